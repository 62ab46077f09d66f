//! Raw memory hex dumps

use anyhow::{Context, Result};
use kview::Program;

const BYTES_PER_LINE: usize = 16;

/// Hex dump `size` bytes at `address`, which may be a number or a symbol
pub fn handle(prog: &Program, address: &str, size: usize) -> Result<()> {
    let start = match parse_number(address) {
        Some(value) => value,
        None => prog
            .symbols()
            .address_of(address)
            .with_context(|| format!("'{}' is neither an address nor a symbol", address))?,
    };

    let bytes = prog.memory().read_bytes(start, size)?;
    for line in hexdump(start, &bytes) {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) fn parse_number(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// `xxd`-style lines: address, sixteen hex bytes, printable ASCII
fn hexdump(start: u64, bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!(
                "{:016x}: {:<width$}  {}",
                start + (i * BYTES_PER_LINE) as u64,
                hex.join(" "),
                ascii,
                width = BYTES_PER_LINE * 3 - 1
            )
        })
        .collect()
}
