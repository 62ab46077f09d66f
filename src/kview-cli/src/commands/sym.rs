//! Address to symbol lookups

use anyhow::{bail, Result};
use kview::symbols::SymbolTable;
use kview::Program;

use super::read::parse_number;

const ADDR_WIDTH: usize = 18;

/// Print `addr: symbol @ symaddr+offset` for each address
pub fn handle(prog: &Program, addresses: &[String]) -> Result<()> {
    for text in addresses {
        let Some(address) = parse_number(text) else {
            bail!("'{}' is not an address", text);
        };
        println!("{}", describe(prog.symbols(), address));
    }
    Ok(())
}

fn describe(symbols: &SymbolTable, address: u64) -> String {
    match symbols.symbolize(address) {
        Some((name, offset)) => format!(
            "{:#0width$x}: {} @ {:#x}+{:#x}",
            address,
            name,
            address - offset,
            offset,
            width = ADDR_WIDTH
        ),
        None => format!("{:#0width$x}: <no-symbol>", address, width = ADDR_WIDTH),
    }
}
