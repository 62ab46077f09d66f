//! Structure member offsets

use anyhow::Result;
use kview::Program;

pub fn handle(prog: &Program, ty: &str, member: &str) -> Result<()> {
    let offset = prog.offset_of(ty, member)?;
    println!("offset of '{}' in '{}' = {}", member, ty, offset);
    Ok(())
}
