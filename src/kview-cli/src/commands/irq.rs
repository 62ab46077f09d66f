//! Interrupt descriptor dump

use anyhow::Result;
use kview::{format_object, irq_to_desc, irq_trigger_type, Program};

pub fn handle(prog: &Program, irq: u32) -> Result<()> {
    let desc = irq_to_desc(prog, irq)?;
    println!("{}", format_object(&desc)?);
    println!("trigger = {}", irq_trigger_type(&desc)?);
    Ok(())
}
