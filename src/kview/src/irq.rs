//! Interrupt descriptor lookups

use crate::error::{KernelError, Result};
use crate::helpers::{mtree_load, xa_load};
use crate::object::Object;
use crate::program::Program;
use crate::types::TypeKind;

use std::fmt;

pub const IRQ_TYPE_NONE: u32 = 0x0000_0000;
pub const IRQ_TYPE_EDGE_RISING: u32 = 0x0000_0001;
pub const IRQ_TYPE_EDGE_FALLING: u32 = 0x0000_0002;
pub const IRQ_TYPE_EDGE_BOTH: u32 = IRQ_TYPE_EDGE_FALLING | IRQ_TYPE_EDGE_RISING;
pub const IRQ_TYPE_LEVEL_HIGH: u32 = 0x0000_0004;
pub const IRQ_TYPE_LEVEL_LOW: u32 = 0x0000_0008;
pub const IRQ_TYPE_SENSE_MASK: u32 = 0x0000_000f;

const IRQ_DESC: &str = "struct irq_desc";

/// Trigger bits of `irq_desc.status_use_accessors`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerType(pub u32);

impl TriggerType {
    pub fn from_status(status: u32) -> Self {
        TriggerType(status & IRQ_TYPE_SENSE_MASK)
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            IRQ_TYPE_NONE => "none",
            IRQ_TYPE_EDGE_RISING => "edge-rising",
            IRQ_TYPE_EDGE_FALLING => "edge-falling",
            IRQ_TYPE_EDGE_BOTH => "edge-both",
            IRQ_TYPE_LEVEL_HIGH => "level-high",
            IRQ_TYPE_LEVEL_LOW => "level-low",
            _ => "mixed",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

/// `irq_to_desc()`
///
/// Sparse irqs live in the `sparse_irqs` maple tree (6.5+) or the
/// `irq_desc_tree` radix tree; kernels without `CONFIG_SPARSE_IRQ` have a
/// flat `irq_desc[NR_IRQS]` array, bounded by `nr_irqs` or, failing that,
/// by the array length BTF declares.
pub fn irq_to_desc(prog: &Program, irq: u32) -> Result<Object<'_>> {
    let symbols = prog.symbols();
    let index = irq as u64;

    let address = if symbols.contains("sparse_irqs") {
        let tree = prog.variable("sparse_irqs", "struct maple_tree")?;
        mtree_load(&tree, index)?
    } else if symbols.contains("irq_desc_tree") {
        let tree = prog.variable("irq_desc_tree", "struct xarray")?;
        xa_load(&tree, index)?
    } else {
        let descs = prog.variable("irq_desc", IRQ_DESC)?;
        if index >= flat_irq_count(prog)? {
            return Err(KernelError::IrqNotFound(irq));
        }
        index
            .checked_mul(descs.size()?)
            .and_then(|offset| descs.address().checked_add(offset))
    };

    let address = address.ok_or(KernelError::IrqNotFound(irq))?;
    tracing::debug!(irq, desc = format_args!("{:#x}", address), "irq_to_desc");
    prog.object_of(address, IRQ_DESC)
}

fn flat_irq_count(prog: &Program) -> Result<u64> {
    if prog.symbols().contains("nr_irqs") {
        let nr_irqs = prog.variable("nr_irqs", "int")?.value_i64()?;
        return Ok(nr_irqs.max(0) as u64);
    }
    let types = prog.types();
    match types.variable("irq_desc").map(|id| types.resolved(id)) {
        Some(Ok(TypeKind::Array { len, .. })) => Ok(*len),
        _ => Err(KernelError::Corrupt(
            "irq_desc table: no nr_irqs and no declared length".into(),
        )),
    }
}

/// `irqd_get_trigger_type()` as stored in the descriptor's status word
pub fn irq_trigger_type(desc: &Object<'_>) -> Result<TriggerType> {
    let status = desc.member("status_use_accessors")?.value_u64()?;
    Ok(TriggerType::from_status(status as u32))
}
