//! XArray lookups
//!
//! Radix trees have been XArrays since 4.20, so `irq_desc_tree` and friends
//! are walked with the same code. Layout offsets come from `struct xa_node`.

use crate::error::{KernelError, Result};
use crate::object::Object;
use crate::types::TypeKind;

/// Internal entries have `0b10` in the low bits
pub(crate) fn xa_is_internal(entry: u64) -> bool {
    entry & 3 == 2
}

/// Node pointers are internal entries above the small-value range
pub(crate) fn xa_is_node(entry: u64) -> bool {
    xa_is_internal(entry) && entry > 4096
}

fn xa_to_node(entry: u64) -> u64 {
    entry - 2
}

fn xa_to_internal(entry: u64) -> u64 {
    entry >> 2
}

/// `xa_load()`: the entry stored at `index`, or `None`
///
/// `xa` is a `struct xarray` (or `struct radix_tree_root`) or a pointer to
/// one. Retry and zero entries read as absent.
pub fn xa_load(xa: &Object<'_>, index: u64) -> Result<Option<u64>> {
    let prog = xa.program();
    let types = prog.types();
    let memory = prog.memory();

    let mut entry = xa.member("xa_head")?.value_u64()?;

    if xa_is_node(entry) {
        let node_ty = types.find("struct xa_node")?;
        let shift_offset = types.find_member(node_ty, "shift")?.byte_offset();
        let slots = types.find_member(node_ty, "slots")?;
        let chunk_size = match types.resolved(slots.ty)? {
            TypeKind::Array { len, .. } if len.is_power_of_two() => *len,
            _ => return Err(KernelError::Corrupt("struct xa_node slots".into())),
        };
        let chunk_mask = chunk_size - 1;
        let slot = |node: u64, offset: u64| {
            memory.read_ptr(node + slots.byte_offset() + offset * 8)
        };

        let top_shift = memory.read_u8(xa_to_node(entry) + shift_offset)? as u32;
        let beyond = (chunk_size as u128)
            .checked_shl(top_shift)
            .is_some_and(|limit| index as u128 >= limit);
        if beyond {
            return Ok(None);
        }

        loop {
            let node = xa_to_node(entry);
            let shift = memory.read_u8(node + shift_offset)? as u32;
            let mut offset = index.checked_shr(shift).unwrap_or(0) & chunk_mask;
            entry = slot(node, offset)?;

            // Multi-index entries point at their canonical slot
            if xa_is_internal(entry) && xa_to_internal(entry) < chunk_mask {
                offset = xa_to_internal(entry);
                entry = slot(node, offset)?;
            }

            tracing::trace!(
                node = format_args!("{:#x}", node),
                shift,
                offset,
                entry = format_args!("{:#x}", entry),
                "xa_load step"
            );

            if shift == 0 || !xa_is_node(entry) {
                break;
            }
        }
    } else if index != 0 {
        return Ok(None);
    }

    if entry == 0 || xa_is_internal(entry) {
        Ok(None)
    } else {
        Ok(Some(entry))
    }
}
