//! Maple tree lookups
//!
//! `sparse_irqs` has been a maple tree since 6.5. Encoded node pointers
//! ("enodes") carry the node type in bits 3-6; the node itself is 256-byte
//! aligned. Pivot and slot offsets are read from `struct maple_node`.

use super::xarray::{xa_is_internal, xa_is_node};
use crate::error::{KernelError, Result};
use crate::object::Object;
use crate::types::{TypeId, TypeKind, TypeTable};

const MAPLE_NODE_MASK: u64 = 0xff;
const MAPLE_NODE_TYPE_SHIFT: u64 = 3;
const MAPLE_NODE_TYPE_MASK: u64 = 0x0f;
const MAPLE_ROOT_NODE: u64 = 0x02;

/// Deepest tree accepted before the walk is considered corrupt
const MAX_HEIGHT: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeType {
    Dense,
    Leaf64,
    Range64,
    Arange64,
}

impl NodeType {
    fn from_enode(enode: u64) -> Result<Self> {
        match (enode >> MAPLE_NODE_TYPE_SHIFT) & MAPLE_NODE_TYPE_MASK {
            0 => Ok(NodeType::Dense),
            1 => Ok(NodeType::Leaf64),
            2 => Ok(NodeType::Range64),
            3 => Ok(NodeType::Arange64),
            other => Err(KernelError::Corrupt(format!(
                "maple node type {} in {:#x}",
                other, enode
            ))),
        }
    }

    fn is_leaf(self) -> bool {
        matches!(self, NodeType::Dense | NodeType::Leaf64)
    }
}

/// Offsets of a pivot array and its slot array inside `struct maple_node`
#[derive(Debug, Clone, Copy)]
struct Layout {
    pivot: u64,
    pivots: u64,
    slot: u64,
    slots: u64,
}

impl Layout {
    fn load(types: &TypeTable, node_ty: TypeId, prefix: &str) -> Result<Self> {
        let (pivot, pivots) = if prefix.is_empty() {
            (0, 0)
        } else {
            array(types, node_ty, &format!("{}.pivot", prefix))?
        };
        let slot_path = if prefix.is_empty() {
            "slot".to_string()
        } else {
            format!("{}.slot", prefix)
        };
        let (slot, slots) = array(types, node_ty, &slot_path)?;
        Ok(Layout {
            pivot,
            pivots,
            slot,
            slots,
        })
    }
}

fn array(types: &TypeTable, ty: TypeId, path: &str) -> Result<(u64, u64)> {
    let location = types.member_path(ty, path)?;
    match types.resolved(location.ty)? {
        TypeKind::Array { len, .. } => Ok((location.byte_offset(), *len)),
        _ => Err(KernelError::Corrupt(format!("struct maple_node {}", path))),
    }
}

/// `mtree_load()`: the entry covering `index`, or `None`
///
/// `mt` is a `struct maple_tree` or a pointer to one.
pub fn mtree_load(mt: &Object<'_>, index: u64) -> Result<Option<u64>> {
    let prog = mt.program();
    let types = prog.types();
    let memory = prog.memory();

    let root = mt.member("ma_root")?.value_u64()?;
    if !xa_is_node(root) {
        // A lone entry lives at index 0 and is stored in the root itself
        return Ok((index == 0 && root != 0 && !xa_is_internal(root)).then_some(root));
    }

    let node_ty = types.find("struct maple_node")?;
    let dense = Layout::load(types, node_ty, "")?;
    let range = Layout::load(types, node_ty, "mr64")?;
    let arange = Layout::load(types, node_ty, "ma64")?;

    let mut enode = root & !MAPLE_ROOT_NODE;
    let mut min = 0u64;

    for _ in 0..MAX_HEIGHT {
        let node = enode & !MAPLE_NODE_MASK;
        let node_type = NodeType::from_enode(enode)?;

        let (layout, offset) = if node_type == NodeType::Dense {
            match index.checked_sub(min) {
                Some(offset) if offset < dense.slots => (dense, offset),
                _ => return Ok(None),
            }
        } else {
            let layout = if node_type == NodeType::Arange64 {
                arange
            } else {
                range
            };

            // The slot past the last pivot runs to the node's maximum, and a
            // zero pivot after the first marks the end of used slots
            let mut offset = layout.pivots;
            for i in 0..layout.pivots {
                let pivot = memory.read_u64(node + layout.pivot + i * 8)?;
                if (pivot == 0 && i > 0) || pivot >= index {
                    offset = i;
                    break;
                }
                min = pivot + 1;
            }
            (layout, offset.min(layout.slots.saturating_sub(1)))
        };

        let entry = memory.read_ptr(node + layout.slot + offset * 8)?;
        tracing::trace!(
            node = format_args!("{:#x}", node),
            ?node_type,
            offset,
            entry = format_args!("{:#x}", entry),
            "mtree_load step"
        );

        if node_type.is_leaf() {
            return Ok((entry != 0 && !xa_is_internal(entry)).then_some(entry));
        }
        if entry == 0 {
            return Ok(None);
        }
        enode = entry;
    }

    Err(KernelError::Corrupt(format!(
        "maple tree deeper than {} levels",
        MAX_HEIGHT
    )))
}
