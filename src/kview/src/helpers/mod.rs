//! Kernel data structure walkers
//!
//! The three containers the lookups traverse: `list_head` lists, XArrays
//! (radix trees) and maple trees.

mod list;
mod maple;
mod xarray;

pub use list::{list_for_each_entry, ListIter};
pub use maple::mtree_load;
pub use xarray::xa_load;
