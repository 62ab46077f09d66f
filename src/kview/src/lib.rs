//! # kview
//!
//! Read-only inspection of Linux kernel structures.
//!
//! This library provides functionality to:
//! - Read kernel memory from `/proc/kcore` or a saved vmcore
//! - Resolve symbols from kallsyms, System.map or VMCOREINFO, and name
//!   addresses by the symbol they fall in
//! - Lay out kernel types from BTF
//! - Find tasks, bus devices, bus drivers and irq descriptors
//! - Resolve field paths and dump structures
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let prog = kview::Program::open(&kview::TargetPaths::default())?;
//!
//! let task = kview::find_task(&prog, 1)?;
//! println!("{}", kview::format_object(&task)?);
//!
//! let path: kview::FieldPath = "*se.vruntime".parse()?;
//! println!("{}", path.resolve(&task)?);
//! # Ok(())
//! # }
//! ```

pub mod btf;
pub mod bus;
pub mod error;
pub mod format;
pub mod helpers;
pub mod irq;
pub mod object;
pub mod path;
pub mod program;
pub mod release;
pub mod source;
pub mod symbols;
pub mod task;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
#[doc(inline)]
pub use bus::{
    find_bus_device, find_bus_driver, for_each_bus_device, for_each_bus_driver, to_bus_device,
    to_bus_driver, BusKind, DeviceSelector,
};
#[doc(inline)]
pub use error::{KernelError, Result};
#[doc(inline)]
pub use format::{format_object, hex};
#[doc(inline)]
pub use irq::{irq_to_desc, irq_trigger_type, TriggerType};
#[doc(inline)]
pub use object::Object;
#[doc(inline)]
pub use path::{FieldPath, Resolved};
#[doc(inline)]
pub use program::{Program, TargetPaths};
#[doc(inline)]
pub use release::KernelRelease;
#[doc(inline)]
pub use task::{find_task, for_each_task, task_comm, task_pid};
