//! Memory Source Abstraction
//!
//! Core abstractions for reading kernel memory:
//! - ELF core images via `CoreFile` (`/proc/kcore` or a saved vmcore)
//! - Mock sources for testing

pub(crate) mod core;
mod region;
mod traits;
#[cfg(test)]
mod mock;

pub use self::core::{CoreFile, VmcoreInfo};
#[cfg(test)]
pub use mock::MockMemorySource;
pub use region::MemoryRegion;
pub use traits::MemorySource;
