//! Command handlers for kview CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod bus;
pub mod configure;
pub mod irq;
pub mod kexpr;
pub mod offsetof;
pub mod read;
pub mod sym;
pub mod task;
