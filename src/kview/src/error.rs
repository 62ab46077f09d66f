//! Error type shared by every lookup in the crate.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid core file: {0}")]
    InvalidCore(String),

    #[error("Invalid BTF data: {0}")]
    InvalidBtf(String),

    #[error("Address {0:#x} is not mapped in the kernel image")]
    Unmapped(u64),

    #[error("Cannot allocate {0} bytes for a read")]
    ReadTooLarge(usize),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No usable symbol addresses in {0} (run as root, or check kptr_restrict)")]
    NoSymbols(PathBuf),

    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("'{ty}' has no member '{member}'")]
    MemberNotFound { ty: String, member: String },

    #[error("'{0}' is not a structure or union")]
    NotAggregate(String),

    #[error("'{0}' is not a pointer or array")]
    NotPointer(String),

    #[error("'{0}' is not a scalar")]
    NotScalar(String),

    #[error("'{0}' has incomplete type")]
    IncompleteType(String),

    #[error("Cannot take the address of bit field of type '{0}'")]
    BitFieldAddress(String),

    #[error("Null pointer dereference of '{0}'")]
    NullPointer(String),

    #[error("Index {index} into '{ty}' overflows the address space")]
    IndexOverflow { ty: String, index: u64 },

    #[error("Cannot find task_struct for pid={0}")]
    TaskNotFound(i64),

    #[error("Bus {0} is not found")]
    BusNotFound(String),

    #[error("Fail to find device {name} on bus {bus}")]
    DeviceNotFound { bus: String, name: String },

    #[error("Fail to find driver {name} on bus {bus}")]
    DriverNotFound { bus: String, name: String },

    #[error("Corrupt {0}")]
    Corrupt(String),

    #[error("No irq_desc for irq {0}")]
    IrqNotFound(u32),

    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid kernel release: {0}")]
    InvalidRelease(String),

    #[error("Invalid device selector '{0}' (expected <name>@<bus>)")]
    InvalidSelector(String),

    #[error("Unknown bus '{0}' (expected platform, usb or pci)")]
    UnknownBus(String),
}

impl KernelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KernelError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;
