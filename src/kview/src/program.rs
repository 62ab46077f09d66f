//! Kernel program handle
//!
//! Bundles the four inputs every lookup needs (memory, symbols, types and
//! the kernel release) and hands out typed [`Object`]s.

use crate::btf;
use crate::error::{KernelError, Result};
use crate::object::Object;
use crate::release::KernelRelease;
use crate::source::{CoreFile, MemorySource};
use crate::symbols::SymbolTable;
use crate::types::{TypeId, TypeTable};

use std::path::PathBuf;

/// Where the kernel image, symbols and types are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPaths {
    pub core: PathBuf,
    pub kallsyms: PathBuf,
    pub btf: PathBuf,
    /// Overrides release detection when set
    pub release: Option<String>,
}

impl Default for TargetPaths {
    fn default() -> Self {
        TargetPaths {
            core: PathBuf::from("/proc/kcore"),
            kallsyms: PathBuf::from("/proc/kallsyms"),
            btf: PathBuf::from("/sys/kernel/btf/vmlinux"),
            release: None,
        }
    }
}

pub struct Program {
    memory: Box<dyn MemorySource>,
    symbols: SymbolTable,
    types: TypeTable,
    release: KernelRelease,
}

impl Program {
    pub fn new(
        memory: Box<dyn MemorySource>,
        symbols: SymbolTable,
        types: TypeTable,
        release: KernelRelease,
    ) -> Self {
        Program {
            memory,
            symbols,
            types,
            release,
        }
    }

    /// Open a live kernel or a saved vmcore
    ///
    /// The release comes from `paths.release`, then the image's
    /// `VMCOREINFO`, then the running kernel. An unreadable symbol file is
    /// tolerated when the image carries `VMCOREINFO` symbols.
    pub fn open(paths: &TargetPaths) -> Result<Self> {
        let core = CoreFile::open(&paths.core)?;

        let mut symbols = match SymbolTable::load(&paths.kallsyms) {
            Ok(table) => table,
            Err(e) if core.vmcoreinfo().is_some() => {
                tracing::warn!("{}; using VMCOREINFO symbols only", e);
                SymbolTable::new()
            }
            Err(e) => return Err(e),
        };
        if let Some(info) = core.vmcoreinfo() {
            symbols.merge_vmcoreinfo(info);
        }

        let types = btf::load(&paths.btf)?;

        let release = match (&paths.release, core.vmcoreinfo().and_then(|i| i.osrelease())) {
            (Some(release), _) => release.parse()?,
            (None, Some(release)) => release.parse()?,
            (None, None) => KernelRelease::running()?,
        };
        tracing::debug!(%release, live = core.is_live(), "opened kernel");

        Ok(Program::new(Box::new(core), symbols, types, release))
    }

    pub fn memory(&self) -> &dyn MemorySource {
        self.memory.as_ref()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn release(&self) -> KernelRelease {
        self.release
    }

    pub fn object(&self, address: u64, ty: TypeId) -> Object<'_> {
        Object::new(self, address, ty)
    }

    /// Object of the named type at `address`
    pub fn object_of(&self, address: u64, spec: &str) -> Result<Object<'_>> {
        Ok(self.object(address, self.types.find(spec)?))
    }

    /// Global variable `name`, read as `spec`
    pub fn variable(&self, name: &str, spec: &str) -> Result<Object<'_>> {
        let address = self.symbols.address_of(name)?;
        self.object_of(address, spec)
    }

    /// Global pointer variable `name`, followed to the `spec` it points at
    pub fn pointer_variable(&self, name: &str, spec: &str) -> Result<Object<'_>> {
        let slot = self.symbols.address_of(name)?;
        let address = self.memory.read_ptr(slot)?;
        if address == 0 {
            return Err(KernelError::NullPointer(format!("{} *{}", spec, name)));
        }
        self.object_of(address, spec)
    }

    /// Byte offset of a (possibly dotted) member path inside a type
    pub fn offset_of(&self, spec: &str, path: &str) -> Result<u64> {
        let id = self.types.find(spec)?;
        let location = self.types.member_path(id, path)?;
        if location.bitfield_size != 0 {
            return Err(KernelError::BitFieldAddress(self.types.name_of(location.ty)));
        }
        Ok(location.byte_offset())
    }
}
