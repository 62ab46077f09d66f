//! Kernel symbol table
//!
//! Built from `/proc/kallsyms` (or a `System.map`, same line format) and
//! optionally topped up from `VMCOREINFO` `SYMBOL(...)` entries when
//! inspecting an offline vmcore.

use crate::error::{KernelError, Result};
use crate::source::VmcoreInfo;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    address: u64,
    kind: char,
}

impl Entry {
    fn is_global(&self) -> bool {
        self.kind.is_ascii_uppercase()
    }

    /// Absolute symbols (per-cpu offsets and the like) are not addresses
    fn is_absolute(&self) -> bool {
        self.kind.eq_ignore_ascii_case(&'a')
    }
}

/// Name to address map
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Entry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a kallsyms-format file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| KernelError::io(path, e))?;
        let table = Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            KernelError::Io { source, .. } => KernelError::io(path, source),
            other => other,
        })?;

        if table.is_empty() {
            return Err(KernelError::NoSymbols(path.to_path_buf()));
        }

        tracing::debug!(path = %path.display(), symbols = table.len(), "loaded symbols");
        Ok(table)
    }

    /// Parse `address type name [module]` lines
    ///
    /// Zero addresses are what unprivileged readers of kallsyms see and are
    /// skipped. When a name repeats, a global symbol replaces a local one;
    /// otherwise the first occurrence is kept.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = SymbolTable::new();

        for line in reader.lines() {
            let line = line.map_err(|e| KernelError::io("<symbols>", e))?;
            let mut tokens = line.split_whitespace();
            let (Some(addr), Some(kind), Some(name)) = (tokens.next(), tokens.next(), tokens.next())
            else {
                continue;
            };

            let Ok(address) = u64::from_str_radix(addr, 16) else {
                continue;
            };
            if address == 0 {
                continue;
            }
            let kind = kind.chars().next().unwrap_or('?');
            table.insert(name, Entry { address, kind });
        }

        Ok(table)
    }

    fn insert(&mut self, name: &str, entry: Entry) {
        match self.symbols.get(name) {
            Some(existing) if existing.is_global() || !entry.is_global() => {}
            _ => {
                self.symbols.insert(name.to_string(), entry);
            }
        }
    }

    /// Add `SYMBOL(name)=addr` entries that the table does not already have
    pub fn merge_vmcoreinfo(&mut self, info: &VmcoreInfo) {
        for (name, address) in info.symbols() {
            if address != 0 && !self.symbols.contains_key(name) {
                self.symbols
                    .insert(name.to_string(), Entry { address, kind: 'D' });
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.symbols.get(name).map(|e| e.address)
    }

    pub fn address_of(&self, name: &str) -> Result<u64> {
        self.lookup(name)
            .ok_or_else(|| KernelError::SymbolNotFound(name.to_string()))
    }

    /// Nearest symbol at or below `address`, and the offset into it
    ///
    /// At a shared address a global beats a local, then the lower name wins.
    pub fn symbolize(&self, address: u64) -> Option<(&str, u64)> {
        self.symbols
            .iter()
            .filter(|(_, e)| e.address <= address && !e.is_absolute())
            .max_by(|(a_name, a), (b_name, b)| {
                a.address
                    .cmp(&b.address)
                    .then(a.is_global().cmp(&b.is_global()))
                    .then(b_name.cmp(a_name))
            })
            .map(|(name, e)| (name.as_str(), address - e.address))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Insert a global data symbol directly
    pub fn add(&mut self, name: &str, address: u64) {
        self.insert(name, Entry { address, kind: 'D' });
    }
}
