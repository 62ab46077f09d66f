//! ELF Core Memory Source
//!
//! Reads kernel memory from an ELF64 core image. `/proc/kcore` is the live
//! case; a vmcore saved by kdump (or a copy of kcore) is the offline case.
//! Loadable segments become `MemoryRegion`s and the `VMCOREINFO` note, when
//! present, provides the kernel release and a handful of symbol addresses.

use super::traits::plan_read;
use super::{MemoryRegion, MemorySource};
use crate::error::{KernelError, Result};

use memmap2::Mmap;
use object::elf::{FileHeader64, ET_CORE, PN_XNUM, PT_LOAD, PT_NOTE};
use object::read::elf::{FileHeader, NoteIterator, ProgramHeader};
use object::Endianness;
use std::borrow::Cow;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

type Elf = FileHeader64<Endianness>;

/// Largest header or note block pulled from a file that cannot be mapped
const MAX_METADATA_READ: u64 = 16 << 20;

/// How the image bytes are reached
enum Backing {
    /// Regular files are mapped once
    Mapped(Mmap),
    /// Procfs files refuse mmap; every read is a positioned read
    Stream(File),
}

impl Backing {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        match self {
            Backing::Mapped(mmap) => {
                buf.copy_from_slice(Self::mapped(mmap, offset, buf.len() as u64)?);
                Ok(())
            }
            Backing::Stream(file) => file.read_exact_at(buf, offset),
        }
    }

    fn mapped(mmap: &Mmap, offset: u64, len: u64) -> std::io::Result<&[u8]> {
        offset
            .checked_add(len)
            .filter(|&end| end <= mmap.len() as u64)
            .map(|end| &mmap[offset as usize..end as usize])
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "read past end of core file")
            })
    }

    /// `len` bytes at `offset`, borrowed from the mapping when there is one
    fn bytes(&self, offset: u64, len: u64) -> std::io::Result<Cow<'_, [u8]>> {
        match self {
            Backing::Mapped(mmap) => Self::mapped(mmap, offset, len).map(Cow::Borrowed),
            Backing::Stream(_) if len > MAX_METADATA_READ => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "header block too large",
            )),
            Backing::Stream(_) => {
                let mut buf = vec![0u8; len as usize];
                self.read_at(offset, &mut buf)?;
                Ok(Cow::Owned(buf))
            }
        }
    }
}

fn malformed(err: object::read::Error) -> KernelError {
    KernelError::InvalidCore(err.to_string())
}

/// ELF core image of kernel memory
pub struct CoreFile {
    backing: Backing,
    regions: Vec<MemoryRegion>,
    vmcoreinfo: Option<VmcoreInfo>,
    live: bool,
    /// Path to the core file
    pub path: PathBuf,
}

impl CoreFile {
    /// Open a core image, memory-mapping it unless it lives under `/proc`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| KernelError::io(&path, e))?;
        let live = path.starts_with("/proc");

        let backing = if live {
            Backing::Stream(file)
        } else {
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| KernelError::io(&path, e))?;
            Backing::Mapped(mmap)
        };

        let (regions, vmcoreinfo) =
            Self::parse_headers(&backing).map_err(|e| match e {
                KernelError::InvalidCore(msg) => {
                    KernelError::InvalidCore(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })?;

        tracing::debug!(
            path = %path.display(),
            regions = regions.len(),
            vmcoreinfo = vmcoreinfo.is_some(),
            "opened core image"
        );

        Ok(CoreFile {
            backing,
            regions,
            vmcoreinfo,
            live,
            path,
        })
    }

    /// The parsed `VMCOREINFO` note, if the image carries one
    pub fn vmcoreinfo(&self) -> Option<&VmcoreInfo> {
        self.vmcoreinfo.as_ref()
    }

    fn parse_headers(backing: &Backing) -> Result<(Vec<MemoryRegion>, Option<VmcoreInfo>)> {
        let too_small = |_| KernelError::InvalidCore("file too small for ELF header".into());
        let ident = backing
            .bytes(0, std::mem::size_of::<Elf>() as u64)
            .map_err(too_small)?;
        let header = Elf::parse(&*ident).map_err(malformed)?;
        let endian = header.endian().map_err(malformed)?;
        if endian != Endianness::Little {
            return Err(KernelError::InvalidCore(
                "only little-endian images are supported".into(),
            ));
        }
        let e_type = header.e_type(endian);
        if e_type != ET_CORE {
            return Err(KernelError::InvalidCore(format!(
                "e_type {} is not ET_CORE",
                e_type
            )));
        }
        if header.e_phnum(endian) == PN_XNUM {
            return Err(KernelError::InvalidCore(
                "extended program header count is not supported".into(),
            ));
        }

        let table_end = u64::from(header.e_phentsize(endian))
            .checked_mul(u64::from(header.e_phnum(endian)))
            .and_then(|len| len.checked_add(header.e_phoff(endian)))
            .ok_or_else(|| KernelError::InvalidCore("program headers out of bounds".into()))?;
        let prefix = backing
            .bytes(0, table_end)
            .map_err(|_| KernelError::InvalidCore("program headers out of bounds".into()))?;
        let phdrs = header.program_headers(endian, &*prefix).map_err(malformed)?;

        let mut regions = Vec::new();
        let mut vmcoreinfo = None;

        for phdr in phdrs {
            let size = phdr.p_filesz(endian);
            match phdr.p_type(endian) {
                PT_LOAD if size > 0 => {
                    regions.push(MemoryRegion::new(
                        phdr.p_vaddr(endian),
                        size,
                        phdr.p_offset(endian),
                    ));
                }
                PT_NOTE if vmcoreinfo.is_none() => {
                    match backing.bytes(phdr.p_offset(endian), size) {
                        Ok(notes) => {
                            vmcoreinfo = find_vmcoreinfo(endian, phdr.p_align(endian), &notes)?;
                        }
                        Err(e) => tracing::debug!("skipping unreadable note segment: {}", e),
                    }
                }
                _ => {}
            }
        }

        if regions.is_empty() {
            return Err(KernelError::InvalidCore("no PT_LOAD segments".into()));
        }

        regions.sort_by_key(|r| r.start);
        Ok((regions, vmcoreinfo))
    }
}

impl MemorySource for CoreFile {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        // Every byte must be mapped before the buffer is sized
        let pieces = plan_read(&self.regions, address, size)?;
        let mut out = Vec::new();
        out.try_reserve_exact(size)
            .map_err(|_| KernelError::ReadTooLarge(size))?;
        out.resize(size, 0);

        let mut filled = 0;
        for (index, offset, len) in pieces {
            let region = &self.regions[index];
            self.backing
                .read_at(region.offset + offset, &mut out[filled..filled + len])
                .map_err(|_| KernelError::Unmapped(region.start + offset))?;
            filled += len;
        }
        Ok(out)
    }

    fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// Walk an ELF note segment and return the `VMCOREINFO` note text
fn find_vmcoreinfo(endian: Endianness, align: u64, notes: &[u8]) -> Result<Option<VmcoreInfo>> {
    let mut iter = NoteIterator::<Elf>::new(endian, align, notes).map_err(malformed)?;
    while let Some(note) = iter.next().map_err(malformed)? {
        if note.name() == b"VMCOREINFO" {
            let text = String::from_utf8_lossy(note.desc());
            return Ok(Some(VmcoreInfo::parse(&text)));
        }
    }
    Ok(None)
}

/// `KEY=value` lines from the `VMCOREINFO` note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmcoreInfo {
    entries: Vec<(String, String)>,
}

impl VmcoreInfo {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let line = line.trim_end_matches('\0').trim();
                let (key, value) = line.split_once('=')?;
                Some((key.to_string(), value.to_string()))
            })
            .collect();
        VmcoreInfo { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn osrelease(&self) -> Option<&str> {
        self.get("OSRELEASE")
    }

    /// `SYMBOL(name)=hexaddr` entries
    pub fn symbols(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().filter_map(|(key, value)| {
            let name = key.strip_prefix("SYMBOL(")?.strip_suffix(')')?;
            let addr = u64::from_str_radix(value, 16).ok()?;
            Some((name, addr))
        })
    }
}
