//! Typed handles to kernel memory
//!
//! An [`Object`] is an address plus a BTF type, borrowed from the
//! [`Program`] it was read through. Navigation never copies the underlying
//! structure; values are read on demand.

use crate::error::{KernelError, Result};
use crate::program::Program;
use crate::types::{split_subscripts, TypeId, TypeKind};

use byteorder::{ByteOrder, LE};

/// Location of a bit field inside its storage bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// Bit offset from `Object::address`, below 8
    pub shift: u32,
    pub width: u32,
}

#[derive(Clone, Copy)]
pub struct Object<'p> {
    prog: &'p Program,
    address: u64,
    ty: TypeId,
    bitfield: Option<BitField>,
}

impl std::fmt::Debug for Object<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("address", &format_args!("{:#x}", self.address))
            .field("type", &self.type_name())
            .field("bitfield", &self.bitfield)
            .finish()
    }
}

impl<'p> Object<'p> {
    pub fn new(prog: &'p Program, address: u64, ty: TypeId) -> Self {
        Object {
            prog,
            address,
            ty,
            bitfield: None,
        }
    }

    pub fn program(&self) -> &'p Program {
        self.prog
    }

    /// Address of the first byte holding this object
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn bitfield(&self) -> Option<BitField> {
        self.bitfield
    }

    pub fn type_name(&self) -> String {
        self.prog.types().name_of(self.ty)
    }

    pub fn size(&self) -> Result<u64> {
        self.prog.types().size_of(self.ty)
    }

    /// `&obj`; bit fields have no address
    pub fn address_of(&self) -> Result<u64> {
        match self.bitfield {
            Some(_) => Err(KernelError::BitFieldAddress(self.type_name())),
            None => Ok(self.address),
        }
    }

    fn kind(&self) -> Result<&'p TypeKind> {
        self.prog.types().resolved(self.ty)
    }

    /// `obj.name`, or `obj->name` when this object is a pointer
    pub fn member(&self, name: &str) -> Result<Object<'p>> {
        let base = if self.prog.types().is_pointer(self.ty) {
            self.deref()?
        } else {
            *self
        };

        let location = self.prog.types().find_member(base.ty, name)?;
        let address = base.address + location.bit_offset / 8;
        let bitfield = (location.bitfield_size != 0).then_some(BitField {
            shift: (location.bit_offset % 8) as u32,
            width: location.bitfield_size,
        });

        Ok(Object {
            prog: self.prog,
            address,
            ty: location.ty,
            bitfield,
        })
    }

    /// Follow a dotted path such as `subsys.kobj.entry` or `pivot[2]`
    pub fn member_path(&self, path: &str) -> Result<Object<'p>> {
        let mut current = *self;
        for component in path.split('.') {
            let (name, indices) =
                split_subscripts(component).ok_or_else(|| KernelError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("bad component '{}'", component),
                })?;
            current = current.member(name)?;
            for index in indices {
                current = current.subscript(index)?;
            }
        }
        Ok(current)
    }

    /// `*obj` for pointers; the first element for arrays
    pub fn deref(&self) -> Result<Object<'p>> {
        let target = self.prog.types().pointee(self.ty)?;
        match self.kind()? {
            TypeKind::Pointer { .. } => {
                let address = self.value_u64()?;
                if address == 0 {
                    return Err(KernelError::NullPointer(self.type_name()));
                }
                Ok(Object::new(self.prog, address, target))
            }
            _ => Ok(Object::new(self.prog, self.address, target)),
        }
    }

    /// `obj[index]` on an array or a pointer
    pub fn subscript(&self, index: u64) -> Result<Object<'p>> {
        let element = self.prog.types().pointee(self.ty)?;
        let stride = self.prog.types().size_of(element)?;
        let base = match self.kind()? {
            TypeKind::Pointer { .. } => {
                let address = self.value_u64()?;
                if address == 0 {
                    return Err(KernelError::NullPointer(self.type_name()));
                }
                address
            }
            _ => self.address,
        };
        let address = index
            .checked_mul(stride)
            .and_then(|offset| base.checked_add(offset))
            .ok_or_else(|| KernelError::IndexOverflow {
                ty: self.type_name(),
                index,
            })?;
        Ok(Object::new(self.prog, address, element))
    }

    /// The `spec` whose member `path` is this object
    ///
    /// A pointer object is taken to point at the member.
    pub fn container_of(&self, spec: &str, path: &str) -> Result<Object<'p>> {
        let member_address = if self.prog.types().is_pointer(self.ty) {
            self.value_u64()?
        } else {
            self.address_of()?
        };
        let offset = self.prog.offset_of(spec, path)?;
        let container = member_address.wrapping_sub(offset);
        tracing::trace!(
            member = format_args!("{:#x}", member_address),
            container = format_args!("{:#x}", container),
            spec,
            path,
            "container_of"
        );
        self.prog.object_of(container, spec)
    }

    /// Reinterpret the same memory as `spec`
    pub fn cast(&self, spec: &str) -> Result<Object<'p>> {
        self.prog.object_of(self.address_of()?, spec)
    }

    /// Treat this pointer's value as the address of a `spec`
    pub fn pointer_as(&self, spec: &str) -> Result<Object<'p>> {
        let address = self.value_u64()?;
        if address == 0 {
            return Err(KernelError::NullPointer(format!("{} *", spec)));
        }
        self.prog.object_of(address, spec)
    }

    /// Raw bytes of the whole object
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let size = self.size()? as usize;
        self.prog.memory().read_bytes(self.address, size)
    }

    fn scalar_layout(&self) -> Result<(u64, bool)> {
        match self.kind()? {
            TypeKind::Int { size, signed, .. } | TypeKind::Enum { size, signed, .. } => {
                Ok((*size, *signed))
            }
            TypeKind::Pointer { .. } => Ok((crate::types::POINTER_SIZE, false)),
            _ => Err(KernelError::NotScalar(self.type_name())),
        }
    }

    /// Whether the scalar is a signed integer or enum
    pub fn is_signed(&self) -> Result<bool> {
        Ok(self.scalar_layout()?.1)
    }

    /// Zero-extended value of an integer, enum, pointer or bit field
    pub fn value_u64(&self) -> Result<u64> {
        let (size, _) = self.scalar_layout()?;
        match self.bitfield {
            Some(field) => self.read_bitfield(field),
            None => {
                let bytes = self.prog.memory().read_bytes(self.address, size as usize)?;
                Ok(decode_unsigned(&bytes))
            }
        }
    }

    /// Sign-extended value for signed types, zero-extended otherwise
    pub fn value_i64(&self) -> Result<i64> {
        let (size, signed) = self.scalar_layout()?;
        let raw = self.value_u64()?;
        let bits = match self.bitfield {
            Some(field) => field.width,
            None => (size * 8) as u32,
        };
        Ok(if signed && bits < 64 {
            let unused = 64 - bits;
            ((raw << unused) as i64) >> unused
        } else {
            raw as i64
        })
    }

    fn read_bitfield(&self, field: BitField) -> Result<u64> {
        let total = field.shift + field.width;
        let len = total.div_ceil(8) as usize;
        let bytes = self.prog.memory().read_bytes(self.address, len)?;
        let mut raw = [0u8; 16];
        raw[..len].copy_from_slice(&bytes);
        let word = LE::read_u128(&raw) >> field.shift;
        let mask = if field.width >= 64 {
            u64::MAX as u128
        } else {
            (1u128 << field.width) - 1
        };
        Ok((word & mask) as u64)
    }

    /// Contents of a `char` array (up to its first NUL) or of the string a
    /// `char *` points at
    pub fn read_cstr(&self) -> Result<String> {
        match self.kind()? {
            TypeKind::Array { len, .. } => {
                let bytes = self.prog.memory().read_bytes(self.address, *len as usize)?;
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Ok(String::from_utf8_lossy(&bytes[..end]).to_string())
            }
            TypeKind::Pointer { .. } => {
                let address = self.value_u64()?;
                if address == 0 {
                    return Err(KernelError::NullPointer(self.type_name()));
                }
                self.prog.memory().read_cstring(address, 4096)
            }
            _ => Err(KernelError::NotPointer(self.type_name())),
        }
    }
}

/// Little-endian bytes (at most eight) as an unsigned value
pub(crate) fn decode_unsigned(bytes: &[u8]) -> u64 {
    let len = bytes.len().min(8);
    if len == 0 {
        0
    } else {
        LE::read_uint(&bytes[..len], len)
    }
}
