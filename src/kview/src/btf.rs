//! BTF reader
//!
//! Loads the kernel's BPF Type Format blob (`/sys/kernel/btf/vmlinux`) with
//! `btf-rs` and copies it into a [`TypeTable`], keeping BTF type ids as table
//! ids. Kinds without layout meaning become `TypeKind::Other`.

use crate::error::{KernelError, Result};
use crate::types::{Aggregate, Member, Qualifier, TypeId, TypeKind, TypeTable};

use btf_rs::{Btf, BtfType, Type};
use std::path::Path;

/// Load and convert a BTF file
pub fn load<P: AsRef<Path>>(path: P) -> Result<TypeTable> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| KernelError::io(path, e))?;
    let btf = Btf::from_bytes(&data).map_err(|e| invalid(format!("{}: {}", path.display(), e)))?;
    let table = convert(&btf)?;
    tracing::debug!(path = %path.display(), types = table.len(), "loaded BTF");
    Ok(table)
}

/// Convert a raw BTF blob
pub fn parse(data: &[u8]) -> Result<TypeTable> {
    let btf = Btf::from_bytes(data).map_err(|e| invalid(e.to_string()))?;
    convert(&btf)
}

fn invalid(msg: String) -> KernelError {
    KernelError::InvalidBtf(msg)
}

/// Walk ids from 1 until the blob runs out
fn convert(btf: &Btf) -> Result<TypeTable> {
    let mut table = TypeTable::new();
    let mut id: TypeId = 1;
    while let Ok(ty) = btf.resolve_type_by_id(id) {
        let kind = Converter { btf, id }.kind(ty)?;
        table.add(kind);
        id += 1;
    }
    if table.is_empty() {
        return Err(invalid("no types".into()));
    }
    Ok(table)
}

struct Converter<'a> {
    btf: &'a Btf,
    id: TypeId,
}

impl Converter<'_> {
    fn fail(&self, what: &str, err: impl std::fmt::Display) -> KernelError {
        invalid(format!("type {}: {}: {}", self.id, what, err))
    }

    /// Name of a type or member; `None` when anonymous
    fn name<T: BtfType + ?Sized>(&self, item: &T) -> Result<Option<String>> {
        let name = self
            .btf
            .resolve_name(item)
            .map_err(|e| self.fail("bad name offset", e))?;
        Ok((!name.is_empty()).then_some(name))
    }

    fn named<T: BtfType + ?Sized>(&self, item: &T) -> Result<String> {
        Ok(self.name(item)?.unwrap_or_default())
    }

    fn target<T: BtfType + ?Sized>(&self, item: &T) -> Result<TypeId> {
        item.get_type_id()
            .map_err(|e| self.fail("missing type reference", e))
    }

    fn aggregate(
        &self,
        name: Option<String>,
        size: usize,
        members: &[btf_rs::Member],
    ) -> Result<Aggregate> {
        let members = members
            .iter()
            .map(|m| {
                Ok(Member {
                    name: self.name(m)?,
                    ty: self.target(m)?,
                    bit_offset: m.bit_offset() as u64,
                    bitfield_size: m.bitfield_size().unwrap_or(0),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Aggregate {
            name,
            size: size as u64,
            members,
        })
    }

    fn qualified<T: BtfType>(&self, qualifier: Qualifier, item: &T) -> Result<TypeKind> {
        Ok(TypeKind::Qualified {
            qualifier,
            target: self.target(item)?,
        })
    }

    fn kind(&self, ty: Type) -> Result<TypeKind> {
        let kind = match ty {
            Type::Void => TypeKind::Void,
            Type::Int(int) => TypeKind::Int {
                name: self.named(&int)?,
                size: int.size() as u64,
                signed: int.is_signed(),
                is_char: int.is_char(),
                is_bool: int.is_bool(),
            },
            Type::Float(float) => TypeKind::Float {
                name: self.named(&float)?,
                size: float.size() as u64,
            },
            Type::Ptr(ptr) => TypeKind::Pointer {
                target: self.target(&ptr)?,
            },
            Type::Array(array) => TypeKind::Array {
                element: self.target(&array)?,
                len: array.len() as u64,
            },
            Type::Struct(agg) => {
                TypeKind::Struct(self.aggregate(self.name(&agg)?, agg.size(), &agg.members)?)
            }
            Type::Union(agg) => {
                TypeKind::Union(self.aggregate(self.name(&agg)?, agg.size(), &agg.members)?)
            }
            Type::Enum(e) => {
                let signed = e.is_signed();
                let variants = e
                    .members
                    .iter()
                    .map(|m| {
                        let value = if signed {
                            m.val() as i32 as i64
                        } else {
                            m.val() as u32 as i64
                        };
                        Ok((self.named(m)?, value))
                    })
                    .collect::<Result<Vec<_>>>()?;
                TypeKind::Enum {
                    name: self.name(&e)?,
                    size: e.size() as u64,
                    signed,
                    variants,
                }
            }
            Type::Enum64(e) => {
                let variants = e
                    .members
                    .iter()
                    .map(|m| Ok((self.named(m)?, m.val() as i64)))
                    .collect::<Result<Vec<_>>>()?;
                TypeKind::Enum {
                    name: self.name(&e)?,
                    size: e.size() as u64,
                    signed: e.is_signed(),
                    variants,
                }
            }
            Type::Fwd(fwd) => TypeKind::Fwd {
                name: self.named(&fwd)?,
                union: fwd.is_union(),
            },
            Type::Typedef(typedef) => TypeKind::Typedef {
                name: self.named(&typedef)?,
                target: self.target(&typedef)?,
            },
            Type::Const(q) => self.qualified(Qualifier::Const, &q)?,
            Type::Volatile(q) => self.qualified(Qualifier::Volatile, &q)?,
            Type::Restrict(q) => self.qualified(Qualifier::Restrict, &q)?,
            Type::TypeTag(q) => self.qualified(Qualifier::TypeTag, &q)?,
            Type::Func(func) => TypeKind::Function {
                name: self.name(&func)?,
            },
            Type::FuncProto(_) => TypeKind::Function { name: None },
            Type::Var(var) => TypeKind::Variable {
                name: self.named(&var)?,
                target: self.target(&var)?,
            },
            _ => TypeKind::Other,
        };
        Ok(kind)
    }
}
