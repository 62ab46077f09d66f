//! Kernel type graph
//!
//! An id-indexed table of C types as described by BTF: integers, pointers,
//! arrays, structs/unions, enums, typedefs and qualifiers. Id 0 is `void`.
//! The table answers the layout questions the lookups need: sizes, member
//! offsets (including members of anonymous structs and unions) and printable
//! type names.

use crate::error::{KernelError, Result};
use std::collections::HashMap;

pub type TypeId = u32;

/// Pointer width of every supported target
pub const POINTER_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Const,
    Volatile,
    Restrict,
    TypeTag,
}

/// One struct or union member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: Option<String>,
    pub ty: TypeId,
    pub bit_offset: u64,
    /// Zero for ordinary members
    pub bitfield_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub name: Option<String>,
    pub size: u64,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Void,
    Int {
        name: String,
        size: u64,
        signed: bool,
        is_char: bool,
        is_bool: bool,
    },
    Float {
        name: String,
        size: u64,
    },
    Pointer {
        target: TypeId,
    },
    Array {
        element: TypeId,
        len: u64,
    },
    Struct(Aggregate),
    Union(Aggregate),
    Enum {
        name: Option<String>,
        size: u64,
        signed: bool,
        variants: Vec<(String, i64)>,
    },
    Fwd {
        name: String,
        union: bool,
    },
    Typedef {
        name: String,
        target: TypeId,
    },
    Qualified {
        qualifier: Qualifier,
        target: TypeId,
    },
    Function {
        name: Option<String>,
    },
    /// A global variable and its declared type
    Variable {
        name: String,
        target: TypeId,
    },
    /// Entries with no layout meaning (sections, tags)
    Other,
}

/// Where a member path lands inside its containing type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberLocation {
    pub bit_offset: u64,
    pub ty: TypeId,
    pub bitfield_size: u32,
}

impl MemberLocation {
    /// Byte offset, valid for non-bitfield members
    pub fn byte_offset(&self) -> u64 {
        self.bit_offset / 8
    }
}

#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<TypeKind>,
    names: HashMap<String, Vec<TypeId>>,
    variables: HashMap<String, TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest typedef/qualifier chain followed before giving up
const MAX_CHAIN: usize = 64;

impl TypeTable {
    pub fn new() -> Self {
        TypeTable {
            types: vec![TypeKind::Void],
            names: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// Append a type and return its id
    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        let id = self.types.len() as TypeId;
        if let TypeKind::Variable { name, target } = &kind {
            self.variables.entry(name.clone()).or_insert(*target);
        } else if let Some(key) = name_key(&kind) {
            self.names.entry(key).or_default().push(id);
        }
        self.types.push(kind);
        id
    }

    pub fn get(&self, id: TypeId) -> Result<&TypeKind> {
        self.types
            .get(id as usize)
            .ok_or_else(|| KernelError::TypeNotFound(format!("type id {}", id)))
    }

    /// Strip typedefs and qualifiers
    pub fn resolve(&self, mut id: TypeId) -> Result<TypeId> {
        for _ in 0..MAX_CHAIN {
            match self.get(id)? {
                TypeKind::Typedef { target, .. } | TypeKind::Qualified { target, .. } => {
                    id = *target;
                }
                _ => return Ok(id),
            }
        }
        Err(KernelError::TypeNotFound(format!(
            "type chain too deep at id {}",
            id
        )))
    }

    pub fn resolved(&self, id: TypeId) -> Result<&TypeKind> {
        self.get(self.resolve(id)?)
    }

    /// Look up a type by its C spelling: `struct task_struct`,
    /// `union thread_union`, `enum pid_type`, or a typedef/base type name
    pub fn find(&self, spec: &str) -> Result<TypeId> {
        let spec = spec.split_whitespace().collect::<Vec<_>>().join(" ");
        let not_found = || KernelError::TypeNotFound(spec.clone());

        let candidates = self.names.get(&spec).ok_or_else(not_found)?;

        // A complete definition beats a forward declaration
        candidates
            .iter()
            .copied()
            .find(|&id| !matches!(self.types[id as usize], TypeKind::Fwd { .. }))
            .or_else(|| candidates.first().copied())
            .ok_or_else(not_found)
    }

    /// Declared type of the global variable `name`
    pub fn variable(&self, name: &str) -> Option<TypeId> {
        self.variables.get(name).copied()
    }

    pub fn size_of(&self, id: TypeId) -> Result<u64> {
        match self.resolved(id)? {
            TypeKind::Int { size, .. }
            | TypeKind::Float { size, .. }
            | TypeKind::Enum { size, .. } => Ok(*size),
            TypeKind::Pointer { .. } => Ok(POINTER_SIZE),
            TypeKind::Array { element, len } => self
                .size_of(*element)?
                .checked_mul(*len)
                .ok_or_else(|| KernelError::Corrupt(format!("array size of {}", self.name_of(id)))),
            TypeKind::Struct(agg) | TypeKind::Union(agg) => Ok(agg.size),
            _ => Err(KernelError::IncompleteType(self.name_of(id))),
        }
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.resolved(id), Ok(TypeKind::Pointer { .. }))
    }

    /// Target of a pointer, or element of an array
    pub fn pointee(&self, id: TypeId) -> Result<TypeId> {
        match self.resolved(id)? {
            TypeKind::Pointer { target } => Ok(*target),
            TypeKind::Array { element, .. } => Ok(*element),
            _ => Err(KernelError::NotPointer(self.name_of(id))),
        }
    }

    pub fn aggregate(&self, id: TypeId) -> Result<&Aggregate> {
        match self.resolved(id)? {
            TypeKind::Struct(agg) | TypeKind::Union(agg) => Ok(agg),
            _ => Err(KernelError::NotAggregate(self.name_of(id))),
        }
    }

    /// Find a named member, descending into anonymous structs and unions
    pub fn find_member(&self, id: TypeId, name: &str) -> Result<MemberLocation> {
        self.search_member(id, name)?
            .ok_or_else(|| KernelError::MemberNotFound {
                ty: self.name_of(id),
                member: name.to_string(),
            })
    }

    fn search_member(&self, id: TypeId, name: &str) -> Result<Option<MemberLocation>> {
        let agg = self.aggregate(id)?;
        for member in &agg.members {
            match &member.name {
                Some(n) if n == name => {
                    return Ok(Some(MemberLocation {
                        bit_offset: member.bit_offset,
                        ty: member.ty,
                        bitfield_size: member.bitfield_size,
                    }));
                }
                None if self.aggregate(member.ty).is_ok() => {
                    if let Some(inner) = self.search_member(member.ty, name)? {
                        return Ok(Some(MemberLocation {
                            bit_offset: member.bit_offset + inner.bit_offset,
                            ..inner
                        }));
                    }
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Resolve a dotted member path such as `subsys.kobj.entry` or
    /// `pivot[3]` within embedded (not pointed-to) members
    pub fn member_path(&self, id: TypeId, path: &str) -> Result<MemberLocation> {
        let mut location = MemberLocation {
            bit_offset: 0,
            ty: id,
            bitfield_size: 0,
        };

        for component in path.split('.') {
            let (name, indices) = split_subscripts(component).ok_or_else(|| {
                KernelError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("bad component '{}'", component),
                }
            })?;

            let member = self.find_member(location.ty, name)?;
            location = MemberLocation {
                bit_offset: location.bit_offset + member.bit_offset,
                ..member
            };

            for index in indices {
                let element = match self.resolved(location.ty)? {
                    TypeKind::Array { element, .. } => *element,
                    _ => return Err(KernelError::NotPointer(self.name_of(location.ty))),
                };
                location = MemberLocation {
                    bit_offset: location.bit_offset + index * self.size_of(element)? * 8,
                    ty: element,
                    bitfield_size: 0,
                };
            }
        }

        Ok(location)
    }

    /// Name of an enum constant, if the value has one
    pub fn enumerator(&self, id: TypeId, value: i64) -> Option<&str> {
        match self.resolved(id).ok()? {
            TypeKind::Enum { variants, .. } => variants
                .iter()
                .find(|(_, v)| *v == value)
                .map(|(n, _)| n.as_str()),
            _ => None,
        }
    }

    /// C spelling of a type, e.g. `struct list_head *` or `char [16]`
    pub fn name_of(&self, id: TypeId) -> String {
        self.name_with_depth(id, 0)
    }

    fn name_with_depth(&self, id: TypeId, depth: usize) -> String {
        if depth > MAX_CHAIN {
            return "?".to_string();
        }
        let Ok(kind) = self.get(id) else {
            return format!("<type {}>", id);
        };

        match kind {
            TypeKind::Void => "void".to_string(),
            TypeKind::Int { name, .. } | TypeKind::Float { name, .. } => name.clone(),
            TypeKind::Typedef { name, .. } => name.clone(),
            TypeKind::Struct(agg) => tagged("struct", agg.name.as_deref()),
            TypeKind::Union(agg) => tagged("union", agg.name.as_deref()),
            TypeKind::Enum { name, .. } => tagged("enum", name.as_deref()),
            TypeKind::Fwd { name, union } => {
                tagged(if *union { "union" } else { "struct" }, Some(name))
            }
            TypeKind::Pointer { target } => {
                if matches!(self.resolved(*target), Ok(TypeKind::Function { .. })) {
                    return "void (*)()".to_string();
                }
                let inner = self.name_with_depth(*target, depth + 1);
                if inner.ends_with('*') {
                    format!("{}*", inner)
                } else {
                    format!("{} *", inner)
                }
            }
            TypeKind::Array { element, len } => {
                format!("{} [{}]", self.name_with_depth(*element, depth + 1), len)
            }
            TypeKind::Qualified { qualifier, target } => {
                let inner = self.name_with_depth(*target, depth + 1);
                match qualifier {
                    Qualifier::Const => format!("const {}", inner),
                    Qualifier::Volatile => format!("volatile {}", inner),
                    Qualifier::Restrict | Qualifier::TypeTag => inner,
                }
            }
            TypeKind::Function { name } => name.clone().unwrap_or_else(|| "void ()".to_string()),
            TypeKind::Variable { name, .. } => name.clone(),
            TypeKind::Other => format!("<type {}>", id),
        }
    }
}

fn tagged(tag: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{} {}", tag, name),
        None => format!("{} <anonymous>", tag),
    }
}

/// Lookup key under which `find` can see a type
fn name_key(kind: &TypeKind) -> Option<String> {
    match kind {
        TypeKind::Struct(Aggregate { name: Some(n), .. }) => Some(format!("struct {}", n)),
        TypeKind::Union(Aggregate { name: Some(n), .. }) => Some(format!("union {}", n)),
        TypeKind::Enum { name: Some(n), .. } => Some(format!("enum {}", n)),
        TypeKind::Fwd { name, union } => Some(format!(
            "{} {}",
            if *union { "union" } else { "struct" },
            name
        )),
        TypeKind::Int { name, .. } | TypeKind::Float { name, .. } | TypeKind::Typedef { name, .. } => {
            Some(name.clone())
        }
        _ => None,
    }
}

/// Split `name[1][2]` into `("name", [1, 2])`
pub(crate) fn split_subscripts(component: &str) -> Option<(&str, Vec<u64>)> {
    let (name, mut rest) = match component.find('[') {
        Some(pos) => (&component[..pos], &component[pos..]),
        None => (component, ""),
    };
    if name.is_empty() {
        return None;
    }

    let mut indices = Vec::new();
    while !rest.is_empty() {
        let close = rest.find(']')?;
        let index = parse_index(rest.get(1..close)?)?;
        indices.push(index);
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return None;
        }
    }
    Some((name, indices))
}

pub(crate) fn parse_index(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
