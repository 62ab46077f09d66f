//! Human-readable structure dumps
//!
//! ```text
//! *(struct irq_data *)0xffff888003a41e00 = {
//! 	.irq = (unsigned int)4,
//! 	.hwirq = (unsigned long)4,
//! }
//! ```
//!
//! The object is read from memory once and printed from that buffer, so a
//! dump never mixes two states of the same structure. Integers print in
//! decimal, pointers in hex; arrays drop trailing zero elements.

use crate::error::{KernelError, Result};
use crate::object::{decode_unsigned, Object};
use crate::program::Program;
use crate::types::{Aggregate, TypeId, TypeKind};

use byteorder::{ByteOrder, LE};

/// Longest string followed through a `char *` member
const MAX_STRING: usize = 4096;

pub fn hex(value: u64) -> String {
    format!("{:#x}", value)
}

/// Dump an object: aggregates as `*(type *)addr = { ... }`, anything else
/// as `(type)value`
pub fn format_object(obj: &Object<'_>) -> Result<String> {
    let printer = Printer {
        prog: obj.program(),
    };
    let type_name = obj.type_name();

    if let Some(field) = obj.bitfield() {
        let text = printer.scalar(obj.ty(), obj.value_u64()?, field.width)?;
        return Ok(format!("({}){}", type_name, text));
    }

    let data = obj.read_bytes()?;
    let body = printer.value(obj.ty(), &data, 0)?;
    match obj.program().types().resolved(obj.ty())? {
        TypeKind::Struct(_) | TypeKind::Union(_) => Ok(format!(
            "*({} *){} = {}",
            type_name,
            hex(obj.address()),
            body
        )),
        _ => Ok(format!("({}){}", type_name, body)),
    }
}

struct Printer<'p> {
    prog: &'p Program,
}

impl Printer<'_> {
    fn value(&self, ty: TypeId, data: &[u8], depth: usize) -> Result<String> {
        let types = self.prog.types();
        match types.resolved(ty)? {
            TypeKind::Int { .. } | TypeKind::Enum { .. } => {
                self.scalar(ty, decode_unsigned(data), (data.len() * 8) as u32)
            }
            TypeKind::Float { size: 4, .. } if data.len() >= 4 => Ok(LE::read_f32(data).to_string()),
            TypeKind::Float { size: 8, .. } if data.len() >= 8 => Ok(LE::read_f64(data).to_string()),
            TypeKind::Pointer { target } => Ok(self.pointer(*target, decode_unsigned(data))),
            TypeKind::Array { element, len } => self.array(*element, *len, data, depth),
            TypeKind::Struct(agg) | TypeKind::Union(agg) => self.aggregate(agg, data, depth),
            _ => Ok("<incomplete>".to_string()),
        }
    }

    /// Integers, bools and enums; `bits` is the stored width
    fn scalar(&self, ty: TypeId, raw: u64, bits: u32) -> Result<String> {
        let types = self.prog.types();
        Ok(match types.resolved(ty)? {
            TypeKind::Int { is_bool: true, .. } => (raw != 0).to_string(),
            TypeKind::Int { signed: true, .. } => sign_extend(raw, bits).to_string(),
            TypeKind::Enum { signed, .. } => {
                let value = if *signed {
                    sign_extend(raw, bits)
                } else {
                    raw as i64
                };
                match types.enumerator(ty, value) {
                    Some(name) => name.to_string(),
                    None => value.to_string(),
                }
            }
            _ => raw.to_string(),
        })
    }

    fn pointer(&self, target: TypeId, address: u64) -> String {
        let text = hex(address);
        let is_char = matches!(
            self.prog.types().resolved(target),
            Ok(TypeKind::Int { is_char: true, .. })
        );
        if address == 0 || !is_char {
            return text;
        }
        match self.prog.memory().read_cstring(address, MAX_STRING) {
            Ok(s) => format!("{} = \"{}\"", text, s.escape_default()),
            Err(_) => text,
        }
    }

    fn array(&self, element: TypeId, len: u64, data: &[u8], depth: usize) -> Result<String> {
        let types = self.prog.types();
        let element_kind = types.resolved(element)?;

        if matches!(element_kind, TypeKind::Int { is_char: true, .. }) {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            let text = String::from_utf8_lossy(&data[..end]);
            return Ok(format!("\"{}\"", text.escape_default()));
        }

        let stride = types.size_of(element)? as usize;
        if stride == 0 {
            return Ok("{}".to_string());
        }
        let elements: Vec<&[u8]> = data.chunks(stride).take(len as usize).collect();
        let used = elements
            .iter()
            .rposition(|e| e.iter().any(|&b| b != 0))
            .map_or(0, |last| last + 1);
        if used == 0 {
            return Ok("{}".to_string());
        }

        let values = elements[..used]
            .iter()
            .map(|e| self.value(element, e, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        if matches!(
            element_kind,
            TypeKind::Struct(_) | TypeKind::Union(_) | TypeKind::Array { .. }
        ) {
            let pad = indent(depth + 1);
            let mut out = String::from("{\n");
            for value in values {
                out.push_str(&format!("{}{},\n", pad, value));
            }
            out.push_str(&indent(depth));
            out.push('}');
            Ok(out)
        } else {
            Ok(format!("{{ {} }}", values.join(", ")))
        }
    }

    fn aggregate(&self, agg: &Aggregate, data: &[u8], depth: usize) -> Result<String> {
        let types = self.prog.types();
        let pad = indent(depth + 1);
        let mut out = String::from("{\n");

        for member in &agg.members {
            let text = if member.bitfield_size != 0 {
                let raw = extract_bits(data, member.bit_offset, member.bitfield_size)?;
                self.scalar(member.ty, raw, member.bitfield_size)?
            } else {
                match types.size_of(member.ty) {
                    Ok(size) => {
                        let start = (member.bit_offset / 8) as usize;
                        let bytes = data
                            .get(start..start + size as usize)
                            .ok_or_else(|| outside(member.name.as_deref(), agg))?;
                        self.value(member.ty, bytes, depth + 1)?
                    }
                    Err(_) => "<incomplete>".to_string(),
                }
            };

            match &member.name {
                Some(name) => out.push_str(&format!(
                    "{}.{} = ({}){},\n",
                    pad,
                    name,
                    types.name_of(member.ty),
                    text
                )),
                None => out.push_str(&format!("{}{},\n", pad, text)),
            }
        }

        out.push_str(&indent(depth));
        out.push('}');
        Ok(out)
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

fn outside(member: Option<&str>, agg: &Aggregate) -> KernelError {
    KernelError::Corrupt(format!(
        "member {} lies outside {} ({} bytes)",
        member.unwrap_or("<anonymous>"),
        agg.name.as_deref().unwrap_or("<anonymous>"),
        agg.size
    ))
}

fn extract_bits(data: &[u8], bit_offset: u64, width: u32) -> Result<u64> {
    let start = (bit_offset / 8) as usize;
    let shift = (bit_offset % 8) as u32;
    let len = (shift + width).div_ceil(8) as usize;
    let bytes = data
        .get(start..start + len)
        .filter(|_| len <= 16)
        .ok_or_else(|| KernelError::Corrupt(format!("bit field at bit {}", bit_offset)))?;

    let mut raw = [0u8; 16];
    raw[..len].copy_from_slice(bytes);
    let word = LE::read_u128(&raw) >> shift;
    let mask = if width >= 64 {
        u64::MAX as u128
    } else {
        (1u128 << width) - 1
    };
    Ok((word & mask) as u64)
}

fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        raw as i64
    } else {
        let unused = 64 - bits;
        ((raw << unused) as i64) >> unused
    }
}
