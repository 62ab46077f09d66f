//! Field paths
//!
//! A field path names a member reachable from an object:
//!
//! ```text
//! [*|&] member ( ('.' | '->') member | '[' index ']' )*
//! ```
//!
//! `*` asks for the member's value, `&` (or no prefix) for its address. The
//! two separators are interchangeable since member access follows pointers
//! on its own. An empty path names the object itself.

use crate::error::{KernelError, Result};
use crate::object::Object;

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Address,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Member(String),
    Index(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub access: Access,
    pub steps: Vec<Step>,
}

/// What a resolved path evaluates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Address(u64),
    Value(u64),
    /// Value of a signed integer or enum, sign-extended
    Signed(i64),
}

impl Resolved {
    /// The bit pattern, with signed values in two's complement
    pub fn raw(self) -> u64 {
        match self {
            Resolved::Address(v) | Resolved::Value(v) => v,
            Resolved::Signed(v) => v as u64,
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Resolved::Signed(v) if v < 0 => write!(f, "-{:#x}", v.unsigned_abs()),
            Resolved::Signed(v) => write!(f, "{:#x}", v),
            other => write!(f, "{:#x}", other.raw()),
        }
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> KernelError {
    KernelError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl FromStr for FieldPath {
    type Err = KernelError;

    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let (access, body) = match trimmed.chars().next() {
            Some('*') => (Access::Value, &trimmed[1..]),
            Some('&') => (Access::Address, &trimmed[1..]),
            _ => (Access::Address, trimmed),
        };

        let mut steps = Vec::new();
        let mut rest = body.trim_start();
        let mut expect_member = true;

        while !rest.is_empty() {
            if expect_member {
                let c = rest.chars().next().unwrap_or_default();
                if !is_ident_start(c) {
                    return Err(invalid(text, format!("expected a member name at '{}'", rest)));
                }
                let end = rest.find(|c| !is_ident(c)).unwrap_or(rest.len());
                steps.push(Step::Member(rest[..end].to_string()));
                rest = &rest[end..];
                expect_member = false;
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = after
                    .find(']')
                    .ok_or_else(|| invalid(text, "unterminated '['"))?;
                let index = crate::types::parse_index(&after[..close])
                    .ok_or_else(|| invalid(text, format!("bad index '{}'", &after[..close])))?;
                steps.push(Step::Index(index));
                rest = &after[close + 1..];
            } else if let Some(after) = rest.strip_prefix("->") {
                rest = after;
                expect_member = true;
            } else if let Some(after) = rest.strip_prefix('.') {
                rest = after;
                expect_member = true;
            } else {
                return Err(invalid(text, format!("unexpected '{}'", rest)));
            }
        }

        if expect_member && !steps.is_empty() {
            return Err(invalid(text, "trailing separator"));
        }

        Ok(FieldPath { access, steps })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.access == Access::Value {
            f.write_str("*")?;
        }
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Member(name) if i == 0 => f.write_str(name)?,
                Step::Member(name) => write!(f, ".{}", name)?,
                Step::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FieldPath {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The object the path names, before the access is applied
    pub fn walk<'p>(&self, root: &Object<'p>) -> Result<Object<'p>> {
        let mut current = *root;
        for step in &self.steps {
            current = match step {
                Step::Member(name) => current.member(name)?,
                Step::Index(index) => current.subscript(*index)?,
            };
        }
        Ok(current)
    }

    pub fn resolve(&self, root: &Object<'_>) -> Result<Resolved> {
        let target = self.walk(root)?;
        let resolved = match self.access {
            Access::Address => Resolved::Address(target.address_of()?),
            Access::Value if target.is_signed()? => Resolved::Signed(target.value_i64()?),
            Access::Value => Resolved::Value(target.value_u64()?),
        };
        tracing::debug!(path = %self, %resolved, "resolved field path");
        Ok(resolved)
    }
}

/// Parse `path` and resolve it against `root`
pub fn resolve(root: &Object<'_>, path: &str) -> Result<Resolved> {
    path.parse::<FieldPath>()?.resolve(root)
}
