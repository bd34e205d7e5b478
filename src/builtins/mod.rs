//! Built-in containers - tagged-union list, dict and set
//!
//! Design: every container is homogeneous over one `ElemKind`. Slots of a
//! reference kind hold a heap reference counted by the container; scalar
//! slots are plain values. Lookup is a linear scan with a kind-specific
//! equality rule.

mod dict;
mod list;
mod set;
mod string;


pub use dict::Dict;
pub use list::List;
pub use set::Set;

use core::fmt;

use crate::allocator::{Heap, ObjRef, Payload};
use crate::errors::{RuntimeError, RuntimeResult};

/// Largest element count a list may ever hold
pub const MAX_LIST: usize = isize::MAX as usize / core::mem::size_of::<Value>();

/// Closed set of slot kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemKind {
    /// Generic owned object
    Obj,
    /// Owned byte-string
    Str,
    /// Owned text
    Text,
    Byte,
    Float,
    UInt,
    Int,
}

impl ElemKind {
    /// Slots of this kind hold counted references
    #[inline]
    pub const fn is_ref(self) -> bool {
        matches!(self, ElemKind::Obj | ElemKind::Str | ElemKind::Text)
    }
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElemKind::Obj => "object",
            ElemKind::Str => "str",
            ElemKind::Text => "text",
            ElemKind::Byte => "byte",
            ElemKind::Float => "float",
            ElemKind::UInt => "uint",
            ElemKind::Int => "int",
        };
        f.write_str(name)
    }
}

/// One container slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Obj(Option<ObjRef>),
    Str(Option<ObjRef>),
    Text(Option<ObjRef>),
    Byte(u8),
    Float(f64),
    UInt(u64),
    Int(i64),
}

impl Value {
    pub const fn kind(&self) -> ElemKind {
        match self {
            Value::Obj(_) => ElemKind::Obj,
            Value::Str(_) => ElemKind::Str,
            Value::Text(_) => ElemKind::Text,
            Value::Byte(_) => ElemKind::Byte,
            Value::Float(_) => ElemKind::Float,
            Value::UInt(_) => ElemKind::UInt,
            Value::Int(_) => ElemKind::Int,
        }
    }

    /// Referenced record, if this is a non-null reference slot
    #[inline]
    pub const fn reference(&self) -> Option<ObjRef> {
        match *self {
            Value::Obj(r) | Value::Str(r) | Value::Text(r) => r,
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match *self {
            Value::UInt(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

/// Equality of two slots of the same kind.
///
/// Byte-strings and text compare content, scalars compare values, generic
/// objects compare identity and then content when both hold strings or text.
pub(crate) fn values_equal(heap: &Heap, a: &Value, b: &Value) -> RuntimeResult<bool> {
    match (a, b) {
        (Value::Byte(x), Value::Byte(y)) => Ok(x == y),
        (Value::Float(x), Value::Float(y)) => Ok(x == y),
        (Value::UInt(x), Value::UInt(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => refs_equal(heap, *x, *y, ElemKind::Str),
        (Value::Text(x), Value::Text(y)) => refs_equal(heap, *x, *y, ElemKind::Text),
        (Value::Obj(x), Value::Obj(y)) => refs_equal(heap, *x, *y, ElemKind::Obj),
        _ => Err(RuntimeError::KindMismatch { expected: a.kind(), found: b.kind() }),
    }
}

fn refs_equal(heap: &Heap, a: Option<ObjRef>, b: Option<ObjRef>, kind: ElemKind) -> RuntimeResult<bool> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(true),
        (Some(a), Some(b)) if a == b => return Ok(true),
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(false),
    };

    let pa = &heap.get(a)?.payload;
    let pb = &heap.get(b)?.payload;

    match kind {
        ElemKind::Str => match (pa, pb) {
            (Payload::Str(x), Payload::Str(y)) => Ok(x == y),
            (Payload::Str(_), other) | (other, _) => {
                Err(RuntimeError::WrongPayload { expected: "str", found: other.kind_name() })
            }
        },
        ElemKind::Text => match (pa, pb) {
            (Payload::Text(x), Payload::Text(y)) => Ok(x == y),
            (Payload::Text(_), other) | (other, _) => {
                Err(RuntimeError::WrongPayload { expected: "text", found: other.kind_name() })
            }
        },
        _ => match (pa, pb) {
            (Payload::Str(x), Payload::Str(y)) => Ok(x == y),
            (Payload::Text(x), Payload::Text(y)) => Ok(x == y),
            _ => Err(RuntimeError::ComparisonNotImplemented { kind }),
        },
    }
}
