//! Byte-strings and text records

use crate::allocator::{try_buffer, ObjRef, Payload};
use crate::context::Context;
use crate::errors::{OrFatal, RuntimeError, RuntimeResult};

impl Context {
    /// Allocate a byte-string holding a copy of `bytes`
    pub fn new_str(&mut self, bytes: &[u8]) -> ObjRef {
        self.try_new_str(bytes).or_fatal()
    }

    pub fn try_new_str(&mut self, bytes: &[u8]) -> RuntimeResult<ObjRef> {
        let mut buf = try_buffer(bytes.len(), 0)?;
        buf.copy_from_slice(bytes);
        self.alloc_record(Payload::Str(buf))
    }

    /// Allocate a text record holding a copy of `text`
    pub fn new_text(&mut self, text: &str) -> ObjRef {
        self.try_new_text(text).or_fatal()
    }

    pub fn try_new_text(&mut self, text: &str) -> RuntimeResult<ObjRef> {
        let mut owned = String::new();
        owned
            .try_reserve_exact(text.len())
            .map_err(|_| RuntimeError::OutOfMemory { bytes: text.len() })?;
        owned.push_str(text);
        self.alloc_record(Payload::Text(owned))
    }

    pub fn str_bytes(&self, obj: ObjRef) -> &[u8] {
        match self.payload(obj) {
            Payload::Str(b) => b,
            other => crate::errors::fatal(RuntimeError::WrongPayload { expected: "str", found: other.kind_name() }),
        }
    }

    pub fn text_str(&self, obj: ObjRef) -> &str {
        match self.payload(obj) {
            Payload::Text(s) => s,
            other => crate::errors::fatal(RuntimeError::WrongPayload { expected: "text", found: other.kind_name() }),
        }
    }

    /// Byte-string equality: the same record, or both present with equal bytes
    pub fn str_eq(&self, a: Option<ObjRef>, b: Option<ObjRef>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b || self.str_bytes(a) == self.str_bytes(b),
            _ => false,
        }
    }
}
