//! Set type - membership over an element list
//!
//! Construction does not remove duplicates; membership answers the same
//! either way.

use super::{ElemKind, List, Value};
use crate::allocator::{ObjRef, Payload};
use crate::context::Context;
use crate::errors::{OrFatal, RuntimeError, RuntimeResult};

#[derive(Debug)]
pub struct Set {
    elements: List,
}

impl Set {
    #[inline]
    pub fn elements(&self) -> &List {
        &self.elements
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn release_set(cx: &mut Context, payload: &mut Payload) {
    if let Payload::Set(set) = payload {
        cx.release_values(set.elements.take_values());
    }
}

impl Context {
    pub fn new_set(&mut self, elements: &[Value], kind: ElemKind) -> ObjRef {
        self.try_new_set(elements, kind).or_fatal()
    }

    pub fn try_new_set(&mut self, elements: &[Value], kind: ElemKind) -> RuntimeResult<ObjRef> {
        let set = Set { elements: List::from_values(elements, kind, self.config.list_limit())? };
        self.alloc_container(Payload::Set(set), elements, Box::new(release_set))
    }

    pub fn set_contains(&self, set: ObjRef, v: Value) -> bool {
        self.try_set_contains(set, v).or_fatal()
    }

    pub fn try_set_contains(&self, set: ObjRef, v: Value) -> RuntimeResult<bool> {
        Ok(self.set(set)?.elements.find(&self.heap, &v)?.is_some())
    }

    /// Stored element count, duplicates included
    pub fn set_len(&self, set: ObjRef) -> usize {
        self.set(set).or_fatal().len()
    }

    pub fn set_elements(&self, set: ObjRef) -> Vec<Value> {
        self.set(set).or_fatal().elements.values().to_vec()
    }

    fn set(&self, obj: ObjRef) -> RuntimeResult<&Set> {
        match &self.heap.get(obj)?.payload {
            Payload::Set(s) => Ok(s),
            other => Err(RuntimeError::WrongPayload { expected: "set", found: other.kind_name() }),
        }
    }
}
