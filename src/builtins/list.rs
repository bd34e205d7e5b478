//! List type - dynamic arrays with amortized O(1) append
//!
//! Design: Contiguous slots with geometric growth (factor of 2)
//! - Fast indexing O(1), negative indices count from the end
//! - Linear-scan membership
//! - Reference-kind slots are counted heap references

use super::{values_equal, ElemKind, Value};
use crate::allocator::{Destructor, Heap, ObjRef, Payload};
use crate::context::Context;
use crate::errors::{OrFatal, RuntimeError, RuntimeResult};
use crate::gc::RefKind;
use crate::logging::{debug, trace};

#[derive(Debug)]
pub struct List {
    kind: ElemKind,
    items: Vec<Value>,
    capacity: usize,
}

impl List {
    /// Build a list over `values` without touching refcounts
    pub(crate) fn from_values(values: &[Value], kind: ElemKind, limit: usize) -> RuntimeResult<Self> {
        if values.len() > limit {
            return Err(RuntimeError::CapacityOverflow { len: values.len(), max: limit });
        }
        if let Some(v) = values.iter().find(|v| v.kind() != kind) {
            return Err(RuntimeError::KindMismatch { expected: kind, found: v.kind() });
        }

        let capacity = values.len().max(1);
        let mut items = Vec::new();
        items.try_reserve_exact(capacity).map_err(|_| RuntimeError::OutOfMemory {
            bytes: capacity * core::mem::size_of::<Value>(),
        })?;
        items.extend_from_slice(values);

        Ok(Self { kind, items, capacity })
    }

    #[inline]
    pub fn kind(&self) -> ElemKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slots allocated; always at least `len`
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn check_kind(&self, v: &Value) -> RuntimeResult<()> {
        if v.kind() != self.kind {
            return Err(RuntimeError::KindMismatch { expected: self.kind, found: v.kind() });
        }
        Ok(())
    }

    /// Make room for one more slot, doubling the capacity when full.
    ///
    /// Only capacity changes; a failure leaves the contents untouched.
    pub(crate) fn reserve_slot(&mut self, limit: usize) -> RuntimeResult<()> {
        if self.items.len() < self.capacity {
            return Ok(());
        }
        if self.capacity >= limit / 2 {
            return Err(RuntimeError::CapacityOverflow { len: self.items.len(), max: limit });
        }

        let grown = self.capacity * 2;
        self.items
            .try_reserve_exact(grown - self.items.len())
            .map_err(|_| RuntimeError::OutOfMemory { bytes: grown * core::mem::size_of::<Value>() })?;
        self.capacity = grown;
        Ok(())
    }

    /// Append into a slot made available by `reserve_slot`, without refcounting
    pub(crate) fn store_slot(&mut self, v: Value) {
        debug_assert!(self.items.len() < self.capacity);
        self.items.push(v);
    }

    pub(crate) fn pop_slot(&mut self) -> RuntimeResult<Value> {
        self.items.pop().ok_or(RuntimeError::PopFromEmpty)
    }

    /// Resolve a possibly negative index
    pub(crate) fn position(&self, index: isize) -> RuntimeResult<usize> {
        let len = self.items.len();
        let resolved = if index < 0 { index + len as isize } else { index };

        if resolved < 0 || resolved as usize >= len {
            return Err(RuntimeError::IndexOutOfRange { index, len });
        }
        Ok(resolved as usize)
    }

    pub(crate) fn at(&self, index: isize) -> RuntimeResult<Value> {
        Ok(self.items[self.position(index)?])
    }

    pub(crate) fn replace(&mut self, position: usize, v: Value) -> Value {
        core::mem::replace(&mut self.items[position], v)
    }

    pub(crate) fn find(&self, heap: &Heap, v: &Value) -> RuntimeResult<Option<usize>> {
        self.check_kind(v)?;
        for (i, item) in self.items.iter().enumerate() {
            if values_equal(heap, item, v)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Move every slot out, leaving the list empty
    pub(crate) fn take_values(&mut self) -> Vec<Value> {
        core::mem::take(&mut self.items)
    }
}

/// Destructor for list records
fn release_list(cx: &mut Context, payload: &mut Payload) {
    if let Payload::List(list) = payload {
        cx.release_values(list.take_values());
    }
}

impl Context {
    /// Check that a reference slot points at a record its kind may hold
    pub(crate) fn check_slot(&self, v: &Value) -> RuntimeResult<()> {
        let (expected, r) = match *v {
            Value::Str(Some(r)) => ("str", r),
            Value::Text(Some(r)) => ("text", r),
            Value::Obj(Some(r)) => ("object", r),
            _ => return Ok(()),
        };

        let payload = &self.heap.get(r)?.payload;
        match (expected, payload) {
            ("str", Payload::Str(_)) | ("text", Payload::Text(_)) | ("object", _) => Ok(()),
            _ => Err(RuntimeError::WrongPayload { expected, found: payload.kind_name() }),
        }
    }

    /// Count a heap reference for every reference slot in `values`.
    ///
    /// All or nothing: on error no count has changed.
    pub(crate) fn retain_values(&mut self, values: &[Value]) -> RuntimeResult<()> {
        for v in values {
            self.check_slot(v)?;
        }

        for (done, r) in values.iter().filter_map(Value::reference).enumerate() {
            if let Err(e) = self.try_inc(r, RefKind::Heap) {
                self.unretain_values(values.iter().filter_map(Value::reference).take(done));
                return Err(e);
            }
        }
        Ok(())
    }

    /// Undo `retain_values` for references that were just counted
    fn unretain_values(&mut self, refs: impl Iterator<Item = ObjRef>) {
        for r in refs {
            if let Err(e) = self.try_dec(r, RefKind::Heap, true) {
                debug!(target: "containers", record = r.index(), error = %e, "Retain rollback skipped");
            }
        }
    }

    /// Drop the heap reference of every reference slot in `values`
    pub(crate) fn release_values(&mut self, values: Vec<Value>) {
        for v in values {
            self.dec_heap(v.reference());
        }
    }

    /// Register a container record that holds counted references to `retained`
    pub(crate) fn alloc_container(
        &mut self,
        payload: Payload,
        retained: &[Value],
        hook: Destructor,
    ) -> RuntimeResult<ObjRef> {
        self.retain_values(retained)?;

        let obj = match self.alloc_record(payload) {
            Ok(obj) => obj,
            Err(e) => {
                self.unretain_values(retained.iter().filter_map(Value::reference));
                return Err(e);
            }
        };
        // A fresh record has no hook yet
        self.install_destructor(obj, hook)?;
        Ok(obj)
    }

    /// Allocate a list of `kind` holding `values`
    pub fn new_list(&mut self, values: &[Value], kind: ElemKind) -> ObjRef {
        self.try_new_list(values, kind).or_fatal()
    }

    pub fn try_new_list(&mut self, values: &[Value], kind: ElemKind) -> RuntimeResult<ObjRef> {
        let list = List::from_values(values, kind, self.config.list_limit())?;
        self.alloc_container(Payload::List(list), values, Box::new(release_list))
    }

    pub fn list_push(&mut self, list: ObjRef, v: Value) {
        self.try_list_push(list, v).or_fatal()
    }

    pub fn try_list_push(&mut self, list: ObjRef, v: Value) -> RuntimeResult<()> {
        let limit = self.config.list_limit();
        self.list(list)?.check_kind(&v)?;
        self.check_slot(&v)?;

        self.list_mut(list)?.reserve_slot(limit)?;
        self.retain_values(core::slice::from_ref(&v))?;
        self.list_mut(list)?.store_slot(v);

        trace!(target: "containers", list = list.index(), "push");
        Ok(())
    }

    /// Remove the last slot and return it, dropping the list's reference
    pub fn list_pop(&mut self, list: ObjRef) -> Value {
        self.try_list_pop(list).or_fatal()
    }

    pub fn try_list_pop(&mut self, list: ObjRef) -> RuntimeResult<Value> {
        let v = self.list_mut(list)?.pop_slot()?;
        if let Some(r) = v.reference() {
            self.try_dec(r, RefKind::Heap, false)?;
        }

        trace!(target: "containers", list = list.index(), "pop");
        Ok(v)
    }

    /// Slot at `index`; negative indices count from the end
    pub fn list_at(&self, list: ObjRef, index: isize) -> Value {
        self.try_list_at(list, index).or_fatal()
    }

    pub fn try_list_at(&self, list: ObjRef, index: isize) -> RuntimeResult<Value> {
        self.list(list)?.at(index)
    }

    /// Overwrite the slot at `index`, moving the list's reference
    pub fn list_set(&mut self, list: ObjRef, index: isize, v: Value) {
        self.try_list_set(list, index, v).or_fatal()
    }

    pub fn try_list_set(&mut self, list: ObjRef, index: isize, v: Value) -> RuntimeResult<()> {
        let position = {
            let l = self.list(list)?;
            l.check_kind(&v)?;
            l.position(index)?
        };

        self.retain_values(core::slice::from_ref(&v))?;
        let old = self.list_mut(list)?.replace(position, v);
        if let Some(r) = old.reference() {
            self.try_dec(r, RefKind::Heap, false)?;
        }
        Ok(())
    }

    pub fn list_contains(&self, list: ObjRef, v: Value) -> bool {
        self.try_list_find(list, v).or_fatal().is_some()
    }

    /// Position of the first slot equal to `v`
    pub fn list_find(&self, list: ObjRef, v: Value) -> Option<usize> {
        self.try_list_find(list, v).or_fatal()
    }

    pub fn try_list_find(&self, list: ObjRef, v: Value) -> RuntimeResult<Option<usize>> {
        self.list(list)?.find(&self.heap, &v)
    }

    pub fn list_len(&self, list: ObjRef) -> usize {
        self.list(list).or_fatal().len()
    }

    pub fn list_capacity(&self, list: ObjRef) -> usize {
        self.list(list).or_fatal().capacity()
    }

    pub fn list_kind(&self, list: ObjRef) -> ElemKind {
        self.list(list).or_fatal().kind()
    }

    /// Copy of the slots, without taking references
    pub fn list_values(&self, list: ObjRef) -> Vec<Value> {
        self.list(list).or_fatal().values().to_vec()
    }

    fn list(&self, obj: ObjRef) -> RuntimeResult<&List> {
        match &self.heap.get(obj)?.payload {
            Payload::List(l) => Ok(l),
            other => Err(RuntimeError::WrongPayload { expected: "list", found: other.kind_name() }),
        }
    }

    fn list_mut(&mut self, obj: ObjRef) -> RuntimeResult<&mut List> {
        match &mut self.heap.get_mut(obj)?.payload {
            Payload::List(l) => Ok(l),
            other => Err(RuntimeError::WrongPayload { expected: "list", found: other.kind_name() }),
        }
    }
}
