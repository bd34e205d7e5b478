//! Dict type - parallel key and value lists
//!
//! Design: no hashing; lookup scans the keys with the key kind's equality
//! rule. Suited to the small dictionaries generated code builds from
//! literals. Key uniqueness is kept by `dict_insert`; construction trusts
//! the caller.

use super::{ElemKind, List, Value};
use crate::allocator::{ObjRef, Payload};
use crate::context::Context;
use crate::errors::{OrFatal, RuntimeError, RuntimeResult};
use crate::gc::RefKind;

#[derive(Debug)]
pub struct Dict {
    keys: List,
    values: List,
}

impl Dict {
    #[inline]
    pub fn keys(&self) -> &List {
        &self.keys
    }

    #[inline]
    pub fn values(&self) -> &List {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn release_dict(cx: &mut Context, payload: &mut Payload) {
    if let Payload::Dict(dict) = payload {
        cx.release_values(dict.keys.take_values());
        cx.release_values(dict.values.take_values());
    }
}

impl Context {
    /// Allocate a dict mapping `keys[i]` to `values[i]`
    pub fn new_dict(&mut self, keys: &[Value], values: &[Value], key_kind: ElemKind, value_kind: ElemKind) -> ObjRef {
        self.try_new_dict(keys, values, key_kind, value_kind).or_fatal()
    }

    pub fn try_new_dict(
        &mut self,
        keys: &[Value],
        values: &[Value],
        key_kind: ElemKind,
        value_kind: ElemKind,
    ) -> RuntimeResult<ObjRef> {
        if keys.len() != values.len() {
            return Err(RuntimeError::LengthMismatch { keys: keys.len(), values: values.len() });
        }

        let limit = self.config.list_limit();
        let dict = Dict {
            keys: List::from_values(keys, key_kind, limit)?,
            values: List::from_values(values, value_kind, limit)?,
        };
        let retained: Vec<Value> = keys.iter().chain(values).copied().collect();
        self.alloc_container(Payload::Dict(dict), &retained, Box::new(release_dict))
    }

    /// Value stored under `key`; an absent key is fatal
    pub fn dict_at(&self, dict: ObjRef, key: Value) -> Value {
        self.try_dict_at(dict, key).or_fatal()
    }

    pub fn try_dict_at(&self, dict: ObjRef, key: Value) -> RuntimeResult<Value> {
        let d = self.dict(dict)?;
        match d.keys.find(&self.heap, &key)? {
            Some(i) => d.values.at(i as isize),
            None => Err(RuntimeError::KeyNotFound),
        }
    }

    pub fn dict_contains_key(&self, dict: ObjRef, key: Value) -> bool {
        self.try_dict_find_key(dict, key).or_fatal().is_some()
    }

    pub fn dict_contains_value(&self, dict: ObjRef, value: Value) -> bool {
        let d = self.dict(dict).or_fatal();
        d.values.find(&self.heap, &value).or_fatal().is_some()
    }

    #[inline]
    pub fn dict_values_contains(&self, dict: ObjRef, value: Value) -> bool {
        self.dict_contains_value(dict, value)
    }

    pub fn try_dict_find_key(&self, dict: ObjRef, key: Value) -> RuntimeResult<Option<usize>> {
        self.dict(dict)?.keys.find(&self.heap, &key)
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn dict_insert(&mut self, dict: ObjRef, key: Value, value: Value) {
        self.try_dict_insert(dict, key, value).or_fatal()
    }

    pub fn try_dict_insert(&mut self, dict: ObjRef, key: Value, value: Value) -> RuntimeResult<()> {
        let limit = self.config.list_limit();
        let existing = {
            let d = self.dict(dict)?;
            d.values.check_kind(&value)?;
            d.keys.find(&self.heap, &key)?
        };

        match existing {
            Some(i) => {
                self.retain_values(core::slice::from_ref(&value))?;
                let old = self.dict_mut(dict)?.values.replace(i, value);
                if let Some(r) = old.reference() {
                    self.try_dec(r, RefKind::Heap, false)?;
                }
            }
            None => {
                // Both lists must have room before any count moves
                let d = self.dict_mut(dict)?;
                d.keys.reserve_slot(limit)?;
                d.values.reserve_slot(limit)?;

                self.retain_values(&[key, value])?;
                let d = self.dict_mut(dict)?;
                d.keys.store_slot(key);
                d.values.store_slot(value);
            }
        }
        Ok(())
    }

    pub fn dict_len(&self, dict: ObjRef) -> usize {
        self.dict(dict).or_fatal().len()
    }

    fn dict(&self, obj: ObjRef) -> RuntimeResult<&Dict> {
        match &self.heap.get(obj)?.payload {
            Payload::Dict(d) => Ok(d),
            other => Err(RuntimeError::WrongPayload { expected: "dict", found: other.kind_name() }),
        }
    }

    fn dict_mut(&mut self, obj: ObjRef) -> RuntimeResult<&mut Dict> {
        match &mut self.heap.get_mut(obj)?.payload {
            Payload::Dict(d) => Ok(d),
            other => Err(RuntimeError::WrongPayload { expected: "dict", found: other.kind_name() }),
        }
    }
}
