//! Record allocation - headers plus payload
//!
//! Design: Two-layer architecture:
//! 1. Record table (`Heap`) owning every record and the live-object list
//! 2. Allocation API on `Context` stamping each header with the active scope
//!
//! Allocation failure is fatal; generated code has no way to handle it.

mod header;
mod heap;


pub use header::{
    Destructor, ObjRef, ObjState, ObjectHeader, Payload, QueueTarget, Record, ScopeId, HEADER_SIZE, ROOT_SCOPE,
    STATIC_SCOPE,
};
pub use heap::{Heap, LiveIter};

use crate::context::Context;
use crate::errors::{OrFatal, RuntimeError, RuntimeResult};
use crate::logging::log_allocation;

/// Fill byte for `allocate` payloads in debug builds, to surface reads of
/// storage the caller never wrote
const UNINIT_FILL: u8 = if cfg!(debug_assertions) { 0xCD } else { 0 };

/// Reserve a byte buffer of exactly `len` bytes, reporting exhaustion
pub(crate) fn try_buffer(len: usize, fill: u8) -> RuntimeResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| RuntimeError::OutOfMemory { bytes: len })?;
    buf.resize(len, fill);
    Ok(buf)
}

impl Context {
    /// Allocate a record of `size` bytes, header included.
    ///
    /// The record starts with refcount 1, belongs to the current scope and
    /// sits at the head of the live-object list. Payload contents are
    /// unspecified; use [`Context::allocate_zeroed`] when they matter.
    pub fn allocate(&mut self, size: usize) -> ObjRef {
        self.try_allocate(size, false).or_fatal()
    }

    /// Like [`Context::allocate`], with the payload zero-filled
    pub fn allocate_zeroed(&mut self, size: usize) -> ObjRef {
        self.try_allocate(size, true).or_fatal()
    }

    pub fn try_allocate(&mut self, size: usize, zeroed: bool) -> RuntimeResult<ObjRef> {
        if size < HEADER_SIZE {
            return Err(RuntimeError::AllocationTooSmall { requested: size, header: HEADER_SIZE });
        }

        let fill = if zeroed { 0 } else { UNINIT_FILL };
        let buf = try_buffer(size - HEADER_SIZE, fill)?;
        self.alloc_record(Payload::Raw(buf))
    }

    /// Allocate a record that is never destroyed and ignores refcounting
    pub fn allocate_static(&mut self, payload: Payload) -> ObjRef {
        self.heap
            .insert(Record { header: ObjectHeader::new_static(), payload })
            .or_fatal()
    }

    /// Register a scope-tracked record for `payload`
    pub(crate) fn alloc_record(&mut self, payload: Payload) -> RuntimeResult<ObjRef> {
        let scope = self.scopes.current();
        let header = ObjectHeader::new(scope, self.scopes.active_target());
        let size = HEADER_SIZE + payload.size_bytes();

        let obj = self.heap.insert(Record { header, payload })?;
        self.heap.attach(obj);
        self.counters.allocated += 1;

        log_allocation(obj, scope, size);
        Ok(obj)
    }

    /// Install the cleanup hook run when `obj` is destroyed.
    ///
    /// A record holds at most one hook; installing a second is fatal.
    pub fn set_destructor<F>(&mut self, obj: ObjRef, hook: F)
    where
        F: FnOnce(&mut Context, &mut Payload) + 'static,
    {
        self.install_destructor(obj, Box::new(hook)).or_fatal()
    }

    pub(crate) fn install_destructor(&mut self, obj: ObjRef, hook: Destructor) -> RuntimeResult<()> {
        let header = &mut self.heap.get_mut(obj)?.header;
        if header.destructor.is_some() {
            return Err(RuntimeError::DestructorAlreadySet { index: obj.index });
        }
        header.destructor = Some(hook);
        Ok(())
    }

    /// Header of a record
    pub fn header(&self, obj: ObjRef) -> &ObjectHeader {
        &self.heap.get(obj).or_fatal().header
    }

    pub fn payload(&self, obj: ObjRef) -> &Payload {
        &self.heap.get(obj).or_fatal().payload
    }

    pub fn payload_mut(&mut self, obj: ObjRef) -> &mut Payload {
        &mut self.heap.get_mut(obj).or_fatal().payload
    }

    /// Raw storage of an `allocate`d record
    pub fn raw_bytes_mut(&mut self, obj: ObjRef) -> &mut [u8] {
        match self.payload_mut(obj) {
            Payload::Raw(buf) => buf.as_mut_slice(),
            other => {
                let found = other.kind_name();
                crate::errors::fatal(RuntimeError::WrongPayload { expected: "raw", found })
            }
        }
    }
}
