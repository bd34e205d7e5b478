//! Reference counting - stack and heap families
//!
//! Stack references count only records that belong to the executing scope
//! or a deeper one; a record from an enclosing scope is borrowed, since that
//! scope still holds its own reference. Heap references (container slots and
//! anything else that may outlive the expression) count every tracked record.
//!
//! When a count reaches zero the record leaves the live-object list, then is
//! either destroyed on the spot or queued on its home scope.

use crate::allocator::{ObjRef, ObjState, ObjectHeader, Record, ScopeId, STATIC_SCOPE};
use crate::context::Context;
use crate::errors::{OrFatal, RuntimeError, RuntimeResult};
use crate::logging::{debug, log_deferral, log_destruction, trace};

/// Which family of reference is being counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Stack,
    Heap,
}

impl RefKind {
    #[inline]
    fn tracks(self, header: &ObjectHeader, current: ScopeId) -> bool {
        match self {
            RefKind::Stack => header.creation_scope != STATIC_SCOPE && header.creation_scope >= current,
            RefKind::Heap => header.creation_scope != STATIC_SCOPE,
        }
    }
}

impl Context {
    /// Count a stack reference. Null, static and borrowed records are ignored.
    #[inline]
    pub fn inc_stack(&mut self, obj: impl Into<Option<ObjRef>>) {
        if let Some(obj) = obj.into() {
            self.try_inc(obj, RefKind::Stack).or_fatal();
        }
    }

    /// Drop a stack reference, destroying the record at zero
    #[inline]
    pub fn dec_stack(&mut self, obj: impl Into<Option<ObjRef>>) {
        if let Some(obj) = obj.into() {
            self.try_dec(obj, RefKind::Stack, false).or_fatal();
        }
    }

    /// Drop a stack reference without destroying at zero.
    ///
    /// Used to hand a value to a caller, which takes its own reference.
    #[inline]
    pub fn dec_stack_keep(&mut self, obj: impl Into<Option<ObjRef>>) {
        if let Some(obj) = obj.into() {
            self.try_dec(obj, RefKind::Stack, true).or_fatal();
        }
    }

    /// Count a heap reference. Null and static records are ignored.
    #[inline]
    pub fn inc_heap(&mut self, obj: impl Into<Option<ObjRef>>) {
        if let Some(obj) = obj.into() {
            self.try_inc(obj, RefKind::Heap).or_fatal();
        }
    }

    /// Drop a heap reference; at zero the record is destroyed now if it
    /// belongs to this scope or a deeper one, otherwise queued on its home scope
    #[inline]
    pub fn dec_heap(&mut self, obj: impl Into<Option<ObjRef>>) {
        if let Some(obj) = obj.into() {
            self.try_dec(obj, RefKind::Heap, false).or_fatal();
        }
    }

    pub fn try_inc(&mut self, obj: ObjRef, kind: RefKind) -> RuntimeResult<()> {
        let current = self.scopes.current();
        let header = &mut self.heap.get_mut(obj)?.header;

        if !kind.tracks(header, current) {
            return Ok(());
        }
        if header.state == ObjState::Pending {
            return Err(RuntimeError::PendingResurrection { index: obj.index });
        }

        header.refcount += 1;
        trace!(target: "refcount", record = obj.index, ?kind, count = header.refcount, "inc");
        Ok(())
    }

    pub fn try_dec(&mut self, obj: ObjRef, kind: RefKind, keep: bool) -> RuntimeResult<()> {
        let current = self.scopes.current();
        let header = &mut self.heap.get_mut(obj)?.header;

        if !kind.tracks(header, current) {
            return Ok(());
        }
        if header.refcount == 0 {
            return Err(RuntimeError::RefcountUnderflow { index: obj.index });
        }

        header.refcount -= 1;
        trace!(target: "refcount", record = obj.index, ?kind, count = header.refcount, "dec");

        if header.refcount == 0 && !keep {
            self.release(obj)?;
        }
        Ok(())
    }

    /// Release decision for a record whose count just reached zero
    fn release(&mut self, obj: ObjRef) -> RuntimeResult<()> {
        self.heap.detach(obj);

        let current = self.scopes.current();
        let header = &mut self.heap.get_mut(obj)?.header;
        let home = header.creation_scope;

        if home >= current {
            return self.destroy(obj);
        }

        header.state = ObjState::Pending;
        let target = header.queue_target;

        if !self.scopes.defer(target, obj) {
            debug!(
                target: "refcount",
                record = obj.index,
                scope = target.scope,
                "Home scope level exited; queued on its successor"
            );
        }
        self.counters.deferred += 1;
        log_deferral(obj, home, current);
        Ok(())
    }

    /// Run the record's destructor, then free its storage
    pub(crate) fn destroy(&mut self, obj: ObjRef) -> RuntimeResult<()> {
        let Record { mut header, mut payload } = self.heap.remove(obj)?;
        let hook = header.destructor.take();
        let hooked = hook.is_some();

        if let Some(hook) = hook {
            hook(self, &mut payload);
        }

        self.counters.destroyed += 1;
        log_destruction(obj, header.creation_scope, hooked);
        Ok(())
    }

    /// Current count of a record
    pub fn refcount(&self, obj: ObjRef) -> usize {
        self.header(obj).refcount
    }

    pub fn creation_scope(&self, obj: ObjRef) -> ScopeId {
        self.header(obj).creation_scope
    }

    /// True while the record has not been destroyed
    pub fn is_live(&self, obj: ObjRef) -> bool {
        self.heap.get(obj).is_ok_and(|r| r.header.state != ObjState::Pending)
    }

    /// True while the record waits in a scope's destruction queue
    pub fn is_pending(&self, obj: ObjRef) -> bool {
        self.heap.get(obj).is_ok_and(|r| r.header.state == ObjState::Pending)
    }
}
