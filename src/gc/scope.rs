//! Scope stack - per-level destruction queues
//!
//! Each level owns a FIFO queue of records whose last reference was dropped
//! while a deeper scope was executing. The queue is drained when the level
//! is popped, so a record never outlives the scope that created it by more
//! than that scope's own lifetime.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use crate::allocator::{ObjRef, QueueTarget, ScopeId, ROOT_SCOPE};
use crate::context::Context;
use crate::errors::{fatal, OrFatal, RuntimeError, RuntimeResult};
use crate::logging::{debug, log_scope_pop, log_scope_push, warn};

#[derive(Debug)]
pub struct ScopeLevel {
    id: ScopeId,
    serial: u64,
    queue: VecDeque<ObjRef>,
}

impl ScopeLevel {
    fn new(id: ScopeId, serial: u64) -> Self {
        Self { id, serial, queue: VecDeque::new() }
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Records waiting for this level to exit, oldest first
    pub fn queue(&self) -> &VecDeque<ObjRef> {
        &self.queue
    }
}

/// Stack of active scope levels; the root level is never popped
#[derive(Debug)]
pub struct ScopeStack {
    levels: Vec<ScopeLevel>,
    next_serial: u64,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            levels: vec![ScopeLevel::new(ROOT_SCOPE, 0)],
            next_serial: 1,
        }
    }

    #[inline]
    pub fn current(&self) -> ScopeId {
        self.levels.last().map_or(ROOT_SCOPE, |l| l.id)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Queue that records allocated right now will defer into
    #[inline]
    pub fn active_target(&self) -> QueueTarget {
        match self.levels.last() {
            Some(level) => QueueTarget { scope: level.id, serial: level.serial },
            None => QueueTarget { scope: ROOT_SCOPE, serial: 0 },
        }
    }

    pub fn push(&mut self) -> ScopeId {
        let id = self.current() + 1;
        self.levels.push(ScopeLevel::new(id, self.next_serial));
        self.next_serial += 1;
        id
    }

    pub fn pop(&mut self) -> RuntimeResult<ScopeLevel> {
        if self.levels.len() <= 1 {
            return Err(RuntimeError::ScopeUnderflow);
        }
        self.levels.pop().ok_or(RuntimeError::ScopeUnderflow)
    }

    /// Append `obj` to the queue of the level with id `target.scope`.
    ///
    /// Returns `false` when the level that was active at allocation time has
    /// since exited and the record went to its successor at the same depth.
    pub fn defer(&mut self, target: QueueTarget, obj: ObjRef) -> bool {
        let slot = target.scope.saturating_sub(1).min(self.levels.len() - 1);
        let level = &mut self.levels[slot];
        level.queue.push_back(obj);
        level.serial == target.serial
    }

    /// Next record waiting on the active level
    #[inline]
    pub fn next_pending(&mut self) -> Option<ObjRef> {
        self.levels.last_mut().and_then(|l| l.queue.pop_front())
    }

    /// Records waiting across all levels
    pub fn pending(&self) -> usize {
        self.levels.iter().map(|l| l.queue.len()).sum()
    }

    pub fn levels(&self) -> &[ScopeLevel] {
        &self.levels
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Enter a nested scope and return its id
    pub fn push_scope(&mut self) -> ScopeId {
        let id = self.scopes.push();
        log_scope_push(id);
        id
    }

    /// Exit the active scope, destroying everything deferred to it
    pub fn pop_scope(&mut self) {
        self.try_pop_scope().or_fatal()
    }

    pub fn try_pop_scope(&mut self) -> RuntimeResult<()> {
        let scope = self.scopes.current();
        if scope == ROOT_SCOPE {
            return Err(RuntimeError::ScopeUnderflow);
        }

        let drained = self.drain_active()?;

        if self.config.audit_scopes {
            self.audit_scope(scope);
        }

        self.scopes.pop()?;
        log_scope_pop(scope, drained);
        Ok(())
    }

    /// Enter a nested scope that is exited when the guard drops
    pub fn scope(&mut self) -> ScopeGuard<'_> {
        let scope = self.push_scope();
        ScopeGuard { cx: self, scope }
    }

    /// Destroy every record queued on the active level, in queue order
    pub(crate) fn drain_active(&mut self) -> RuntimeResult<usize> {
        let mut drained = 0;
        while let Some(obj) = self.scopes.next_pending() {
            self.destroy(obj)?;
            drained += 1;
        }
        Ok(drained)
    }

    fn audit_scope(&self, scope: ScopeId) {
        let escaped = self.live_objects_in(scope).len();
        if escaped > 0 {
            warn!(target: "scope", scope, escaped, "Records outlive the scope that created them");
        } else {
            debug!(target: "scope", scope, "Scope released all of its records");
        }
    }
}

/// Scope entered by [`Context::scope`]; pops it on drop.
///
/// Derefs to the context so work inside the scope goes through the guard.
pub struct ScopeGuard<'a> {
    cx: &'a mut Context,
    scope: ScopeId,
}

impl ScopeGuard<'_> {
    #[inline]
    pub fn id(&self) -> ScopeId {
        self.scope
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = Context;

    #[inline]
    fn deref(&self) -> &Context {
        self.cx
    }
}

impl DerefMut for ScopeGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Context {
        self.cx
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }

        let found = self.cx.current_scope();
        if found != self.scope {
            fatal(RuntimeError::ScopeMismatch { expected: self.scope, found });
        }
        self.cx.pop_scope();
    }
}
