//! Lifetime management - reference counting synchronized with lexical scopes
//!
//! Design: Two cooperating parts:
//! 1. Reference counting (stack and heap families, deterministic)
//! 2. Scope stack (deferred destruction drained on scope exit)
//!
//! No cycle collection: records that reference each other through
//! containers are never destroyed and show up as leaks at teardown.

mod refcount;
mod scope;


pub use refcount::RefKind;
pub use scope::{ScopeGuard, ScopeLevel, ScopeStack};

use crate::allocator::{ObjRef, ScopeId, ROOT_SCOPE};
use crate::context::Context;
use crate::errors::OrFatal;
use crate::logging::{info, log_leak, warn};

/// Running totals kept by a context
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub allocated: usize,
    pub destroyed: usize,
    pub deferred: usize,
    pub leaked: usize,
}

/// Heap statistics for monitoring and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Records on the live-object list
    pub live_objects: usize,
    /// Records waiting in destruction queues
    pub pending_objects: usize,
    /// Scope-tracked records ever allocated
    pub allocated: usize,
    pub destroyed: usize,
    /// Releases that were deferred to an enclosing scope
    pub deferred: usize,
    /// Records released by teardown instead of by refcount
    pub leaked: usize,
    pub scope_depth: usize,
}

impl Context {
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            live_objects: self.heap.live_count(),
            pending_objects: self.scopes.pending(),
            allocated: self.counters.allocated,
            destroyed: self.counters.destroyed,
            deferred: self.counters.deferred,
            leaked: self.counters.leaked,
            scope_depth: self.scopes.depth(),
        }
    }

    /// Live records, most recently allocated first
    pub fn live_objects(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.heap.live()
    }

    /// Live records created in `scope`
    pub fn live_objects_in(&self, scope: ScopeId) -> Vec<ObjRef> {
        self.heap
            .live()
            .filter(|&obj| self.heap.get(obj).is_ok_and(|r| r.header.creation_scope == scope))
            .collect()
    }

    pub fn scope_stack(&self) -> &ScopeStack {
        &self.scopes
    }

    /// Shut the context down.
    ///
    /// Unbalanced scopes are popped, the root queue is drained, and whatever
    /// is still live is released without running its destructor.
    pub fn teardown(mut self) -> HeapStats {
        let depth = self.scopes.depth();
        if depth > 1 {
            warn!(target: "scope", depth, "Scopes still open at teardown");
            while self.scopes.current() != ROOT_SCOPE {
                self.pop_scope();
            }
        }

        self.drain_active().or_fatal();

        let leaked: Vec<ObjRef> = self.heap.live().collect();
        for obj in leaked {
            if self.config.leak_report {
                let header = self.header(obj);
                log_leak(obj, header.creation_scope, header.refcount);
            }
            self.heap.detach(obj);
            self.heap.remove(obj).or_fatal();
            self.counters.leaked += 1;
        }

        let stats = self.stats();
        info!(
            target: "runtime",
            allocated = stats.allocated,
            destroyed = stats.destroyed,
            leaked = stats.leaked,
            "Context torn down"
        );
        stats
    }
}
