//! Object metadata - the header carried by every record
//!
//! Design: every allocation is a `Record` (header + payload) stored in the
//! context's record table. References are generational indices, so a stale
//! reference is detected instead of dereferenced.

use core::fmt;

use crate::builtins::{Dict, List, Set};
use crate::context::Context;

/// Scope (block) identifier; equal to the nesting depth of the scope
pub type ScopeId = usize;

/// Creation scope of static records; never destroyed
pub const STATIC_SCOPE: ScopeId = 0;

/// Scope that exists for the whole life of a context
pub const ROOT_SCOPE: ScopeId = 1;

/// Size in bytes of the object header; the smallest valid allocation
pub const HEADER_SIZE: usize = core::mem::size_of::<ObjectHeader>();

/// Reference to a record owned by a [`Context`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ObjRef {
    /// Slot index in the record table
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Cleanup hook, invoked once when a record is destroyed
pub type Destructor = Box<dyn FnOnce(&mut Context, &mut Payload)>;

/// The destruction queue a record is appended to when its release is deferred.
///
/// `serial` identifies the exact scope level instance that was active at
/// allocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueTarget {
    pub scope: ScopeId,
    pub serial: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjState {
    /// Reachable and on the live-object list
    Live,
    /// Refcount reached zero; waiting in a scope's destruction queue
    Pending,
    /// Created with `STATIC_SCOPE`; exempt from destruction
    Static,
}

/// Object header - prefixed to every record
pub struct ObjectHeader {
    pub(crate) prev: Option<u32>,
    pub(crate) next: Option<u32>,
    pub(crate) refcount: usize,
    pub(crate) creation_scope: ScopeId,
    pub(crate) queue_target: QueueTarget,
    pub(crate) state: ObjState,
    pub(crate) destructor: Option<Destructor>,
}

impl ObjectHeader {
    /// Header for a new scope-tracked record
    #[inline]
    pub fn new(creation_scope: ScopeId, queue_target: QueueTarget) -> Self {
        Self {
            prev: None,
            next: None,
            refcount: 1,
            creation_scope,
            queue_target,
            state: ObjState::Live,
            destructor: None,
        }
    }

    /// Header for a record that is never destroyed
    #[inline]
    pub fn new_static() -> Self {
        Self {
            prev: None,
            next: None,
            refcount: 1,
            creation_scope: STATIC_SCOPE,
            queue_target: QueueTarget { scope: STATIC_SCOPE, serial: 0 },
            state: ObjState::Static,
            destructor: None,
        }
    }

    #[inline]
    pub fn refcount(&self) -> usize {
        self.refcount
    }

    #[inline]
    pub fn creation_scope(&self) -> ScopeId {
        self.creation_scope
    }

    #[inline]
    pub fn state(&self) -> ObjState {
        self.state
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.creation_scope == STATIC_SCOPE
    }

    #[inline]
    pub fn has_destructor(&self) -> bool {
        self.destructor.is_some()
    }
}

impl fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeader")
            .field("prev", &self.prev)
            .field("next", &self.next)
            .field("refcount", &self.refcount)
            .field("creation_scope", &self.creation_scope)
            .field("queue_target", &self.queue_target)
            .field("state", &self.state)
            .field("destructor", &self.destructor.is_some())
            .finish()
    }
}

/// Record contents
#[derive(Debug)]
pub enum Payload {
    /// Untyped storage from `allocate`/`allocate_zeroed`
    Raw(Vec<u8>),
    /// Owned byte-string
    Str(Vec<u8>),
    /// Owned UTF-8 text
    Text(String),
    List(List),
    Dict(Dict),
    Set(Set),
}

impl Payload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Raw(_) => "raw",
            Payload::Str(_) => "str",
            Payload::Text(_) => "text",
            Payload::List(_) => "list",
            Payload::Dict(_) => "dict",
            Payload::Set(_) => "set",
        }
    }

    /// Bytes of payload storage, excluding the header
    pub fn size_bytes(&self) -> usize {
        match self {
            Payload::Raw(b) | Payload::Str(b) => b.len(),
            Payload::Text(s) => s.len(),
            Payload::List(l) => l.capacity() * core::mem::size_of::<crate::builtins::Value>(),
            Payload::Dict(d) => {
                (d.keys().capacity() + d.values().capacity()) * core::mem::size_of::<crate::builtins::Value>()
            }
            Payload::Set(s) => s.elements().capacity() * core::mem::size_of::<crate::builtins::Value>(),
        }
    }
}

/// Header plus payload
#[derive(Debug)]
pub struct Record {
    pub header: ObjectHeader,
    pub payload: Payload,
}
