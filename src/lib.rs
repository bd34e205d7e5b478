//! scoperc - scope-synchronous reference counting runtime
//!
//! Core memory management for compiled programs: an allocator that stamps
//! every record with the lexical scope that created it, a scope stack whose
//! levels own deferred-destruction queues, a two-family refcount protocol,
//! and homogeneous list/dict/set containers that count the references they
//! hold.
//!
//! All state lives in an explicitly passed [`Context`].

pub mod allocator;
pub mod builtins;
pub mod config;
pub mod context;
pub mod errors;
pub mod gc;
pub mod logging;

// Re-export core types
pub use allocator::{ObjRef, ObjState, ObjectHeader, Payload, ScopeId, HEADER_SIZE, ROOT_SCOPE, STATIC_SCOPE};
pub use builtins::{Dict, ElemKind, List, Set, Value, MAX_LIST};
pub use config::{HeapConfig, RuntimeConfig};
pub use context::Context;
pub use errors::{fatal, RuntimeError, RuntimeResult};
pub use gc::{HeapStats, RefKind, ScopeGuard};
pub use logging::LogConfig;
