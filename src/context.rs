//! Execution context - one object graph and one scope stack
//!
//! Every runtime operation takes the context explicitly. Contexts share
//! nothing; an `ObjRef` from one context means nothing in another.

use crate::allocator::{Heap, ObjRef, Payload, ScopeId};
use crate::config::{HeapConfig, RuntimeConfig};
use crate::gc::{Counters, ScopeStack};

pub struct Context {
    pub(crate) heap: Heap,
    pub(crate) scopes: ScopeStack,
    pub(crate) config: HeapConfig,
    pub(crate) counters: Counters,
    bool_texts: [ObjRef; 2],
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let heap = Heap::with_capacity(config.heap.initial_slots);
        let mut cx = Self {
            heap,
            scopes: ScopeStack::new(),
            config: config.heap,
            counters: Counters::default(),
            bool_texts: [ObjRef { index: 0, generation: 0 }; 2],
        };

        let false_text = cx.allocate_static(Payload::Text("false".to_string()));
        let true_text = cx.allocate_static(Payload::Text("true".to_string()));
        cx.bool_texts = [false_text, true_text];
        cx
    }

    /// Scope id presently executing
    #[inline]
    pub fn current_scope(&self) -> ScopeId {
        self.scopes.current()
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Shared static "true"/"false" text
    pub fn bool_text(&self, b: bool) -> ObjRef {
        self.bool_texts[b as usize]
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
