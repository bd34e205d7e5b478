use proptest::prelude::*;
use scoperc::{Context, ElemKind, ObjRef, Value, HEADER_SIZE};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Op {
    Enter,
    Exit,
    Alloc,
    /// Store a local into the root-level sink list
    Store(usize),
    /// Drop a local's stack reference
    Release(usize),
    /// Pop the sink's last element
    Unstore,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Enter),
        2 => Just(Op::Exit),
        4 => Just(Op::Alloc),
        3 => any::<usize>().prop_map(Op::Store),
        2 => any::<usize>().prop_map(Op::Release),
        1 => Just(Op::Unstore),
    ]
}

/// Destruction counts keyed by record
type Destroyed = Rc<RefCell<HashMap<ObjRef, usize>>>;

struct Program {
    cx: Context,
    sink: ObjRef,
    frames: Vec<Vec<ObjRef>>,
    destroyed: Destroyed,
}

impl Program {
    fn new() -> Self {
        let mut cx = Context::new();
        let sink = cx.new_list(&[], ElemKind::Obj);
        Self { cx, sink, frames: vec![Vec::new()], destroyed: Destroyed::default() }
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Enter => {
                self.cx.push_scope();
                self.frames.push(Vec::new());
            }
            Op::Exit => {
                if self.frames.len() > 1 {
                    self.exit_frame();
                }
            }
            Op::Alloc => {
                let obj = self.cx.allocate(HEADER_SIZE + 16);
                let log = Rc::clone(&self.destroyed);
                self.cx.set_destructor(obj, move |_, _| *log.borrow_mut().entry(obj).or_insert(0) += 1);
                self.top().push(obj);
            }
            Op::Store(i) => {
                let picked = pick(self.top(), i).copied();
                if let Some(obj) = picked {
                    self.cx.list_push(self.sink, Value::Obj(Some(obj)));
                }
            }
            Op::Release(i) => {
                let locals = self.top();
                if !locals.is_empty() {
                    let obj = locals.swap_remove(i % locals.len());
                    self.cx.dec_stack(obj);
                }
            }
            Op::Unstore => {
                if self.cx.list_len(self.sink) > 0 {
                    self.cx.list_pop(self.sink);
                }
            }
        }
    }

    fn exit_frame(&mut self) {
        if let Some(locals) = self.frames.pop() {
            for obj in locals {
                self.cx.dec_stack(obj);
            }
        }
        self.cx.pop_scope();
    }

    fn top(&mut self) -> &mut Vec<ObjRef> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn referenced(&self) -> Vec<ObjRef> {
        let mut refs: Vec<ObjRef> = self.frames.iter().flatten().copied().collect();
        refs.extend(self.cx.list_values(self.sink).iter().filter_map(Value::reference));
        refs
    }
}

fn pick(locals: &[ObjRef], i: usize) -> Option<&ObjRef> {
    if locals.is_empty() {
        None
    } else {
        locals.get(i % locals.len())
    }
}

proptest! {
    #[test]
    fn referenced_records_are_never_destroyed(ops in prop::collection::vec(op(), 0..96)) {
        let mut program = Program::new();

        for op in &ops {
            program.apply(op);
            for obj in program.referenced() {
                prop_assert!(program.cx.is_live(obj), "{:?} destroyed while referenced after {:?}", obj, op);
            }
        }
    }
}

proptest! {
    #[test]
    fn balanced_programs_end_with_nothing_live(ops in prop::collection::vec(op(), 0..96)) {
        let mut program = Program::new();
        for op in &ops {
            program.apply(op);
        }

        while program.frames.len() > 1 {
            program.exit_frame();
        }
        if let Some(locals) = program.frames.pop() {
            for obj in locals {
                program.cx.dec_stack(obj);
            }
        }
        program.cx.dec_stack(program.sink);

        prop_assert_eq!(program.cx.live_objects().count(), 0);

        // Releases deferred to the root level drain at teardown
        let stats = program.cx.teardown();
        prop_assert_eq!(stats.leaked, 0);
        prop_assert_eq!(stats.pending_objects, 0);
        prop_assert_eq!(stats.allocated, stats.destroyed);

        let destroyed = program.destroyed.borrow();
        prop_assert!(destroyed.values().all(|&n| n == 1));
        prop_assert_eq!(destroyed.len() + 1, stats.destroyed);
    }
}
