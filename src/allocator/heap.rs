//! Record table and the intrusive live-object list
//!
//! Design: slots are reused through a free list; each reuse bumps the slot
//! generation so references to the previous occupant go stale. Live records
//! are threaded through `prev`/`next` in their headers, newest first.

use super::header::{ObjRef, Record};
use crate::errors::{RuntimeError, RuntimeResult};

struct Slot {
    generation: u32,
    record: Option<Record>,
}

pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live_head: Option<u32>,
    live_count: usize,
    occupied: usize,
}

impl Heap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live_head: None,
            live_count: 0,
            occupied: 0,
        }
    }

    /// Store a record and return its reference
    pub fn insert(&mut self, record: Record) -> RuntimeResult<ObjRef> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.record = Some(record);
            self.occupied += 1;
            return Ok(ObjRef { index, generation: slot.generation });
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| RuntimeError::OutOfMemory {
            bytes: core::mem::size_of::<Slot>(),
        })?;
        self.slots.try_reserve(1).map_err(|_| RuntimeError::OutOfMemory {
            bytes: core::mem::size_of::<Slot>(),
        })?;
        self.slots.push(Slot { generation: 0, record: Some(record) });
        self.occupied += 1;

        Ok(ObjRef { index, generation: 0 })
    }

    pub fn get(&self, obj: ObjRef) -> RuntimeResult<&Record> {
        match self.slots.get(obj.index as usize) {
            Some(Slot { generation, record: Some(record) }) if *generation == obj.generation => Ok(record),
            _ => Err(dangling(obj)),
        }
    }

    pub fn get_mut(&mut self, obj: ObjRef) -> RuntimeResult<&mut Record> {
        match self.slots.get_mut(obj.index as usize) {
            Some(Slot { generation, record: Some(record) }) if *generation == obj.generation => Ok(record),
            _ => Err(dangling(obj)),
        }
    }

    #[inline]
    pub fn contains(&self, obj: ObjRef) -> bool {
        self.get(obj).is_ok()
    }

    /// Take a record out of the table. The record must already be detached.
    pub fn remove(&mut self, obj: ObjRef) -> RuntimeResult<Record> {
        let slot = match self.slots.get_mut(obj.index as usize) {
            Some(slot) if slot.generation == obj.generation && slot.record.is_some() => slot,
            _ => return Err(dangling(obj)),
        };

        let record = slot.record.take().ok_or_else(|| dangling(obj))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(obj.index);
        self.occupied -= 1;

        Ok(record)
    }

    /// Link a record at the head of the live-object list
    pub fn attach(&mut self, obj: ObjRef) {
        let old_head = self.live_head;

        if let Some(record) = self.record_at_mut(obj.index) {
            record.header.prev = None;
            record.header.next = old_head;
        } else {
            return;
        }

        if let Some(head) = old_head.and_then(|h| self.record_at_mut(h)) {
            head.header.prev = Some(obj.index);
        }

        self.live_head = Some(obj.index);
        self.live_count += 1;
    }

    /// Unlink a record from the live-object list
    pub fn detach(&mut self, obj: ObjRef) {
        let (prev, next) = match self.record_at_mut(obj.index) {
            Some(record) => (record.header.prev.take(), record.header.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(record) = self.record_at_mut(p) {
                    record.header.next = next;
                }
            }
            None => {
                if self.live_head != Some(obj.index) {
                    // Not on the list
                    return;
                }
                self.live_head = next;
            }
        }

        if let Some(record) = next.and_then(|n| self.record_at_mut(n)) {
            record.header.prev = prev;
        }

        self.live_count -= 1;
    }

    /// Live records, most recently allocated first
    pub fn live(&self) -> LiveIter<'_> {
        LiveIter { heap: self, cursor: self.live_head }
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Records stored in the table, whether live, pending or static
    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    fn record_at_mut(&mut self, index: u32) -> Option<&mut Record> {
        self.slots.get_mut(index as usize).and_then(|s| s.record.as_mut())
    }
}

fn dangling(obj: ObjRef) -> RuntimeError {
    RuntimeError::DanglingReference { index: obj.index, generation: obj.generation }
}

pub struct LiveIter<'a> {
    heap: &'a Heap,
    cursor: Option<u32>,
}

impl Iterator for LiveIter<'_> {
    type Item = ObjRef;

    fn next(&mut self) -> Option<ObjRef> {
        let index = self.cursor?;
        let slot = self.heap.slots.get(index as usize)?;
        let record = slot.record.as_ref()?;
        self.cursor = record.header.next;
        Some(ObjRef { index, generation: slot.generation })
    }
}
