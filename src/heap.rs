//! Heap bookkeeping: the allocation list and the mark-and-sweep pass.
//!
//! Values are reference counted; cycles (prototype chains, closures,
//! user-level cycles) are collected by a periodic mark-and-sweep keyed on a
//! monotonically growing stamp. The mark phase stamps `temporary_id` on
//! everything reachable from the roots; the sweep clears the child lists of
//! every unstamped value, which breaks the cycles and lets reference counts
//! finish the job.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::value::{Var, VarKind, VarRef};

/// Statistics about the heap.
#[derive(Debug, Clone)]
pub struct HeapStats {
    /// Allocation-list entries, dead weak refs included.
    pub tracked: usize,
    /// Values still alive.
    pub live: usize,
    /// Values collected over the heap's lifetime.
    pub collected: u64,
}

/// The per-context allocation list. Every `Var` construction appends; the
/// sweep unlinks whatever did not get the current stamp.
pub struct Heap {
    vars: RefCell<Vec<Weak<RefCell<Var>>>>,
    unique_id: Cell<u32>,
    collected: Cell<u64>,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            vars: RefCell::new(Vec::new()),
            unique_id: Cell::new(0),
            collected: Cell::new(0),
        }
    }

    /// Allocate a new value and register it on the allocation list.
    pub fn alloc(&self, kind: VarKind) -> VarRef {
        let var = Rc::new(RefCell::new(Var::new(kind)));
        self.vars.borrow_mut().push(Rc::downgrade(&var));
        var
    }

    /// Bump and return the monotonic stamp used for marking and for
    /// recursion breaks in graph traversals.
    pub fn next_unique_id(&self) -> u32 {
        let id = self.unique_id.get().wrapping_add(1);
        self.unique_id.set(id);
        id
    }

    pub fn current_unique_id(&self) -> u32 {
        self.unique_id.get()
    }

    /// Sweep phase: every live value whose `temporary_id` differs from
    /// `mark_id` loses its children, breaking any cycle it participates in.
    /// Dead allocation-list entries are dropped along the way.
    pub fn sweep(&self, mark_id: u32) {
        // Hold strong refs while clearing so the list does not mutate under
        // the iteration when refcounts cascade to zero.
        let live: Vec<VarRef> = self
            .vars
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        let mut cleared = 0u64;
        for var in &live {
            let mut var = var.borrow_mut();
            if var.temporary_id != mark_id {
                var.remove_all_children();
                cleared += 1;
            }
        }
        drop(live);
        self.collected.set(self.collected.get() + cleared);
        self.vars.borrow_mut().retain(|weak| weak.strong_count() > 0);
    }

    pub fn stats(&self) -> HeapStats {
        let vars = self.vars.borrow();
        HeapStats {
            tracked: vars.len(),
            live: vars.iter().filter(|weak| weak.strong_count() > 0).count(),
            collected: self.collected.get(),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{LinkFlags, ScriptString, VarExt};

    #[test]
    fn test_alloc_tracks() {
        let heap = Heap::new();
        let _a = heap.alloc(VarKind::Object);
        let _b = heap.alloc(VarKind::Int(1));
        assert_eq!(heap.stats().live, 2);
    }

    #[test]
    fn test_unique_id_is_monotonic() {
        let heap = Heap::new();
        let a = heap.next_unique_id();
        let b = heap.next_unique_id();
        assert!(b > a);
    }

    #[test]
    fn test_sweep_collects_unmarked() {
        let heap = Heap::new();
        let root = heap.alloc(VarKind::Object);
        let kept = heap.alloc(VarKind::Object);
        root.add_child(ScriptString::from("kept"), kept, LinkFlags::DEFAULT);
        {
            let _garbage = heap.alloc(VarKind::Object);
        }

        let id = heap.next_unique_id();
        root.set_temporary_id_recursive(id);
        heap.sweep(id);

        assert_eq!(heap.stats().live, 2);
        assert!(root.find_child("kept").is_some());
    }

    #[test]
    fn test_sweep_breaks_cycles() {
        let heap = Heap::new();
        let root = heap.alloc(VarKind::Object);
        {
            let a = heap.alloc(VarKind::Object);
            let b = heap.alloc(VarKind::Object);
            a.add_child(ScriptString::from("b"), b.clone(), LinkFlags::DEFAULT);
            b.add_child(ScriptString::from("a"), a.clone(), LinkFlags::DEFAULT);
        }
        // The cycle keeps itself alive past the drop of the locals.
        assert_eq!(heap.stats().live, 3);

        let id = heap.next_unique_id();
        root.set_temporary_id_recursive(id);
        heap.sweep(id);

        assert_eq!(heap.stats().live, 1);
        assert_eq!(heap.stats().collected, 2);
    }

    #[test]
    fn test_sweep_keeps_reachable_cycle() {
        let heap = Heap::new();
        let root = heap.alloc(VarKind::Object);
        let a = heap.alloc(VarKind::Object);
        let b = heap.alloc(VarKind::Object);
        root.add_child(ScriptString::from("a"), a.clone(), LinkFlags::DEFAULT);
        a.add_child(ScriptString::from("b"), b.clone(), LinkFlags::DEFAULT);
        b.add_child(ScriptString::from("a"), a.clone(), LinkFlags::DEFAULT);
        drop(a);
        drop(b);

        let id = heap.next_unique_id();
        root.set_temporary_id_recursive(id);
        heap.sweep(id);

        assert_eq!(heap.stats().live, 3);
    }
}
