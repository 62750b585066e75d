//! Root-to-leaf descent record shared by the height- and size-balanced trees.
//!
//! Instead of parent pointers the trees remember the *slots* they passed
//! through: the root slot, or the left/right link of some node. Repair walks
//! this record from the deepest slot back to the root.

use std::cmp::Ordering;

use crate::arena::Id;

/// Enough for an AVL tree over more than 10^15 entries.
pub(crate) const TRACE_DEPTH: usize = 80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline(always)]
    pub(crate) fn idx(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    #[inline(always)]
    pub(crate) fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// A place that holds a subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Root,
    Left(Id),
    Right(Id),
}

impl Slot {
    #[inline(always)]
    pub(crate) fn child(owner: Id, side: Side) -> Self {
        match side {
            Side::Left => Self::Left(owner),
            Side::Right => Self::Right(owner),
        }
    }
}

/// Child access for a tree whose shape is edited through slots.
pub(crate) trait SlotTree {
    fn root(&self) -> Id;
    fn child(&self, id: Id, side: Side) -> Id;

    /// Stores subtree `id` in `slot`. Threaded trees accept only non-empty
    /// subtrees here.
    fn attach(&mut self, slot: Slot, id: Id);

    fn subtree(&self, slot: Slot) -> Id {
        match slot {
            Slot::Root => self.root(),
            Slot::Left(owner) => self.child(owner, Side::Left),
            Slot::Right(owner) => self.child(owner, Side::Right),
        }
    }
}

pub(crate) struct Trace {
    slots: [Slot; TRACE_DEPTH],
    len: usize,
}

impl Trace {
    pub(crate) fn new() -> Self {
        Self {
            slots: [Slot::Root; TRACE_DEPTH],
            len: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub(crate) fn slot(&self, i: usize) -> Slot {
        debug_assert!(i < self.len);
        self.slots[i]
    }

    #[inline(always)]
    pub(crate) fn set(&mut self, i: usize, slot: Slot) {
        debug_assert!(i < self.len);
        self.slots[i] = slot;
    }

    #[inline]
    pub(crate) fn push(&mut self, slot: Slot) {
        assert!(
            self.len < TRACE_DEPTH,
            "`Trace::push()` - descent deeper than {TRACE_DEPTH} levels"
        );
        self.slots[self.len] = slot;
        self.len += 1;
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Slot {
        debug_assert!(self.len > 0, "`Trace::pop()` - trace is empty");
        self.len -= 1;
        self.slots[self.len]
    }

    /// The deepest recorded slot.
    #[inline]
    pub(crate) fn top(&self) -> Slot {
        debug_assert!(self.len > 0, "`Trace::top()` - trace is empty");
        self.slots[self.len - 1]
    }

    /// Records the descent from the root steered by `compare`.
    ///
    /// `compare(node)` answers how the target compares to `node`. On `Equal` the
    /// descent stops and the last slot holds the matching node; otherwise the
    /// last slot is the empty slot where the target would be attached.
    pub(crate) fn search<T: SlotTree>(
        &mut self,
        tree: &T,
        mut compare: impl FnMut(Id) -> Ordering,
    ) -> bool {
        self.len = 0;
        let mut slot = Slot::Root;
        let mut cur = tree.root();
        while !cur.is_nil() {
            self.push(slot);
            let side = match compare(cur) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return true,
            };
            slot = Slot::child(cur, side);
            cur = tree.child(cur, side);
        }
        self.push(slot);
        false
    }

    /// Pushes `slot` (which must hold a subtree) and then keeps following
    /// `toward` links, so the last slot ends up holding that subtree's extreme
    /// node on the `toward` side.
    pub(crate) fn push_extreme<T: SlotTree>(&mut self, tree: &T, slot: Slot, toward: Side) {
        let mut cur = tree.subtree(slot);
        debug_assert!(!cur.is_nil());
        self.push(slot);
        loop {
            let next = tree.child(cur, toward);
            if next.is_nil() {
                return;
            }
            self.push(Slot::child(cur, toward));
            cur = next;
        }
    }
}
