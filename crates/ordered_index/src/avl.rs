use std::cmp::Ordering;

use crate::arena::{Arena, Handle, Id};
use crate::index::OrderedIndex;
use crate::key::Key;
use crate::pretty::TreeShape;
use crate::trace::{Side, Slot, SlotTree, Trace};

const LEFT_CHILD: u8 = 0b01;
const RIGHT_CHILD: u8 = 0b10;
const CHILD_MASK: u8 = LEFT_CHILD | RIGHT_CHILD;
const HEIGHT_SHIFT: u32 = 2;

/// Height-balanced search tree over threaded nodes.
///
/// Every node carries two link words. A link whose bit is set in the node's
/// child mask points at a real child; otherwise it is a thread to the in-order
/// predecessor (left) or successor (right), `NIL` at either end of the order.
/// `prev`/`next` therefore never need a parent pointer.
pub struct AvlTree<V> {
    nodes: Arena<Node<V>>,
    root: Id,
}

struct Node<V> {
    key: Key,
    value: V,
    links: [Id; 2],
    // Child mask in the low two bits, subtree height above them.
    meta: u8,
}

#[inline(always)]
fn child_bit(side: Side) -> u8 {
    match side {
        Side::Left => LEFT_CHILD,
        Side::Right => RIGHT_CHILD,
    }
}

impl<V> Node<V> {
    fn leaf(key: Key, value: V, pred: Id, succ: Id) -> Self {
        Self {
            key,
            value,
            links: [pred, succ],
            meta: 1 << HEIGHT_SHIFT,
        }
    }

    #[inline(always)]
    fn has_child(&self, side: Side) -> bool {
        self.meta & child_bit(side) != 0
    }

    #[inline(always)]
    fn height(&self) -> u8 {
        self.meta >> HEIGHT_SHIFT
    }

    #[inline(always)]
    fn set_height(&mut self, height: u8) {
        debug_assert!(height < 1 << (8 - HEIGHT_SHIFT));
        self.meta = (self.meta & CHILD_MASK) | (height << HEIGHT_SHIFT);
    }
}

impl<V> AvlTree<V> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: Id::NIL,
        }
    }

    pub fn height(&self) -> usize {
        self.h(self.root) as usize
    }

    #[inline(always)]
    fn h(&self, id: Id) -> u8 {
        if id.is_nil() { 0 } else { self.nodes[id].height() }
    }

    /// Points `p`'s `side` link at `sub`, or threads it to `neighbor` when
    /// `sub` is empty.
    fn set_link(&mut self, p: Id, side: Side, sub: Id, neighbor: Id) {
        let node = &mut self.nodes[p];
        if sub.is_nil() {
            node.links[side.idx()] = neighbor;
            node.meta &= !child_bit(side);
        } else {
            node.links[side.idx()] = sub;
            node.meta |= child_bit(side);
        }
    }

    fn fix_height(&mut self, p: Id) {
        let hl = self.h(self.child(p, Side::Left));
        let hr = self.h(self.child(p, Side::Right));
        self.nodes[p].set_height(1 + hl.max(hr));
    }

    /// Repairs heights and balance from the deepest traced slot upward.
    fn maintain(&mut self, trace: &Trace) {
        for i in (0..trace.len()).rev() {
            let slot = trace.slot(i);
            let p = self.subtree(slot);
            let before = self.nodes[p].height();
            let hl = self.h(self.child(p, Side::Left));
            let hr = self.h(self.child(p, Side::Right));
            let top = if hl > hr + 1 {
                self.rotate(p, Side::Left)
            } else if hr > hl + 1 {
                self.rotate(p, Side::Right)
            } else {
                self.fix_height(p);
                p
            };
            if top != p {
                self.attach(slot, top);
            }
            // An unchanged height cannot unbalance any ancestor.
            if self.nodes[top].height() == before {
                break;
            }
        }
    }

    /// Rebalances `p`, whose `heavy` subtree is two levels taller than the
    /// other, and returns the new subtree root.
    fn rotate(&mut self, p: Id, heavy: Side) -> Id {
        let light = heavy.flip();
        let c = self.child(p, heavy);
        let outer = self.child(c, heavy);
        let inner = self.child(c, light);
        if self.h(outer) >= self.h(inner) {
            self.set_link(p, heavy, inner, c);
            self.set_link(c, light, p, Id::NIL);
            self.fix_height(p);
            self.fix_height(c);
            c
        } else {
            let x = self.child(inner, heavy);
            let y = self.child(inner, light);
            self.set_link(c, light, x, inner);
            self.set_link(p, heavy, y, inner);
            self.set_link(inner, heavy, c, Id::NIL);
            self.set_link(inner, light, p, Id::NIL);
            self.fix_height(c);
            self.fix_height(p);
            self.fix_height(inner);
            inner
        }
    }

    /// Rotates the node in the top slot down until it is a leaf, always
    /// promoting the taller child. Promoted nodes get height 0 so `maintain`
    /// treats them as changed.
    fn to_leaf(&mut self, trace: &mut Trace) {
        let p = self.subtree(trace.top());
        let mut l = self.child(p, Side::Left);
        let mut r = self.child(p, Side::Right);
        loop {
            let side = if self.h(l) > self.h(r) {
                Side::Left
            } else if r.is_nil() {
                return;
            } else {
                Side::Right
            };
            let c = if side == Side::Left { l } else { r };
            let across = side.flip();
            let t = self.child(c, across);
            self.attach(trace.top(), c);
            trace.push(Slot::child(c, across));
            self.nodes[c].set_height(0);
            self.set_link(c, across, p, Id::NIL);
            self.set_link(p, side, t, c);
            match side {
                Side::Left => l = t,
                Side::Right => r = t,
            }
        }
    }

    /// Links a new leaf into the empty `slot`, threading it to its neighbors.
    fn attach_leaf(&mut self, slot: Slot, key: Key, value: V) -> Id {
        let (pred, succ) = match slot {
            Slot::Root => (Id::NIL, Id::NIL),
            Slot::Left(q) => (self.nodes[q].links[0], q),
            Slot::Right(q) => (q, self.nodes[q].links[1]),
        };
        let id = self.nodes.alloc(Node::leaf(key, value, pred, succ));
        self.attach(slot, id);
        id
    }

    /// Removes leaf `p` from `slot`; the parent inherits `p`'s thread.
    fn detach_leaf(&mut self, slot: Slot, p: Id) {
        debug_assert_eq!(self.nodes[p].meta & CHILD_MASK, 0);
        match slot {
            Slot::Root => self.root = Id::NIL,
            Slot::Left(q) => {
                let pred = self.nodes[p].links[0];
                self.set_link(q, Side::Left, Id::NIL, pred);
            }
            Slot::Right(q) => {
                let succ = self.nodes[p].links[1];
                self.set_link(q, Side::Right, Id::NIL, succ);
            }
        }
    }

    fn extreme(&self, side: Side) -> Id {
        let mut cur = self.root;
        if cur.is_nil() {
            return cur;
        }
        while self.nodes[cur].has_child(side) {
            cur = self.nodes[cur].links[side.idx()];
        }
        cur
    }

    /// In-order neighbor of `id` toward `side`.
    fn step(&self, id: Id, side: Side) -> Id {
        let node = &self.nodes[id];
        let link = node.links[side.idx()];
        if !node.has_child(side) {
            return link;
        }
        let back = side.flip();
        let mut cur = link;
        while self.nodes[cur].has_child(back) {
            cur = self.nodes[cur].links[back.idx()];
        }
        cur
    }
}

impl<V> Default for AvlTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SlotTree for AvlTree<V> {
    #[inline(always)]
    fn root(&self) -> Id {
        self.root
    }

    #[inline(always)]
    fn child(&self, id: Id, side: Side) -> Id {
        let node = &self.nodes[id];
        if node.has_child(side) {
            node.links[side.idx()]
        } else {
            Id::NIL
        }
    }

    fn attach(&mut self, slot: Slot, id: Id) {
        debug_assert!(!id.is_nil());
        match slot {
            Slot::Root => self.root = id,
            Slot::Left(owner) => self.set_link(owner, Side::Left, id, Id::NIL),
            Slot::Right(owner) => self.set_link(owner, Side::Right, id, Id::NIL),
        }
    }
}

impl<V> OrderedIndex for AvlTree<V> {
    type Value = V;

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn update(&mut self, key: Key, value: V) -> Option<V> {
        let mut trace = Trace::new();
        if trace.search(self, |p| key.cmp(&self.nodes[p].key)) {
            let p = self.subtree(trace.top());
            return Some(std::mem::replace(&mut self.nodes[p].value, value));
        }
        let slot = trace.pop();
        self.attach_leaf(slot, key, value);
        self.maintain(&trace);
        None
    }

    fn insert(&mut self, key: Key, value: V) -> Handle {
        let mut trace = Trace::new();
        // Equal keys descend right, so the new entry closes its run.
        trace.search(self, |p| match key.cmp(&self.nodes[p].key) {
            Ordering::Less => Ordering::Less,
            _ => Ordering::Greater,
        });
        let slot = trace.pop();
        let id = self.attach_leaf(slot, key, value);
        self.maintain(&trace);
        Handle(id)
    }

    fn delete(&mut self, key: &Key) -> Option<V> {
        let mut trace = Trace::new();
        if !trace.search(self, |p| key.cmp(&self.nodes[p].key)) {
            return None;
        }
        self.to_leaf(&mut trace);
        let slot = trace.pop();
        let p = self.subtree(slot);
        self.detach_leaf(slot, p);
        self.maintain(&trace);
        Some(self.nodes.take(p).value)
    }

    fn find(&self, key: &Key) -> Option<Handle> {
        let mut cur = self.root;
        while !cur.is_nil() {
            match key.cmp(&self.nodes[cur].key) {
                Ordering::Less => cur = self.child(cur, Side::Left),
                Ordering::Greater => cur = self.child(cur, Side::Right),
                Ordering::Equal => return Some(Handle(cur)),
            }
        }
        None
    }

    fn min(&self) -> Option<Handle> {
        Handle::wrap(self.extreme(Side::Left))
    }

    fn max(&self) -> Option<Handle> {
        Handle::wrap(self.extreme(Side::Right))
    }

    fn key(&self, h: Handle) -> &Key {
        &self.nodes[h.id()].key
    }

    fn value(&self, h: Handle) -> &V {
        &self.nodes[h.id()].value
    }

    fn set(&mut self, h: Handle, value: V) -> V {
        std::mem::replace(&mut self.nodes[h.id()].value, value)
    }

    fn prev(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.step(h.id(), Side::Left))
    }

    fn next(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.step(h.id(), Side::Right))
    }
}

impl<V> TreeShape for AvlTree<V> {
    type Value = V;

    fn top(&self) -> Option<Handle> {
        Handle::wrap(self.root)
    }

    fn left(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.child(h.id(), Side::Left))
    }

    fn right(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.child(h.id(), Side::Right))
    }

    fn entry(&self, h: Handle) -> (&Key, &V) {
        let node = &self.nodes[h.id()];
        (&node.key, &node.value)
    }
}
