use std::cmp::Ordering;

use crate::arena::{Arena, Handle, Id};
use crate::index::OrderedIndex;
use crate::key::Key;
use crate::pretty::TreeShape;
use crate::trace::{Side, Slot, SlotTree, Trace};

// Weight balance: neither subtree weighs more than DELTA times the other,
// where a subtree of n nodes weighs n + 1. GAMMA picks single vs double
// rotation.
const DELTA: u64 = 3;
const GAMMA: u64 = 2;

/// What `insert` does with a key that is already present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Duplicates {
    /// Overwrite the existing entry, like `update`.
    #[default]
    Update,
    /// Add another entry at the end of the key's run.
    Keep,
}

/// Size-balanced search tree with order statistics.
///
/// Every node knows its subtree size, which gives `index` and `rank` in
/// logarithmic time. Entries are additionally chained in key order for
/// constant-time `prev`/`next`.
pub struct SbTree<V> {
    nodes: Arena<Node<V>>,
    root: Id,
    duplicates: Duplicates,
    // Insertion counter; (key, seq) totally orders the entries of a run.
    seq: u64,
}

struct Node<V> {
    key: Key,
    value: V,
    seq: u64,
    size: u32,
    children: [Id; 2],
    prev: Id,
    next: Id,
}

impl<V> SbTree<V> {
    pub fn new() -> Self {
        Self::with_duplicates(Duplicates::default())
    }

    pub fn with_duplicates(duplicates: Duplicates) -> Self {
        Self {
            nodes: Arena::new(),
            root: Id::NIL,
            duplicates,
            seq: 0,
        }
    }

    pub fn duplicates(&self) -> Duplicates {
        self.duplicates
    }

    /// The entry with `rank` smaller entries before it.
    pub fn index(&self, rank: usize) -> Option<Handle> {
        Handle::wrap(self.select(rank))
    }

    /// Number of entries ordered before `h`.
    pub fn rank(&self, h: Handle) -> Option<usize> {
        let target = self.owned(h, "rank")?;
        let (key, seq) = (&self.nodes[target].key, self.nodes[target].seq);
        let mut rank = 0;
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = &self.nodes[cur];
            let left = self.size(node.children[0]) as usize;
            match key.cmp(&node.key).then(seq.cmp(&node.seq)) {
                Ordering::Less => cur = node.children[0],
                Ordering::Greater => {
                    rank += left + 1;
                    cur = node.children[1];
                }
                Ordering::Equal => return Some(rank + left),
            }
        }
        foreign_handle("rank");
        None
    }

    pub fn delete_by_index(&mut self, rank: usize) -> Option<(Key, V)> {
        let id = self.select(rank);
        if id.is_nil() {
            return None;
        }
        let node = self.remove(id);
        Some((node.key, node.value))
    }

    /// Removes exactly the entry behind `h`.
    pub fn delete_node(&mut self, h: Handle) -> Option<(Key, V)> {
        let id = self.owned(h, "delete_node")?;
        let node = self.remove(id);
        Some((node.key, node.value))
    }

    #[inline(always)]
    fn size(&self, id: Id) -> u32 {
        if id.is_nil() { 0 } else { self.nodes[id].size }
    }

    #[inline(always)]
    fn weight(&self, id: Id) -> u64 {
        self.size(id) as u64 + 1
    }

    fn owned(&self, h: Handle, op: &str) -> Option<Id> {
        if self.nodes.is_live(h.id()) {
            Some(h.id())
        } else {
            foreign_handle(op);
            None
        }
    }

    fn select(&self, mut rank: usize) -> Id {
        if rank >= self.len() {
            return Id::NIL;
        }
        let mut cur = self.root;
        loop {
            let [l, r] = self.nodes[cur].children;
            let left = self.size(l) as usize;
            match rank.cmp(&left) {
                Ordering::Less => cur = l,
                Ordering::Equal => return cur,
                Ordering::Greater => {
                    rank -= left + 1;
                    cur = r;
                }
            }
        }
    }

    /// First entry of `key`'s run.
    fn first_equal(&self, key: &Key) -> Id {
        let mut found = Id::NIL;
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = &self.nodes[cur];
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.children[0],
                Ordering::Greater => cur = node.children[1],
                Ordering::Equal => {
                    found = cur;
                    cur = node.children[0];
                }
            }
        }
        found
    }

    fn fix_size(&mut self, p: Id) {
        let [l, r] = self.nodes[p].children;
        self.nodes[p].size = self.size(l) + self.size(r) + 1;
    }

    /// Single rotation lifting `p`'s `side` child; returns the new top.
    fn lift(&mut self, p: Id, side: Side) -> Id {
        let across = side.flip();
        let c = self.nodes[p].children[side.idx()];
        self.nodes[p].children[side.idx()] = self.nodes[c].children[across.idx()];
        self.nodes[c].children[across.idx()] = p;
        self.fix_size(p);
        self.fix_size(c);
        c
    }

    /// Restores the weight bound at `p` and returns the subtree's new top.
    fn balance(&mut self, p: Id) -> Id {
        let [l, r] = self.nodes[p].children;
        let (wl, wr) = (self.weight(l), self.weight(r));
        let heavy = if wr > DELTA * wl {
            Side::Right
        } else if wl > DELTA * wr {
            Side::Left
        } else {
            self.fix_size(p);
            return p;
        };
        let light = heavy.flip();
        let c = self.nodes[p].children[heavy.idx()];
        let outer = self.nodes[c].children[heavy.idx()];
        let inner = self.nodes[c].children[light.idx()];
        if self.weight(inner) >= GAMMA * self.weight(outer) {
            let top = self.lift(c, light);
            self.nodes[p].children[heavy.idx()] = top;
        }
        self.lift(p, heavy)
    }

    /// Refreshes sizes and weight balance along the whole trace.
    fn maintain(&mut self, trace: &Trace) {
        for i in (0..trace.len()).rev() {
            let slot = trace.slot(i);
            let p = self.subtree(slot);
            let top = self.balance(p);
            if top != p {
                self.attach(slot, top);
            }
        }
    }

    /// Adds a new entry at the end of its key's run.
    fn insert_new(&mut self, key: Key, value: V) -> Id {
        let mut trace = Trace::new();
        trace.search(self, |p| match key.cmp(&self.nodes[p].key) {
            Ordering::Less => Ordering::Less,
            _ => Ordering::Greater,
        });
        let slot = trace.pop();
        let (prev, next) = match slot {
            Slot::Root => (Id::NIL, Id::NIL),
            Slot::Left(q) => (self.nodes[q].prev, q),
            Slot::Right(q) => (q, self.nodes[q].next),
        };
        let seq = self.seq;
        self.seq += 1;
        let id = self.nodes.alloc(Node {
            key,
            value,
            seq,
            size: 1,
            children: [Id::NIL; 2],
            prev,
            next,
        });
        if !prev.is_nil() {
            self.nodes[prev].next = id;
        }
        if !next.is_nil() {
            self.nodes[next].prev = id;
        }
        self.attach(slot, id);
        self.maintain(&trace);
        id
    }

    /// Unlinks live node `id` from the tree and the chain and frees it.
    fn remove(&mut self, id: Id) -> Node<V> {
        let mut trace = Trace::new();
        let (key, seq) = (&self.nodes[id].key, self.nodes[id].seq);
        let found = trace.search(self, |p| {
            let node = &self.nodes[p];
            key.cmp(&node.key).then(seq.cmp(&node.seq))
        });
        debug_assert!(found);

        let k = trace.len() - 1;
        let slot = trace.top();
        let [l, r] = self.nodes[id].children;
        if l.is_nil() || r.is_nil() {
            trace.pop();
            self.attach(slot, if l.is_nil() { r } else { l });
        } else {
            // Replace `id` by its in-order neighbor from the heavier side.
            let side = if self.size(l) > self.size(r) {
                Side::Left
            } else {
                Side::Right
            };
            trace.push_extreme(self, Slot::child(id, side), side.flip());
            let s_slot = trace.pop();
            let s = self.subtree(s_slot);
            let rest = self.nodes[s].children[side.idx()];
            self.attach(s_slot, rest);
            self.nodes[s].children = self.nodes[id].children;
            self.attach(slot, s);
            if trace.len() > k + 1 {
                trace.set(k + 1, Slot::child(s, side));
            }
        }

        let (prev, next) = (self.nodes[id].prev, self.nodes[id].next);
        if !prev.is_nil() {
            self.nodes[prev].next = next;
        }
        if !next.is_nil() {
            self.nodes[next].prev = prev;
        }
        self.maintain(&trace);
        self.nodes.take(id)
    }

    fn extreme(&self, side: Side) -> Id {
        let mut cur = self.root;
        if cur.is_nil() {
            return cur;
        }
        loop {
            let next = self.nodes[cur].children[side.idx()];
            if next.is_nil() {
                return cur;
            }
            cur = next;
        }
    }
}

#[cold]
fn foreign_handle(op: &str) {
    if cfg!(debug_assertions) {
        panic!("`SbTree::{op}()` - handle does not belong to this tree");
    }
}

impl<V> Default for SbTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SlotTree for SbTree<V> {
    #[inline(always)]
    fn root(&self) -> Id {
        self.root
    }

    #[inline(always)]
    fn child(&self, id: Id, side: Side) -> Id {
        self.nodes[id].children[side.idx()]
    }

    fn attach(&mut self, slot: Slot, id: Id) {
        match slot {
            Slot::Root => self.root = id,
            Slot::Left(owner) => self.nodes[owner].children[0] = id,
            Slot::Right(owner) => self.nodes[owner].children[1] = id,
        }
    }
}

impl<V> OrderedIndex for SbTree<V> {
    type Value = V;

    fn len(&self) -> usize {
        self.size(self.root) as usize
    }

    fn update(&mut self, key: Key, value: V) -> Option<V> {
        let id = self.first_equal(&key);
        if id.is_nil() {
            self.insert_new(key, value);
            None
        } else {
            Some(std::mem::replace(&mut self.nodes[id].value, value))
        }
    }

    fn insert(&mut self, key: Key, value: V) -> Handle {
        if self.duplicates == Duplicates::Update {
            let id = self.first_equal(&key);
            if !id.is_nil() {
                self.nodes[id].value = value;
                return Handle(id);
            }
        }
        Handle(self.insert_new(key, value))
    }

    fn delete(&mut self, key: &Key) -> Option<V> {
        let id = self.first_equal(key);
        if id.is_nil() {
            return None;
        }
        Some(self.remove(id).value)
    }

    fn find(&self, key: &Key) -> Option<Handle> {
        Handle::wrap(self.first_equal(key))
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
        Handle::wrap(self.nodes[h.id()].prev)
    }

    fn next(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.nodes[h.id()].next)
    }
}

impl<V> TreeShape for SbTree<V> {
    type Value = V;

    fn top(&self) -> Option<Handle> {
        Handle::wrap(self.root)
    }

    fn left(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.nodes[h.id()].children[0])
    }

    fn right(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.nodes[h.id()].children[1])
    }

    fn entry(&self, h: Handle) -> (&Key, &V) {
        let node = &self.nodes[h.id()];
        (&node.key, &node.value)
    }
}
