use std::cmp::Ordering;
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arena::{Arena, Handle, Id};
use crate::index::OrderedIndex;
use crate::key::Key;
use crate::pretty::TreeShape;
use crate::trace::Side;

const DEFAULT_SEED: u64 = 0x5EED_7EA9_2026;

/// Search tree on keys that is at the same time a min-heap on per-node
/// priorities.
///
/// The caller picks every priority; the façades below draw them at random
/// ([`TreapMap`]) or use them as weights ([`PriorityQueue`]). A priority is
/// fixed when its node is created.
pub struct Treap<V> {
    nodes: Arena<Node<V>>,
    root: Id,
}

struct Node<V> {
    key: Key,
    value: V,
    priority: i64,
    parent: Id,
    children: [Id; 2],
}

impl<V> Treap<V> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: Id::NIL,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, depth)) = stack.pop() {
            if id.is_nil() {
                continue;
            }
            height = height.max(depth);
            let [l, r] = self.nodes[id].children;
            stack.push((l, depth + 1));
            stack.push((r, depth + 1));
        }
        height
    }

    pub fn priority(&self, h: Handle) -> i64 {
        self.nodes[h.id()].priority
    }

    /// Adds an entry with `priority`; an equal key joins the end of its run.
    pub fn insert_with_priority(&mut self, key: Key, value: V, priority: i64) -> Handle {
        let mut parent = Id::NIL;
        let mut side = Side::Left;
        let mut cur = self.root;
        while !cur.is_nil() {
            parent = cur;
            side = match key.cmp(&self.nodes[cur].key) {
                Ordering::Less => Side::Left,
                _ => Side::Right,
            };
            cur = self.nodes[cur].children[side.idx()];
        }
        let id = self.nodes.alloc(Node {
            key,
            value,
            priority,
            parent,
            children: [Id::NIL; 2],
        });
        if parent.is_nil() {
            self.root = id;
        } else {
            self.nodes[parent].children[side.idx()] = id;
        }
        self.arrange(id);
        Handle(id)
    }

    /// Overwrites the value of `key` if present; otherwise inserts it with
    /// `priority`.
    pub fn update_with_priority(&mut self, key: Key, value: V, priority: i64) -> Option<V> {
        let id = self.locate(&key);
        if id.is_nil() {
            self.insert_with_priority(key, value, priority);
            None
        } else {
            Some(std::mem::replace(&mut self.nodes[id].value, value))
        }
    }

    pub fn delete(&mut self, key: &Key) -> Option<V> {
        let id = self.locate(key);
        if id.is_nil() {
            return None;
        }
        Some(self.release(id).1)
    }

    pub fn find(&self, key: &Key) -> Option<Handle> {
        Handle::wrap(self.locate(key))
    }

    pub fn min(&self) -> Option<Handle> {
        Handle::wrap(self.extreme(self.root, Side::Left))
    }

    pub fn max(&self) -> Option<Handle> {
        Handle::wrap(self.extreme(self.root, Side::Right))
    }

    pub fn key(&self, h: Handle) -> &Key {
        &self.nodes[h.id()].key
    }

    pub fn value(&self, h: Handle) -> &V {
        &self.nodes[h.id()].value
    }

    pub fn set(&mut self, h: Handle, value: V) -> V {
        std::mem::replace(&mut self.nodes[h.id()].value, value)
    }

    pub fn prev(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.step(h.id(), Side::Left))
    }

    pub fn next(&self, h: Handle) -> Option<Handle> {
        Handle::wrap(self.step(h.id(), Side::Right))
    }

    fn locate(&self, key: &Key) -> Id {
        let mut cur = self.root;
        while !cur.is_nil() {
            let node = &self.nodes[cur];
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.children[0],
                Ordering::Greater => cur = node.children[1],
                Ordering::Equal => break,
            }
        }
        cur
    }

    fn side_of(&self, c: Id) -> Side {
        let p = self.nodes[c].parent;
        if self.nodes[p].children[0] == c {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Puts `new` where `old` hung under `parent`.
    fn replace_child(&mut self, parent: Id, old: Id, new: Id) {
        if parent.is_nil() {
            self.root = new;
        } else {
            let children = &mut self.nodes[parent].children;
            if children[0] == old {
                children[0] = new;
            } else {
                children[1] = new;
            }
        }
        if !new.is_nil() {
            self.nodes[new].parent = parent;
        }
    }

    /// Rotates `c` above its parent.
    fn rotate_up(&mut self, c: Id) {
        let p = self.nodes[c].parent;
        let side = self.side_of(c);
        let across = side.flip();
        let t = self.nodes[c].children[across.idx()];
        let g = self.nodes[p].parent;

        self.nodes[p].children[side.idx()] = t;
        if !t.is_nil() {
            self.nodes[t].parent = p;
        }
        self.replace_child(g, p, c);
        self.nodes[c].children[across.idx()] = p;
        self.nodes[p].parent = c;
    }

    /// Lifts `id` while its parent has a larger priority.
    fn arrange(&mut self, id: Id) {
        loop {
            let p = self.nodes[id].parent;
            if p.is_nil() || self.nodes[p].priority <= self.nodes[id].priority {
                return;
            }
            self.rotate_up(id);
        }
    }

    /// Sinks `id` to a leaf by lifting its smaller-priority child, then cuts it
    /// out.
    fn release(&mut self, id: Id) -> (Key, V) {
        loop {
            let [l, r] = self.nodes[id].children;
            let lift = match (l.is_nil(), r.is_nil()) {
                (true, true) => break,
                (false, true) => l,
                (true, false) => r,
                (false, false) => {
                    if self.nodes[l].priority <= self.nodes[r].priority {
                        l
                    } else {
                        r
                    }
                }
            };
            self.rotate_up(lift);
        }
        let parent = self.nodes[id].parent;
        self.replace_child(parent, id, Id::NIL);
        let node = self.nodes.take(id);
        (node.key, node.value)
    }

    fn extreme(&self, mut cur: Id, side: Side) -> Id {
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

    /// In-order neighbor of `id` toward `side`.
    fn step(&self, id: Id, side: Side) -> Id {
        let down = self.nodes[id].children[side.idx()];
        if !down.is_nil() {
            return self.extreme(down, side.flip());
        }
        let mut cur = id;
        loop {
            let p = self.nodes[cur].parent;
            if p.is_nil() || self.nodes[p].children[side.idx()] != cur {
                return p;
            }
            cur = p;
        }
    }
}

impl<V> Default for Treap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TreeShape for Treap<V> {
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

/// Randomized search tree: a treap whose priorities are drawn from `R`.
pub struct TreapMap<V, R = StdRng> {
    treap: Treap<V>,
    rng: R,
}

impl<V> TreapMap<V> {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<V, R: Rng> TreapMap<V, R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            treap: Treap::new(),
            rng,
        }
    }

    pub fn height(&self) -> usize {
        self.treap.height()
    }

    pub fn treap(&self) -> &Treap<V> {
        &self.treap
    }
}

impl<V> Default for TreapMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, R: Rng> OrderedIndex for TreapMap<V, R> {
    type Value = V;

    fn len(&self) -> usize {
        self.treap.len()
    }

    fn update(&mut self, key: Key, value: V) -> Option<V> {
        let priority = self.rng.random();
        self.treap.update_with_priority(key, value, priority)
    }

    fn insert(&mut self, key: Key, value: V) -> Handle {
        let priority = self.rng.random();
        self.treap.insert_with_priority(key, value, priority)
    }

    fn delete(&mut self, key: &Key) -> Option<V> {
        self.treap.delete(key)
    }

    fn find(&self, key: &Key) -> Option<Handle> {
        self.treap.find(key)
    }

    fn min(&self) -> Option<Handle> {
        self.treap.min()
    }

    fn max(&self) -> Option<Handle> {
        self.treap.max()
    }

    fn key(&self, h: Handle) -> &Key {
        self.treap.key(h)
    }

    fn value(&self, h: Handle) -> &V {
        self.treap.value(h)
    }

    fn set(&mut self, h: Handle, value: V) -> V {
        self.treap.set(h, value)
    }

    fn prev(&self, h: Handle) -> Option<Handle> {
        self.treap.prev(h)
    }

    fn next(&self, h: Handle) -> Option<Handle> {
        self.treap.next(h)
    }
}

impl<V, R> TreeShape for TreapMap<V, R> {
    type Value = V;

    fn top(&self) -> Option<Handle> {
        self.treap.top()
    }

    fn left(&self, h: Handle) -> Option<Handle> {
        self.treap.left(h)
    }

    fn right(&self, h: Handle) -> Option<Handle> {
        self.treap.right(h)
    }

    fn entry(&self, h: Handle) -> (&Key, &V) {
        self.treap.entry(h)
    }
}

/// Min-priority queue keyed by caller weights.
///
/// Weights are the heap priorities; the search keys are random and only keep
/// the shape balanced. `pop` yields the smallest weight. Entries of equal
/// weight are threaded on a side list so `update` finds one without a search.
pub struct PriorityQueue<V, R = StdRng> {
    treap: Treap<V>,
    rng: R,
    // Most recently pushed live entry of each weight.
    heads: HashMap<i64, Id>,
    // `[prev, next]` among entries of the same weight, by `Id` index.
    peers: Vec<[Id; 2]>,
}

impl<V> PriorityQueue<V> {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<V> Default for PriorityQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, R: Rng> PriorityQueue<V, R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            treap: Treap::new(),
            rng,
            heads: HashMap::new(),
            peers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.treap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treap.is_empty()
    }

    /// Adds `value` with `weight`. Entries of equal weight pop in no
    /// particular order.
    pub fn push(&mut self, weight: i64, value: V) {
        let key = Key::new(self.rng.random(), "");
        let id = self.treap.insert_with_priority(key, value, weight).id();
        if self.peers.len() <= id.idx() {
            self.peers.resize(id.idx() + 1, [Id::NIL; 2]);
        }
        let next = self.heads.insert(weight, id).unwrap_or(Id::NIL);
        self.peers[id.idx()] = [Id::NIL, next];
        if !next.is_nil() {
            self.peers[next.idx()][0] = id;
        }
    }

    /// Replaces the value of some entry with `weight`, or pushes a new one.
    pub fn update(&mut self, weight: i64, value: V) -> Option<V> {
        match self.heads.get(&weight) {
            Some(&id) => Some(std::mem::replace(&mut self.treap.nodes[id].value, value)),
            None => {
                self.push(weight, value);
                None
            }
        }
    }

    pub fn peek(&self) -> Option<(i64, &V)> {
        let root = self.treap.root;
        if root.is_nil() {
            return None;
        }
        let node = &self.treap.nodes[root];
        Some((node.priority, &node.value))
    }

    pub fn pop(&mut self) -> Option<(i64, V)> {
        let root = self.treap.root;
        if root.is_nil() {
            return None;
        }
        let weight = self.treap.nodes[root].priority;
        self.unthread(weight, root);
        let (_, value) = self.treap.release(root);
        Some((weight, value))
    }

    /// Takes `id` off the side list of `weight`.
    fn unthread(&mut self, weight: i64, id: Id) {
        let [prev, next] = self.peers[id.idx()];
        if prev.is_nil() {
            if next.is_nil() {
                self.heads.remove(&weight);
            } else {
                self.heads.insert(weight, next);
            }
        } else {
            self.peers[prev.idx()][1] = next;
        }
        if !next.is_nil() {
            self.peers[next.idx()][0] = prev;
        }
    }
}
