use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::arena::{Arena, Handle, Id};
use crate::error::ConfigError;
use crate::index::OrderedIndex;
use crate::key::Key;

const DEFAULT_SEED: u64 = 0x5EED_5C1B_2026;

/// Chance that a node reaching some level also reaches the next one: 1/e.
pub const DEFAULT_DECAY: f64 = 0.367_879_441_171_442_33;

pub const MAX_LEVEL: usize = 32;

/// Skip list whose forward links count the entries they pass over.
///
/// Positions are 1-based with the head at 0. A link from `x` to `y` has span
/// `rank(y) - rank(x)`; a link leading off the end has span `len - rank(x)`.
/// The spans make `by_index`, `rank` and `delete_by_index` logarithmic.
pub struct SkipList<V, R = StdRng> {
    nodes: Arena<Node<V>>,
    head: Vec<Link>,
    tail: Id,
    len: usize,
    seq: u64,
    decay: f64,
    rng: R,
}

#[derive(Clone, Copy, Debug)]
struct Link {
    next: Id,
    span: usize,
}

// `(key, seq)` orders nodes exactly as the base level does.
struct Node<V> {
    key: Key,
    seq: u64,
    value: V,
    prev: Id,
    links: Vec<Link>,
}

// Per-level predecessors of a position, with their ranks.
struct Path {
    preds: Vec<Id>,
    ranks: Vec<usize>,
}

impl<V> SkipList<V> {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_decay(decay: f64) -> Result<Self, ConfigError> {
        Self::with_rng_and_decay(StdRng::seed_from_u64(DEFAULT_SEED), decay)
    }
}

impl<V> Default for SkipList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, R: Rng> SkipList<V, R> {
    pub fn with_rng(rng: R) -> Self {
        Self::build(rng, DEFAULT_DECAY)
    }

    /// Fails unless `decay` is a finite probability in `(0, 1)`.
    pub fn with_rng_and_decay(rng: R, decay: f64) -> Result<Self, ConfigError> {
        if decay.is_finite() && decay > 0.0 && decay < 1.0 {
            Ok(Self::build(rng, decay))
        } else {
            Err(ConfigError::InvalidDecay(decay))
        }
    }

    fn build(rng: R, decay: f64) -> Self {
        Self {
            nodes: Arena::new(),
            head: Vec::new(),
            tail: Id::NIL,
            len: 0,
            seq: 0,
            decay,
            rng,
        }
    }

    /// Number of levels in use.
    pub fn level(&self) -> usize {
        self.head.len()
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.head.clear();
        self.tail = Id::NIL;
        self.len = 0;
    }

    /// Inserts only if `key` is absent.
    pub fn try_insert(&mut self, key: Key, value: V) -> Option<Handle> {
        let (path, found) = self.locate(&key);
        if !found.is_nil() {
            return None;
        }
        Some(Handle(self.insert_at(path, key, value)))
    }

    /// The entry at 0-based position `i`.
    pub fn by_index(&self, i: usize) -> Option<Handle> {
        if i >= self.len {
            return None;
        }
        let target = i + 1;
        let mut x = Id::NIL;
        let mut rank = 0;
        for lvl in (0..self.head.len()).rev() {
            while let Some(link) = self.link(x, lvl) {
                if rank + link.span > target {
                    break;
                }
                rank += link.span;
                x = link.next;
            }
            if rank == target {
                break;
            }
        }
        debug_assert_eq!(rank, target);
        Handle::wrap(x)
    }

    /// 0-based position of `h`.
    pub fn rank(&self, h: Handle) -> Option<usize> {
        let target = h.id();
        if !self.nodes.is_live(target) {
            foreign_handle("rank");
            return None;
        }
        let path = self.path_to(target);
        if self.base_next(path.preds[0]) != target {
            foreign_handle("rank");
            return None;
        }
        Some(path.ranks[0])
    }

    pub fn delete_by_index(&mut self, i: usize) -> Option<(Key, V)> {
        if i >= self.len {
            return None;
        }
        let path = self.descend(|_, rank_after| rank_after <= i);
        let x = self.base_next(path.preds[0]);
        let node = self.unlink(&path.preds, x);
        Some((node.key, node.value))
    }

    /// Forward link of `at` (the head when `NIL`) on `lvl`.
    #[inline]
    fn raw_link(&self, at: Id, lvl: usize) -> Link {
        if at.is_nil() {
            self.head[lvl]
        } else {
            self.nodes[at].links[lvl]
        }
    }

    /// Like `raw_link`, but only if the link leads somewhere.
    #[inline]
    fn link(&self, at: Id, lvl: usize) -> Option<Link> {
        if at.is_nil() && lvl >= self.head.len() {
            return None;
        }
        let link = self.raw_link(at, lvl);
        if link.next.is_nil() { None } else { Some(link) }
    }

    #[inline]
    fn link_mut(&mut self, at: Id, lvl: usize) -> &mut Link {
        if at.is_nil() {
            &mut self.head[lvl]
        } else {
            &mut self.nodes[at].links[lvl]
        }
    }

    #[inline]
    fn base_next(&self, at: Id) -> Id {
        self.link(at, 0).map_or(Id::NIL, |l| l.next)
    }

    /// Walks down from the top level, stepping forward while
    /// `advance(next, rank_of_next)` holds.
    fn descend(&self, mut advance: impl FnMut(&Node<V>, usize) -> bool) -> Path {
        let levels = self.head.len();
        let mut path = Path {
            preds: vec![Id::NIL; levels],
            ranks: vec![0; levels],
        };
        let mut x = Id::NIL;
        let mut rank = 0;
        for lvl in (0..levels).rev() {
            while let Some(link) = self.link(x, lvl) {
                if !advance(&self.nodes[link.next], rank + link.span) {
                    break;
                }
                rank += link.span;
                x = link.next;
            }
            path.preds[lvl] = x;
            path.ranks[lvl] = rank;
        }
        path
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.random::<f64>() < self.decay {
            level += 1;
        }
        level
    }

    /// Links a new node right after `path`'s base predecessor.
    fn insert_at(&mut self, mut path: Path, key: Key, value: V) -> Id {
        let level = self.random_level();
        while self.head.len() < level {
            self.head.push(Link {
                next: Id::NIL,
                span: self.len,
            });
            path.preds.push(Id::NIL);
            path.ranks.push(0);
        }

        let base = path.ranks[0];
        let links = (0..level)
            .map(|lvl| {
                let pred = self.raw_link(path.preds[lvl], lvl);
                Link {
                    next: pred.next,
                    span: pred.span - (base - path.ranks[lvl]),
                }
            })
            .collect::<Vec<_>>();
        let next = links[0].next;
        self.seq += 1;
        let id = self.nodes.alloc(Node {
            key,
            seq: self.seq,
            value,
            prev: path.preds[0],
            links,
        });
        for lvl in 0..level {
            *self.link_mut(path.preds[lvl], lvl) = Link {
                next: id,
                span: base - path.ranks[lvl] + 1,
            };
        }
        for lvl in level..self.head.len() {
            self.link_mut(path.preds[lvl], lvl).span += 1;
        }

        if next.is_nil() {
            self.tail = id;
        } else {
            self.nodes[next].prev = id;
        }
        self.len += 1;
        id
    }

    /// Removes `x`, whose predecessor on every level is in `preds`.
    fn unlink(&mut self, preds: &[Id], x: Id) -> Node<V> {
        let node = self.nodes.take(x);
        for (lvl, &pred) in preds.iter().enumerate() {
            let link = self.link_mut(pred, lvl);
            match node.links.get(lvl) {
                Some(skip) => {
                    debug_assert_eq!(link.next, x);
                    link.next = skip.next;
                    link.span = link.span + skip.span - 1;
                }
                None => link.span -= 1,
            }
        }

        let next = node.links[0].next;
        if next.is_nil() {
            self.tail = node.prev;
        } else {
            self.nodes[next].prev = node.prev;
        }
        self.len -= 1;
        while self.head.last().is_some_and(|l| l.next.is_nil()) {
            self.head.pop();
        }
        node
    }

    /// Path to the predecessors of the live node `id`.
    fn path_to(&self, id: Id) -> Path {
        let Node { key, seq, .. } = &self.nodes[id];
        self.descend(|node, _| (&node.key, node.seq) < (key, *seq))
    }

    /// First entry of `key`'s run and the path leading to it.
    fn locate(&self, key: &Key) -> (Path, Id) {
        let path = self.descend(|node, _| node.key < *key);
        let first = path.preds.first().map_or(Id::NIL, |&p| self.base_next(p));
        if !first.is_nil() && self.nodes[first].key == *key {
            (path, first)
        } else {
            (path, Id::NIL)
        }
    }
}

#[cold]
fn foreign_handle(op: &str) {
    if cfg!(debug_assertions) {
        panic!("`SkipList::{op}()` - handle does not belong to this list");
    }
}

impl<V, R: Rng> OrderedIndex for SkipList<V, R> {
    type Value = V;

    fn len(&self) -> usize {
        self.len
    }

    fn update(&mut self, key: Key, value: V) -> Option<V> {
        let (path, found) = self.locate(&key);
        if found.is_nil() {
            self.insert_at(path, key, value);
            None
        } else {
            Some(std::mem::replace(&mut self.nodes[found].value, value))
        }
    }

    fn insert(&mut self, key: Key, value: V) -> Handle {
        let path = self.descend(|node, _| node.key <= key);
        Handle(self.insert_at(path, key, value))
    }

    fn delete(&mut self, key: &Key) -> Option<V> {
        let (path, found) = self.locate(key);
        if found.is_nil() {
            return None;
        }
        Some(self.unlink(&path.preds, found).value)
    }

    fn find(&self, key: &Key) -> Option<Handle> {
        Handle::wrap(self.locate(key).1)
    }

    fn min(&self) -> Option<Handle> {
        Handle::wrap(self.base_next(Id::NIL))
    }

    fn max(&self) -> Option<Handle> {
        Handle::wrap(self.tail)
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
        Handle::wrap(self.base_next(h.id()))
    }
}
