use std::iter::FusedIterator;

use crate::arena::Handle;
use crate::avl::AvlTree;
use crate::key::Key;
use crate::sbt::{Duplicates, SbTree};
use crate::skip_list::SkipList;
use crate::treap::TreapMap;

/// Ordered associative container over composite keys.
///
/// - `update` overwrites the value of an existing key and returns the old one.
/// - `insert` always adds a new entry; an equal key joins the end of its run,
///   so equal keys iterate in insertion order.
/// - Navigation goes through `Handle`s, which survive rebalancing.
pub trait OrderedIndex {
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(&mut self, key: Key, value: Self::Value) -> Option<Self::Value>;

    fn insert(&mut self, key: Key, value: Self::Value) -> Handle;

    /// Removes one entry with `key`, returning its value.
    fn delete(&mut self, key: &Key) -> Option<Self::Value>;

    fn find(&self, key: &Key) -> Option<Handle>;

    fn search(&self, key: &Key) -> Option<&Self::Value> {
        self.find(key).map(|h| self.value(h))
    }

    fn min(&self) -> Option<Handle>;
    fn max(&self) -> Option<Handle>;

    fn key(&self, h: Handle) -> &Key;
    fn value(&self, h: Handle) -> &Self::Value;

    /// Replaces the value behind `h`, returning the old one.
    fn set(&mut self, h: Handle, value: Self::Value) -> Self::Value;

    fn prev(&self, h: Handle) -> Option<Handle>;
    fn next(&self, h: Handle) -> Option<Handle>;

    fn iter(&self) -> Iter<'_, Self>
    where
        Self: Sized,
    {
        Iter {
            index: self,
            front: self.min(),
            back: self.max(),
            remaining: self.len(),
        }
    }
}

/// In-order iterator driven by `prev`/`next`.
pub struct Iter<'a, T: OrderedIndex> {
    index: &'a T,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, T: OrderedIndex> Iterator for Iter<'a, T> {
    type Item = (&'a Key, &'a T::Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.front?;
        self.remaining -= 1;
        self.front = self.index.next(h);
        Some((self.index.key(h), self.index.value(h)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: OrderedIndex> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let h = self.back?;
        self.remaining -= 1;
        self.back = self.index.prev(h);
        Some((self.index.key(h), self.index.value(h)))
    }
}

impl<T: OrderedIndex> ExactSizeIterator for Iter<'_, T> {}

impl<T: OrderedIndex> FusedIterator for Iter<'_, T> {}

/// Balancing strategy, fixed when an `Index` is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    Avl,
    Sbt,
    Treap,
    SkipList,
}

impl Strategy {
    pub const ALL: [Self; 4] = [Self::Avl, Self::Sbt, Self::Treap, Self::SkipList];
}

/// One of the four engines behind the common contract.
pub enum Index<V> {
    Avl(AvlTree<V>),
    Sbt(SbTree<V>),
    Treap(TreapMap<V>),
    SkipList(SkipList<V>),
}

macro_rules! dispatch {
    ($self:expr, $engine:ident => $body:expr) => {
        match $self {
            Index::Avl($engine) => $body,
            Index::Sbt($engine) => $body,
            Index::Treap($engine) => $body,
            Index::SkipList($engine) => $body,
        }
    };
}

impl<V> Index<V> {
    pub fn new(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Avl => Self::Avl(AvlTree::new()),
            Strategy::Sbt => Self::Sbt(SbTree::with_duplicates(Duplicates::Keep)),
            Strategy::Treap => Self::Treap(TreapMap::new()),
            Strategy::SkipList => Self::SkipList(SkipList::new()),
        }
    }

    /// Like `new`, with the random source of the randomized engines seeded.
    pub fn with_seed(strategy: Strategy, seed: u64) -> Self {
        match strategy {
            Strategy::Treap => Self::Treap(TreapMap::with_seed(seed)),
            Strategy::SkipList => Self::SkipList(SkipList::with_seed(seed)),
            _ => Self::new(strategy),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Avl(_) => Strategy::Avl,
            Self::Sbt(_) => Strategy::Sbt,
            Self::Treap(_) => Strategy::Treap,
            Self::SkipList(_) => Strategy::SkipList,
        }
    }

    /// The `rank`-th smallest entry, for engines that keep order statistics.
    pub fn index(&self, rank: usize) -> Option<Handle> {
        match self {
            Self::Sbt(tree) => tree.index(rank),
            Self::SkipList(list) => list.by_index(rank),
            Self::Avl(_) | Self::Treap(_) => None,
        }
    }

    /// Position of `h` in key order, for engines that keep order statistics.
    pub fn rank(&self, h: Handle) -> Option<usize> {
        match self {
            Self::Sbt(tree) => tree.rank(h),
            Self::SkipList(list) => list.rank(h),
            Self::Avl(_) | Self::Treap(_) => None,
        }
    }
}

impl<V> OrderedIndex for Index<V> {
    type Value = V;

    fn len(&self) -> usize {
        dispatch!(self, e => e.len())
    }

    fn update(&mut self, key: Key, value: V) -> Option<V> {
        dispatch!(self, e => e.update(key, value))
    }

    fn insert(&mut self, key: Key, value: V) -> Handle {
        dispatch!(self, e => e.insert(key, value))
    }

    fn delete(&mut self, key: &Key) -> Option<V> {
        dispatch!(self, e => e.delete(key))
    }

    fn find(&self, key: &Key) -> Option<Handle> {
        dispatch!(self, e => e.find(key))
    }

    fn min(&self) -> Option<Handle> {
        dispatch!(self, e => e.min())
    }

    fn max(&self) -> Option<Handle> {
        dispatch!(self, e => e.max())
    }

    fn key(&self, h: Handle) -> &Key {
        dispatch!(self, e => e.key(h))
    }

    fn value(&self, h: Handle) -> &V {
        dispatch!(self, e => e.value(h))
    }

    fn set(&mut self, h: Handle, value: V) -> V {
        dispatch!(self, e => e.set(h, value))
    }

    fn prev(&self, h: Handle) -> Option<Handle> {
        dispatch!(self, e => e.prev(h))
    }

    fn next(&self, h: Handle) -> Option<Handle> {
        dispatch!(self, e => e.next(h))
    }
}
