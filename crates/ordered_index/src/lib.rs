//! In-memory ordered indexes over composite `(i64, String)` keys.
//!
//! Four balancing strategies share the [`OrderedIndex`] contract:
//! [`AvlTree`] (height-balanced, threaded nodes), [`SbTree`] (size-balanced,
//! with order statistics), [`TreapMap`] (random priorities) and [`SkipList`]
//! (random levels, with order statistics). [`Index`] picks one at runtime.

mod arena;
mod avl;
mod error;
mod index;
mod key;
pub mod pretty;
mod sbt;
mod skip_list;
mod trace;
mod treap;

pub use arena::Handle;
pub use avl::AvlTree;
pub use error::ConfigError;
pub use index::{Index, Iter, OrderedIndex, Strategy};
pub use key::Key;
pub use sbt::{Duplicates, SbTree};
pub use skip_list::{DEFAULT_DECAY, MAX_LEVEL, SkipList};
pub use treap::{PriorityQueue, Treap, TreapMap};
