use std::ops::{Index, IndexMut};

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Id(pub(crate) u32);

impl Id {
    pub(crate) const NIL: Self = Self(u32::MAX);

    #[inline(always)]
    pub(crate) fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline(always)]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    fn from_index(index: usize) -> Self {
        assert!(
            index < u32::MAX as usize,
            "`Id::from_index()` - arena is at maximum capacity"
        );
        Self(index as u32)
    }
}

/// Stable reference to one entry of an index.
///
/// A handle stays valid across rotations and rebalancing; it is invalidated
/// only when its entry is deleted or the structure is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(pub(crate) Id);

impl Handle {
    #[inline(always)]
    pub(crate) fn id(self) -> Id {
        self.0
    }

    #[inline(always)]
    pub(crate) fn wrap(id: Id) -> Option<Self> {
        if id.is_nil() { None } else { Some(Self(id)) }
    }
}

/// Growable node storage addressed by `Id`.
///
/// Freed slots are recycled, so an `Id` is only meaningful while its node is
/// live.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Id>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, node: T) -> Id {
        if let Some(id) = self.free.pop() {
            self.slots[id.idx()] = Some(node);
            id
        } else {
            let id = Id::from_index(self.slots.len());
            self.slots.push(Some(node));
            id
        }
    }

    #[inline]
    pub(crate) fn is_live(&self, id: Id) -> bool {
        !id.is_nil() && matches!(self.slots.get(id.idx()), Some(Some(_)))
    }

    pub(crate) fn take(&mut self, id: Id) -> T {
        let node = self.slots[id.idx()]
            .take()
            .expect("`Arena::take()` - `id` is invalid!");
        self.free.push(id);
        node
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Index<Id> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: Id) -> &T {
        self.slots[id.idx()]
            .as_ref()
            .expect("`Arena::index()` - `id` is invalid!")
    }
}

impl<T> IndexMut<Id> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: Id) -> &mut T {
        self.slots[id.idx()]
            .as_mut()
            .expect("`Arena::index_mut()` - `id` is invalid!")
    }
}
