use std::{mem, ops::Index};

use crate::{
    error::{Error, Result},
    signal::Signal,
};

/// Listener for element-level changes. Receives the affected index.
pub type IndexListener = dyn Fn(usize);
/// Listener for wholesale replacement.
pub type ResetListener = dyn Fn();

/// A list that announces its changes.
///
/// Listeners run synchronously, after the change is applied. They must not
/// access the list they are observing.
pub struct ObservableList<E> {
    /// Items.
    items: Vec<E>,
    /// Fired after an item is inserted, with its index.
    pub added: Signal<IndexListener>,
    /// Fired after an item is removed, with its former index.
    pub removed: Signal<IndexListener>,
    /// Fired after an item is replaced in place.
    pub changed: Signal<IndexListener>,
    /// Fired after the whole list is replaced or cleared.
    pub reset: Signal<ResetListener>,
}

impl<E> Default for ObservableList<E> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<E> Index<usize> for ObservableList<E> {
    type Output = E;

    fn index(&self, index: usize) -> &E {
        &self.items[index]
    }
}

impl<E> ObservableList<E> {
    /// A list holding `items`.
    pub fn new(items: Vec<E>) -> Self {
        Self {
            items,
            added: Signal::default(),
            removed: Signal::default(),
            changed: Signal::default(),
            reset: Signal::default(),
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item at `index`.
    pub fn get(&self, index: usize) -> Option<&E> {
        self.items.get(index)
    }

    /// The items.
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    /// Iterate over the items.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.items.iter()
    }

    /// Append an item.
    pub fn push(&mut self, item: E) {
        self.items.push(item);
        let index = self.items.len() - 1;
        for l in self.added.snapshot() {
            l(index);
        }
    }

    /// Insert an item at `index`.
    pub fn insert(&mut self, index: usize, item: E) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, item);
        for l in self.added.snapshot() {
            l(index);
        }
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn remove(&mut self, index: usize) -> Result<E> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        let item = self.items.remove(index);
        for l in self.removed.snapshot() {
            l(index);
        }
        Ok(item)
    }

    /// Replace the item at `index`, returning the old one.
    pub fn set(&mut self, index: usize, item: E) -> Result<E> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        let old = mem::replace(slot, item);
        for l in self.changed.snapshot() {
            l(index);
        }
        Ok(old)
    }

    /// Replace every item.
    pub fn replace_all(&mut self, items: Vec<E>) {
        self.items = items;
        for l in self.reset.snapshot() {
            l();
        }
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }
}

impl<E: Clone> ObservableList<E> {
    /// A copy of the items.
    pub fn to_vec(&self) -> Vec<E> {
        self.items.clone()
    }
}
