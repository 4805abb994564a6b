/// The set of selected items in a list.
///
/// Items are compared by value. Selection order is preserved, and an item
/// is never selected twice.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<E> {
    /// Selected items, in selection order.
    selected: Vec<E>,
}

impl<E> Default for Selection<E> {
    fn default() -> Self {
        Self {
            selected: Vec::new(),
        }
    }
}

impl<E: PartialEq> Selection<E> {
    /// True if `item` is selected.
    pub fn is_selected(&self, item: &E) -> bool {
        self.selected.contains(item)
    }

    /// The selected items.
    pub fn selected(&self) -> &[E] {
        &self.selected
    }

    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Select an item. Returns false if it was already selected.
    pub fn select(&mut self, item: E) -> bool {
        if self.is_selected(&item) {
            return false;
        }
        self.selected.push(item);
        true
    }

    /// Deselect an item. Returns false if it was not selected.
    pub fn deselect(&mut self, item: &E) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != item);
        before != self.selected.len()
    }

    /// Flip the selection state of an item. Returns the new state.
    pub fn toggle(&mut self, item: E) -> bool {
        if self.deselect(&item) {
            false
        } else {
            self.selected.push(item);
            true
        }
    }

    /// Replace the selection.
    pub fn set_selected(&mut self, items: Vec<E>) {
        self.selected.clear();
        for item in items {
            self.select(item);
        }
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop selected items that do not appear in `data`. Returns true if
    /// anything was deselected.
    pub fn deselect_not_containing(&mut self, data: &[Option<E>]) -> bool {
        let before = self.selected.len();
        self.selected
            .retain(|s| data.iter().any(|d| d.as_ref() == Some(s)));
        before != self.selected.len()
    }
}
