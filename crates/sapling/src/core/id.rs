//! Node handles.
//!
//! Nodes live in the [`Core`](crate::Core) arena and are addressed by
//! [`NodeId`]. A handle outlives its node: once the node is disposed, lookups
//! through the handle fail with `Error::Disposed` instead of reaching a reused
//! slot.

use std::{
    any::type_name,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use slotmap::new_key_type;

new_key_type! {
    /// A node in the arena. Versioned, so stale handles never alias.
    pub struct NodeId;
}

/// A [`NodeId`] that remembers the widget type it was created with.
///
/// `with_widget` and the typed widget APIs take these so the widget type does
/// not have to be restated. Comparison and hashing ignore `W`.
pub struct TypedId<W> {
    /// The node.
    id: NodeId,
    /// Widget type.
    widget: PhantomData<fn() -> W>,
}

impl<W> TypedId<W> {
    /// Tag `id` as holding a `W`. The caller vouches for the widget type.
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            widget: PhantomData,
        }
    }

    /// The untagged node.
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<W> Clone for TypedId<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for TypedId<W> {}

impl<W> PartialEq for TypedId<W> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<W> Eq for TypedId<W> {}

impl<W> PartialEq<NodeId> for TypedId<W> {
    fn eq(&self, other: &NodeId) -> bool {
        self.id == *other
    }
}

impl<W> Hash for TypedId<W> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<W> fmt::Debug for TypedId<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedId<{}>({:?})", type_name::<W>(), self.id)
    }
}

impl<W> From<TypedId<W>> for NodeId {
    fn from(value: TypedId<W>) -> Self {
        value.id
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    #[test]
    fn typed_ids_compare_by_node() {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        let a = arena.insert(());
        let b = arena.insert(());
        let ta: TypedId<u8> = TypedId::new(a);
        assert_eq!(ta, TypedId::new(a));
        assert_ne!(ta, TypedId::new(b));
        assert!(ta == a);
        assert_eq!(NodeId::from(ta), a);
        assert!(format!("{ta:?}").starts_with("TypedId<u8>"));
    }

    #[test]
    fn stale_ids_do_not_alias() {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        let a = arena.insert(());
        arena.remove(a);
        let b = arena.insert(());
        assert_ne!(a, b);
        assert!(!arena.contains_key(a));
    }
}
