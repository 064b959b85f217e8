//! Collection pages and parent scoping.

use super::{EntityId, EntityType};

/// One window of a collection, as returned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<E> {
    /// The items in storage order.
    pub items: Vec<E>,
    /// Number of matching items before `$top`/`$skip` were applied.
    pub total_count: u64,
}

impl<E> Page<E> {
    /// Creates a page.
    pub fn new(items: Vec<E>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    /// Creates an empty page.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Maps each item, keeping the total count.
    pub fn map<F, T>(self, f: F) -> Page<T>
    where
        F: FnMut(E) -> T,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}

/// The entity a child collection is navigated from, e.g. `Datastreams(7)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentRef {
    /// The parent's type.
    pub entity_type: EntityType,
    /// The parent's id.
    pub id: EntityId,
}

impl ParentRef {
    /// Creates a parent reference.
    pub fn new(entity_type: EntityType, id: EntityId) -> Self {
        Self { entity_type, id }
    }
}

impl std::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.entity_type.collection_name(), self.id)
    }
}
