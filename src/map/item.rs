//! Item: one record of the hierarchy
//!
//! An item is a key plus a value slot; an empty slot is a tombstone. For
//! pointer-like values (`Box`, `&T`, `NonNull`) the empty slot occupies the
//! pointer's niche, so the record costs exactly `size_of::<K>() +
//! size_of::<V>()`; for other value types the slot carries a discriminant
//! byte. Both layouts present the same interface, and no legitimate value
//! can collide with the tombstone encoding.

/// One key→value record; an empty slot marks a deletion
#[derive(Debug)]
pub(crate) struct Item<K, V> {
    key: K,
    slot: Option<V>,
}

impl<K, V> Item<K, V> {
    /// A live record
    pub(crate) fn live(key: K, value: V) -> Self {
        Self {
            key,
            slot: Some(value),
        }
    }

    /// A deletion marker for `key`
    pub(crate) fn tombstone(key: K) -> Self {
        Self { key, slot: None }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    /// The live value, or `None` for a tombstone
    pub(crate) fn value(&self) -> Option<&V> {
        self.slot.as_ref()
    }

    pub(crate) fn is_tombstone(&self) -> bool {
        self.slot.is_none()
    }
}
