//! Latest value of every slot.

use chrono::{DateTime, Utc};

use super::slot::{Slot, SlotValue};

/// A slot value with the time it was merged.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSlot {
    pub value: SlotValue,
    pub updated_at: DateTime<Utc>,
}

/// Holds the most recent value of each slot.
///
/// Owned by the single task that drives recomputes, so merges need no
/// locking. A merge replaces the whole slot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    slots: [Option<CachedSlot>; Slot::COUNT],
}

impl SnapshotCache {
    /// Create a cache with every slot absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with every slot set to `value`.
    #[must_use]
    pub fn filled(value: &SlotValue) -> Self {
        let mut cache = Self::new();
        for slot in Slot::ALL {
            cache.merge(slot, value.clone());
        }
        cache
    }

    /// Replace the value of `slot`.
    pub fn merge(&mut self, slot: Slot, value: SlotValue) {
        tracing::trace!(slot = %slot, error = value.is_error(), "Slot updated");
        self.slots[slot.index()] = Some(CachedSlot {
            value,
            updated_at: Utc::now(),
        });
    }

    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<&CachedSlot> {
        self.slots[slot.index()].as_ref()
    }

    #[must_use]
    pub fn value(&self, slot: Slot) -> Option<&SlotValue> {
        self.get(slot).map(|cached| &cached.value)
    }

    #[must_use]
    pub fn updated_at(&self, slot: Slot) -> Option<DateTime<Utc>> {
        self.get(slot).map(|cached| cached.updated_at)
    }

    /// Number of slots holding a value.
    #[must_use]
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
