//! Snapshot slots, their cache, and the output document.

mod cache;
mod emitter;
mod slot;

pub use cache::{CachedSlot, SnapshotCache};
pub use emitter::{document, render, OutputEmitter, ABSENT_SLOT};
pub use slot::{Slot, SlotValue, DISABLED_MARKER};
