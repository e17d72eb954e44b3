//! Token-keyed document output.
//!
//! Each emission is one line of JSON: an object whose keys are the seven
//! placeholder tokens and whose values are strings, each holding that
//! slot's own JSON text. Hosts decode every value a second time. Slots that
//! were never computed publish `{}`.

use std::io::Write;

use serde_json::{Map, Value};

use super::cache::SnapshotCache;
use super::slot::{Slot, SlotValue};

/// Encoded value of a slot that has never been computed.
pub const ABSENT_SLOT: &str = "{}";

/// Build the token map for `cache`.
#[must_use]
pub fn document(cache: &SnapshotCache) -> Map<String, Value> {
    Slot::ALL
        .iter()
        .map(|&slot| {
            let encoded = cache
                .value(slot)
                .map_or_else(|| ABSENT_SLOT.to_string(), SlotValue::encode);
            (slot.token().to_string(), Value::String(encoded))
        })
        .collect()
}

/// Render `cache` as a single line.
#[must_use]
pub fn render(cache: &SnapshotCache) -> String {
    Value::Object(document(cache)).to_string()
}

/// Writes snapshot documents to the primary output stream.
#[derive(Debug)]
pub struct OutputEmitter<W: Write> {
    out: W,
    emissions: usize,
}

impl<W: Write> OutputEmitter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out, emissions: 0 }
    }

    /// Write one document line and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn emit(&mut self, cache: &SnapshotCache) -> std::io::Result<()> {
        let mut line = render(cache);
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        self.emissions += 1;
        tracing::debug!(
            emission = self.emissions,
            populated = cache.populated(),
            bytes = line.len(),
            "Snapshot emitted"
        );
        Ok(())
    }

    /// Emit the disabled marker in every slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn emit_disabled(&mut self) -> std::io::Result<()> {
        self.emit(&SnapshotCache::filled(&SlotValue::Disabled))
    }

    /// Emit the same error in every slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream cannot be written.
    pub fn emit_failure(&mut self, message: &str) -> std::io::Result<()> {
        self.emit(&SnapshotCache::filled(&SlotValue::error(message)))
    }

    /// Number of documents written so far.
    #[must_use]
    pub fn emissions(&self) -> usize {
        self.emissions
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}
