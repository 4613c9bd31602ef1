//! Transactional record buffer
//!
//! Accumulates change records per entity type across mutation calls. A
//! commit drains every accumulated type in one step: [`drain_all`] hands
//! the whole map to the caller and leaves the buffer empty, so no observer
//! can see some types cleared and others not.
//!
//! [`drain_all`]: TransactionBuffer::drain_all

use crate::record::Record;
use std::collections::HashMap;
use tracing::debug;

/// Per-entity-type accumulation of buffered change records.
///
/// An entity type that was never appended behaves as an empty sequence.
/// The owning target holds the buffer behind `&mut self`, which is what
/// keeps a new mutation call from interleaving with a commit in progress.
#[derive(Debug, Default)]
pub struct TransactionBuffer {
    pending: HashMap<String, Vec<Record>>,
}

impl TransactionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record for an entity type, creating its sequence on
    /// first use. O(1) amortized.
    pub fn append(&mut self, entity_type: &str, record: Record) {
        self.pending
            .entry(entity_type.to_string())
            .or_default()
            .push(record);
    }

    /// Take the current contents and clear the buffer in one step.
    ///
    /// Records come back in append order within each entity type. A second
    /// drain without intervening appends yields an empty map.
    pub fn drain_all(&mut self) -> HashMap<String, Vec<Record>> {
        let drained = std::mem::take(&mut self.pending);
        if !drained.is_empty() {
            debug!(
                entity_types = drained.len(),
                records = drained.values().map(Vec::len).sum::<usize>(),
                "drained transaction buffer"
            );
        }
        drained
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of records currently buffered for one entity type.
    pub fn buffered(&self, entity_type: &str) -> usize {
        self.pending.get(entity_type).map_or(0, Vec::len)
    }
}
