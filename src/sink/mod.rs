//! Sink targets
//!
//! The [`Target`] trait is the inbound contract a change-capture source
//! drives: one call per change event, one commit call per transaction. Two
//! concrete targets exist: [`ParquetTarget`] streams buffered records into
//! compressed Parquet artifacts and uploads them to an object store, and
//! [`KafkaTarget`] produces one nested JSON message per change event.

mod kafka;
mod parquet;
mod store;

pub use kafka::KafkaTarget;
pub use parquet::ParquetTarget;
pub use store::{BlobStore, CloudStore};

use crate::error::Result;
use crate::record::Record;
use async_trait::async_trait;

/// The kind of change a mutation call carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    Insert,
    Update,
    Populate,
}

impl Operation {
    /// Display form, used as the message-path method tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Delete => "Delete",
            Operation::Insert => "Insert",
            Operation::Update => "Update",
            Operation::Populate => "Populate",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "delete" => Ok(Operation::Delete),
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "populate" => Ok(Operation::Populate),
            other => Err(crate::error::Error::config(format!(
                "unknown operation kind: {other}"
            ))),
        }
    }
}

/// Kind of a setup parameter, for hosting engines that render a setup UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Text,
    Directory,
    File,
}

/// One declared setup parameter.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParameterKind,
}

impl ParameterSpec {
    pub const fn new(key: &'static str, label: &'static str, kind: ParameterKind) -> Self {
        Self { key, label, kind }
    }
}

/// A change-capture target adapter.
///
/// Callers serialize mutation and commit calls per replication stream; the
/// `&mut self` receivers make a second commit for the same target
/// impossible while one is in flight.
#[async_trait]
pub trait Target: Send + Sync {
    /// Setup parameters this target accepts.
    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    /// Handle one change event.
    async fn on_mutation(
        &mut self,
        op: Operation,
        entity_type: &str,
        record: Record,
    ) -> Result<()>;

    /// Flush everything accumulated for one transaction.
    async fn on_commit(&mut self, transaction_id: &str) -> Result<()>;

    /// Whether the downstream service is reachable and usable.
    async fn is_service_okay(&self) -> bool {
        true
    }

    /// Release held resources, waiting out pending deliveries.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
