// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # adasink
//!
//! A minimal, Rust-native toolkit for building change-capture target
//! adapters: sinks that receive one hierarchical record per change event,
//! buffer them per entity type across a unit of work, and deliver them on
//! commit.
//!
//! ## Features
//!
//! - **Columnar path**: derive an Arrow schema from runtime metadata,
//!   project buffered records into Snappy-compressed Parquet artifacts, and
//!   upload them to an object store (S3, GCS, Azure, local)
//! - **Message path**: project each record into a nested JSON message and
//!   produce it to the entity type's Kafka topic, keyed by identity
//! - **Transactional buffering**: per-entity-type accumulation with an
//!   atomic all-or-nothing drain on commit
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adasink::config::AdapterConfig;
//! use adasink::sink::{CloudStore, Operation, ParquetTarget, Target};
//! use adasink::{Record, Value};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> adasink::Result<()> {
//!     let config = AdapterConfig::from_yaml_file("adasink.yaml")?;
//!     let parquet = config.parquet()?.clone();
//!     let store = Arc::new(CloudStore::parse(&parquet.bucket)?);
//!     let mut target = ParquetTarget::new(parquet, Arc::new(config.metadata.clone()), store);
//!
//!     // One call per captured change event
//!     let record = Record::with_identity(42).with("NAME", Value::text("Mustermann"));
//!     target.on_mutation(Operation::Populate, "EMPL", record).await?;
//!
//!     // One commit per transaction
//!     target.on_commit("tx-1").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Target Interface                         │
//! │   on_mutation(op, type, record)      on_commit(transaction)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬────────────┬──────┴───────┬────────────┬─────────────┐
//! │ Metadata │   Schema   │  Projection  │   Buffer   │    Sink     │
//! ├──────────┼────────────┼──────────────┼────────────┼─────────────┤
//! │ Fields   │ Arrow      │ Flat row     │ Per-type   │ Parquet+S3  │
//! │ Formats  │ Cached     │ JSON tree    │ Atomic     │ Kafka       │
//! └──────────┴────────────┴──────────────┴────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the toolkit
pub mod error;

/// The hierarchical change record model
pub mod record;

/// Field metadata and the metadata-service seam
pub mod metadata;

/// Columnar schema derivation and caching
pub mod schema;

/// Row and tree projection
pub mod project;

/// Transactional record buffer
pub mod buffer;

/// Sink targets (Parquet/object store, Kafka)
pub mod sink;

/// Configuration types and loading
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use record::{Record, Scalar, Value, IDENTITY_FIELD};
pub use sink::{Operation, Target};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
