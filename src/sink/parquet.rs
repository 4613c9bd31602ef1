//! Columnar sink path: Parquet artifacts uploaded to an object store
//!
//! Mutation calls buffer records per entity type; a commit drains the
//! buffer, projects each type against its derived schema, writes one
//! Snappy-compressed Parquet artifact in the staging directory, and uploads
//! it. An artifact-write or upload failure is unrecoverable: the drained
//! records are gone, so the error is fatal and the host is expected to
//! terminate.

use crate::buffer::TransactionBuffer;
use crate::config::{ParquetTargetConfig, PARAM_BUCKET, PARAM_DIRECTORY};
use crate::error::{Error, Result};
use crate::metadata::MetadataProvider;
use crate::project::{project, rows_to_batch};
use crate::record::Record;
use crate::schema::SchemaCatalog;
use crate::sink::store::{BlobStore, CloudStore};
use crate::sink::{Operation, ParameterKind, ParameterSpec, Target};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Parquet/object-store target adapter.
pub struct ParquetTarget {
    config: ParquetTargetConfig,
    metadata: Arc<dyn MetadataProvider>,
    store: Arc<dyn BlobStore>,
    catalog: SchemaCatalog,
    buffer: TransactionBuffer,
}

impl std::fmt::Debug for ParquetTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetTarget")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ParquetTarget {
    pub fn new(
        config: ParquetTargetConfig,
        metadata: Arc<dyn MetadataProvider>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        let catalog = SchemaCatalog::new(&config.namespace);
        Self {
            config,
            metadata,
            store,
            catalog,
            buffer: TransactionBuffer::new(),
        }
    }

    /// Set up from a raw parameter map, connecting the store named by the
    /// `bucket` parameter.
    pub fn from_params(
        params: &std::collections::HashMap<String, String>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Result<Self> {
        let config = ParquetTargetConfig::from_params(params)?;
        let store = Arc::new(CloudStore::parse(&config.bucket)?);
        Ok(Self::new(config, metadata, store))
    }

    /// Number of records currently buffered for one entity type.
    pub fn buffered(&self, entity_type: &str) -> usize {
        self.buffer.buffered(entity_type)
    }

    async fn flush_entity(&mut self, entity_type: &str, records: Vec<Record>) -> Result<()> {
        let schema = self
            .catalog
            .schema_for(entity_type, self.metadata.as_ref())?;

        // Projection runs to completion before any artifact exists, so a
        // bad record aborts this type's flush with nothing on disk and
        // nothing uploaded.
        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            rows.push(project(record, &schema)?);
        }
        let batch = rows_to_batch(&schema, &rows)?;

        let artifact = format!("p{}.parquet", Utc::now().timestamp_millis());
        let staging = PathBuf::from(&self.config.directory).join(&artifact);
        std::fs::create_dir_all(&self.config.directory)
            .map_err(|e| Error::artifact(&self.config.directory, e))?;
        write_artifact(&staging, &schema, &batch)?;

        let data = std::fs::read(&staging)
            .map_err(|e| Error::artifact(staging.display(), e))?;
        let key = format!(
            "{}/{}/{}",
            self.config.prefix,
            entity_type.to_lowercase(),
            artifact
        );
        self.store.put(&key, Bytes::from(data)).await?;

        info!(entity_type, rows = batch.num_rows(), key = %key, "uploaded artifact");
        Ok(())
    }
}

/// Write one batch into a Parquet file at `path`.
///
/// Open, write, and close are one scoped acquisition: on any failure the
/// half-written file is removed before the error is returned, so a file
/// that exists is always a finalized artifact.
fn write_artifact(path: &Path, schema: &Arc<Schema>, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::artifact(path.display(), e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = match ArrowWriter::try_new(file, Arc::clone(schema), Some(props)) {
        Ok(writer) => writer,
        Err(e) => {
            let _ = std::fs::remove_file(path);
            return Err(Error::artifact(path.display(), e));
        }
    };

    let result = match writer.write(batch) {
        Ok(()) => writer.close().map(drop),
        Err(e) => {
            drop(writer);
            Err(e)
        }
    };
    if let Err(e) = result {
        let _ = std::fs::remove_file(path);
        return Err(Error::artifact(path.display(), e));
    }
    Ok(())
}

#[async_trait]
impl Target for ParquetTarget {
    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::new(PARAM_BUCKET, "Bucket-Name", ParameterKind::Text),
            ParameterSpec::new(PARAM_DIRECTORY, "Directory", ParameterKind::Directory),
        ]
    }

    async fn on_mutation(
        &mut self,
        op: Operation,
        entity_type: &str,
        record: Record,
    ) -> Result<()> {
        debug!(%op, entity_type, "buffering change record");
        self.buffer.append(entity_type, record);
        Ok(())
    }

    async fn on_commit(&mut self, transaction_id: &str) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        debug!(transaction_id, "flushing buffered entity types");
        for (entity_type, records) in self.buffer.drain_all() {
            self.flush_entity(&entity_type, records).await?;
        }
        Ok(())
    }

    async fn is_service_okay(&self) -> bool {
        if let Err(e) = std::fs::create_dir_all(&self.config.directory) {
            warn!(directory = %self.config.directory, error = %e, "staging directory unusable");
            return false;
        }
        match self.store.ensure_available().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "object store unavailable");
                false
            }
        }
    }
}
