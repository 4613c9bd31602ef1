//! Object-store seam for artifact upload
//!
//! The object store is an external collaborator; [`BlobStore`] is the
//! contract the columnar sink path needs from it. [`CloudStore`] is the
//! production implementation, parsing a destination URL into the matching
//! `object_store` backend (S3, GCS, Azure, or the local filesystem).

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;

/// What the columnar sink path needs from an object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store one finalized artifact under `key`.
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Verify the destination exists and is reachable, creating it where
    /// the backend supports that.
    async fn ensure_available(&self) -> Result<()>;
}

/// Object-store destination parsed from a URL.
///
/// Supported forms:
/// - `s3://bucket/` - AWS S3 (credentials from the environment)
/// - `gs://bucket/` - Google Cloud Storage
/// - `az://container/` - Azure Blob Storage
/// - any other value - a local filesystem directory
#[derive(Debug, Clone)]
pub struct CloudStore {
    store: Arc<dyn ObjectStore>,
    scheme: String,
}

impl CloudStore {
    /// Parse a destination URL and create the matching object store.
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(bucket) = url.strip_prefix("s3://") {
            Self::parse_s3(bucket)
        } else if let Some(bucket) = url.strip_prefix("gs://") {
            Self::parse_gcs(bucket)
        } else if let Some(container) = url.strip_prefix("az://") {
            Self::parse_azure(container)
        } else {
            Self::parse_local(url)
        }
    }

    fn parse_s3(bucket: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket.trim_end_matches('/'))
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;
        Ok(Self {
            store: Arc::new(store),
            scheme: "s3".to_string(),
        })
    }

    fn parse_gcs(bucket: &str) -> Result<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.trim_end_matches('/'))
            .build()
            .map_err(|e| Error::config(format!("Failed to create gs client: {e}")))?;
        Ok(Self {
            store: Arc::new(store),
            scheme: "gs".to_string(),
        })
    }

    fn parse_azure(container: &str) -> Result<Self> {
        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container.trim_end_matches('/'))
            .build()
            .map_err(|e| Error::config(format!("Failed to create az client: {e}")))?;
        Ok(Self {
            store: Arc::new(store),
            scheme: "az".to_string(),
        })
    }

    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;
        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            scheme: "file".to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }
}

#[async_trait]
impl BlobStore for CloudStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = ObjectPath::from(key);
        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::upload(key, e))?;
        Ok(())
    }

    async fn ensure_available(&self) -> Result<()> {
        // A bounded list probe: succeeds iff the bucket exists and the
        // credentials can reach it. Empty destinations yield no entries.
        let mut listing = self.store.list(None);
        match listing.next().await {
            None | Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(Error::config(format!(
                "object store unavailable: {e}"
            ))),
        }
    }
}
