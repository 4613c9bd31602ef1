//! Tests for the sink targets

use super::*;
use crate::config::{KafkaTargetConfig, ParquetTargetConfig};
use crate::error::{Error, Result};
use crate::metadata::{FieldDescriptor, FieldFormat, MetadataProvider, StaticMetadata};
use crate::record::{Record, Value};
use arrow::array::{Array, Int64Array, ListArray, StringArray};
use async_trait::async_trait;
use bytes::Bytes;
use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test doubles
// ============================================================================

/// Records every upload; optionally fails them all.
#[derive(Default)]
struct RecordingStore {
    puts: Mutex<Vec<(String, Bytes)>>,
    fail_puts: bool,
}

impl RecordingStore {
    fn failing() -> Self {
        Self {
            puts: Mutex::new(Vec::new()),
            fail_puts: true,
        }
    }

    fn keys(&self) -> Vec<String> {
        self.puts
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl BlobStore for RecordingStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        if self.fail_puts {
            return Err(Error::upload(key, "simulated outage"));
        }
        self.puts.lock().unwrap().push((key.to_string(), data));
        Ok(())
    }

    async fn ensure_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Counts metadata lookups to prove empty commits touch nothing.
struct CountingMetadata {
    inner: StaticMetadata,
    calls: AtomicUsize,
}

impl CountingMetadata {
    fn new(inner: StaticMetadata) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MetadataProvider for CountingMetadata {
    fn fields_of(&self, entity_type: &str) -> Result<Vec<FieldDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fields_of(entity_type)
    }
}

fn empl_metadata() -> StaticMetadata {
    StaticMetadata::new().with(
        "EMPL",
        [
            FieldDescriptor::new("NAME", FieldFormat::String),
            FieldDescriptor::repeating("LANG", FieldFormat::String),
        ],
    )
}

fn target_with(
    store: Arc<RecordingStore>,
    metadata: Arc<dyn MetadataProvider>,
    staging: &std::path::Path,
) -> ParquetTarget {
    let config = ParquetTargetConfig {
        bucket: "unused://".to_string(),
        directory: staging.to_string_lossy().into_owned(),
        prefix: "adabas".to_string(),
        namespace: "com.softwareag.adabas".to_string(),
    };
    ParquetTarget::new(config, metadata, store)
}

fn empl(isn: i64, name: &str) -> Record {
    Record::with_identity(isn).with("NAME", Value::text(name))
}

// ============================================================================
// Columnar path
// ============================================================================

#[tokio::test]
async fn test_commit_uploads_one_artifact_per_entity_type() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::default());
    let mut target = target_with(store.clone(), Arc::new(empl_metadata()), staging.path());

    target
        .on_mutation(Operation::Populate, "EMPL", empl(1, "Mustermann"))
        .await
        .unwrap();
    target
        .on_mutation(Operation::Populate, "EMPL", empl(2, "Meier"))
        .await
        .unwrap();
    target.on_commit("tx-1").await.unwrap();

    let keys = store.keys();
    assert_eq!(keys.len(), 1);
    assert!(
        keys[0].starts_with("adabas/empl/p") && keys[0].ends_with(".parquet"),
        "unexpected key: {}",
        keys[0]
    );
    assert_eq!(target.buffered("EMPL"), 0);
}

#[tokio::test]
async fn test_uploaded_artifact_contains_projected_rows() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::default());
    let mut target = target_with(store.clone(), Arc::new(empl_metadata()), staging.path());

    let record = empl(42, "Mustermann").with("LANG", Value::texts(["GER", "ENG"]));
    target
        .on_mutation(Operation::Populate, "EMPL", record)
        .await
        .unwrap();
    target.on_commit("tx-1").await.unwrap();

    let (_, data) = store.puts.lock().unwrap()[0].clone();
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
    assert_eq!(batches.len(), 1);

    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 1);

    let isn = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(isn.value(0), 42);

    let name = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(name.value(0), "Mustermann");

    let langs = batch
        .column(2)
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    let first = langs.value(0);
    let first = first.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(first.value(0), "GER");
    assert_eq!(first.value(1), "ENG");
}

#[tokio::test]
async fn test_empty_commit_is_a_no_op() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::default());
    let metadata = Arc::new(CountingMetadata::new(empl_metadata()));
    let mut target = target_with(store.clone(), metadata.clone(), staging.path());

    target.on_commit("tx-1").await.unwrap();

    assert!(store.keys().is_empty());
    assert_eq!(metadata.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_projection_failure_aborts_flush_before_upload() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::default());
    let mut target = target_with(store.clone(), Arc::new(empl_metadata()), staging.path());

    target
        .on_mutation(Operation::Populate, "EMPL", empl(1, "a"))
        .await
        .unwrap();
    target
        .on_mutation(Operation::Populate, "EMPL", empl(2, "b"))
        .await
        .unwrap();
    // The third record cannot be projected: NAME is a group
    let bad = Record::with_identity(3).with("NAME", Value::groups([Record::new()]));
    target
        .on_mutation(Operation::Populate, "EMPL", bad)
        .await
        .unwrap();

    let err = target.on_commit("tx-1").await.unwrap_err();
    assert!(matches!(err, Error::Projection { .. }));
    assert!(!err.is_fatal());

    // Nothing was uploaded and no partial artifact is left behind
    assert!(store.keys().is_empty());
    let leftovers: Vec<_> = std::fs::read_dir(staging.path()).unwrap().collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_fatal() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::failing());
    let mut target = target_with(store, Arc::new(empl_metadata()), staging.path());

    target
        .on_mutation(Operation::Populate, "EMPL", empl(1, "a"))
        .await
        .unwrap();

    let err = target.on_commit("tx-1").await.unwrap_err();
    assert!(matches!(err, Error::Upload { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_each_entity_type_gets_its_own_artifact() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::default());
    let metadata = empl_metadata().with(
        "VEHI",
        [FieldDescriptor::new("MODEL", FieldFormat::String)],
    );
    let mut target = target_with(store.clone(), Arc::new(metadata), staging.path());

    target
        .on_mutation(Operation::Populate, "EMPL", empl(1, "a"))
        .await
        .unwrap();
    target
        .on_mutation(
            Operation::Populate,
            "VEHI",
            Record::with_identity(2).with("MODEL", Value::text("T3")),
        )
        .await
        .unwrap();
    target.on_commit("tx-1").await.unwrap();

    let mut keys = store.keys();
    keys.sort();
    assert_eq!(keys.len(), 2);
    assert!(keys[0].starts_with("adabas/empl/"));
    assert!(keys[1].starts_with("adabas/vehi/"));
}

#[tokio::test]
async fn test_parquet_target_from_params() {
    let staging = tempfile::tempdir().unwrap();
    let bucket = tempfile::tempdir().unwrap();

    let mut params = std::collections::HashMap::new();
    params.insert(
        "bucket".to_string(),
        bucket.path().to_string_lossy().into_owned(),
    );
    params.insert(
        "directory".to_string(),
        staging.path().to_string_lossy().into_owned(),
    );

    let target = ParquetTarget::from_params(&params, Arc::new(empl_metadata())).unwrap();
    assert!(target.is_service_okay().await);

    params.remove("bucket");
    let err = ParquetTarget::from_params(&params, Arc::new(empl_metadata())).unwrap_err();
    assert!(matches!(err, Error::MissingParameter { .. }));
}

#[tokio::test]
async fn test_parquet_target_parameters() {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::default());
    let target = target_with(store, Arc::new(empl_metadata()), staging.path());

    let params = target.parameters();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].key, "bucket");
    assert_eq!(params[1].kind, ParameterKind::Directory);
}

// ============================================================================
// Message path
// ============================================================================

#[test]
fn test_message_payload_shape() {
    let record = Record::with_identity(42)
        .with("NAME", Value::text("Mustermann"))
        .with("LANG", Value::texts(["GER", "ENG"]));

    let payload = kafka::message_payload(Operation::Update, &record).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&payload).unwrap();

    assert_eq!(parsed["method"], "Update");
    assert_eq!(parsed["data"]["ISN"], 42);
    assert!(parsed["data"]["ISN"].is_i64());
    assert_eq!(parsed["data"]["NAME"], "Mustermann");
    assert_eq!(parsed["data"]["LANG"], serde_json::json!(["GER", "ENG"]));
    // Bodies are pretty-printed
    assert!(payload.contains('\n'));
}

#[test]
fn test_message_key_follows_identity() {
    assert_eq!(
        kafka::message_key(&Record::with_identity(42)),
        Some("42".to_string())
    );
    assert_eq!(kafka::message_key(&Record::new()), None);
}

#[test]
fn test_kafka_target_from_params() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("producer.yaml");
    std::fs::write(&path, "bootstrap.servers: localhost:9092\n").unwrap();

    let mut params = std::collections::HashMap::new();
    params.insert(
        "propertiesFile".to_string(),
        path.to_string_lossy().into_owned(),
    );

    let target = KafkaTarget::from_params(&params).unwrap();
    assert_eq!(target.queued(), 0);
    assert_eq!(target.parameters()[0].key, "propertiesFile");
}

#[test]
fn test_kafka_target_requires_bootstrap_servers() {
    let err = KafkaTarget::new(&KafkaTargetConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MissingParameter { ref key } if key == "bootstrap.servers"));
}

#[tokio::test]
async fn test_kafka_target_queues_per_mutation_and_drains_on_commit() {
    let mut properties = std::collections::HashMap::new();
    properties.insert("bootstrap.servers".to_string(), "localhost:9092".to_string());
    properties.insert("message.timeout.ms".to_string(), "100".to_string());
    let mut target = KafkaTarget::new(&KafkaTargetConfig { properties }).unwrap();

    target
        .on_mutation(Operation::Create, "EMPL", empl(1, "a"))
        .await
        .unwrap();
    target
        .on_mutation(Operation::Delete, "EMPL", empl(2, "b"))
        .await
        .unwrap();
    assert_eq!(target.queued(), 2);

    // Submission succeeds with no broker; delivery outcomes are log-only
    target.on_commit("tx-1").await.unwrap();
    assert_eq!(target.queued(), 0);
}

// ============================================================================
// Operation parsing
// ============================================================================

#[test]
fn test_operation_round_trip() {
    for (text, op) in [
        ("create", Operation::Create),
        ("delete", Operation::Delete),
        ("insert", Operation::Insert),
        ("update", Operation::Update),
        ("populate", Operation::Populate),
    ] {
        assert_eq!(text.parse::<Operation>().unwrap(), op);
    }
    assert_eq!(Operation::Populate.to_string(), "Populate");
    assert!("truncate".parse::<Operation>().is_err());
}
