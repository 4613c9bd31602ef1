//! Configuration for target adapters
//!
//! Targets are configured once at setup and do not re-validate per call.
//! Two entry points exist for each target: a typed struct loadable from
//! YAML, and a raw string parameter map as handed over by a hosting
//! replication engine. Missing required keys surface immediately as setup
//! failures.

use crate::error::{Error, Result};
use crate::metadata::StaticMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Parameter key for the destination bucket.
pub const PARAM_BUCKET: &str = "bucket";
/// Parameter key for the local staging directory.
pub const PARAM_DIRECTORY: &str = "directory";
/// Parameter key for the Kafka properties file.
pub const PARAM_PROPERTIES_FILE: &str = "propertiesFile";

fn default_prefix() -> String {
    "adabas".to_string()
}

fn default_namespace() -> String {
    "com.softwareag.adabas".to_string()
}

// ============================================================================
// Columnar path
// ============================================================================

/// Configuration for the Parquet/object-store target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParquetTargetConfig {
    /// Destination bucket: `s3://name`, `gs://name`, `az://container`, or a
    /// local path.
    pub bucket: String,

    /// Local staging directory for artifacts before upload.
    pub directory: String,

    /// Leading segment of every object key.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Declared namespace carried in every derived schema.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl ParquetTargetConfig {
    /// Build from a raw parameter map. `bucket` and `directory` are
    /// required.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let bucket = params
            .get(PARAM_BUCKET)
            .ok_or_else(|| Error::missing_parameter(PARAM_BUCKET))?
            .clone();
        let directory = params
            .get(PARAM_DIRECTORY)
            .ok_or_else(|| Error::missing_parameter(PARAM_DIRECTORY))?
            .clone();

        Ok(Self {
            bucket,
            directory,
            prefix: params
                .get("prefix")
                .cloned()
                .unwrap_or_else(default_prefix),
            namespace: params
                .get("namespace")
                .cloned()
                .unwrap_or_else(default_namespace),
        })
    }
}

// ============================================================================
// Message path
// ============================================================================

/// Configuration for the Kafka target: producer properties, forwarded
/// verbatim to the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KafkaTargetConfig {
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl KafkaTargetConfig {
    /// Build from a raw parameter map naming a properties file.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let path = params
            .get(PARAM_PROPERTIES_FILE)
            .ok_or_else(|| Error::missing_parameter(PARAM_PROPERTIES_FILE))?;
        Self::from_properties_file(path)
    }

    /// Load producer properties from a YAML mapping of key to value.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let properties: HashMap<String, String> = serde_yaml::from_str(&raw)?;
        Ok(Self { properties })
    }
}

// ============================================================================
// Adapter (host) configuration
// ============================================================================

/// Which sink path an adapter instance drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Parquet,
    Kafka,
}

/// Complete adapter configuration loaded from YAML: the selected target,
/// its settings, and the entity-type metadata available to the schema
/// derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub target: TargetKind,

    #[serde(default)]
    pub parquet: Option<ParquetTargetConfig>,

    #[serde(default)]
    pub kafka: Option<KafkaTargetConfig>,

    #[serde(default)]
    pub metadata: StaticMetadata,
}

impl AdapterConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// The Parquet section, required when the target kind selects it.
    pub fn parquet(&self) -> Result<&ParquetTargetConfig> {
        self.parquet
            .as_ref()
            .ok_or_else(|| Error::config("target is 'parquet' but no parquet section is present"))
    }

    /// The Kafka section, required when the target kind selects it.
    pub fn kafka(&self) -> Result<&KafkaTargetConfig> {
        self.kafka
            .as_ref()
            .ok_or_else(|| Error::config("target is 'kafka' but no kafka section is present"))
    }
}
