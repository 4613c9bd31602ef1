//! Per-entity-type schema cache

use crate::error::Result;
use crate::metadata::MetadataProvider;
use crate::record::IDENTITY_FIELD;
use crate::schema::mapper;
use arrow::datatypes::{DataType, Field, Schema};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Arrow schema metadata key carrying the declared record name.
pub const RECORD_NAME_KEY: &str = "record.name";
/// Arrow schema metadata key carrying the declared record namespace.
pub const RECORD_NAMESPACE_KEY: &str = "record.namespace";

/// Derives and caches one Arrow schema per entity type.
///
/// The cache lives for the catalog's lifetime and is never invalidated:
/// identical entity types always yield the same schema object. Each target
/// owns its own catalog, so two targets in one process cannot share or
/// corrupt each other's cache.
#[derive(Debug)]
pub struct SchemaCatalog {
    namespace: String,
    cache: HashMap<String, Arc<Schema>>,
}

impl SchemaCatalog {
    /// Create an empty catalog. The namespace is format plumbing carried in
    /// every derived schema's metadata, not business data.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            cache: HashMap::new(),
        }
    }

    /// The schema for one entity type, derived on first use.
    ///
    /// The identity field comes first with a fixed 64-bit integer type,
    /// never sourced from metadata. Every mapped metadata field follows in
    /// the metadata service's reported order, nullable. Unmapped fields are
    /// absent.
    pub fn schema_for(
        &mut self,
        entity_type: &str,
        metadata: &dyn MetadataProvider,
    ) -> Result<Arc<Schema>> {
        if let Some(schema) = self.cache.get(entity_type) {
            return Ok(Arc::clone(schema));
        }

        let descriptors = metadata.fields_of(entity_type)?;
        let mut fields = vec![Field::new(IDENTITY_FIELD, DataType::Int64, false)];
        for descriptor in &descriptors {
            if let Some(data_type) = mapper::arrow_type(descriptor) {
                fields.push(Field::new(&descriptor.name, data_type, true));
            }
        }

        let mut schema_metadata = HashMap::new();
        schema_metadata.insert(RECORD_NAME_KEY.to_string(), entity_type.to_string());
        schema_metadata.insert(RECORD_NAMESPACE_KEY.to_string(), self.namespace.clone());

        let schema = Arc::new(Schema::new_with_metadata(fields, schema_metadata));
        debug!(
            entity_type,
            fields = schema.fields().len(),
            "derived columnar schema"
        );
        self.cache.insert(entity_type.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.cache.contains_key(entity_type)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
