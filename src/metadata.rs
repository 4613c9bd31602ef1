//! Field metadata for replicated entity types
//!
//! The metadata service is an external collaborator: given an entity type
//! name it returns the ordered field descriptors the schema derivation works
//! from. This module defines the descriptor model, the [`MetadataProvider`]
//! seam, and a config-backed provider used by the replay tooling and tests.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logical format of a field as reported by the metadata service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    String,
    Integer,
    Decimal,
    Float,
    Binary,
    Date,
}

/// Whether a field holds one value or an ordered sequence of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    #[default]
    Single,
    Repeating,
}

/// One field descriptor sourced from the metadata service.
///
/// Immutable for the process lifetime; cached only in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub format: FieldFormat,
    #[serde(default)]
    pub multiplicity: Multiplicity,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, format: FieldFormat) -> Self {
        Self {
            name: name.into(),
            format,
            multiplicity: Multiplicity::Single,
        }
    }

    pub fn repeating(name: impl Into<String>, format: FieldFormat) -> Self {
        Self {
            name: name.into(),
            format,
            multiplicity: Multiplicity::Repeating,
        }
    }
}

/// The metadata collaborator contract.
pub trait MetadataProvider: Send + Sync {
    /// Ordered field descriptors for one entity type.
    fn fields_of(&self, entity_type: &str) -> Result<Vec<FieldDescriptor>>;
}

/// A provider backed by a static map, declared in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticMetadata {
    entities: HashMap<String, Vec<FieldDescriptor>>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the field descriptors for one entity type.
    pub fn insert(
        &mut self,
        entity_type: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) {
        self.entities
            .insert(entity_type.into(), fields.into_iter().collect());
    }

    #[must_use]
    pub fn with(
        mut self,
        entity_type: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Self {
        self.insert(entity_type, fields);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl MetadataProvider for StaticMetadata {
    fn fields_of(&self, entity_type: &str) -> Result<Vec<FieldDescriptor>> {
        self.entities
            .get(entity_type)
            .cloned()
            .ok_or_else(|| Error::metadata(entity_type, "unknown entity type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_metadata_lookup() {
        let metadata = StaticMetadata::new().with(
            "EMPL",
            [
                FieldDescriptor::new("NAME", FieldFormat::String),
                FieldDescriptor::repeating("LANG", FieldFormat::String),
            ],
        );

        let fields = metadata.fields_of("EMPL").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "NAME");
        assert_eq!(fields[1].multiplicity, Multiplicity::Repeating);

        assert!(metadata.fields_of("VEHI").is_err());
    }

    #[test]
    fn test_descriptor_yaml_round_trip() {
        let yaml = "name: SALARY\nformat: decimal\nmultiplicity: repeating\n";
        let field: FieldDescriptor = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(field.name, "SALARY");
        assert_eq!(field.format, FieldFormat::Decimal);
        assert_eq!(field.multiplicity, Multiplicity::Repeating);
    }

    #[test]
    fn test_descriptor_multiplicity_defaults_to_single() {
        let field: FieldDescriptor =
            serde_yaml::from_str("name: NAME\nformat: string\n").unwrap();
        assert_eq!(field.multiplicity, Multiplicity::Single);
    }
}
