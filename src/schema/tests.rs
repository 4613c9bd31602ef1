//! Tests for schema derivation

use super::*;
use crate::metadata::{FieldDescriptor, FieldFormat, StaticMetadata};
use crate::project::Cell;
use crate::record::{Scalar, IDENTITY_FIELD};
use crate::schema::catalog::{RECORD_NAME_KEY, RECORD_NAMESPACE_KEY};
use arrow::datatypes::DataType;
use std::sync::Arc;
use test_case::test_case;

fn empl_metadata() -> StaticMetadata {
    StaticMetadata::new().with(
        "EMPL",
        [
            FieldDescriptor::new("NAME", FieldFormat::String),
            FieldDescriptor::new("SALARY", FieldFormat::Decimal),
            FieldDescriptor::repeating("LANG", FieldFormat::String),
            FieldDescriptor::new("BIRTH", FieldFormat::Date),
        ],
    )
}

// ============================================================================
// Field Mapper Tests
// ============================================================================

#[test_case(FieldFormat::String => DataType::Utf8; "string maps to utf8")]
#[test_case(FieldFormat::Integer => DataType::Int64; "integer maps to int64")]
#[test_case(FieldFormat::Decimal => DataType::Int64; "decimal maps to int64")]
#[test_case(FieldFormat::Float => DataType::Float64; "float maps to float64")]
#[test_case(FieldFormat::Binary => DataType::Binary; "binary maps to bytes")]
fn test_arrow_type_single(format: FieldFormat) -> DataType {
    arrow_type(&FieldDescriptor::new("F", format)).unwrap()
}

#[test]
fn test_arrow_type_date_is_unmapped() {
    assert!(arrow_type(&FieldDescriptor::new("BIRTH", FieldFormat::Date)).is_none());
}

#[test]
fn test_arrow_type_repeating_wraps_in_list() {
    let mapped = arrow_type(&FieldDescriptor::repeating("LANG", FieldFormat::String)).unwrap();
    match mapped {
        DataType::List(item) => assert_eq!(item.data_type(), &DataType::Utf8),
        other => panic!("expected a list type, got {other}"),
    }
}

#[test]
fn test_default_cells() {
    assert_eq!(
        default_cell(&DataType::Int64),
        Cell::Single(Scalar::Integer(0))
    );
    assert_eq!(
        default_cell(&DataType::Float64),
        Cell::Single(Scalar::Float(0.0))
    );
    assert_eq!(
        default_cell(&DataType::Binary),
        Cell::Single(Scalar::Binary(vec![0]))
    );
    assert_eq!(
        default_cell(&DataType::Utf8),
        Cell::Single(Scalar::Text(String::new()))
    );

    let list_type = arrow_type(&FieldDescriptor::repeating("LANG", FieldFormat::String)).unwrap();
    assert_eq!(default_cell(&list_type), Cell::List(Vec::new()));
}

// ============================================================================
// Schema Catalog Tests
// ============================================================================

#[test]
fn test_identity_field_is_always_first() {
    let mut catalog = SchemaCatalog::new("com.softwareag.adabas");
    let schema = catalog.schema_for("EMPL", &empl_metadata()).unwrap();

    let first = schema.field(0);
    assert_eq!(first.name(), IDENTITY_FIELD);
    assert_eq!(first.data_type(), &DataType::Int64);
    assert!(!first.is_nullable());
}

#[test]
fn test_metadata_order_is_preserved_and_unmapped_fields_skipped() {
    let mut catalog = SchemaCatalog::new("com.softwareag.adabas");
    let schema = catalog.schema_for("EMPL", &empl_metadata()).unwrap();

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    // BIRTH is date-formatted and deliberately unmapped
    assert_eq!(names, vec!["ISN", "NAME", "SALARY", "LANG"]);
}

#[test]
fn test_schema_for_is_memoized() {
    let mut catalog = SchemaCatalog::new("com.softwareag.adabas");
    let metadata = empl_metadata();

    let first = catalog.schema_for("EMPL", &metadata).unwrap();
    let second = catalog.schema_for("EMPL", &metadata).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(catalog.len(), 1);
}

#[test]
fn test_cached_schema_survives_metadata_loss() {
    // The cache is never invalidated: once derived, the schema no longer
    // consults the metadata service.
    let mut catalog = SchemaCatalog::new("com.softwareag.adabas");
    let schema = catalog.schema_for("EMPL", &empl_metadata()).unwrap();

    let gone = StaticMetadata::new();
    let cached = catalog.schema_for("EMPL", &gone).unwrap();
    assert!(Arc::ptr_eq(&schema, &cached));
}

#[test]
fn test_schema_carries_name_and_namespace() {
    let mut catalog = SchemaCatalog::new("com.softwareag.adabas");
    let schema = catalog.schema_for("EMPL", &empl_metadata()).unwrap();

    assert_eq!(
        schema.metadata().get(RECORD_NAME_KEY).map(String::as_str),
        Some("EMPL")
    );
    assert_eq!(
        schema
            .metadata()
            .get(RECORD_NAMESPACE_KEY)
            .map(String::as_str),
        Some("com.softwareag.adabas")
    );
}

#[test]
fn test_unknown_entity_type_is_an_error() {
    let mut catalog = SchemaCatalog::new("com.softwareag.adabas");
    let result = catalog.schema_for("VEHI", &empl_metadata());
    assert!(result.is_err());
    assert!(!catalog.contains("VEHI"));
}

#[test]
fn test_catalogs_do_not_share_caches() {
    let mut first = SchemaCatalog::new("com.softwareag.adabas");
    let mut second = SchemaCatalog::new("com.softwareag.adabas");
    let metadata = empl_metadata();

    let a = first.schema_for("EMPL", &metadata).unwrap();
    let b = second.schema_for("EMPL", &metadata).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.as_ref(), b.as_ref());
}
