//! Record projection
//!
//! Walks one hierarchical [`Record`] and emits either a flat row aligned
//! with a derived columnar schema, or a nested JSON tree for the message
//! path. Both projections apply the same traversal rules: dispatch on the
//! value's shape, preserve field order and multiplicity, keep numbers as
//! numbers.

use crate::error::{Error, Result};
use crate::record::{Record, Scalar, Value, IDENTITY_FIELD};
use crate::schema::default_cell;
use arrow::array::{ArrayRef, BinaryArray, Float64Array, Int64Array, ListArray, StringArray};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use base64::prelude::{Engine, BASE64_STANDARD};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// One projected column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Single(Scalar),
    List(Vec<Scalar>),
}

/// One projected row, aligned with a schema's field order.
pub type Row = Vec<Cell>;

// ============================================================================
// Columnar projection
// ============================================================================

/// Project one record into a flat row matching `schema`.
///
/// The identity value is read directly from the record. Every later schema
/// field is looked up by name: present values are coerced to the column
/// type, absent values take the mapper default. Fields the schema does not
/// declare never appear in the row.
pub fn project(record: &Record, schema: &Schema) -> Result<Row> {
    let mut row = Vec::with_capacity(schema.fields().len());
    for (index, field) in schema.fields().iter().enumerate() {
        if index == 0 {
            let isn = record.identity().ok_or_else(|| {
                Error::projection(IDENTITY_FIELD, "record carries no identity value")
            })?;
            row.push(Cell::Single(Scalar::Integer(isn)));
            continue;
        }
        let cell = match record.get(field.name()) {
            Some(value) => coerce(value, field.data_type(), field.name())?,
            None => default_cell(field.data_type()),
        };
        row.push(cell);
    }
    Ok(row)
}

fn coerce(value: &Value, data_type: &DataType, field: &str) -> Result<Cell> {
    match (value, data_type) {
        // A lone scalar in a repeating column is one occurrence
        (Value::Scalar(scalar), DataType::List(item)) => {
            Ok(Cell::List(vec![coerce_scalar(scalar, item.data_type(), field)?]))
        }
        (Value::Scalar(scalar), _) => Ok(Cell::Single(coerce_scalar(scalar, data_type, field)?)),
        (Value::ScalarList(items), DataType::List(item)) => {
            let coerced = items
                .iter()
                .map(|scalar| coerce_scalar(scalar, item.data_type(), field))
                .collect::<Result<Vec<_>>>()?;
            Ok(Cell::List(coerced))
        }
        (Value::ScalarList(_), _) => Err(Error::projection(
            field,
            "multi-valued field cannot be written to a single-valued column",
        )),
        (Value::GroupList(_), _) => Err(Error::projection(
            field,
            "nested repeating group cannot be written to a flat column",
        )),
    }
}

fn coerce_scalar(scalar: &Scalar, data_type: &DataType, field: &str) -> Result<Scalar> {
    match (scalar, data_type) {
        (Scalar::Integer(_), DataType::Int64)
        | (Scalar::Float(_), DataType::Float64)
        | (Scalar::Text(_), DataType::Utf8)
        | (Scalar::Binary(_), DataType::Binary) => Ok(scalar.clone()),
        (Scalar::Integer(value), DataType::Float64) => Ok(Scalar::Float(*value as f64)),
        (Scalar::Date(value), DataType::Utf8) => Ok(Scalar::Text(value.to_string())),
        (other, data_type) => Err(Error::projection(
            field,
            format!("cannot coerce {} value to {data_type}", other.kind()),
        )),
    }
}

/// Assemble projected rows into one Arrow record batch.
///
/// Row order in the batch equals slice order; row position has no other
/// identity.
pub fn rows_to_batch(schema: &Arc<Schema>, rows: &[Row]) -> Result<RecordBatch> {
    for row in rows {
        if row.len() != schema.fields().len() {
            return Err(Error::Other(format!(
                "row arity {} does not match schema arity {}",
                row.len(),
                schema.fields().len()
            )));
        }
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for (index, field) in schema.fields().iter().enumerate() {
        let column = match field.data_type() {
            DataType::List(item) => list_column(rows, index, item, field.name())?,
            data_type => {
                let mut values = Vec::with_capacity(rows.len());
                for row in rows {
                    match &row[index] {
                        Cell::Single(scalar) => values.push(scalar),
                        Cell::List(_) => {
                            return Err(Error::projection(
                                field.name(),
                                "list cell in a single-valued column",
                            ))
                        }
                    }
                }
                scalar_array(&values, data_type, field.name())?
            }
        };
        columns.push(column);
    }

    RecordBatch::try_new(Arc::clone(schema), columns).map_err(Error::from)
}

fn list_column(rows: &[Row], index: usize, item: &FieldRef, field: &str) -> Result<ArrayRef> {
    let mut flat: Vec<&Scalar> = Vec::new();
    let mut offsets: Vec<i32> = Vec::with_capacity(rows.len() + 1);
    offsets.push(0);

    for row in rows {
        match &row[index] {
            Cell::List(items) => flat.extend(items.iter()),
            Cell::Single(_) => {
                return Err(Error::projection(field, "scalar cell in a repeating column"))
            }
        }
        let offset = i32::try_from(flat.len())
            .map_err(|_| Error::projection(field, "repeating field too large for i32 offset"))?;
        offsets.push(offset);
    }

    let child = scalar_array(&flat, item.data_type(), field)?;
    let list = ListArray::new(Arc::clone(item), OffsetBuffer::new(offsets.into()), child, None);
    Ok(Arc::new(list))
}

fn scalar_array(values: &[&Scalar], data_type: &DataType, field: &str) -> Result<ArrayRef> {
    match data_type {
        DataType::Int64 => {
            let mut out = Vec::with_capacity(values.len());
            for scalar in values {
                match scalar {
                    Scalar::Integer(value) => out.push(*value),
                    other => return Err(shape_error(field, other, data_type)),
                }
            }
            Ok(Arc::new(Int64Array::from(out)))
        }
        DataType::Float64 => {
            let mut out = Vec::with_capacity(values.len());
            for scalar in values {
                match scalar {
                    Scalar::Float(value) => out.push(*value),
                    other => return Err(shape_error(field, other, data_type)),
                }
            }
            Ok(Arc::new(Float64Array::from(out)))
        }
        DataType::Utf8 => {
            let mut out: Vec<&str> = Vec::with_capacity(values.len());
            for scalar in values {
                match scalar {
                    Scalar::Text(value) => out.push(value.as_str()),
                    other => return Err(shape_error(field, other, data_type)),
                }
            }
            Ok(Arc::new(StringArray::from(out)))
        }
        DataType::Binary => {
            let mut out: Vec<&[u8]> = Vec::with_capacity(values.len());
            for scalar in values {
                match scalar {
                    Scalar::Binary(value) => out.push(value.as_slice()),
                    other => return Err(shape_error(field, other, data_type)),
                }
            }
            Ok(Arc::new(BinaryArray::from_iter_values(out)))
        }
        other => Err(Error::projection(
            field,
            format!("unsupported column type {other}"),
        )),
    }
}

fn shape_error(field: &str, scalar: &Scalar, data_type: &DataType) -> Error {
    Error::projection(
        field,
        format!("{} cell in a {data_type} column", scalar.kind()),
    )
}

// ============================================================================
// Tree projection
// ============================================================================

/// Project one record into a nested JSON tree.
///
/// Applied uniformly at every depth: a repeating group becomes an array of
/// objects, a multi-valued field an array of scalars in original order, and
/// a scalar attaches directly: numbers stay numbers, dates render as their
/// canonical text form, binary values as base64 text.
pub fn to_tree(record: &Record) -> JsonValue {
    let mut tree = serde_json::Map::with_capacity(record.len());
    for (name, value) in record.fields() {
        tree.insert(name.to_string(), value_to_json(value));
    }
    JsonValue::Object(tree)
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Scalar(scalar) => scalar_to_json(scalar),
        Value::ScalarList(items) => JsonValue::Array(items.iter().map(scalar_to_json).collect()),
        Value::GroupList(groups) => JsonValue::Array(groups.iter().map(to_tree).collect()),
    }
}

fn scalar_to_json(scalar: &Scalar) -> JsonValue {
    match scalar {
        Scalar::Text(value) => JsonValue::String(value.clone()),
        Scalar::Integer(value) => JsonValue::Number((*value).into()),
        Scalar::Float(value) => {
            serde_json::Number::from_f64(*value).map_or(JsonValue::Null, JsonValue::Number)
        }
        Scalar::Binary(value) => JsonValue::String(BASE64_STANDARD.encode(value)),
        Scalar::Date(value) => JsonValue::String(value.to_string()),
    }
}
