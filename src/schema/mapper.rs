//! Field mapping between metadata descriptors and Arrow types

use crate::metadata::{FieldDescriptor, FieldFormat, Multiplicity};
use crate::project::Cell;
use crate::record::Scalar;
use arrow::datatypes::{DataType, Field};
use std::sync::Arc;

/// Map one field descriptor to its Arrow type.
///
/// String becomes text, decimal and integer collapse to a 64-bit integer,
/// float becomes a double, binary becomes a byte sequence. A repeating field
/// wraps the mapped primitive in a list. Date (and any format added to the
/// metadata service before it is added here) yields `None` and the field is
/// silently excluded from the derived schema: a deliberate skip, not an
/// error.
pub fn arrow_type(field: &FieldDescriptor) -> Option<DataType> {
    let base = match field.format {
        FieldFormat::String => DataType::Utf8,
        FieldFormat::Decimal | FieldFormat::Integer => DataType::Int64,
        FieldFormat::Float => DataType::Float64,
        FieldFormat::Binary => DataType::Binary,
        FieldFormat::Date => return None,
    };
    Some(match field.multiplicity {
        Multiplicity::Single => base,
        Multiplicity::Repeating => DataType::List(Arc::new(Field::new("item", base, true))),
    })
}

/// The cell substituted when an instance omits a field the schema declares.
///
/// 0 for integer columns, 0.0 for float columns, a single zero byte for
/// binary columns, empty text otherwise. A repeating column defaults to an
/// empty list: zero occurrences is the only length that preserves the
/// multiplicity of a field that was never populated.
pub fn default_cell(data_type: &DataType) -> Cell {
    match data_type {
        DataType::List(_) => Cell::List(Vec::new()),
        DataType::Int64 => Cell::Single(Scalar::Integer(0)),
        DataType::Float64 => Cell::Single(Scalar::Float(0.0)),
        DataType::Binary => Cell::Single(Scalar::Binary(vec![0])),
        _ => Cell::Single(Scalar::Text(String::new())),
    }
}
