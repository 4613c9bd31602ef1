//! The hierarchical change record model
//!
//! A [`Record`] is one captured entity instance: an ordered mapping from
//! field name to [`Value`]. Values form a closed sum over exactly three
//! shapes: a single scalar, an ordered list of scalars (multi-valued
//! field), or an ordered list of sub-records (nested repeating group).
//! Nested groups carry their own independent field namespace.
//!
//! Every instance carries an identity value under the `ISN` field, used as
//! the delivery key and as the leading column of every derived schema.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;

/// Name of the identity field present on every instance.
pub const IDENTITY_FIELD: &str = "ISN";

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Binary(Vec<u8>),
    Date(NaiveDateTime),
}

impl Scalar {
    /// Short name of the scalar shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Text(_) => "text",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Binary(_) => "binary",
            Scalar::Date(_) => "date",
        }
    }
}

/// A field value: one of exactly three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single scalar.
    Scalar(Scalar),
    /// A multi-valued field: ordered scalars.
    ScalarList(Vec<Scalar>),
    /// A nested repeating group: ordered sub-records.
    GroupList(Vec<Record>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Text(value.into()))
    }

    pub fn integer(value: i64) -> Self {
        Value::Scalar(Scalar::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Value::Scalar(Scalar::Float(value))
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Value::Scalar(Scalar::Binary(value.into()))
    }

    pub fn date(value: NaiveDateTime) -> Self {
        Value::Scalar(Scalar::Date(value))
    }

    pub fn scalars(values: impl IntoIterator<Item = Scalar>) -> Self {
        Value::ScalarList(values.into_iter().collect())
    }

    pub fn texts(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Value::ScalarList(
            values
                .into_iter()
                .map(|v| Scalar::Text(v.into()))
                .collect(),
        )
    }

    pub fn groups(records: impl IntoIterator<Item = Record>) -> Self {
        Value::GroupList(records.into_iter().collect())
    }
}

/// One hierarchical entity instance.
///
/// Field order is insertion order and is preserved through projection to
/// JSON. Field names are unique within one record's own level; inserting an
/// existing name replaces its value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record that already carries its identity value.
    pub fn with_identity(isn: i64) -> Self {
        Self::new().with(IDENTITY_FIELD, Value::integer(isn))
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field, replacing any existing value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The instance's identity value, if present as an integer scalar.
    pub fn identity(&self) -> Option<i64> {
        match self.get(IDENTITY_FIELD) {
            Some(Value::Scalar(Scalar::Integer(isn))) => Some(*isn),
            _ => None,
        }
    }

    /// Build a record from a JSON object.
    ///
    /// Used by the replay tooling to reconstruct captured instances from
    /// event files: integers and floats map to the matching scalar, strings
    /// to text, arrays of objects to a repeating group, other arrays to a
    /// multi-valued scalar field. A nested object becomes a one-element
    /// group. Null fields are treated as absent.
    pub fn from_json(value: &serde_json::Value) -> Result<Record> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Other(format!("expected a JSON object, got: {value}")))?;

        let mut record = Record::new();
        for (name, field) in obj {
            match json_to_value(field)? {
                Some(value) => record.insert(name, value),
                None => continue,
            }
        }
        Ok(record)
    }
}

fn json_to_value(value: &serde_json::Value) -> Result<Option<Value>> {
    use serde_json::Value as Json;

    let converted = match value {
        Json::Null => return Ok(None),
        Json::Bool(b) => Value::text(b.to_string()),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::integer(i),
            None => Value::float(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::text(s),
        Json::Object(_) => Value::groups([Record::from_json(value)?]),
        Json::Array(items) => {
            if items.iter().all(serde_json::Value::is_object) && !items.is_empty() {
                let groups = items
                    .iter()
                    .map(Record::from_json)
                    .collect::<Result<Vec<_>>>()?;
                Value::GroupList(groups)
            } else {
                let scalars = items
                    .iter()
                    .map(json_to_scalar)
                    .collect::<Result<Vec<_>>>()?;
                Value::ScalarList(scalars)
            }
        }
    };
    Ok(Some(converted))
}

fn json_to_scalar(value: &serde_json::Value) -> Result<Scalar> {
    use serde_json::Value as Json;

    match value {
        Json::Bool(b) => Ok(Scalar::Text(b.to_string())),
        Json::Number(n) => Ok(match n.as_i64() {
            Some(i) => Scalar::Integer(i),
            None => Scalar::Float(n.as_f64().unwrap_or_default()),
        }),
        Json::String(s) => Ok(Scalar::Text(s.clone())),
        other => Err(Error::Other(format!(
            "cannot use {other} as an element of a multi-valued field"
        ))),
    }
}
