//! Typed record mapper
//!
//! Converts domain types to and from the generic value (`serde_json::Value`)
//! exchanged with the transport. The identity field is dropped on the write
//! path (the store assigns it) and read back on the decode path.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::Result;

/// Name of the identity field on every record
pub const ID_FIELD: &str = "id";

/// Serialize any value into its generic form.
pub fn to_generic<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::schema_mismatch::<T>(e))
}

/// Serialize a record for writing: must be an object, and the identity field
/// is removed.
pub fn to_content<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>> {
    match to_generic(value)? {
        Value::Object(mut fields) => {
            fields.remove(ID_FIELD);
            Ok(fields)
        }
        other => Err(Error::schema_mismatch::<T>(format!(
            "expected an object, found {}",
            kind_of(&other)
        ))),
    }
}

/// Decode a generic value into `T`.
pub fn from_generic<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::schema_mismatch::<T>(e))
}

/// Wrap a statement's raw result as a row sequence: arrays are taken as-is,
/// `null` is empty and any other value is a single row.
pub(crate) fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
