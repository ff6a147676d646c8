//! Structural type-conformance checking of generic documents.
//!
//! A [`Schema`] is any deserializable type with a human-readable name. Checking
//! a document value against it either yields the typed value or a
//! [`SchemaMismatch`] describing why the value does not fit. Callers never
//! reach into document fields themselves; they describe the expected shape as a
//! type and let serde do the structural work.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// A parsed, not yet validated document tree (JSON or TOML source).
pub type Document = Value;

/// A value does not conform to the schema it was checked against.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{schema} does not conform: {message}")]
pub struct SchemaMismatch {
    pub schema: &'static str,
    pub message: String,
}

/// Schema descriptor: a deserializable shape with a display name.
pub trait Schema: DeserializeOwned {
    const NAME: &'static str;
}

/// Check `value` against the schema `S`.
pub fn check<S: Schema>(value: &Value) -> Result<S, SchemaMismatch> {
    S::deserialize(value).map_err(|e| SchemaMismatch {
        schema: S::NAME,
        message: e.to_string(),
    })
}

/// Short name of a document value's runtime kind, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deserialize an explicit `null` the same way as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
