//! Canonicalization of fields that accept a compact string or an object.
//!
//! A [`Notation`] type parses its shorthand, checks its structured form, and
//! enforces value constraints shared by both encodings.

use crate::conform::{check, value_kind, Schema, SchemaMismatch};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("invalid {kind} shorthand: {reason}")]
    Shorthand { kind: &'static str, reason: String },
    #[error("invalid {kind}: {reason}")]
    Constraint { kind: &'static str, reason: String },
    #[error("{kind} must be a compact string or an object, got {found}")]
    UnsupportedEncoding {
        kind: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
}

/// A configuration value accepted either as a compact delimited string or as a
/// structured object, both normalizing to the same canonical form.
pub trait Notation: Schema + Sized {
    /// Parse the compact shorthand into the structured shape.
    fn parse_compact(input: &str) -> Result<Self, NotationError>;

    /// Enforce value constraints shared by both encodings.
    fn validate(&self) -> Result<(), NotationError>;
}

/// Normalize a document value into the canonical form of `N`.
///
/// Strings go through the shorthand parser, objects through the schema check
/// (which also applies field defaults). Anything else is rejected. Normalizing
/// an already canonical object yields the same value.
pub fn normalize<N: Notation>(value: &Value) -> Result<N, NotationError> {
    let canonical = match value {
        Value::String(s) => N::parse_compact(s)?,
        Value::Object(_) => check::<N>(value)?,
        other => {
            return Err(NotationError::UnsupportedEncoding {
                kind: N::NAME,
                found: value_kind(other),
            })
        }
    };
    canonical.validate()?;
    Ok(canonical)
}

pub(crate) fn shorthand_error(kind: &'static str, reason: impl Into<String>) -> NotationError {
    NotationError::Shorthand {
        kind,
        reason: reason.into(),
    }
}

pub(crate) fn constraint_error(kind: &'static str, reason: impl Into<String>) -> NotationError {
    NotationError::Constraint {
        kind,
        reason: reason.into(),
    }
}
