//! Manifest data model, notation normalization, and asset entry validation for Stockpile.
//!
//! This crate defines the schema layer: the generic conformance check
//! (`conform::check`), compact-notation normalization of DSN and transform
//! fields (`normalize`), per-entry asset validation (`validate_entry`), the
//! verified manifest types handed to the upload pipeline, and the content
//! digest of a verified bundle (`compute_digest`).

pub mod conform;
pub mod dsn;
pub mod entry;
pub mod identity;
pub mod manifest;
pub mod normalize;
pub mod transform;
pub mod types;

pub use conform::{check, value_kind, Document, Schema, SchemaMismatch};
pub use dsn::{DsnConfig, SslMode};
pub use entry::{validate_assets, validate_collection, validate_entry, validate_single};
pub use identity::compute_digest;
pub use manifest::{
    parse_document_str, AssetEntry, Collection, CollectionEntry, DocumentFormat, ManifestError,
    Settings, SingleAsset, SubFileDeclaration, VerifiedManifest, VerifiedSubManifest,
};
pub use normalize::{normalize, Notation, NotationError};
pub use transform::{Flip, ImageFormat, Resize, TransformSpec};
pub use types::{AssetId, ManifestDigest, UseCase};
