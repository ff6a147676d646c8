//! Manifest verification and composition engine for Stockpile.
//!
//! This crate ties together schema validation and document retrieval into the
//! `Engine`: it verifies a root manifest, checks that the identifier ranges of
//! its declared sub-manifests are disjoint, loads and verifies every
//! sub-manifest against its range, and composes the result into one
//! `VerifiedBundle` ready for an `UploadPipeline`.

pub mod bundle;
pub mod engine;
pub mod lifecycle;
pub mod partition;
pub mod submanifest;
pub mod upload;

pub use bundle::{BundleSummary, VerifiedBundle};
pub use engine::Engine;
pub use lifecycle::{validate_transition, VerifyStage};
pub use partition::check_ranges;
pub use submanifest::{check_root_conflicts, load_and_verify, unique_ids, verify_assignment};
pub use upload::{UploadError, UploadPipeline, UploadReport};

use stockpile_remote::RetrieveError;
use stockpile_schema::{AssetId, ManifestError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("retrieval error: {0}")]
    Retrieve(#[from] RetrieveError),
    #[error("range error: sub-file {index} {declaration} has start greater than end")]
    MalformedRange { index: usize, declaration: String },
    #[error("range error: sub-file {first} overlaps sub-file {second}")]
    OverlappingRanges { first: String, second: String },
    #[error("range error: asset id {id} is below declared start {start}")]
    IdBelowRange { id: AssetId, start: AssetId },
    #[error("range error: asset id {id} exceeds declared end {end}")]
    IdAboveRange { id: AssetId, end: AssetId },
    #[error("duplicate asset id {0}")]
    DuplicateId(AssetId),
    #[error("asset id {id} in the root manifest is also assigned in sub-file '{path}'")]
    IdConflict { id: AssetId, path: String },
    #[error("sub-file '{path}': {source}")]
    SubFile {
        path: String,
        source: Box<CoreError>,
    },
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid verification stage transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl CoreError {
    /// True when the failure came from fetching or parsing a document rather
    /// than from its content.
    pub fn is_retrieval(&self) -> bool {
        match self {
            CoreError::Retrieve(_) => true,
            CoreError::SubFile { source, .. } => source.is_retrieval(),
            _ => false,
        }
    }
}
