use crate::bundle::VerifiedBundle;
use serde::Serialize;
use stockpile_schema::{AssetId, ManifestDigest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to connect to target store: {0}")]
    Connection(String),
    #[error("failed to persist asset {id}: {reason}")]
    Asset { id: AssetId, reason: String },
    #[error("{0}")]
    Other(String),
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub digest: ManifestDigest,
    pub assets_persisted: usize,
}

/// Consumer of verified bundles.
///
/// Implementations connect with `bundle.manifest.settings.dsn` and persist
/// every asset. The engine hands the bundle over by value and never retries.
pub trait UploadPipeline {
    fn upload(&self, bundle: VerifiedBundle) -> Result<UploadReport, UploadError>;
}
