//! Manifest document retrieval for Stockpile.
//!
//! This crate turns a locator (a filesystem path or an `http(s)://` URL) into a
//! parsed document tree. It provides the [`Retrieve`] seam the verification
//! engine is written against, the default [`DocumentRetriever`] backed by the
//! local filesystem and an HTTP client, locator resolution for relative
//! sub-manifest references, and retrieval configuration.

pub mod config;
pub mod http;
pub mod locator;
pub mod retriever;

pub use config::RetrieveConfig;
pub use locator::Locator;
pub use retriever::DocumentRetriever;

use stockpile_schema::{Document, ManifestError};
use thiserror::Error;

/// Sent as the `User-Agent` header on all HTTP requests.
pub const USER_AGENT: &str = concat!("stockpile/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("'{locator}' exceeds the {limit} byte document limit")]
    TooLarge { locator: String, limit: u64 },
    #[error("'{0}' is not valid UTF-8")]
    Encoding(String),
    #[error("'{locator}': {source}")]
    Parse {
        locator: String,
        source: ManifestError,
    },
    #[error("retrieve config error: {0}")]
    Config(String),
}

/// Content retrieval collaborator: locator in, parsed document out.
///
/// Implementations own transport details (timeouts, auth, size limits); the
/// verification engine never inspects them.
pub trait Retrieve: Send + Sync {
    fn retrieve(&self, locator: &Locator) -> Result<Document, RetrieveError>;
}

impl<F> Retrieve for F
where
    F: Fn(&Locator) -> Result<Document, RetrieveError> + Send + Sync,
{
    fn retrieve(&self, locator: &Locator) -> Result<Document, RetrieveError> {
        self(locator)
    }
}
