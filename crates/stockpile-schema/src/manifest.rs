//! Manifest data model and structural errors.
//!
//! Documents are parsed from JSON or TOML into a generic tree first; the typed
//! values here are only built after validation succeeds.

use crate::conform::{Document, Schema, SchemaMismatch};
use crate::dsn::DsnConfig;
use crate::normalize::NotationError;
use crate::transform::TransformSpec;
use crate::types::{AssetId, UseCase};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("{what} must be an object, got {found}")]
    ExpectedObject {
        what: &'static str,
        found: &'static str,
    },
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("'{0}' must be a non-empty array")]
    EmptyArray(&'static str),
    #[error("sub-manifest must not declare 'settings'")]
    UnexpectedSettings,
    #[error("unknown asset type '{0}', expected 'single' or 'collection'")]
    UnknownAssetType(String),
    #[error("{0}")]
    Schema(#[from] SchemaMismatch),
    #[error("{0}")]
    Notation(#[from] NotationError),
    #[error("asset {index}: {source}")]
    Asset {
        index: usize,
        source: Box<ManifestError>,
    },
    #[error("entry {entry}: {source}")]
    Entry {
        entry: usize,
        source: Box<ManifestError>,
    },
}

impl ManifestError {
    pub(crate) fn at_asset(self, index: usize) -> Self {
        ManifestError::Asset {
            index,
            source: Box::new(self),
        }
    }

    pub(crate) fn at_entry(self, entry: usize) -> Self {
        ManifestError::Entry {
            entry,
            source: Box::new(self),
        }
    }
}

/// Source syntax of a manifest document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Json,
    Toml,
}

impl DocumentFormat {
    /// Guess the format from a path or URL; anything not ending in `.toml` is JSON.
    pub fn from_locator(locator: &str) -> Self {
        let path = locator.split(['?', '#']).next().unwrap_or(locator);
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<Document, ManifestError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(input)?),
        DocumentFormat::Toml => Ok(toml::from_str(input)?),
    }
}

/// Declares a sub-manifest and the inclusive identifier range its assets must use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubFileDeclaration {
    pub path: String,
    pub start: AssetId,
    pub end: AssetId,
}

impl SubFileDeclaration {
    pub fn contains(&self, id: AssetId) -> bool {
        self.start <= id && id <= self.end
    }
}

impl fmt::Display for SubFileDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' [{}, {}]", self.path, self.start, self.end)
    }
}

impl Schema for Vec<SubFileDeclaration> {
    const NAME: &'static str = "settings.subFiles";
}

/// Normalized root settings. `Debug` and `Display` never show DSN credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub dsn: DsnConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_files: Vec<SubFileDeclaration>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dsn={} subFiles={}", self.dsn, self.sub_files.len())
    }
}

/// One standalone asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleAsset {
    pub id: AssetId,
    pub name: String,
    pub source: String,
    /// Edge sizes (pixels) of the level-of-detail variants to generate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lods: Vec<u32>,
}

impl Schema for SingleAsset {
    const NAME: &'static str = "single";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionEntry {
    pub id: AssetId,
    pub source: String,
    pub transform: TransformSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Collection {
    pub entries: Vec<CollectionEntry>,
}

/// A validated asset entry, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum AssetEntry {
    Single {
        use_case: UseCase,
        single: SingleAsset,
    },
    Collection {
        use_case: UseCase,
        name: String,
        collection: Collection,
    },
}

impl AssetEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            AssetEntry::Single { .. } => "single",
            AssetEntry::Collection { .. } => "collection",
        }
    }

    pub fn use_case(&self) -> &UseCase {
        match self {
            AssetEntry::Single { use_case, .. } | AssetEntry::Collection { use_case, .. } => {
                use_case
            }
        }
    }

    /// Identifiers carried by this entry, in document order.
    pub fn ids(&self) -> Vec<AssetId> {
        match self {
            AssetEntry::Single { single, .. } => vec![single.id],
            AssetEntry::Collection { collection, .. } => {
                collection.entries.iter().map(|e| e.id).collect()
            }
        }
    }
}

/// Root manifest after verification: DSN and transforms in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedManifest {
    pub settings: Settings,
    pub assets: Vec<AssetEntry>,
}

/// A loaded sub-manifest, checked against the declaration that referenced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSubManifest {
    pub declaration: SubFileDeclaration,
    pub assets: Vec<AssetEntry>,
}
