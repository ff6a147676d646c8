//! Shape validation of asset entries.
//!
//! Each entry is narrowed by its `type` discriminant, checked against the
//! schema of that variant, and has its nested compact-notation fields
//! normalized. The result is a typed [`AssetEntry`]; the input document is
//! never modified.

use crate::conform::{check, value_kind, Schema};
use crate::manifest::{AssetEntry, Collection, CollectionEntry, ManifestError};
use crate::normalize::normalize;
use crate::transform::TransformSpec;
use crate::types::{AssetId, UseCase};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SingleShape {
    #[serde(rename = "type")]
    _kind: String,
    use_case: UseCase,
    single: Value,
}

impl Schema for SingleShape {
    const NAME: &'static str = "single asset";
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CollectionShape {
    #[serde(rename = "type")]
    _kind: String,
    use_case: UseCase,
    name: String,
    collection: Value,
}

impl Schema for CollectionShape {
    const NAME: &'static str = "collection asset";
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CollectionBodyShape {
    entries: Vec<Value>,
}

impl Schema for CollectionBodyShape {
    const NAME: &'static str = "collection";
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryShape {
    id: AssetId,
    source: String,
    transform: Value,
}

impl Schema for EntryShape {
    const NAME: &'static str = "collection entry";
}

/// Validate every entry of an `assets` array. The first failure wins.
pub fn validate_assets(assets: &Value) -> Result<Vec<AssetEntry>, ManifestError> {
    let items = match assets {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(ManifestError::EmptyArray("assets")),
    };
    items
        .iter()
        .enumerate()
        .map(|(index, entry)| validate_entry(index, entry))
        .collect()
}

/// Validate one asset entry; errors are prefixed with `asset <index>`.
pub fn validate_entry(index: usize, entry: &Value) -> Result<AssetEntry, ManifestError> {
    dispatch(entry).map_err(|e| e.at_asset(index))
}

fn dispatch(entry: &Value) -> Result<AssetEntry, ManifestError> {
    let Value::Object(fields) = entry else {
        return Err(ManifestError::ExpectedObject {
            what: "asset entry",
            found: value_kind(entry),
        });
    };
    match fields.get("type") {
        None | Some(Value::Null) => Err(ManifestError::MissingField("type")),
        Some(Value::String(kind)) => match kind.as_str() {
            "single" => validate_single(entry),
            "collection" => validate_collection(entry),
            other => Err(ManifestError::UnknownAssetType(other.to_owned())),
        },
        Some(other) => Err(ManifestError::UnknownAssetType(other.to_string())),
    }
}

pub fn validate_single(entry: &Value) -> Result<AssetEntry, ManifestError> {
    let shape: SingleShape = check(entry)?;
    let single = check(&shape.single)?;
    Ok(AssetEntry::Single {
        use_case: shape.use_case,
        single,
    })
}

pub fn validate_collection(entry: &Value) -> Result<AssetEntry, ManifestError> {
    let shape: CollectionShape = check(entry)?;
    let body: CollectionBodyShape = check(&shape.collection)?;
    if body.entries.is_empty() {
        return Err(ManifestError::EmptyArray("collection.entries"));
    }

    let entries = body
        .entries
        .iter()
        .enumerate()
        .map(|(i, raw)| validate_collection_entry(raw).map_err(|e| e.at_entry(i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AssetEntry::Collection {
        use_case: shape.use_case,
        name: shape.name,
        collection: Collection { entries },
    })
}

fn validate_collection_entry(raw: &Value) -> Result<CollectionEntry, ManifestError> {
    let shape: EntryShape = check(raw)?;
    let transform: TransformSpec = normalize(&shape.transform)?;
    Ok(CollectionEntry {
        id: shape.id,
        source: shape.source,
        transform,
    })
}
