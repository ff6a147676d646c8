use crate::CoreError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use stockpile_remote::{Locator, Retrieve};
use stockpile_schema::{
    check, validate_assets, value_kind, AssetEntry, AssetId, Document, ManifestError, Schema,
    SubFileDeclaration, VerifiedSubManifest,
};
use tracing::debug;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SubManifestShape {
    #[serde(default)]
    assets: Option<Value>,
}

impl Schema for SubManifestShape {
    const NAME: &'static str = "sub-manifest";
}

/// Retrieve, validate, and range-check one declared sub-manifest.
///
/// Relative declaration paths resolve against `base`, the locator of the root
/// manifest. Every error is prefixed with the path as declared.
pub fn load_and_verify(
    declaration: &SubFileDeclaration,
    base: &Locator,
    retriever: &dyn Retrieve,
) -> Result<VerifiedSubManifest, CoreError> {
    load(declaration, base, retriever).map_err(|e| CoreError::SubFile {
        path: declaration.path.clone(),
        source: Box::new(e),
    })
}

fn load(
    declaration: &SubFileDeclaration,
    base: &Locator,
    retriever: &dyn Retrieve,
) -> Result<VerifiedSubManifest, CoreError> {
    let locator = base.resolve(&declaration.path);
    debug!("loading sub-manifest {declaration} from {locator}");

    let document = retriever.retrieve(&locator)?;
    let assets = validate_sub_document(&document)?;
    verify_assignment(declaration, &assets)?;

    debug!(
        "sub-manifest {declaration} verified: {} asset entries",
        assets.len()
    );
    Ok(VerifiedSubManifest {
        declaration: declaration.clone(),
        assets,
    })
}

fn validate_sub_document(document: &Document) -> Result<Vec<AssetEntry>, ManifestError> {
    let Value::Object(fields) = document else {
        return Err(ManifestError::ExpectedObject {
            what: "sub-manifest",
            found: value_kind(document),
        });
    };
    if fields.contains_key("settings") {
        return Err(ManifestError::UnexpectedSettings);
    }
    match check::<SubManifestShape>(document)?.assets {
        None => Err(ManifestError::MissingField("assets")),
        Some(assets) => validate_assets(&assets),
    }
}

/// Check that every identifier lies in `[start, end]` and appears only once.
///
/// Gaps inside the range are allowed.
pub fn verify_assignment(
    declaration: &SubFileDeclaration,
    assets: &[AssetEntry],
) -> Result<(), CoreError> {
    for id in assets.iter().flat_map(AssetEntry::ids) {
        if id < declaration.start {
            return Err(CoreError::IdBelowRange {
                id,
                start: declaration.start,
            });
        }
        if id > declaration.end {
            return Err(CoreError::IdAboveRange {
                id,
                end: declaration.end,
            });
        }
    }
    unique_ids(assets)?;
    Ok(())
}

/// Collect every identifier of `assets`, rejecting the first repeated one.
pub fn unique_ids(assets: &[AssetEntry]) -> Result<BTreeSet<AssetId>, CoreError> {
    let mut seen = BTreeSet::new();
    for id in assets.iter().flat_map(AssetEntry::ids) {
        if !seen.insert(id) {
            return Err(CoreError::DuplicateId(id));
        }
    }
    Ok(seen)
}

/// Reject any sub-manifest identifier already used by the root manifest.
///
/// Sub-manifests cannot collide with each other once their ranges are
/// disjoint, so only root-to-sub pairs are checked.
pub fn check_root_conflicts(
    root_ids: &BTreeSet<AssetId>,
    subs: &[VerifiedSubManifest],
) -> Result<(), CoreError> {
    for sub in subs {
        if let Some(id) = sub
            .assets
            .iter()
            .flat_map(AssetEntry::ids)
            .find(|id| root_ids.contains(id))
        {
            return Err(CoreError::IdConflict {
                id,
                path: sub.declaration.path.clone(),
            });
        }
    }
    Ok(())
}
