use crate::manifest::{VerifiedManifest, VerifiedSubManifest};
use crate::types::ManifestDigest;

/// Compute the content digest of a verified manifest and its sub-manifests.
///
/// The digest covers the canonical JSON of every verified document, so two
/// sources that differ only in notation (DSN shorthand vs. object, transform
/// shorthand vs. object) hash identically. Sub-manifests are hashed in
/// declaration order.
pub fn compute_digest(
    manifest: &VerifiedManifest,
    subs: &[VerifiedSubManifest],
) -> Result<ManifestDigest, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();

    hasher.update(b"manifest:");
    hasher.update(serde_json::to_string(manifest)?.as_bytes());

    for sub in subs {
        hasher.update(format!("sub:{}:", sub.declaration.path).as_bytes());
        hasher.update(serde_json::to_string(&sub.assets)?.as_bytes());
    }

    Ok(ManifestDigest::new(hasher.finalize().to_hex().to_string()))
}
