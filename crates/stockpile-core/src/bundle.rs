use serde::Serialize;
use stockpile_schema::{AssetEntry, ManifestDigest, VerifiedManifest, VerifiedSubManifest};

/// Output of one verification run: the normalized root manifest, its verified
/// sub-manifests in declaration order, and the digest of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedBundle {
    pub manifest: VerifiedManifest,
    pub subs: Vec<VerifiedSubManifest>,
    pub digest: ManifestDigest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BundleSummary {
    pub single_assets: usize,
    pub collections: usize,
    pub collection_entries: usize,
    pub sub_manifests: usize,
    pub total_ids: usize,
}

impl VerifiedBundle {
    /// Every asset entry, root manifest first, then sub-manifests in order.
    pub fn all_assets(&self) -> impl Iterator<Item = &AssetEntry> {
        self.manifest
            .assets
            .iter()
            .chain(self.subs.iter().flat_map(|s| s.assets.iter()))
    }

    pub fn summary(&self) -> BundleSummary {
        let mut summary = BundleSummary {
            sub_manifests: self.subs.len(),
            ..BundleSummary::default()
        };
        for asset in self.all_assets() {
            match asset {
                AssetEntry::Single { .. } => summary.single_assets += 1,
                AssetEntry::Collection { collection, .. } => {
                    summary.collections += 1;
                    summary.collection_entries += collection.entries.len();
                }
            }
        }
        summary.total_ids = summary.single_assets + summary.collection_entries;
        summary
    }
}
