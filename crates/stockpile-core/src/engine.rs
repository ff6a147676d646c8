use crate::bundle::VerifiedBundle;
use crate::lifecycle::{advance, VerifyStage};
use crate::partition::check_ranges;
use crate::submanifest::{check_root_conflicts, load_and_verify, unique_ids};
use crate::upload::{UploadPipeline, UploadReport};
use crate::CoreError;
use serde::Deserialize;
use serde_json::Value;
use stockpile_remote::{DocumentRetriever, Locator, Retrieve, RetrieveConfig};
use stockpile_schema::{
    check, compute_digest, normalize, validate_assets, value_kind, Document, DsnConfig,
    ManifestError, Schema, Settings, SubFileDeclaration, VerifiedManifest,
};
use tracing::{debug, info, warn};

/// Central verification engine.
///
/// Verifies a root manifest and its sub-manifests into a [`VerifiedBundle`].
/// All stages are pure checks over in-memory values except sub-manifest
/// loading, which goes through the injected [`Retrieve`] implementation,
/// strictly in declaration order. The first failure aborts the run.
pub struct Engine {
    retriever: Box<dyn Retrieve>,
}

impl Engine {
    pub fn new(retriever: impl Retrieve + 'static) -> Self {
        Self {
            retriever: Box::new(retriever),
        }
    }

    /// Engine backed by the default file/HTTP retriever.
    pub fn with_config(config: &RetrieveConfig) -> Self {
        Self::new(DocumentRetriever::new(config))
    }

    /// Retrieve the manifest at `locator` and verify it.
    pub fn verify(&self, locator: &Locator) -> Result<VerifiedBundle, CoreError> {
        info!("verifying manifest {locator}");
        let document = self.retriever.retrieve(locator)?;
        self.verify_document(&document, locator)
    }

    /// Verify an already parsed root document. Relative sub-file paths
    /// resolve against `base`.
    pub fn verify_document(
        &self,
        document: &Document,
        base: &Locator,
    ) -> Result<VerifiedBundle, CoreError> {
        let mut stage = VerifyStage::ParseRoot;
        let result = self.run(document, base, &mut stage);
        match &result {
            Ok(bundle) => info!(
                "manifest {base} verified: digest {}",
                bundle.digest.short()
            ),
            Err(e) => warn!("verification of {base} failed during {stage}: {e}"),
        }
        result
    }

    /// Verify the manifest at `locator` and hand the bundle to `pipeline`.
    pub fn ingest(
        &self,
        locator: &Locator,
        pipeline: &dyn UploadPipeline,
    ) -> Result<UploadReport, CoreError> {
        let bundle = self.verify(locator)?;
        info!(
            "handing {} to upload pipeline ({} sub-manifests)",
            bundle.digest.short(),
            bundle.subs.len()
        );
        Ok(pipeline.upload(bundle)?)
    }

    fn run(
        &self,
        document: &Document,
        base: &Locator,
        stage: &mut VerifyStage,
    ) -> Result<VerifiedBundle, CoreError> {
        let (settings, assets) = root_fields(document)?;

        advance(stage, VerifyStage::NormalizeDsn)?;
        let dsn = match &settings.dsn {
            None => return Err(ManifestError::MissingField("settings.dsn").into()),
            Some(raw) => normalize::<DsnConfig>(raw).map_err(ManifestError::from)?,
        };
        debug!("dsn normalized: {dsn}");

        advance(stage, VerifyStage::ValidateAssets)?;
        let assets = validate_assets(&assets)?;
        let root_ids = unique_ids(&assets)?;
        debug!("{} root asset entries validated", assets.len());

        advance(stage, VerifyStage::PartitionSubFiles)?;
        let sub_files = sub_file_declarations(settings.sub_files.as_ref())?;
        check_ranges(&sub_files)?;

        advance(stage, VerifyStage::LoadSubFiles)?;
        let subs = sub_files
            .iter()
            .map(|decl| load_and_verify(decl, base, self.retriever.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        advance(stage, VerifyStage::Compose)?;
        check_root_conflicts(&root_ids, &subs)?;
        let manifest = VerifiedManifest {
            settings: Settings { dsn, sub_files },
            assets,
        };
        let digest = compute_digest(&manifest, &subs)?;
        Ok(VerifiedBundle {
            manifest,
            subs,
            digest,
        })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RootShape {
    #[serde(default)]
    settings: Option<Value>,
    #[serde(default)]
    assets: Option<Value>,
}

impl Schema for RootShape {
    const NAME: &'static str = "manifest";
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SettingsShape {
    #[serde(default)]
    dsn: Option<Value>,
    #[serde(default)]
    sub_files: Option<Value>,
}

impl Schema for SettingsShape {
    const NAME: &'static str = "settings";
}

fn root_fields(document: &Document) -> Result<(SettingsShape, Value), ManifestError> {
    if !document.is_object() {
        return Err(ManifestError::ExpectedObject {
            what: "manifest",
            found: value_kind(document),
        });
    }
    let root = check::<RootShape>(document)?;
    let settings = match root.settings {
        None => return Err(ManifestError::MissingField("settings")),
        Some(settings @ Value::Object(_)) => check::<SettingsShape>(&settings)?,
        Some(other) => {
            return Err(ManifestError::ExpectedObject {
                what: "settings",
                found: value_kind(&other),
            })
        }
    };
    let assets = root.assets.ok_or(ManifestError::MissingField("assets"))?;
    Ok((settings, assets))
}

fn sub_file_declarations(raw: Option<&Value>) -> Result<Vec<SubFileDeclaration>, ManifestError> {
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => Ok(check::<Vec<SubFileDeclaration>>(raw)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use stockpile_remote::RetrieveError;
    use stockpile_schema::SslMode;

    fn manifest(extra_settings: Value) -> Value {
        let mut settings = json!({"dsn": "localhost 5432, admin secret, assetsdb, disable"});
        if let (Value::Object(s), Value::Object(extra)) = (&mut settings, extra_settings) {
            s.extend(extra);
        }
        json!({
            "settings": settings,
            "assets": [{
                "type": "single",
                "useCase": "icon",
                "single": {"id": 500, "name": "logo", "source": "logo.png"}
            }]
        })
    }

    fn sub(ids: &[u64]) -> Value {
        let assets: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({
                    "type": "single",
                    "useCase": "tile",
                    "single": {"id": id, "name": format!("t{id}"), "source": format!("{id}.png")}
                })
            })
            .collect();
        json!({ "assets": assets })
    }

    fn no_io() -> Engine {
        Engine::new(|l: &Locator| -> Result<Document, RetrieveError> {
            Err(RetrieveError::NotFound(l.to_string()))
        })
    }

    fn base() -> Locator {
        Locator::parse("/batch/manifest.json")
    }

    #[test]
    fn verifies_manifest_without_sub_files() {
        let bundle = no_io()
            .verify_document(&manifest(json!({})), &base())
            .unwrap();
        assert_eq!(bundle.manifest.settings.dsn.ssl_mode, SslMode::Disable);
        assert_eq!(bundle.manifest.assets.len(), 1);
        assert!(bundle.subs.is_empty());
        assert_eq!(bundle.digest.len(), 64);
    }

    #[test]
    fn missing_settings_or_assets_is_structural() {
        let engine = no_io();
        let err = engine
            .verify_document(&json!({"assets": []}), &base())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "manifest error: missing required field 'settings'"
        );

        let err = engine
            .verify_document(&json!({"settings": {"dsn": "h 1, u p, d"}}), &base())
            .unwrap_err();
        assert_eq!(err.to_string(), "manifest error: missing required field 'assets'");

        let err = engine
            .verify_document(&json!({"settings": {}, "assets": []}), &base())
            .unwrap_err();
        assert!(err.to_string().contains("'settings.dsn'"));
    }

    #[test]
    fn root_must_be_an_object() {
        let err = no_io().verify_document(&json!([1]), &base()).unwrap_err();
        assert!(err.to_string().contains("manifest must be an object, got array"));
    }

    #[test]
    fn bad_dsn_fails_before_assets_are_checked() {
        let mut doc = manifest(json!({}));
        doc["settings"]["dsn"] = json!("localhost");
        doc["assets"] = json!([]);
        let err = no_io().verify_document(&doc, &base()).unwrap_err();
        assert!(err.to_string().contains("invalid dsn shorthand"), "{err}");
    }

    #[test]
    fn empty_assets_is_rejected() {
        let mut doc = manifest(json!({}));
        doc["assets"] = json!([]);
        let err = no_io().verify_document(&doc, &base()).unwrap_err();
        assert!(err.to_string().contains("'assets' must be a non-empty array"));
    }

    #[test]
    fn malformed_sub_files_are_schema_errors() {
        let doc = manifest(json!({"subFiles": [{"path": "a.json", "start": 1}]}));
        let err = no_io().verify_document(&doc, &base()).unwrap_err();
        assert!(err.to_string().contains("settings.subFiles does not conform"), "{err}");
    }

    #[test]
    fn overlapping_sub_files_fail_before_any_retrieval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = Engine::new(move |l: &Locator| -> Result<Document, RetrieveError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RetrieveError::NotFound(l.to_string()))
        });
        let doc = manifest(json!({"subFiles": [
            {"path": "a.json", "start": 1, "end": 10},
            {"path": "b.json", "start": 5, "end": 15}
        ]}));
        let err = engine.verify_document(&doc, &base()).unwrap_err();
        assert!(matches!(err, CoreError::OverlappingRanges { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sub_files_load_in_declaration_order_and_stop_at_first_failure() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let engine = Engine::new(move |l: &Locator| -> Result<Document, RetrieveError> {
            let name = l.to_string();
            log.lock().unwrap().push(name.clone());
            match name.as_str() {
                "/batch/b.json" => Ok(sub(&[20, 21])),
                "/batch/a.json" => Ok(sub(&[1, 99])),
                _ => Ok(sub(&[40])),
            }
        });
        let doc = manifest(json!({"subFiles": [
            {"path": "b.json", "start": 20, "end": 29},
            {"path": "a.json", "start": 1, "end": 10},
            {"path": "c.json", "start": 40, "end": 49}
        ]}));
        let err = engine.verify_document(&doc, &base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "sub-file 'a.json': range error: asset id 99 exceeds declared end 10"
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["/batch/b.json".to_owned(), "/batch/a.json".to_owned()]
        );
    }

    #[test]
    fn composes_sub_manifests_in_declaration_order() {
        let engine = Engine::new(|l: &Locator| -> Result<Document, RetrieveError> {
            match l.to_string().as_str() {
                "/batch/low.json" => Ok(sub(&[1, 2])),
                "/batch/high.json" => Ok(sub(&[100])),
                other => Err(RetrieveError::NotFound(other.to_owned())),
            }
        });
        let doc = manifest(json!({"subFiles": [
            {"path": "high.json", "start": 100, "end": 199},
            {"path": "low.json", "start": 1, "end": 99}
        ]}));
        let bundle = engine.verify_document(&doc, &base()).unwrap();
        let paths: Vec<&str> = bundle
            .subs
            .iter()
            .map(|s| s.declaration.path.as_str())
            .collect();
        assert_eq!(paths, vec!["high.json", "low.json"]);
        let summary = bundle.summary();
        assert_eq!(summary.sub_manifests, 2);
        assert_eq!(summary.single_assets, 4);
        assert_eq!(summary.total_ids, 4);
    }

    #[test]
    fn reverifying_canonical_output_is_idempotent() {
        let doc = json!({
            "settings": {"dsn": "localhost 5432, admin secret, assetsdb"},
            "assets": [{
                "type": "collection",
                "useCase": "gallery",
                "name": "hero",
                "collection": {"entries": [
                    {"id": 1, "source": "a.png", "transform": "rotate 90, format webp"}
                ]}
            }]
        });
        let engine = no_io();
        let first = engine.verify_document(&doc, &base()).unwrap();
        let canonical = serde_json::to_value(&first.manifest).unwrap();
        let second = engine.verify_document(&canonical, &base()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn verify_retrieves_root_through_retriever() {
        let engine = Engine::new(|l: &Locator| -> Result<Document, RetrieveError> {
            if l.to_string() == "/batch/manifest.json" {
                Ok(manifest(json!({})))
            } else {
                Err(RetrieveError::NotFound(l.to_string()))
            }
        });
        assert!(engine.verify(&base()).is_ok());
        let err = engine.verify(&Locator::parse("/elsewhere.json")).unwrap_err();
        assert!(err.is_retrieval());
    }

    #[test]
    fn misspelled_sub_files_key_is_rejected() {
        let engine = Engine::new(|_: &Locator| -> Result<Document, RetrieveError> {
            Ok(sub(&[1]))
        });
        let doc = manifest(json!({"subfiles": [{"path": "sub.json", "start": 1, "end": 10}]}));
        let err = engine.verify_document(&doc, &base()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("settings does not conform"), "{msg}");
        assert!(msg.contains("subfiles"), "{msg}");
    }

    #[test]
    fn unknown_root_keys_are_rejected() {
        let mut doc = manifest(json!({}));
        doc["asset"] = json!([]);
        let err = no_io().verify_document(&doc, &base()).unwrap_err();
        assert!(err.to_string().contains("manifest does not conform"), "{err}");
    }

    #[test]
    fn duplicate_root_ids_are_rejected() {
        let mut doc = manifest(json!({}));
        doc["assets"] = json!([
            {"type": "single", "useCase": "icon", "single": {"id": 1, "name": "a", "source": "a.png"}},
            {"type": "single", "useCase": "icon", "single": {"id": 1, "name": "b", "source": "b.png"}}
        ]);
        let err = no_io().verify_document(&doc, &base()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateId(id) if id.get() == 1));
    }

    #[test]
    fn root_id_reused_in_sub_manifest_is_rejected() {
        let engine = Engine::new(|_: &Locator| -> Result<Document, RetrieveError> {
            Ok(sub(&[3, 500]))
        });
        let doc = manifest(json!({"subFiles": [{"path": "sub.json", "start": 1, "end": 500}]}));
        let err = engine.verify_document(&doc, &base()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "asset id 500 in the root manifest is also assigned in sub-file 'sub.json'"
        );
    }
}
