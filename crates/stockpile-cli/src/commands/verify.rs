use super::{exit_code_for, json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use serde::Serialize;
use stockpile_core::{BundleSummary, Engine};
use stockpile_remote::{Locator, RetrieveConfig};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOutput<'a> {
    verified: bool,
    locator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dsn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<BundleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Accepts `path=<locator>` or a bare locator.
pub fn parse_path_arg(arg: &str) -> Result<Locator, String> {
    let raw = arg.strip_prefix("path=").unwrap_or(arg).trim();
    if raw.is_empty() {
        return Err("missing manifest location: expected path=<file-or-url>".to_owned());
    }
    Ok(Locator::parse(raw))
}

pub fn run(config: &RetrieveConfig, path: &str, json: bool) -> Result<u8, String> {
    let locator = parse_path_arg(path)?;
    let engine = Engine::with_config(config);

    let pb = (!json).then(|| spinner(&format!("verifying {locator}…")));
    let result = engine.verify(&locator);

    match result {
        Ok(bundle) => {
            let summary = bundle.summary();
            if let Some(pb) = &pb {
                spin_ok(pb, "verification complete");
            }
            if json {
                let payload = VerifyOutput {
                    verified: true,
                    locator: locator.to_string(),
                    digest: Some(bundle.digest.as_str()),
                    dsn: Some(bundle.manifest.settings.dsn.to_string()),
                    summary: Some(summary),
                    error: None,
                };
                println!("{}", json_pretty(&payload)?);
            } else {
                println!(
                    "manifest verified: {} assets, {} sub-manifests",
                    summary.single_assets + summary.collections,
                    summary.sub_manifests
                );
                println!("digest:      {}", bundle.digest);
                println!("dsn:         {}", bundle.manifest.settings.dsn);
                println!(
                    "identifiers: {} ({} collection entries)",
                    summary.total_ids, summary.collection_entries
                );
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "verification failed");
            }
            if json {
                let payload = VerifyOutput {
                    verified: false,
                    locator: locator.to_string(),
                    digest: None,
                    dsn: None,
                    summary: None,
                    error: Some(e.to_string()),
                };
                println!("{}", json_pretty(&payload)?);
            }
            eprintln!("error: {e}");
            Ok(exit_code_for(&e))
        }
    }
}
