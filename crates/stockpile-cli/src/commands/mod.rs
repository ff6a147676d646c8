pub mod verify;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use stockpile_core::CoreError;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_RETRIEVE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Map a verification failure to the process exit code.
pub fn exit_code_for(err: &CoreError) -> u8 {
    if err.is_retrieval() {
        return EXIT_RETRIEVE_ERROR;
    }
    match err {
        CoreError::Upload(_) | CoreError::Serialization(_) | CoreError::InvalidTransition { .. } => {
            EXIT_FAILURE
        }
        _ => EXIT_MANIFEST_ERROR,
    }
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, &format!("{} {msg}", colorize_status(true)));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, &format!("{} {msg}", colorize_status(false)));
}

fn finish(pb: &ProgressBar, msg: &str) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg.to_owned());
}

pub fn colorize_status(ok: bool) -> String {
    use console::Style;
    if ok {
        Style::new().green().apply_to("✓").to_string()
    } else {
        Style::new().red().bold().apply_to("✗").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpile_core::UploadError;
    use stockpile_remote::RetrieveError;
    use stockpile_schema::{AssetId, ManifestError};

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_MANIFEST_ERROR);
        assert_ne!(EXIT_MANIFEST_ERROR, EXIT_RETRIEVE_ERROR);
    }

    #[test]
    fn content_errors_map_to_manifest_exit() {
        let err = CoreError::from(ManifestError::MissingField("settings"));
        assert_eq!(exit_code_for(&err), EXIT_MANIFEST_ERROR);
        let err = CoreError::DuplicateId(AssetId::new(4));
        assert_eq!(exit_code_for(&err), EXIT_MANIFEST_ERROR);
        let err = CoreError::IdConflict {
            id: AssetId::new(4),
            path: "tiles.json".to_owned(),
        };
        assert_eq!(exit_code_for(&err), EXIT_MANIFEST_ERROR);
    }

    #[test]
    fn retrieval_errors_map_to_retrieve_exit_even_when_nested() {
        let err = CoreError::SubFile {
            path: "a.json".to_owned(),
            source: Box::new(CoreError::from(RetrieveError::NotFound("a.json".to_owned()))),
        };
        assert_eq!(exit_code_for(&err), EXIT_RETRIEVE_ERROR);
    }

    #[test]
    fn upload_errors_map_to_generic_failure() {
        let err = CoreError::from(UploadError::Other("disk full".to_owned()));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }

    #[test]
    fn colorize_status_keeps_symbol() {
        assert!(colorize_status(true).contains('✓'));
        assert!(colorize_status(false).contains('✗'));
    }

    #[test]
    fn spinner_creates_progress_bar() {
        let pb = spinner("testing...");
        spin_ok(&pb, "done");
        let pb = spinner("testing...");
        spin_fail(&pb, "failed");
    }
}
