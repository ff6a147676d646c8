use crate::RetrieveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for RetrieveConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth_token: None,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl fmt::Debug for RetrieveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveConfig")
            .field("timeout_secs", &self.timeout_secs)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}

impl RetrieveConfig {
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from `~/.config/stockpile/retrieve.json`, or defaults when absent.
    pub fn load_default() -> Result<Self, RetrieveError> {
        let path = default_config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, RetrieveError> {
        let content = std::fs::read_to_string(path).map_err(|source| RetrieveError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| RetrieveError::Config(format!("invalid retrieve config: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), RetrieveError> {
        let io_err = |source: std::io::Error| RetrieveError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RetrieveError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(io_err)?;
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_config_path() -> Result<PathBuf, RetrieveError> {
    let home =
        std::env::var("HOME").map_err(|_| RetrieveError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/stockpile/retrieve.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/retrieve.json");

        let config = RetrieveConfig::default()
            .with_token("secret123")
            .with_timeout(5);
        config.save(&path).unwrap();

        let loaded = RetrieveConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrieve.json");
        std::fs::write(&path, r#"{"auth_token": "t"}"#).unwrap();

        let loaded = RetrieveConfig::load(&path).unwrap();
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.max_bytes, 16 * 1024 * 1024);
        assert_eq!(loaded.auth_token.as_deref(), Some("t"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrieve.json");
        std::fs::write(&path, "{ nope").unwrap();
        let err = RetrieveConfig::load(&path).unwrap_err();
        assert!(matches!(err, RetrieveError::Config(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let config = RetrieveConfig::default().with_token("hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
