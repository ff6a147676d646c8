use crate::http::HttpFetcher;
use crate::{Locator, Retrieve, RetrieveConfig, RetrieveError};
use std::io::{ErrorKind, Read};
use std::path::Path;
use stockpile_schema::{parse_document_str, Document};

/// Default retriever: local files and `http(s)://` URLs, JSON or TOML.
pub struct DocumentRetriever {
    max_bytes: u64,
    http: HttpFetcher,
}

impl DocumentRetriever {
    pub fn new(config: &RetrieveConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            http: HttpFetcher::new(config),
        }
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, RetrieveError> {
        tracing::debug!("reading {}", path.display());
        let io_err = |source: std::io::Error| {
            if source.kind() == ErrorKind::NotFound {
                RetrieveError::NotFound(path.display().to_string())
            } else {
                RetrieveError::Io {
                    path: path.display().to_string(),
                    source,
                }
            }
        };
        let file = std::fs::File::open(path).map_err(io_err)?;
        let mut body = Vec::new();
        file.take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(io_err)?;
        if body.len() as u64 > self.max_bytes {
            return Err(RetrieveError::TooLarge {
                locator: path.display().to_string(),
                limit: self.max_bytes,
            });
        }
        Ok(body)
    }
}

impl Retrieve for DocumentRetriever {
    fn retrieve(&self, locator: &Locator) -> Result<Document, RetrieveError> {
        let bytes = match locator {
            Locator::File(path) => self.read_file(path)?,
            Locator::Url(url) => self.http.get(url)?,
        };
        let text =
            String::from_utf8(bytes).map_err(|_| RetrieveError::Encoding(locator.to_string()))?;
        parse_document_str(&text, locator.format()).map_err(|source| RetrieveError::Parse {
            locator: locator.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::TestServer;
    use serde_json::json;

    fn retriever() -> DocumentRetriever {
        DocumentRetriever::new(&RetrieveConfig::default())
    }

    #[test]
    fn reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, r#"{"assets": [1, 2]}"#).unwrap();
        let doc = retriever().retrieve(&Locator::File(path)).unwrap();
        assert_eq!(doc, json!({"assets": [1, 2]}));
    }

    #[test]
    fn reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.toml");
        std::fs::write(&path, "[settings]\ndsn = \"h 1, u p, d\"\n").unwrap();
        let doc = retriever().retrieve(&Locator::File(path)).unwrap();
        assert_eq!(doc, json!({"settings": {"dsn": "h 1, u p, d"}}));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = retriever().retrieve(&Locator::File(path)).unwrap_err();
        assert!(matches!(err, RetrieveError::NotFound(_)), "{err}");
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = retriever()
            .retrieve(&Locator::File(dir.path().to_path_buf()))
            .unwrap_err();
        assert!(matches!(err, RetrieveError::Io { .. }), "{err}");
    }

    #[test]
    fn malformed_document_names_locator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ oops").unwrap();
        let err = retriever().retrieve(&Locator::File(path)).unwrap_err();
        assert!(matches!(err, RetrieveError::Parse { .. }));
        let msg = err.to_string();
        assert!(msg.contains("bad.json"), "{msg}");
        assert!(msg.contains("failed to parse manifest"), "{msg}");
    }

    #[test]
    fn non_utf8_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = retriever().retrieve(&Locator::File(path)).unwrap_err();
        assert!(matches!(err, RetrieveError::Encoding(_)));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        std::fs::write(&path, "[1, 2, 3, 4, 5]").unwrap();
        let retriever = DocumentRetriever::new(&RetrieveConfig {
            max_bytes: 5,
            ..RetrieveConfig::default()
        });
        let err = retriever.retrieve(&Locator::File(path)).unwrap_err();
        assert!(matches!(err, RetrieveError::TooLarge { limit: 5, .. }));
    }

    #[test]
    fn retrieves_over_http() {
        let server = TestServer::start(&[("/subs/a.toml", "[[assets]]\ntype = \"single\"\n")]);
        let locator = Locator::parse(&format!("{}/subs/a.toml", server.url));
        let doc = retriever().retrieve(&locator).unwrap();
        assert_eq!(doc, json!({"assets": [{"type": "single"}]}));
    }

    #[test]
    fn unbounded_limit_still_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, r#"{"assets": []}"#).unwrap();
        let retriever = DocumentRetriever::new(&RetrieveConfig {
            max_bytes: u64::MAX,
            ..RetrieveConfig::default()
        });
        let doc = retriever.retrieve(&Locator::File(path)).unwrap();
        assert_eq!(doc, json!({"assets": []}));
    }
}
