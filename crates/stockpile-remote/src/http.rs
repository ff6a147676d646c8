use crate::{RetrieveConfig, RetrieveError, USER_AGENT};
use std::io::Read;

/// Blocking HTTP(S) fetcher for manifest documents.
///
/// Sends `Authorization: Bearer <token>` when a token is configured and
/// refuses bodies larger than the configured document limit.
pub struct HttpFetcher {
    agent: ureq::Agent,
    auth_token: Option<String>,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &RetrieveConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .build()
            .into();
        Self {
            agent,
            auth_token: config.auth_token.clone(),
            max_bytes: config.max_bytes,
        }
    }

    pub fn get(&self, url: &str) -> Result<Vec<u8>, RetrieveError> {
        tracing::debug!("GET {url}");
        let mut req = self.agent.get(url).header("User-Agent", USER_AGENT);
        if let Some(ref token) = self.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        let resp = match req.call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(RetrieveError::NotFound(url.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(RetrieveError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(RetrieveError::Http(format!("{url}: {e}")));
            }
        };

        // Read one byte past the limit to tell "exactly at limit" from "over".
        let mut reader = resp
            .into_body()
            .into_reader()
            .take(self.max_bytes.saturating_add(1));
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| RetrieveError::Http(format!("{url}: {e}")))?;
        if body.len() as u64 > self.max_bytes {
            return Err(RetrieveError::TooLarge {
                locator: url.to_owned(),
                limit: self.max_bytes,
            });
        }
        tracing::debug!("GET {url}: {} bytes", body.len());
        Ok(body)
    }
}
