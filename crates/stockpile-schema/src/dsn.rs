//! Connection settings for the target asset store.
//!
//! Compact form: `"<host> <port>, <username> <password>, <dbName>[, <sslMode>]"`.

use crate::conform::{null_as_default, Schema};
use crate::normalize::{constraint_error, shorthand_error, Notation, NotationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KIND: &str = "dsn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    #[default]
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(constraint_error(KIND, format!("unknown sslMode '{other}'"))),
        }
    }
}

/// Canonical DSN. `ssl_mode` is always present after normalization.
///
/// `Debug` and `Display` redact the password; use
/// [`DsnConfig::connection_string`] when the real credentials are needed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DsnConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub db_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssl_mode: SslMode,
}

impl DsnConfig {
    /// Unredacted `postgres://` connection URL.
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username, self.password, self.host, self.port, self.db_name, self.ssl_mode
        )
    }
}

impl fmt::Display for DsnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgres://{}:***@{}:{}/{}?sslmode={}",
            self.username, self.host, self.port, self.db_name, self.ssl_mode
        )
    }
}

impl fmt::Debug for DsnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DsnConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

impl Schema for DsnConfig {
    const NAME: &'static str = KIND;
}

impl Notation for DsnConfig {
    fn parse_compact(input: &str) -> Result<Self, NotationError> {
        // The raw input carries the password, so errors only describe its shape.
        let groups: Vec<&str> = input.split(',').map(str::trim).collect();
        if !(3..=4).contains(&groups.len()) {
            return Err(shorthand_error(
                KIND,
                format!(
                    "expected 3 or 4 comma-separated groups \
                     ('<host> <port>, <username> <password>, <dbName>[, <sslMode>]'), got {}",
                    groups.len()
                ),
            ));
        }

        let [host, port] = tokens::<2>(groups[0], "host and port")?;
        let [username, password] = tokens::<2>(groups[1], "username and password")?;
        let [db_name] = tokens::<1>(groups[2], "dbName")?;
        let ssl_mode = match groups.get(3) {
            Some(group) => {
                let [mode] = tokens::<1>(group, "sslMode")?;
                mode.parse()?
            }
            None => SslMode::default(),
        };

        let port = port
            .parse::<u16>()
            .map_err(|_| shorthand_error(KIND, format!("port '{port}' is not a valid port number")))?;

        Ok(DsnConfig {
            host: host.to_owned(),
            port,
            username: username.to_owned(),
            password: password.to_owned(),
            db_name: db_name.to_owned(),
            ssl_mode,
        })
    }

    fn validate(&self) -> Result<(), NotationError> {
        if self.host.trim().is_empty() {
            return Err(constraint_error(KIND, "host must not be empty"));
        }
        if self.port == 0 {
            return Err(constraint_error(KIND, "port must not be 0"));
        }
        if self.username.trim().is_empty() {
            return Err(constraint_error(KIND, "username must not be empty"));
        }
        if self.db_name.trim().is_empty() {
            return Err(constraint_error(KIND, "dbName must not be empty"));
        }
        Ok(())
    }
}

fn tokens<'a, const N: usize>(group: &'a str, what: &str) -> Result<[&'a str; N], NotationError> {
    let parts: Vec<&str> = group.split_whitespace().collect();
    <[&str; N]>::try_from(parts.as_slice()).map_err(|_| {
        shorthand_error(
            KIND,
            format!("expected {what} ({N} token(s)), got {} token(s)", parts.len()),
        )
    })
}
