use std::fmt;
use std::path::{Path, PathBuf};
use stockpile_schema::DocumentFormat;

/// Where a manifest document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    File(PathBuf),
    Url(String),
}

impl Locator {
    /// `http://` and `https://` prefixes select a URL; everything else is a path.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if is_url(trimmed) {
            Locator::Url(trimmed.to_owned())
        } else {
            Locator::File(PathBuf::from(trimmed))
        }
    }

    /// Resolve `reference` relative to this locator.
    ///
    /// URLs and absolute paths are returned unchanged. A relative path is
    /// joined to the directory of a file locator, or replaces the last path
    /// segment of a URL locator.
    pub fn resolve(&self, reference: &str) -> Locator {
        let target = Locator::parse(reference);
        let Locator::File(relative) = &target else {
            return target;
        };
        if relative.is_absolute() {
            return target;
        }
        match self {
            Locator::File(base) => {
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Locator::File(dir.join(relative))
            }
            Locator::Url(base) => Locator::Url(join_url(base, reference.trim())),
        }
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            Locator::File(path) => DocumentFormat::from_locator(&path.to_string_lossy()),
            Locator::Url(url) => DocumentFormat::from_locator(url),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::File(path) => write!(f, "{}", path.display()),
            Locator::Url(url) => f.write_str(url),
        }
    }
}

fn is_url(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn join_url(base: &str, reference: &str) -> String {
    let base = base.split(['?', '#']).next().unwrap_or(base);
    let reference = reference.trim_start_matches("./");
    let path_start = base.find("://").map_or(0, |i| i + 3);
    match base[path_start..].rfind('/') {
        Some(i) => format!("{}{reference}", &base[..=path_start + i]),
        None => format!("{base}/{reference}"),
    }
}
