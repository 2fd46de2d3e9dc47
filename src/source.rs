//! Source locators: local paths vs HTTP/HTTPS URLs.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::LoadError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceLocator {
    Local(PathBuf),
    Http(String),
}

impl SourceLocator {
    /// Classifies the locator using string parsing only (no filesystem calls).
    pub fn parse(s: &str) -> Self {
        if let Some(after_scheme) = s.find("://") {
            let prefix = s[..after_scheme].to_lowercase();
            if prefix == "http" || prefix == "https" {
                return Self::Http(s.to_string());
            }
        }
        Self::Local(PathBuf::from(s))
    }

    /// Resolve a configured source name against a base directory. URLs and absolute
    /// paths are kept as they are.
    pub fn resolve(base: &Path, name: &str) -> Self {
        match Self::parse(name) {
            Self::Local(p) if p.is_relative() => Self::Local(base.join(p)),
            other => other,
        }
    }

    /// File extension of the last path segment, used to name downloaded temp files.
    pub fn extension(&self) -> Option<String> {
        match self {
            Self::Local(p) => p.extension().and_then(|e| e.to_str()).map(String::from),
            Self::Http(url) => url_path_extension(url),
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(p) => write!(f, "{}", p.display()),
            Self::Http(url) => f.write_str(url),
        }
    }
}

/// Extension of the URL path's last segment (query and fragment stripped).
fn url_path_extension(url: &str) -> Option<String> {
    let after = url.find("://").map(|i| &url[i + 3..]).unwrap_or(url);
    let path_part = after.find('/').map(|j| &after[j + 1..]).unwrap_or("");
    let path_part = path_part.split(['?', '#']).next().unwrap_or(path_part);
    let last_segment = path_part.rsplit('/').next().unwrap_or(path_part);
    Path::new(last_segment)
        .extension()
        .and_then(|e| e.to_str())
        .map(String::from)
}

/// A source made readable from the local filesystem. Downloaded sources live in a temp
/// file that is removed when this value is dropped.
pub struct LocalSource {
    path: PathBuf,
    _temp: Option<tempfile::NamedTempFile>,
}

impl LocalSource {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Make `locator` readable as a local file: local paths must exist, URLs are downloaded.
pub fn fetch(locator: &SourceLocator) -> Result<LocalSource, LoadError> {
    match locator {
        SourceLocator::Local(path) => {
            if !path.is_file() {
                let err = std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} is not a file", path.display()),
                );
                return Err(LoadError::from_io(&locator.to_string(), &err));
            }
            Ok(LocalSource {
                path: path.clone(),
                _temp: None,
            })
        }
        SourceLocator::Http(url) => download_http(url, locator.extension().as_deref()),
    }
}

#[cfg(feature = "http")]
fn download_http(url: &str, extension: Option<&str>) -> Result<LocalSource, LoadError> {
    let unreachable = |message: String| LoadError::Unreachable {
        locator: url.to_string(),
        message,
    };
    let suffix = extension
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".tmp".to_string());
    let mut temp = tempfile::Builder::new()
        .suffix(&suffix)
        .tempfile()
        .map_err(|_| unreachable("Could not create a temporary file.".to_string()))?;
    let response = ureq::get(url)
        .timeout(std::time::Duration::from_secs(60))
        .call()
        .map_err(|e| unreachable(format!("Download failed: {}", e)))?;
    let status = response.status();
    if status >= 400 {
        return Err(unreachable(format!(
            "Server returned {} {}.",
            status,
            response.status_text()
        )));
    }
    std::io::copy(&mut response.into_reader(), &mut temp)
        .map_err(|_| unreachable("Download failed while saving the file.".to_string()))?;
    tracing::debug!(url, path = %temp.path().display(), "downloaded source");
    Ok(LocalSource {
        path: temp.path().to_path_buf(),
        _temp: Some(temp),
    })
}

#[cfg(not(feature = "http"))]
fn download_http(url: &str, _extension: Option<&str>) -> Result<LocalSource, LoadError> {
    Err(LoadError::Unreachable {
        locator: url.to_string(),
        message: "HTTP sources need the `http` feature.".to_string(),
    })
}
