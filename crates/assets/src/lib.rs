mod fetch;

pub use fetch::{AssetFetcher, FetchOptions};

use std::fmt;
use std::path::PathBuf;

use reqwest::Url;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("asset url must not be empty")]
    Empty,
    #[error("invalid remote asset url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Where the bytes of an asset come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Local(PathBuf),
    Remote(Url),
}

impl AssetSource {
    pub fn parse(input: &str) -> Result<Self, SourceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SourceError::Empty);
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|err| SourceError::InvalidUrl {
                url: trimmed.to_string(),
                reason: err.to_string(),
            })?;
            return Ok(Self::Remote(url));
        }

        if let Some(rest) = trimmed.strip_prefix("file://") {
            return Ok(Self::Local(PathBuf::from(rest)));
        }

        Ok(Self::Local(PathBuf::from(trimmed)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}
