//! Turns an [`AssetSource`] into bytes.
//!
//! Local files are read in place. Remote files are downloaded once into the
//! cache directory and served from disk afterwards; `cache_only` skips the
//! network entirely and fails when the cache has no copy.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::AssetSource;

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub cache_only: bool,
    pub refresh: bool,
}

#[derive(Debug, Clone)]
pub struct AssetFetcher {
    http: Option<Client>,
    cache_dir: PathBuf,
    options: FetchOptions,
}

impl AssetFetcher {
    pub fn new(cache_dir: PathBuf, options: FetchOptions) -> Result<Self> {
        let http = if options.cache_only {
            None
        } else {
            Some(
                Client::builder()
                    .build()
                    .context("failed to construct HTTP client for asset downloads")?,
            )
        };
        Ok(Self {
            http,
            cache_dir,
            options,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn fetch(&self, source: &AssetSource) -> Result<Vec<u8>> {
        match source {
            AssetSource::Local(path) => fs::read(path)
                .with_context(|| format!("failed to read asset at {}", path.display())),
            AssetSource::Remote(url) => self.fetch_remote(url),
        }
    }

    /// Location a remote asset is (or would be) cached at: the host and path
    /// of the url mirrored under the cache directory.
    pub fn cached_path(&self, url: &Url) -> PathBuf {
        self.cache_dir.join(cache_relative_path(url))
    }

    pub fn is_cached(&self, source: &AssetSource) -> bool {
        match source {
            AssetSource::Local(path) => path.exists(),
            AssetSource::Remote(url) => self.cached_path(url).exists(),
        }
    }

    fn fetch_remote(&self, url: &Url) -> Result<Vec<u8>> {
        let cached = self.cached_path(url);
        if cached.exists() && !self.options.refresh {
            debug!(%url, path = %cached.display(), "serving asset from cache");
            return fs::read(&cached)
                .with_context(|| format!("failed to read cached asset {}", cached.display()));
        }

        let Some(http) = self.http.as_ref() else {
            bail!("asset {url} is not cached and remote fetches are disabled (--cache-only)");
        };

        debug!(%url, path = %cached.display(), "downloading asset");
        let response = http
            .get(url.clone())
            .send()
            .with_context(|| format!("requesting asset {url}"))?
            .error_for_status()
            .with_context(|| format!("asset request for {url} failed"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read response body for {url}"))?;

        if let Some(parent) = cached.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to prepare asset cache directory {}", parent.display())
            })?;
        }
        // Downloads land next to their final name and are renamed into place,
        // so an interrupted write never looks like a cached asset.
        let partial = partial_path(&cached);
        fs::write(&partial, &bytes)
            .with_context(|| format!("failed to write cached asset {}", partial.display()))?;
        fs::rename(&partial, &cached).with_context(|| {
            format!(
                "failed to move downloaded asset into place at {}",
                cached.display()
            )
        })?;
        Ok(bytes.to_vec())
    }
}

fn cache_relative_path(url: &Url) -> PathBuf {
    let mut host = sanitize(url.host_str().unwrap_or("local"));
    if let Some(port) = url.port() {
        host = format!("{host}_{port}");
    }
    let mut path = PathBuf::from(host);

    let mut segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|segment| !segment.is_empty())
                .map(sanitize)
                .collect()
        })
        .unwrap_or_default();
    let mut file_name = segments.pop().unwrap_or_else(|| "asset".to_string());
    if let Some(query) = url.query().filter(|query| !query.is_empty()) {
        file_name = format!("{file_name}_{}", sanitize(query));
    }
    for segment in segments {
        path.push(segment);
    }
    path.push(file_name);
    path
}

fn partial_path(cached: &Path) -> PathBuf {
    let name = cached
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());
    cached.with_file_name(format!(".{name}.part"))
}

fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    // Dot-only segments would walk out of the cache directory.
    if cleaned.chars().all(|ch| ch == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}
