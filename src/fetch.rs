use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::config::Config;

/// Download-at-most-once discipline: each distinct page URL maps to one file
/// in the source directory, and a page already on disk is never re-fetched.
/// Nothing ever evicts or refreshes an entry.
pub struct FetchCache {
    source_dir: PathBuf,
    client: Client,
}

impl FetchCache {
    pub fn new(config: &Config) -> FetchCache {
        FetchCache {
            source_dir: config.source_dir.clone(),
            client: Client::new(),
        }
    }

    /// Ensure a local copy of the page exists and return its path.
    /// A non-2xx response is fatal: it propagates and aborts the run,
    /// with no retry and nothing written.
    pub async fn ensure_local(&self, url: &str) -> Result<PathBuf> {
        let name = page_name(url);
        let path = self.source_dir.join(format!("{}.html", name));

        if path.exists() {
            info!("hike {} already downloaded", name);
            return Ok(path);
        }

        info!("downloading {}: {}", name, url);
        std::fs::create_dir_all(&self.source_dir)
            .with_context(|| format!("creating {}", self.source_dir.display()))?;

        let body = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting {}", url))?
            .error_for_status()
            .with_context(|| format!("fetching {}", url))?
            .text()
            .await
            .with_context(|| format!("reading body of {}", url))?;

        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Local file stem for a URL: its last '/'-separated segment.
fn page_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

// ── Tests ──
