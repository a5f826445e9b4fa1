use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::info;

use crate::fetch::FetchCache;
use crate::parser;
use crate::record::{HikeRecord, SearchResult};

/// Small fixed batch used for smoke-testing the pipeline end to end.
pub const SAMPLE_HIKE_URLS: &[&str] = &[
    "https://www.oregonhikers.org/field_guide/Bells_Mountain_Hike",
    "https://www.oregonhikers.org/field_guide/Triple_Falls_Hike",
    "https://www.oregonhikers.org/field_guide/Acker_Lake_Loop_Hike",
    "https://www.oregonhikers.org/field_guide/Goat_Rocks_Traverse_Hike",
    "https://www.oregonhikers.org/field_guide/Broken_Top_Loop_Hike",
];

/// Fixed category query, capped at 500 rows.
const BACKPACKABLE_SEARCH_URL: &str = "https://www.oregonhikers.org/w/index.php?title=Special:Ask&limit=500&q=%5B%5BCategory%3ABackpackable+Hikes%5D%5D&p=format%3Dbroadtable&po=%3FDifficulty%0A%3FDistance%0A%3FElevation+gain%0A&sort=&order=ASC";

/// Drives fetch → parse → validate for a batch of hike URLs, one page at a
/// time, in input order. The first failure aborts the whole batch.
pub struct Pipeline {
    cache: FetchCache,
}

impl Pipeline {
    pub fn new(cache: FetchCache) -> Pipeline {
        Pipeline { cache }
    }

    /// Fetch one hike page through the cache and turn it into a record.
    pub async fn hike_from_url(&self, url: &str) -> Result<HikeRecord> {
        let path = self.cache.ensure_local(url).await?;
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut fields =
            parser::parse_hike_page(&html).with_context(|| format!("parsing {}", url))?;
        fields.insert("url".to_string(), Value::String(url.to_string()));
        HikeRecord::from_fields(&fields).with_context(|| format!("validating {}", url))
    }

    /// Fixed sample flow: the five literal hike URLs, in order.
    pub async fn sample_hikes(&self) -> Result<Vec<HikeRecord>> {
        let mut records = Vec::with_capacity(SAMPLE_HIKE_URLS.len());
        for url in SAMPLE_HIKE_URLS {
            records.push(self.hike_from_url(url).await?);
        }
        Ok(records)
    }

    /// Discovery flow: parse the category search listing for target URLs,
    /// then process each one. Record order follows table row order.
    pub async fn backpackable_hikes(&self) -> Result<Vec<HikeRecord>> {
        let results = self.backpackable_search_results().await?;
        info!("{} hikes in search results", results.len());

        let pb = ProgressBar::new(results.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );

        let mut records = Vec::with_capacity(results.len());
        for result in &results {
            pb.set_message(result.title.clone());
            records.push(self.hike_from_url(&result.url()).await?);
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(records)
    }

    async fn backpackable_search_results(&self) -> Result<Vec<SearchResult>> {
        let path = self.cache.ensure_local(BACKPACKABLE_SEARCH_URL).await?;
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        parser::parse_search_results(&html).context("parsing search results listing")
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::record::PageUrl;

    const HIKE_PAGE: &str = r#"
    <html><body>
        <h1>Seeded Hike</h1>
        <div id="mw-content-text">
            <ul>
                <li>Start point: <a href="/start" title="Trailhead">Trailhead</a></li>
                <li>Distance: 5 miles</li>
                <li>Elevation gain: 500 feet</li>
                <li>Difficulty: Moderate</li>
                <li>Seasons: All</li>
                <li>Crowded: No</li>
            </ul>
            <p>A quiet walk.</p>
        </div>
    </body></html>
    "#;

    fn seeded_pipeline(dir: &std::path::Path) -> Pipeline {
        Pipeline::new(FetchCache::new(&Config {
            source_dir: dir.to_path_buf(),
        }))
    }

    #[tokio::test]
    async fn hike_from_cached_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Seeded_Hike.html"), HIKE_PAGE).unwrap();
        let pipeline = seeded_pipeline(dir.path());

        let url = "https://www.oregonhikers.org/field_guide/Seeded_Hike";
        let hike = pipeline.hike_from_url(url).await.unwrap();
        assert_eq!(hike.title, "Seeded Hike");
        assert_eq!(hike.url, PageUrl::parse_lenient(url));
        assert_eq!(hike.elevation_gain_in_feet, 500);
        assert_eq!(hike.start_point_name.as_deref(), Some("Trailhead"));
        assert_eq!(
            hike.start_point_url.as_ref().map(|u| u.as_str()),
            Some("https://www.oregonhikers.org/start")
        );
        assert_eq!(hike.end_point_name, None);
        assert_eq!(hike.backpackable, None);
    }

    #[tokio::test]
    async fn malformed_page_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken_Hike.html"), "<html><body></body></html>")
            .unwrap();
        let pipeline = seeded_pipeline(dir.path());

        let err = pipeline
            .hike_from_url("https://www.oregonhikers.org/field_guide/Broken_Hike")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Broken_Hike"));
    }
}
