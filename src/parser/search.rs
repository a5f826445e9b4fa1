use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{element_text, ParseError};
use crate::record::SearchResult;

static WIKITABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.wikitable").unwrap());
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static A: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Extract the ordered search results from a category listing page: skip the
/// header row, then take each row's first anchor as (title, relative URI).
/// A table with only the header row yields an empty list, not an error.
pub fn parse_search_results(html: &str) -> Result<Vec<SearchResult>, ParseError> {
    let doc = Html::parse_document(html);
    let table = doc
        .select(&WIKITABLE)
        .next()
        .ok_or(ParseError::MissingResultsTable)?;

    let mut results = Vec::new();
    for row in table.select(&TR).skip(1) {
        let anchor = row
            .select(&A)
            .next()
            .ok_or(ParseError::MissingAnchor("search result row"))?;
        let uri = anchor
            .value()
            .attr("href")
            .ok_or(ParseError::MissingAttr("search result row", "href"))?;
        results.push(SearchResult {
            title: element_text(anchor),
            uri: uri.to_string(),
        });
    }
    Ok(results)
}

// ── Tests ──
