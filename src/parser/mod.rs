mod hike;
mod search;

pub use hike::parse_hike_page;
pub use search::parse_search_results;

use scraper::ElementRef;
use thiserror::Error;

/// Structural failures: a required DOM anchor is missing, so no partial
/// record can be produced for the page. The caller aborts the batch.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("page has no <h1> heading")]
    MissingHeading,
    #[error("page has no mw-content-text region")]
    MissingContent,
    #[error("content region has no summary list")]
    MissingSummaryList,
    #[error("content region has no description paragraph")]
    MissingDescription,
    #[error("`{0}` item has no anchor")]
    MissingAnchor(&'static str),
    #[error("`{0}` anchor has no {1} attribute")]
    MissingAttr(&'static str, &'static str),
    #[error("page has no search results table")]
    MissingResultsTable,
}

/// Concatenated text of an element and all its descendants.
pub(crate) fn element_text(element: ElementRef) -> String {
    element.text().collect()
}
