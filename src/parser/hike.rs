use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use super::{element_text, ParseError};
use crate::record::BASE_URL;

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#mw-content-text").unwrap());
static UL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul").unwrap());
static LI: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static A: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static P: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

/// Summary-list labels whose field value is the matched item's raw text.
/// The label prefix stays in the value ("Distance: 5 miles").
const TEXT_FIELDS: &[(&str, &str)] = &[
    ("Hike Type", "hike_type"),
    ("Distance", "distance_in_miles"),
    ("Elevation gain", "elevation_gain_in_feet"),
    ("High point", "high_point_in_feet"),
    ("Difficulty", "difficulty"),
    ("Seasons", "seasons"),
    ("Family Friendly", "family_friendly"),
    ("Backpackable", "backpackable"),
    ("Crowded", "crowded"),
];

/// Labels whose item carries an anchor: name from the `title` attribute,
/// URL from `href` rewritten absolute against the wiki base.
const ANCHOR_FIELDS: &[(&str, &str, &str)] = &[
    ("Start point", "start_point_name", "start_point_url"),
    ("End point", "end_point_name", "end_point_url"),
];

/// Extract the untyped field mapping from a hike detail page.
///
/// The wiki offers no stable class/id hooks per field, so everything below
/// the title comes from scanning the summary list for label substrings —
/// case-sensitive, first match wins, absent labels yield null.
pub fn parse_hike_page(html: &str) -> Result<Map<String, Value>, ParseError> {
    let doc = Html::parse_document(html);

    let heading = doc.select(&H1).next().ok_or(ParseError::MissingHeading)?;
    let content = doc.select(&CONTENT).next().ok_or(ParseError::MissingContent)?;
    let summary = content
        .select(&UL)
        .next()
        .ok_or(ParseError::MissingSummaryList)?;
    let items: Vec<ElementRef> = summary.select(&LI).collect();

    let mut fields = Map::new();
    fields.insert("title".to_string(), Value::String(element_text(heading)));

    for &(label, key) in TEXT_FIELDS {
        let value = match find_item(&items, label) {
            Some(item) => Value::String(element_text(item)),
            None => Value::Null,
        };
        fields.insert(key.to_string(), value);
    }

    for &(label, name_key, url_key) in ANCHOR_FIELDS {
        let (name, url) = match find_item(&items, label) {
            Some(item) => {
                let anchor = item
                    .select(&A)
                    .next()
                    .ok_or(ParseError::MissingAnchor(label))?;
                let name = anchor
                    .value()
                    .attr("title")
                    .ok_or(ParseError::MissingAttr(label, "title"))?;
                let href = anchor
                    .value()
                    .attr("href")
                    .ok_or(ParseError::MissingAttr(label, "href"))?;
                (
                    Value::String(name.to_string()),
                    Value::String(format!("{}{}", BASE_URL, href)),
                )
            }
            None => (Value::Null, Value::Null),
        };
        fields.insert(name_key.to_string(), name);
        fields.insert(url_key.to_string(), url);
    }

    // Trail Log: URL only when the matched item actually carries an anchor.
    let trail_log = find_item(&items, "Trail Log")
        .and_then(|item| item.select(&A).next())
        .and_then(|anchor| anchor.value().attr("href"))
        .map(|href| Value::String(format!("{}{}", BASE_URL, href)))
        .unwrap_or(Value::Null);
    fields.insert("trail_log_url".to_string(), trail_log);

    let paragraph = content
        .select(&P)
        .next()
        .ok_or(ParseError::MissingDescription)?;
    fields.insert(
        "description".to_string(),
        Value::String(element_text(paragraph)),
    );

    Ok(fields)
}

fn find_item<'a>(items: &[ElementRef<'a>], label: &str) -> Option<ElementRef<'a>> {
    items
        .iter()
        .copied()
        .find(|item| element_text(*item).contains(label))
}

// ── Tests ──
