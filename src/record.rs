use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// Base address of the wiki; relative hrefs are rewritten against it.
pub const BASE_URL: &str = "https://www.oregonhikers.org";

static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Column set of the hike table, in schema order. The sink relies on this
/// being the fully-enumerated key set of every row mapping.
pub const COLUMNS: &[&str] = &[
    "title",
    "url",
    "start_point_name",
    "start_point_url",
    "end_point_name",
    "end_point_url",
    "trail_log_url",
    "hike_type",
    "distance_in_miles",
    "elevation_gain_in_feet",
    "high_point_in_feet",
    "difficulty",
    "seasons",
    "family_friendly",
    "backpackable",
    "crowded",
    "description",
];

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("field `{0}` is not a string")]
    NotAString(&'static str),
    #[error("field `{0}` has no usable number: {1:?}")]
    BadNumber(&'static str, String),
}

/// Fail-slow bulk report: every bad row, collected before raising.
#[derive(Debug)]
pub struct DatasetValidationError {
    pub errors: Vec<(usize, RecordError)>,
}

impl fmt::Display for DatasetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dataset validation failed with {} errors:", self.errors.len())?;
        for (row, err) in &self.errors {
            writeln!(f, "  row {} failed validation: {}", row, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for DatasetValidationError {}

/// URL field that keeps the raw text when it does not parse as an absolute
/// http(s) URL, instead of rejecting the whole record.
#[derive(Debug, Clone, PartialEq)]
pub enum PageUrl {
    Parsed(Url),
    Raw(String),
}

impl PageUrl {
    pub fn parse_lenient(text: &str) -> PageUrl {
        match Url::parse(text) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => PageUrl::Parsed(url),
            _ => PageUrl::Raw(text.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PageUrl::Parsed(url) => url.as_str(),
            PageUrl::Raw(text) => text,
        }
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PageUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One trail's metadata entry, validated and normalized.
#[derive(Debug, Clone, Serialize)]
pub struct HikeRecord {
    pub title: String,
    pub url: PageUrl,
    pub start_point_name: Option<String>,
    pub start_point_url: Option<PageUrl>,
    pub end_point_name: Option<String>,
    pub end_point_url: Option<PageUrl>,
    pub trail_log_url: Option<PageUrl>,
    pub hike_type: Option<String>,
    pub distance_in_miles: String,
    pub elevation_gain_in_feet: i64,
    pub high_point_in_feet: Option<i64>,
    pub difficulty: String,
    pub seasons: String,
    pub family_friendly: Option<String>,
    pub backpackable: Option<String>,
    pub crowded: String,
    pub description: String,
}

impl HikeRecord {
    /// Build a record from an untyped field mapping, coercing strings into
    /// the schema types. Fails only on missing/incompatible required fields
    /// or numbers with no digit run to extract.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<HikeRecord, RecordError> {
        let record = HikeRecord {
            title: req_string(fields, "title")?,
            url: PageUrl::parse_lenient(&req_string(fields, "url")?),
            start_point_name: opt_string(fields, "start_point_name")?,
            start_point_url: opt_url(fields, "start_point_url")?,
            end_point_name: opt_string(fields, "end_point_name")?,
            end_point_url: opt_url(fields, "end_point_url")?,
            trail_log_url: opt_url(fields, "trail_log_url")?,
            hike_type: opt_string(fields, "hike_type")?,
            distance_in_miles: req_string(fields, "distance_in_miles")?,
            elevation_gain_in_feet: req_feet(fields, "elevation_gain_in_feet")?,
            high_point_in_feet: opt_feet(fields, "high_point_in_feet")?,
            difficulty: req_string(fields, "difficulty")?,
            seasons: req_string(fields, "seasons")?,
            family_friendly: opt_string(fields, "family_friendly")?,
            backpackable: opt_string(fields, "backpackable")?,
            crowded: req_string(fields, "crowded")?,
            description: req_string(fields, "description")?,
        };
        Ok(record.normalized())
    }

    /// Post-construction pass over every string field: trim, and turn each
    /// embedded newline into a single space. Raw URL fallbacks are plain
    /// strings, so they get the same treatment; parsed URLs are left alone.
    fn normalized(mut self) -> HikeRecord {
        fn norm(s: &mut String) {
            *s = s.trim().replace('\n', " ");
        }
        fn norm_opt(s: &mut Option<String>) {
            if let Some(s) = s {
                norm(s);
            }
        }
        fn norm_url(u: &mut Option<PageUrl>) {
            if let Some(PageUrl::Raw(s)) = u {
                norm(s);
            }
        }

        norm(&mut self.title);
        if let PageUrl::Raw(s) = &mut self.url {
            norm(s);
        }
        norm_opt(&mut self.start_point_name);
        norm_url(&mut self.start_point_url);
        norm_opt(&mut self.end_point_name);
        norm_url(&mut self.end_point_url);
        norm_url(&mut self.trail_log_url);
        norm_opt(&mut self.hike_type);
        norm(&mut self.distance_in_miles);
        norm(&mut self.difficulty);
        norm(&mut self.seasons);
        norm_opt(&mut self.family_friendly);
        norm_opt(&mut self.backpackable);
        norm(&mut self.crowded);
        norm(&mut self.description);
        self
    }

    /// Flat row mapping with the full `COLUMNS` key set, for the sink.
    pub fn to_row(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One row of the category-search listing.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub uri: String,
}

impl SearchResult {
    /// Absolute URL: base address + relative URI, plain concatenation.
    pub fn url(&self) -> String {
        format!("{}/{}", BASE_URL, self.uri)
    }
}

/// Validate a batch of row mappings against the hike schema, collecting
/// every row's error before reporting, rather than failing on the first.
pub fn validate_rows(rows: &[Map<String, Value>]) -> Result<(), DatasetValidationError> {
    let errors: Vec<(usize, RecordError)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| HikeRecord::from_fields(row).err().map(|e| (i, e)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DatasetValidationError { errors })
    }
}

fn req_string(fields: &Map<String, Value>, key: &'static str) -> Result<String, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(RecordError::Missing(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RecordError::NotAString(key)),
    }
}

fn opt_string(fields: &Map<String, Value>, key: &'static str) -> Result<Option<String>, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RecordError::NotAString(key)),
    }
}

fn opt_url(fields: &Map<String, Value>, key: &'static str) -> Result<Option<PageUrl>, RecordError> {
    Ok(opt_string(fields, key)?.map(|s| PageUrl::parse_lenient(&s)))
}

fn req_feet(fields: &Map<String, Value>, key: &'static str) -> Result<i64, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(RecordError::Missing(key)),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| RecordError::BadNumber(key, n.to_string())),
        Some(Value::String(s)) => extract_feet(key, s),
        Some(_) => Err(RecordError::NotAString(key)),
    }
}

fn opt_feet(fields: &Map<String, Value>, key: &'static str) -> Result<Option<i64>, RecordError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        _ => req_feet(fields, key).map(Some),
    }
}

/// First contiguous digit run in the text, as an integer. Text with no
/// digits fails construction outright instead of smuggling a string into
/// an integer-typed field.
fn extract_feet(key: &'static str, text: &str) -> Result<i64, RecordError> {
    DIGIT_RUN_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| RecordError::BadNumber(key, text.to_string()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn example_fields() -> Map<String, Value> {
        let fields = json!({
            "title": "Test Hike",
            "url": "https://www.oregonhikers.org/test",
            "start_point_name": "Start Point",
            "start_point_url": "https://www.oregonhikers.org/start",
            "end_point_name": "End Point",
            "end_point_url": "https://www.oregonhikers.org/end",
            "trail_log_url": "https://www.oregonhikers.org/log",
            "hike_type": "Loop",
            "distance_in_miles": "5 miles",
            "elevation_gain_in_feet": "Elevation gain: 500 feet",
            "high_point_in_feet": "1000 feet",
            "difficulty": "Moderate",
            "seasons": "All",
            "family_friendly": "Yes",
            "backpackable": "No",
            "crowded": "No",
            "description": "A test hike",
        });
        match fields {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn digit_run_extraction() {
        let hike = HikeRecord::from_fields(&example_fields()).unwrap();
        assert_eq!(hike.elevation_gain_in_feet, 500);
        assert_eq!(hike.high_point_in_feet, Some(1000));
    }

    #[test]
    fn urls_parse_absolute() {
        let hike = HikeRecord::from_fields(&example_fields()).unwrap();
        assert!(matches!(hike.url, PageUrl::Parsed(_)));
        assert_eq!(
            hike.start_point_url.as_ref().map(|u| u.as_str()),
            Some("https://www.oregonhikers.org/start")
        );
        assert!(matches!(hike.trail_log_url, Some(PageUrl::Parsed(_))));
    }

    #[test]
    fn absent_optional_url_stays_none() {
        let mut fields = example_fields();
        fields.insert("trail_log_url".into(), Value::Null);
        fields.remove("end_point_url");
        let hike = HikeRecord::from_fields(&fields).unwrap();
        assert_eq!(hike.trail_log_url, None);
        assert_eq!(hike.end_point_url, None);
    }

    #[test]
    fn unparseable_url_keeps_raw_text() {
        let mut fields = example_fields();
        fields.insert("start_point_url".into(), json!("/start"));
        let hike = HikeRecord::from_fields(&fields).unwrap();
        assert_eq!(hike.start_point_url, Some(PageUrl::Raw("/start".into())));
    }

    #[test]
    fn strings_trimmed_and_newlines_flattened() {
        let mut fields = example_fields();
        fields.insert("description".into(), json!("  A hike\nwith\nviews  \n"));
        fields.insert("seasons".into(), json!("\nAll year\n"));
        let hike = HikeRecord::from_fields(&fields).unwrap();
        assert_eq!(hike.description, "A hike with views");
        assert_eq!(hike.seasons, "All year");
        assert!(!hike.description.contains('\n'));
    }

    #[test]
    fn missing_required_field_fails() {
        let mut fields = example_fields();
        fields.remove("difficulty");
        let err = HikeRecord::from_fields(&fields).unwrap_err();
        assert!(matches!(err, RecordError::Missing("difficulty")));
    }

    #[test]
    fn elevation_without_digits_fails() {
        let mut fields = example_fields();
        fields.insert("elevation_gain_in_feet".into(), json!("Elevation gain: unknown"));
        let err = HikeRecord::from_fields(&fields).unwrap_err();
        assert!(matches!(err, RecordError::BadNumber("elevation_gain_in_feet", _)));
    }

    #[test]
    fn search_result_url_is_base_plus_uri() {
        let result = SearchResult {
            title: "Bells Mountain Hike".into(),
            uri: "field_guide/Bells_Mountain_Hike".into(),
        };
        assert_eq!(
            result.url(),
            "https://www.oregonhikers.org/field_guide/Bells_Mountain_Hike"
        );
    }

    #[test]
    fn row_mapping_enumerates_every_column() {
        let hike = HikeRecord::from_fields(&example_fields()).unwrap();
        let row = hike.to_row();
        assert_eq!(row.len(), COLUMNS.len());
        for column in COLUMNS {
            assert!(row.contains_key(*column), "missing column {}", column);
        }
    }

    #[test]
    fn bulk_validation_collects_all_errors() {
        let good = example_fields();
        let mut no_title = example_fields();
        no_title.remove("title");
        let mut bad_gain = example_fields();
        bad_gain.insert("elevation_gain_in_feet".into(), json!("none"));

        let err = validate_rows(&[good, no_title, bad_gain]).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.errors[0].0, 1);
        assert_eq!(err.errors[1].0, 2);
        let report = err.to_string();
        assert!(report.contains("row 1"));
        assert!(report.contains("row 2"));
    }
}
