// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Date handling for imagery file names and metadata timelines

use chrono::{Month, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Extract the acquisition date embedded in an image file name.
///
/// The stem is split on `_` and the first part that is either `YYYYMMDD`
/// or `YYYY-MM-DD` and forms a real calendar date wins.
pub fn parse_date_from_filename(name: &str) -> Option<NaiveDate> {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);

    stem.split('_').find_map(parse_date_part)
}

fn parse_date_part(part: &str) -> Option<NaiveDate> {
    if part.len() == 8 && part.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(part, "%Y%m%d").ok();
    }
    if part.len() == 10 && part.contains('-') {
        return NaiveDate::parse_from_str(part, "%Y-%m-%d").ok();
    }
    None
}

/// Month as it appears in metadata: usually an English name, occasionally a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthField {
    Number(u32),
    Name(String),
}

impl MonthField {
    /// Month number, 1-based
    pub fn number(&self) -> Option<u32> {
        match self {
            MonthField::Number(n) if (1..=12).contains(n) => Some(*n),
            MonthField::Number(_) => None,
            MonthField::Name(name) => {
                let name = name.trim();
                name.parse::<Month>()
                    .ok()
                    .map(|m| m.number_from_month())
                    .or_else(|| name.parse::<u32>().ok().filter(|n| (1..=12).contains(n)))
            }
        }
    }
}

/// A `{year, month, day, caption}` entry from a metadata timeline.
///
/// Every field is optional; entries missing a part simply have no date.
/// Entries with mistyped fields are dropped by [`lenient_timeline`] and
/// [`lenient_entry`] rather than rejecting the whole metadata file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<MonthField>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl TimelineEntry {
    pub fn date(&self) -> Option<NaiveDate> {
        let month = self.month.as_ref()?.number()?;
        NaiveDate::from_ymd_opt(self.year?, month, self.day?)
    }

    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or("")
    }
}

/// Keep the well-formed entries of a timeline list; a non-list reads as absent
pub fn timeline_from_value(value: Value) -> Option<Vec<TimelineEntry>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            debug!("Ignoring timeline that is not a list: {}", other);
            return None;
        }
    };
    let entries = items.into_iter()
        .filter_map(|item| match TimelineEntry::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Dropping malformed timeline entry: {}", e);
                None
            }
        })
        .collect();
    Some(entries)
}

/// `deserialize_with` for timeline lists that drops malformed entries one by one
pub fn lenient_timeline<'de, D>(deserializer: D) -> Result<Option<Vec<TimelineEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(timeline_from_value))
}

/// `deserialize_with` for a single timeline entry; anything malformed (e.g. `"N/A"`) is `None`
pub fn lenient_entry<'de, D>(deserializer: D) -> Result<Option<TimelineEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|value| TimelineEntry::deserialize(value).ok()))
}

/// Parse an ISO `YYYY-MM-DD` date from a form field; blank means "no date"
pub fn parse_iso_field(value: &str) -> crate::Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| crate::LabelError::InvalidDate(format!("{}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compact_date_in_filename() {
        assert_eq!(parse_date_from_filename("20230105_planet.png"), Some(ymd(2023, 1, 5)));
        assert_eq!(parse_date_from_filename("planet_20230105.png"), Some(ymd(2023, 1, 5)));
    }

    #[test]
    fn test_dashed_date_in_filename() {
        assert_eq!(parse_date_from_filename("sentinel_2023-02-28_rgb.jpg"), Some(ymd(2023, 2, 28)));
    }

    #[test]
    fn test_invalid_parts_are_skipped() {
        // 20231399 looks like a date but is not one
        assert_eq!(parse_date_from_filename("20231399_20230310.png"), Some(ymd(2023, 3, 10)));
        assert_eq!(parse_date_from_filename("overview.png"), None);
        assert_eq!(parse_date_from_filename("tile_12345678x.png"), None);
    }

    #[test]
    fn test_timeline_entry_date() {
        let entry: TimelineEntry = serde_json::from_str(
            r#"{"year": 2023, "month": "March", "day": 4, "caption": "Crane visible"}"#,
        ).unwrap();
        assert_eq!(entry.date(), Some(ymd(2023, 3, 4)));
        assert_eq!(entry.caption(), "Crane visible");

        let numeric: TimelineEntry = serde_json::from_str(r#"{"year": 2023, "month": 7, "day": 1}"#).unwrap();
        assert_eq!(numeric.date(), Some(ymd(2023, 7, 1)));
    }

    #[test]
    fn test_timeline_entry_without_date() {
        let bad_month: TimelineEntry = serde_json::from_str(
            r#"{"year": 2023, "month": "Smarch", "day": 4}"#,
        ).unwrap();
        assert_eq!(bad_month.date(), None);

        let missing_day: TimelineEntry = serde_json::from_str(r#"{"year": 2023, "month": "May"}"#).unwrap();
        assert_eq!(missing_day.date(), None);

        let impossible: TimelineEntry = serde_json::from_str(
            r#"{"year": 2023, "month": "February", "day": 30}"#,
        ).unwrap();
        assert_eq!(impossible.date(), None);
    }

    #[test]
    fn test_malformed_timeline_entries_are_dropped() {
        let entries = timeline_from_value(serde_json::json!([
            {"year": 2023, "month": "March", "day": 4, "caption": "kept"},
            {"year": "2023", "month": "March", "day": 5, "caption": "mistyped year"},
            "not an entry"
        ])).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].caption(), "kept");

        assert!(timeline_from_value(serde_json::json!("N/A")).is_none());
    }

    #[test]
    fn test_parse_iso_field() {
        assert_eq!(parse_iso_field("").unwrap(), None);
        assert_eq!(parse_iso_field(" 2023-01-09 ").unwrap(), Some(ymd(2023, 1, 9)));
        assert!(parse_iso_field("09/01/2023").is_err());
    }
}
