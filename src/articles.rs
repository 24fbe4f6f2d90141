// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Article metadata discovery for one validation batch

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::dates::{lenient_entry, lenient_timeline, timeline_from_value, TimelineEntry};
use crate::Result;

/// Event type of articles that have nothing to validate
pub const NO_CHANGE: &str = "no change";

/// Contents of `<article_id>/metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub event_type: String,
    #[serde(default)]
    pub event_caption: Option<String>,
    #[serde(default)]
    pub article_content: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    /// `"<lat>_<lon>"` of the image center
    #[serde(default)]
    pub coordinates: Option<String>,
    #[serde(default)]
    pub initial_caption: Option<String>,
    #[serde(default, deserialize_with = "lenient_original_timeline")]
    pub initial_timeline: Option<OriginalTimeline>,
    #[serde(default)]
    pub initial_success: Option<serde_json::Value>,
    #[serde(default)]
    pub initial_visual_reason: Option<serde_json::Value>,
    #[serde(default)]
    pub initial_confidence: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_timeline")]
    pub sat_timeline: Option<Vec<TimelineEntry>>,
    /// Imagery provider, e.g. `planet` or `sentinel`
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_entry")]
    pub start_date: Option<TimelineEntry>,
    #[serde(default, deserialize_with = "lenient_entry")]
    pub end_date: Option<TimelineEntry>,
}

/// Timeline extracted from the article text before the imagery pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OriginalTimeline {
    Entries(Vec<TimelineEntry>),
    ByDate(BTreeMap<String, serde_json::Value>),
}

fn lenient_original_timeline<'de, D>(deserializer: D) -> std::result::Result<Option<OriginalTimeline>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Some(OriginalTimeline::ByDate(map.into_iter().collect())),
        Some(other) => timeline_from_value(other).map(OriginalTimeline::Entries),
        None => None,
    })
}

/// One reviewable article
#[derive(Debug, Clone)]
pub struct Article {
    pub id: String,
    pub dir: PathBuf,
    pub metadata: ArticleMetadata,
}

impl Article {
    /// Folder holding this article's satellite images
    pub fn imagery_dir(&self) -> PathBuf {
        self.dir.join("imagery")
    }

    /// Per-image captions keyed by acquisition date
    pub fn sat_timeline(&self) -> &[TimelineEntry] {
        self.metadata.sat_timeline.as_deref().unwrap_or(&[])
    }

    /// Latitude and longitude as written in the metadata
    pub fn coordinates(&self) -> Option<(&str, &str)> {
        self.metadata.coordinates.as_deref()?.split_once('_')
    }

    /// Predicted event window; only available when both ends resolve
    pub fn predicted_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.metadata.start_date.as_ref()?.date()?;
        let end = self.metadata.end_date.as_ref()?.date()?;
        Some((start, end))
    }

    /// Original timeline as `(date label, description)` pairs
    pub fn original_timeline(&self) -> Vec<(String, String)> {
        match &self.metadata.initial_timeline {
            Some(OriginalTimeline::ByDate(map)) => map.iter()
                .map(|(date, desc)| (date.clone(), value_text(desc).unwrap_or_default()))
                .collect(),
            Some(OriginalTimeline::Entries(entries)) => entries.iter()
                .filter_map(|e| Some((e.date()?.format("%Y-%m-%d").to_string(), e.caption().to_string())))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Imagery provider name with the first letter capitalized
    pub fn source_title(&self) -> String {
        let source = self.metadata.source.as_deref().unwrap_or("satellite");
        let mut chars = source.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
            None => String::new(),
        }
    }
}

/// Render a loosely typed metadata value for display; falsy values are hidden
pub fn value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(false) => None,
        serde_json::Value::String(s) if s.is_empty() => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Google Maps search link for a free-form query
pub fn maps_search_url(query: &str) -> String {
    format!("https://www.google.com/maps/search/?api=1&query={}", query)
}

/// All reviewable articles of one batch, ordered by article id
#[derive(Debug, Clone, Default)]
pub struct ArticleStore {
    articles: Vec<Article>,
}

impl ArticleStore {
    /// Scan `<validation_dir>/*/metadata.json`, skipping "no change" events
    pub fn load(validation_dir: &Path) -> Result<Self> {
        let root = glob::Pattern::escape(&validation_dir.to_string_lossy());
        let pattern = format!("{}/*/metadata.json", root);

        let mut articles = Vec::new();
        let mut skipped = 0usize;
        for entry in glob::glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Cannot read {:?}: {}", e.path(), e.error());
                    continue;
                }
            };
            let Some(dir) = path.parent().map(Path::to_path_buf) else {
                continue;
            };
            let id = dir.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let metadata = match read_metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping article {}: {}", id, e);
                    continue;
                }
            };

            if metadata.event_type == NO_CHANGE {
                skipped += 1;
                continue;
            }
            debug!("Loaded article {}", id);
            articles.push(Article { id, dir, metadata });
        }

        articles.sort_by(|a, b| a.id.cmp(&b.id));
        info!(
            "Loaded {} articles from {:?} ({} without change skipped)",
            articles.len(), validation_dir, skipped
        );

        Ok(Self { articles })
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
    }

    pub fn find(&self, id: &str) -> Option<(usize, &Article)> {
        self.articles.iter().enumerate().find(|(_, a)| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.articles.iter().map(|a| a.id.as_str()).collect()
    }
}

fn read_metadata(path: &Path) -> Result<ArticleMetadata> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
