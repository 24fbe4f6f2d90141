// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Feedback persistence: one CSV row per reviewed article

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{LabelError, Result};

/// Column order of the feedback file
pub const COLUMNS: [&str; 5] = ["article_id", "visible", "new_start_date", "new_end_date", "notes"];

/// Reviewer's verdict on whether the change event is visible in the imagery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Yes,
    Unsure,
    No,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Yes, Visibility::Unsure, Visibility::No];

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Yes => "Yes",
            Visibility::Unsure => "Unsure",
            Visibility::No => "No",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        Visibility::ALL.into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| LabelError::Config(format!("Unknown verdict '{}'", s)))
    }
}

/// One row of the feedback file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub article_id: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub visible: Option<Visibility>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub new_start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub new_end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub notes: Option<String>,
}

impl FeedbackRecord {
    fn new(article_id: &str) -> Self {
        Self {
            article_id: article_id.to_string(),
            ..Self::default()
        }
    }
}

/// In-memory copy of the feedback file, rows in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackTable {
    pub records: Vec<FeedbackRecord>,
}

impl FeedbackTable {
    pub fn get(&self, article_id: &str) -> Option<&FeedbackRecord> {
        self.records.iter().find(|r| r.article_id == article_id)
    }

    pub fn get_mut(&mut self, article_id: &str) -> Option<&mut FeedbackRecord> {
        self.records.iter_mut().find(|r| r.article_id == article_id)
    }

    /// Row for `article_id`, appended when missing
    pub fn ensure(&mut self, article_id: &str) -> &mut FeedbackRecord {
        let index = match self.records.iter().position(|r| r.article_id == article_id) {
            Some(index) => index,
            None => {
                self.records.push(FeedbackRecord::new(article_id));
                self.records.len() - 1
            }
        };
        &mut self.records[index]
    }

    /// Verdict recorded for an article, if any
    pub fn visibility(&self, article_id: &str) -> Option<Visibility> {
        self.get(article_id).and_then(|r| r.visible)
    }

    /// Number of distinct articles carrying a verdict
    pub fn reviewed_count(&self) -> usize {
        self.records.iter().filter(|r| r.visible.is_some()).count()
    }

    /// Number of articles per verdict, in `Visibility::ALL` order
    pub fn verdict_counts(&self) -> Vec<(Visibility, usize)> {
        Visibility::ALL.into_iter()
            .map(|v| (v, self.records.iter().filter(|r| r.visible == Some(v)).count()))
            .collect()
    }
}

/// Review progress for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub reviewed: usize,
    pub total: usize,
}

/// Which corrected date to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

/// Feedback file manager (serializes read-modify-write cycles)
pub struct FeedbackStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FeedbackStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Get feedback file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| LabelError::Server("Feedback lock poisoned".to_string()))
    }

    /// Read the current feedback table; a missing file is an empty table
    pub fn load(&self) -> Result<FeedbackTable> {
        let _guard = self.lock()?;
        self.read_table()
    }

    /// Parse the file; for duplicate article ids only the first row is kept,
    /// so later duplicates are gone from disk after the next write.
    fn read_table(&self) -> Result<FeedbackTable> {
        if !self.path.exists() {
            return Ok(FeedbackTable::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let mut table = FeedbackTable::default();
        for (line, row) in reader.deserialize::<FeedbackRecord>().enumerate() {
            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable feedback row {}: {}", line + 2, e);
                    continue;
                }
            };
            if table.get(&record.article_id).is_some() {
                warn!("Ignoring duplicate feedback row for {}", record.article_id);
                continue;
            }
            table.records.push(record);
        }
        Ok(table)
    }

    fn write_table(&self, table: &FeedbackTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp_path)?;
            writer.write_record(COLUMNS)?;
            for record in &table.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!("Wrote {} feedback rows to {:?}", table.records.len(), self.path);
        Ok(())
    }

    /// Load, apply `change`, and persist only if `change` succeeds
    fn update<T>(&self, change: impl FnOnce(&mut FeedbackTable) -> Result<T>) -> Result<T> {
        let _guard = self.lock()?;
        let mut table = self.read_table()?;
        let result = change(&mut table)?;
        self.write_table(&table)?;
        Ok(result)
    }

    /// Create the row if needed, then set whichever of verdict and note are given
    pub fn record_visibility(
        &self,
        article_id: &str,
        visibility: Option<Visibility>,
        note: Option<&str>,
    ) -> Result<()> {
        self.update(|table| {
            let record = table.ensure(article_id);
            if let Some(visibility) = visibility {
                record.visible = Some(visibility);
            }
            if let Some(note) = note {
                record.notes = non_empty(note);
            }
            Ok(())
        })
    }

    /// Store notes without touching the verdict
    pub fn submit_note(&self, article_id: &str, note: &str) -> Result<()> {
        self.record_visibility(article_id, None, Some(note))
    }

    /// Clear the verdict, keeping notes and corrected dates
    pub fn undo_visibility(&self, article_id: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|table| {
            if let Some(record) = table.get_mut(article_id) {
                record.visible = None;
            }
            Ok(())
        })
    }

    /// Replace both corrected dates; the row must already exist
    pub fn save_dates(
        &self,
        article_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<()> {
        self.update(|table| {
            let record = table.get_mut(article_id)
                .ok_or_else(|| LabelError::NoFeedbackRecord(article_id.to_string()))?;
            record.new_start_date = start;
            record.new_end_date = end;
            Ok(())
        })
    }

    /// Clear one corrected date; the row must already exist
    pub fn clear_date(&self, article_id: &str, field: DateField) -> Result<()> {
        self.update(|table| {
            let record = table.get_mut(article_id)
                .ok_or_else(|| LabelError::NoFeedbackRecord(article_id.to_string()))?;
            match field {
                DateField::Start => record.new_start_date = None,
                DateField::End => record.new_end_date = None,
            }
            Ok(())
        })
    }

    pub fn progress(&self, total: usize) -> Result<Progress> {
        Ok(Progress {
            reviewed: self.load()?.reviewed_count(),
            total,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FeedbackStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("202301").join("feedback.csv");
        (dir, FeedbackStore::new(path))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().records.is_empty());
        assert_eq!(store.progress(4).unwrap(), Progress { reviewed: 0, total: 4 });
    }

    #[test]
    fn test_record_visibility_creates_file_with_header() {
        let (_dir, store) = store();
        store.record_visibility("a1", Some(Visibility::Yes), Some("")).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("article_id,visible,new_start_date,new_end_date,notes"));
        assert_eq!(lines.next(), Some("a1,Yes,,,"));
        assert_eq!(store.load().unwrap().visibility("a1"), Some(Visibility::Yes));
    }

    #[test]
    fn test_note_keeps_verdict() {
        let (_dir, store) = store();
        store.record_visibility("a1", Some(Visibility::No), None).unwrap();
        store.submit_note("a1", "haze, but roof visible, \"maybe\"").unwrap();

        let table = store.load().unwrap();
        let record = table.get("a1").unwrap();
        assert_eq!(record.visible, Some(Visibility::No));
        assert_eq!(record.notes.as_deref(), Some("haze, but roof visible, \"maybe\""));
    }

    #[test]
    fn test_note_alone_creates_row_without_verdict() {
        let (_dir, store) = store();
        store.submit_note("a2", "check again").unwrap();
        let table = store.load().unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.reviewed_count(), 0);
    }

    #[test]
    fn test_undo_keeps_notes_and_dates() {
        let (_dir, store) = store();
        store.record_visibility("a1", Some(Visibility::Yes), Some("tower")).unwrap();
        store.save_dates("a1", Some(ymd(2023, 1, 5)), None).unwrap();
        store.undo_visibility("a1").unwrap();

        let table = store.load().unwrap();
        let record = table.get("a1").unwrap();
        assert_eq!(record.visible, None);
        assert_eq!(record.notes.as_deref(), Some("tower"));
        assert_eq!(record.new_start_date, Some(ymd(2023, 1, 5)));
    }

    #[test]
    fn test_undo_without_file_is_noop() {
        let (_dir, store) = store();
        store.undo_visibility("a1").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_dates_require_existing_row() {
        let (_dir, store) = store();
        store.record_visibility("a1", Some(Visibility::Yes), None).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.save_dates("b2", Some(ymd(2023, 1, 5)), None).unwrap_err();
        assert!(matches!(err, LabelError::NoFeedbackRecord(id) if id == "b2"));
        assert!(matches!(
            store.clear_date("b2", DateField::End),
            Err(LabelError::NoFeedbackRecord(_))
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_save_and_clear_dates() {
        let (_dir, store) = store();
        store.record_visibility("a1", Some(Visibility::Unsure), None).unwrap();
        store.save_dates("a1", Some(ymd(2023, 1, 5)), Some(ymd(2023, 4, 1))).unwrap();
        assert!(fs::read_to_string(store.path()).unwrap().contains("a1,Unsure,2023-01-05,2023-04-01,"));

        store.clear_date("a1", DateField::Start).unwrap();
        let table = store.load().unwrap();
        let record = table.get("a1").unwrap();
        assert_eq!(record.new_start_date, None);
        assert_eq!(record.new_end_date, Some(ymd(2023, 4, 1)));
    }

    #[test]
    fn test_reads_loose_cells_as_empty() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "article_id,visible,new_start_date,new_end_date,notes\n\
             a1,Yes,not-a-date,,ok\n\
             a2,Maybe,,,\n\
             a1,No,,,duplicate\n",
        ).unwrap();

        let table = store.load().unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.visibility("a1"), Some(Visibility::Yes));
        assert_eq!(table.get("a1").unwrap().new_start_date, None);
        assert_eq!(table.visibility("a2"), None);
        assert_eq!(table.reviewed_count(), 1);
    }

    #[test]
    fn test_progress_and_counts() {
        let (_dir, store) = store();
        store.record_visibility("a1", Some(Visibility::Yes), None).unwrap();
        store.record_visibility("a2", Some(Visibility::No), None).unwrap();
        store.record_visibility("a3", Some(Visibility::No), None).unwrap();
        store.submit_note("a4", "later").unwrap();

        assert_eq!(store.progress(10).unwrap(), Progress { reviewed: 3, total: 10 });
        let counts = store.load().unwrap().verdict_counts();
        assert_eq!(counts, vec![(Visibility::Yes, 1), (Visibility::Unsure, 0), (Visibility::No, 2)]);
    }

    #[test]
    fn test_verdicts_never_overwrite_concurrent_notes() {
        let (_dir, store) = store();
        store.submit_note("a1", "note 0").unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..20 {
                    let verdict = if i % 2 == 0 { Visibility::Yes } else { Visibility::No };
                    store.record_visibility("a1", Some(verdict), None).unwrap();
                }
            });
            s.spawn(|| {
                for i in 1..=20 {
                    store.submit_note("a1", &format!("note {}", i)).unwrap();
                }
            });
        });

        let table = store.load().unwrap();
        let record = table.get("a1").unwrap();
        assert_eq!(record.notes.as_deref(), Some("note 20"));
        assert!(record.visible.is_some());
    }

    #[test]
    fn test_duplicate_rows_dropped_on_next_write() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "article_id,visible,new_start_date,new_end_date,notes\n\
             a1,Yes,,,first\n\
             a1,No,,,second\n",
        ).unwrap();

        store.submit_note("a2", "other").unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("a1,Yes,,,first"));
        assert!(!content.contains("second"));
    }

    #[test]
    fn test_poisoned_lock_is_server_error() {
        let (_dir, store) = store();
        let poisoned = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = store.lock.lock().unwrap();
                panic!("writer crashed");
            }).join()
        });
        assert!(poisoned.is_err());
        assert!(matches!(store.load(), Err(LabelError::Server(_))));
    }

    #[test]
    fn test_visibility_from_str() {
        assert_eq!("Unsure".parse::<Visibility>().unwrap(), Visibility::Unsure);
        assert!("maybe".parse::<Visibility>().is_err());
    }
}
