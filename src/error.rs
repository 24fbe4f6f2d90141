// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the labeling tool

use thiserror::Error;

/// Result type alias for labeling operations
pub type Result<T> = std::result::Result<T, LabelError>;

/// Labeling error types
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("No feedback recorded yet for article {0}")]
    NoFeedbackRecord(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),
}
