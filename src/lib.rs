// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Sky Scraper: Local Validation & Labeling
//!
//! Serves one batch (`DATE`) of extracted satellite change events to a human
//! reviewer through a local web UI and records their feedback as CSV.

pub mod archive;
pub mod articles;
pub mod config;
pub mod dates;
pub mod error;
pub mod feedback;
pub mod imagery;
pub mod navigation;
pub mod web;

pub use config::AppConfig;
pub use error::{LabelError, Result};
