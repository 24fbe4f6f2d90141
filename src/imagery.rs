// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Satellite imagery listing, captioning and display encoding

use chrono::NaiveDate;
use image::GenericImageView;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::dates::{parse_date_from_filename, TimelineEntry};
use crate::Result;

/// Caption that marks an image as unusable for review
const CLOUDY_CAPTION: &str = "obscured by clouds";

/// Shown for dated images that the timeline says nothing about
pub const NO_CAPTION: &str = "No caption available";

/// Gallery filtering options
#[derive(Debug, Clone, Copy)]
pub struct GalleryOptions<'a> {
    pub extensions: &'a [String],
    pub hide_cloudy: bool,
}

/// One image in the timeline viewer
#[derive(Debug, Clone, Serialize)]
pub struct Slide {
    #[serde(skip)]
    pub path: PathBuf,
    pub file_name: String,
    pub date: Option<NaiveDate>,
    pub caption: String,
}

/// Ordered, captioned images for one article
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    pub slides: Vec<Slide>,
}

impl Gallery {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }
}

/// List image files in `dir`, dated images first in date order, then the rest by name.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut images: Vec<(Option<NaiveDate>, String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let name = file_name(&path);
        images.push((parse_date_from_filename(&name), name, path));
    }

    images.sort_by(|a, b| {
        (a.0.is_none(), a.0, &a.1).cmp(&(b.0.is_none(), b.0, &b.1))
    });

    Ok(images.into_iter().map(|(_, _, path)| path).collect())
}

/// Map each timeline date to its caption, marking the predicted start and end.
pub fn timeline_captions(
    timeline: &[TimelineEntry],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> HashMap<NaiveDate, String> {
    let mut captions = HashMap::new();
    for entry in timeline {
        let Some(date) = entry.date() else {
            continue;
        };
        let mut caption = entry.caption().to_string();
        if start == Some(date) {
            caption = format!("(START) {}", caption);
        }
        if end == Some(date) {
            caption = format!("(END) {}", caption);
        }
        captions.insert(date, caption);
    }
    captions
}

/// Build the captioned timeline viewer for an imagery folder.
pub fn build_gallery(
    dir: &Path,
    timeline: &[TimelineEntry],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    options: GalleryOptions<'_>,
) -> Result<Gallery> {
    let captions = timeline_captions(timeline, start, end);
    let mut slides = Vec::new();

    for path in list_images(dir, options.extensions)? {
        let name = file_name(&path);
        let date = parse_date_from_filename(&name);
        let timeline_caption = date.and_then(|d| captions.get(&d));

        if options.hide_cloudy {
            if let Some(caption) = timeline_caption {
                if caption.trim().eq_ignore_ascii_case(CLOUDY_CAPTION) {
                    debug!("Hiding cloudy image {:?}", path);
                    continue;
                }
            }
        }

        let caption = match (date, timeline_caption) {
            (Some(_), Some(caption)) => caption.clone(),
            (Some(_), None) => NO_CAPTION.to_string(),
            (None, _) => name.clone(),
        };

        slides.push(Slide {
            path,
            file_name: name,
            date,
            caption,
        });
    }

    Ok(Gallery { slides })
}

/// Downscale an image for the browser and re-encode it as JPEG
pub fn render_for_display(path: &Path, max_dimension: u32) -> Result<Vec<u8>> {
    let img = image::open(path)?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, image::imageops::FilterType::Triangle)
    } else {
        img
    };
    debug!("Rendering {:?} at {:?}", path, img.dimensions());

    // JPEG has no alpha channel
    let img = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    img.write_to(&mut cursor, image::ImageFormat::Jpeg)?;

    Ok(buffer)
}

/// Content type for serving an image file as-is
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
