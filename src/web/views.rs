// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Page models and template rendering

use chrono::NaiveDate;
use minijinja::{context, Environment};
use serde::Serialize;

use crate::articles::{maps_search_url, value_text, Article};
use crate::feedback::{FeedbackRecord, Progress, Visibility};
use crate::imagery::Gallery;
use crate::navigation::{next_index, prev_index, Flash};
use crate::Result;

/// Shown when the metadata has no usable predicted window
const NOT_AVAILABLE: &str = "N/A";

/// Build the template environment with the embedded page templates
pub fn template_env() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template("base.html", include_str!("templates/base.html"))?;
    env.add_template("article.html", include_str!("templates/article.html"))?;
    env.add_template("empty.html", include_str!("templates/empty.html"))?;
    Ok(env)
}

#[derive(Debug, Serialize)]
pub struct TimelineRow {
    pub label: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct LocationView {
    pub name: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub coordinates_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlideView {
    pub index: usize,
    pub url: String,
    pub date: Option<String>,
    pub caption: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryView {
    pub folder: String,
    pub count: usize,
    pub last: usize,
    pub selected: usize,
    pub slide: Option<SlideView>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentView {
    pub success: Option<String>,
    pub reason: Option<String>,
    pub confidence: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerdictOption {
    pub value: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub text_color: &'static str,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct FlashView {
    pub message: &'static str,
    pub is_error: bool,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        Self {
            message: flash.message(),
            is_error: flash.is_error(),
        }
    }
}

/// Everything the review page shows for one article
#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub date: String,
    pub progress: Progress,
    pub index: usize,
    pub last_index: usize,
    pub prev_index: usize,
    pub next_index: usize,
    pub article_id: String,
    pub article_text: Option<String>,
    pub original_caption: Option<String>,
    pub original_timeline: Vec<TimelineRow>,
    pub location: LocationView,
    pub source_title: String,
    pub gallery: GalleryView,
    pub assessment: AssessmentView,
    pub event_type: String,
    pub event_caption: String,
    pub verdict: Option<&'static str>,
    pub verdict_options: Vec<VerdictOption>,
    pub predicted_start: String,
    pub predicted_end: String,
    pub corrected_start: String,
    pub corrected_end: String,
    pub notes: String,
    pub flash: Option<FlashView>,
}

/// Inputs for [`ArticlePage::build`]
pub struct PageInput<'a> {
    pub date: &'a str,
    pub index: usize,
    pub count: usize,
    pub article: &'a Article,
    pub gallery: &'a Gallery,
    pub selected_image: usize,
    pub record: Option<&'a FeedbackRecord>,
    pub progress: Progress,
    pub flash: Option<Flash>,
}

impl ArticlePage {
    pub fn build(input: PageInput<'_>) -> Self {
        let article = input.article;
        let metadata = &article.metadata;

        let (lat, lon) = match article.coordinates() {
            Some((lat, lon)) => (Some(lat.to_string()), Some(lon.to_string())),
            None => (None, None),
        };
        let coordinates_url = match (&lat, &lon) {
            (Some(lat), Some(lon)) => Some(maps_search_url(&format!("{},{}", lat, lon))),
            _ => None,
        };

        let (predicted_start, predicted_end) = match article.predicted_window() {
            Some((start, end)) => (iso(start), iso(end)),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        let verdict = input.record.and_then(|r| r.visible);

        Self {
            date: input.date.to_string(),
            progress: input.progress,
            index: input.index,
            last_index: input.count.saturating_sub(1),
            prev_index: prev_index(input.index, input.count),
            next_index: next_index(input.index, input.count),
            article_id: article.id.clone(),
            article_text: metadata.article_content.clone().filter(|t| !t.is_empty()),
            original_caption: metadata.initial_caption.clone().filter(|t| !t.is_empty()),
            original_timeline: article.original_timeline()
                .into_iter()
                .map(|(label, description)| TimelineRow { label, description })
                .collect(),
            location: LocationView {
                name: metadata.location_name.clone().filter(|n| !n.is_empty()),
                lat,
                lon,
                coordinates_url,
            },
            source_title: article.source_title(),
            gallery: gallery_view(input.index, input.gallery, input.selected_image, article),
            assessment: AssessmentView {
                success: metadata.initial_success.as_ref().and_then(value_text),
                reason: metadata.initial_visual_reason.as_ref().and_then(value_text),
                confidence: metadata.initial_confidence.as_ref().and_then(value_text),
            },
            event_type: metadata.event_type.clone(),
            event_caption: metadata.event_caption.clone().unwrap_or_default(),
            verdict: verdict.map(|v| v.as_str()),
            verdict_options: verdict_options(verdict),
            predicted_start,
            predicted_end,
            corrected_start: input.record.and_then(|r| r.new_start_date).map(iso).unwrap_or_default(),
            corrected_end: input.record.and_then(|r| r.new_end_date).map(iso).unwrap_or_default(),
            notes: input.record.and_then(|r| r.notes.clone()).unwrap_or_default(),
            flash: input.flash.map(FlashView::from),
        }
    }
}

fn gallery_view(article_index: usize, gallery: &Gallery, selected: usize, article: &Article) -> GalleryView {
    let selected = selected.min(gallery.len().saturating_sub(1));
    let slide = gallery.get(selected).map(|slide| SlideView {
        index: selected,
        url: format!("/article/{}/image/{}", article_index, selected),
        date: slide.date.map(iso),
        caption: slide.caption.clone(),
    });

    GalleryView {
        folder: article.imagery_dir().display().to_string(),
        count: gallery.len(),
        last: gallery.len().saturating_sub(1),
        selected,
        slide,
    }
}

fn verdict_options(current: Option<Visibility>) -> Vec<VerdictOption> {
    Visibility::ALL.into_iter()
        .map(|v| {
            let (label, color, text_color) = match v {
                Visibility::Yes => ("\u{2705} Yes", "#2e7d32", "white"),
                Visibility::Unsure => ("\u{1f914} Unsure", "#f9a825", "black"),
                Visibility::No => ("\u{274c} No", "#c62828", "white"),
            };
            VerdictOption {
                value: v.as_str(),
                label,
                color,
                text_color,
                selected: current == Some(v),
            }
        })
        .collect()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn render_article(env: &Environment<'_>, page: &ArticlePage) -> Result<String> {
    let template = env.get_template("article.html")?;
    Ok(template.render(context! { page => page, date => &page.date })?)
}

pub fn render_empty(env: &Environment<'_>, date: &str, folder: &str) -> Result<String> {
    let template = env.get_template("empty.html")?;
    Ok(template.render(context! { date => date, folder => folder })?)
}
