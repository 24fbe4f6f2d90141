// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

use axum::{
    extract::{Form, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::views::{render_article, render_empty, ArticlePage, PageInput};
use super::AppState;
use crate::dates::parse_iso_field;
use crate::feedback::{DateField, Progress, Visibility};
use crate::imagery::{content_type_for, render_for_display};
use crate::navigation::{article_location, clamp_index, Flash};
use crate::{LabelError, Result};

// === Page Handlers ===

pub async fn index_page() -> Redirect {
    Redirect::to(&article_location(0, None))
}

#[derive(Deserialize)]
pub struct JumpQuery {
    index: Option<usize>,
}

pub async fn jump(State(state): State<Arc<AppState>>, Query(query): Query<JumpQuery>) -> Redirect {
    let (index, clamped) = clamp_index(query.index.unwrap_or(0), state.articles.len());
    let flash = clamped.then_some(Flash::JumpClamped);
    Redirect::to(&article_location(index, flash))
}

#[derive(Deserialize)]
pub struct PageQuery {
    image: Option<usize>,
    flash: Option<String>,
}

pub async fn article_page(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>> {
    if state.articles.is_empty() {
        let folder = state.config.validation_dir().display().to_string();
        return Ok(Html(render_empty(state.templates(), &state.config.date, &folder)?));
    }

    let article = state.article(index)?;
    let gallery = state.gallery(article)?;
    let table = state.feedback.load()?;

    let page = ArticlePage::build(PageInput {
        date: &state.config.date,
        index,
        count: state.articles.len(),
        article,
        gallery: &gallery,
        selected_image: query.image.unwrap_or(0),
        record: table.get(&article.id),
        progress: Progress {
            reviewed: table.reviewed_count(),
            total: state.articles.len(),
        },
        flash: query.flash.as_deref().and_then(Flash::from_param),
    });

    Ok(Html(render_article(state.templates(), &page)?))
}

pub async fn article_image(
    State(state): State<Arc<AppState>>,
    Path((index, slide)): Path<(usize, usize)>,
) -> Result<Response> {
    let article = state.article(index)?;
    let gallery = state.gallery(article)?;
    let path = gallery.get(slide)
        .map(|s| s.path.clone())
        .ok_or_else(|| LabelError::NotFound(format!("image {} of article {}", slide, article.id)))?;

    let max_dimension = state.config.gallery.max_dimension;
    let render_path = path.clone();
    let rendered = tokio::task::spawn_blocking(move || render_for_display(&render_path, max_dimension))
        .await
        .map_err(|e| LabelError::Server(format!("Image task failed: {}", e)))?;

    match rendered {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response()),
        Err(e) => {
            // Fallback: serve the file untouched and let the browser decode it
            warn!("Could not re-encode {:?}: {}, serving original", path, e);
            let bytes = tokio::fs::read(&path).await?;
            Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response())
        }
    }
}

// === Feedback Handlers ===

#[derive(Deserialize)]
pub struct VisibilityForm {
    value: Visibility,
}

pub async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Form(form): Form<VisibilityForm>,
) -> Result<Redirect> {
    let article = state.article(index)?;
    // No note given: the stored one is kept inside the same locked update
    state.feedback.record_visibility(&article.id, Some(form.value), None)?;
    info!("Article {}: visible = {}", article.id, form.value);
    Ok(Redirect::to(&article_location(index, Some(Flash::VerdictSaved))))
}

pub async fn undo_visibility(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Redirect> {
    let article = state.article(index)?;
    state.feedback.undo_visibility(&article.id)?;
    info!("Article {}: verdict cleared", article.id);
    Ok(Redirect::to(&article_location(index, Some(Flash::VerdictUndone))))
}

#[derive(Deserialize)]
pub struct DatesForm {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

pub async fn save_dates(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Form(form): Form<DatesForm>,
) -> Result<Redirect> {
    let article = state.article(index)?;

    let (start, end) = match (parse_iso_field(&form.start), parse_iso_field(&form.end)) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Article {}: {}", article.id, e);
            return Ok(Redirect::to(&article_location(index, Some(Flash::InvalidDate))));
        }
    };

    let flash = match state.feedback.save_dates(&article.id, start, end) {
        Ok(()) => {
            info!("Article {}: corrected dates {:?} - {:?}", article.id, start, end);
            Flash::DatesSaved
        }
        Err(LabelError::NoFeedbackRecord(_)) => Flash::SaveNeedsVerdict,
        Err(e) => return Err(e),
    };
    Ok(Redirect::to(&article_location(index, Some(flash))))
}

pub async fn clear_start(state: State<Arc<AppState>>, index: Path<usize>) -> Result<Redirect> {
    clear_date(state, index, DateField::Start).await
}

pub async fn clear_end(state: State<Arc<AppState>>, index: Path<usize>) -> Result<Redirect> {
    clear_date(state, index, DateField::End).await
}

async fn clear_date(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    field: DateField,
) -> Result<Redirect> {
    let article = state.article(index)?;
    let flash = match (state.feedback.clear_date(&article.id, field), field) {
        (Ok(()), DateField::Start) => Flash::StartCleared,
        (Ok(()), DateField::End) => Flash::EndCleared,
        (Err(LabelError::NoFeedbackRecord(_)), DateField::Start) => Flash::ClearStartNeedsRecord,
        (Err(LabelError::NoFeedbackRecord(_)), DateField::End) => Flash::ClearEndNeedsRecord,
        (Err(e), _) => return Err(e),
    };
    Ok(Redirect::to(&article_location(index, Some(flash))))
}

#[derive(Deserialize)]
pub struct NotesForm {
    #[serde(default)]
    note: String,
}

pub async fn submit_notes(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Form(form): Form<NotesForm>,
) -> Result<Redirect> {
    let article = state.article(index)?;
    state.feedback.submit_note(&article.id, &form.note)?;
    info!("Article {}: notes updated", article.id);
    Ok(Redirect::to(&article_location(index, Some(Flash::NotesSaved))))
}

// === API Handlers ===

#[derive(Serialize)]
pub struct ProgressResponse {
    date: String,
    reviewed: usize,
    total: usize,
}

pub async fn api_progress(State(state): State<Arc<AppState>>) -> Result<Json<ProgressResponse>> {
    let progress = state.feedback.progress(state.articles.len())?;
    Ok(Json(ProgressResponse {
        date: state.config.date.clone(),
        reviewed: progress.reviewed,
        total: progress.total,
    }))
}

#[derive(Serialize)]
pub struct ArticleSummary {
    index: usize,
    article_id: String,
    event_type: String,
    visible: Option<Visibility>,
}

pub async fn api_articles(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ArticleSummary>>> {
    let table = state.feedback.load()?;
    let summaries = state.articles.iter()
        .enumerate()
        .map(|(index, article)| ArticleSummary {
            index,
            article_id: article.id.clone(),
            event_type: article.metadata.event_type.clone(),
            visible: table.visibility(&article.id),
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
