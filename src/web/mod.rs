// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web UI for reviewing one validation batch

mod handlers;
pub mod views;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use minijinja::Environment;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::articles::{Article, ArticleStore};
use crate::config::AppConfig;
use crate::feedback::FeedbackStore;
use crate::imagery::{build_gallery, Gallery, GalleryOptions};
use crate::{LabelError, Result};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub articles: ArticleStore,
    pub feedback: FeedbackStore,
    templates: Environment<'static>,
}

impl AppState {
    pub fn new(config: AppConfig, articles: ArticleStore, feedback: FeedbackStore) -> Result<Self> {
        Ok(Self {
            config,
            articles,
            feedback,
            templates: views::template_env()?,
        })
    }

    pub(crate) fn templates(&self) -> &Environment<'static> {
        &self.templates
    }

    /// Article at `index`, or a 404
    pub fn article(&self, index: usize) -> Result<&Article> {
        self.articles.get(index)
            .ok_or_else(|| LabelError::NotFound(format!("article index {}", index)))
    }

    /// Captioned images for an article, using the configured filters
    pub fn gallery(&self, article: &Article) -> Result<Gallery> {
        let (start, end) = match article.predicted_window() {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        build_gallery(
            &article.imagery_dir(),
            article.sat_timeline(),
            start,
            end,
            GalleryOptions {
                extensions: &self.config.gallery.extensions,
                hide_cloudy: self.config.gallery.hide_cloudy,
            },
        )
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(handlers::index_page))
        .route("/jump", get(handlers::jump))
        .route("/article/:index", get(handlers::article_page))
        .route("/article/:index/image/:slide", get(handlers::article_image))
        // Feedback forms
        .route("/article/:index/visibility", post(handlers::set_visibility))
        .route("/article/:index/undo", post(handlers::undo_visibility))
        .route("/article/:index/dates", post(handlers::save_dates))
        .route("/article/:index/dates/clear-start", post(handlers::clear_start))
        .route("/article/:index/dates/clear-end", post(handlers::clear_end))
        .route("/article/:index/notes", post(handlers::submit_notes))
        // API endpoints
        .route("/api/progress", get(handlers::api_progress))
        .route("/api/articles", get(handlers::api_articles))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for LabelError {
    fn into_response(self) -> Response {
        let status = match &self {
            LabelError::NotFound(_) => StatusCode::NOT_FOUND,
            LabelError::InvalidDate(_) | LabelError::NoFeedbackRecord(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Start the web server and run until Ctrl+C or SIGTERM
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.web.host, state.config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Validation UI available at http://{}", addr);

    let router = create_router(Arc::new(state));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LabelError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
