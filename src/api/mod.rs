mod admin;
mod health;

use std::future::Future;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::app::App;
use crate::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Admin request failed: {}", self);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub fn router(app: App) -> Router {
    Router::new()
        .route("/health/live", get(health::live))
        .route("/admin/trends/analyze", post(admin::analyze_trends))
        .route("/admin/trends/today", get(admin::today_trends))
        .route("/admin/posts", get(admin::list_posts))
        .route("/admin/posts/generate", post(admin::generate_posts))
        .route("/admin/posts/{id}", get(admin::get_post))
        .route("/admin/posts/{id}/publish", post(admin::publish_post))
        .with_state(app)
}

pub async fn serve(
    app: App,
    listen_addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("Admin API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
