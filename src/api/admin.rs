use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::app::App;
use crate::error::{AppError, Result};
use crate::models::{BlogPost, CreatedBy, GenerationOutcome, TrendRecord};

const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateRequest {
    #[serde(default)]
    count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListPostsQuery {
    limit: Option<u32>,
    created_by: Option<String>,
}

pub(crate) async fn analyze_trends(State(app): State<App>) -> Result<Json<TrendRecord>> {
    let record = app.orchestrator.analyze_now().await?;
    Ok(Json(record))
}

pub(crate) async fn today_trends(State(app): State<App>) -> Result<Json<TrendRecord>> {
    app.orchestrator
        .trends()
        .today_record()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no trend record for today".to_string()))
}

/// Body is optional; `{}` or an empty body uses the configured default count.
pub(crate) async fn generate_posts(
    State(app): State<App>,
    body: Bytes,
) -> Result<Json<GenerationOutcome>> {
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("malformed request body: {}", e)))?
    };

    let count = match request.count {
        Some(raw) => u32::try_from(raw)
            .map_err(|_| AppError::Validation(format!("count must be positive, got {}", raw)))?,
        None => app.orchestrator.settings().manual_default_count,
    };

    let outcome = app.orchestrator.run_now(count).await?;
    Ok(Json(outcome))
}

pub(crate) async fn list_posts(
    State(app): State<App>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<BlogPost>>> {
    let created_by = query
        .created_by
        .as_deref()
        .map(str::parse::<CreatedBy>)
        .transpose()
        .map_err(AppError::Validation)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    let posts = app.repository.list_blog_posts(created_by, limit).await?;
    Ok(Json(posts))
}

pub(crate) async fn get_post(State(app): State<App>, Path(id): Path<i64>) -> Result<Json<BlogPost>> {
    app.repository
        .get_blog_post(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("blog post {}", id)))
}

pub(crate) async fn publish_post(
    State(app): State<App>,
    Path(id): Path<i64>,
) -> Result<Json<BlogPost>> {
    app.repository
        .publish_blog_post(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("blog post {}", id)))
}
