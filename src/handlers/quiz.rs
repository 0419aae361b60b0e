// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{catalog::CatalogStore, error::AppError, models::quiz::QuizTitles};

/// Returns the whole catalog in its on-disk shape (`{ "quizzes": [...] }`).
///
/// The bundled front end polls this every 30 seconds.
pub async fn get_catalog(
    State(catalog): State<Arc<CatalogStore>>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = catalog.snapshot().await;
    Ok(Json((*snapshot).clone()))
}

/// Lists quiz titles in catalog order.
pub async fn list_titles(
    State(catalog): State<Arc<CatalogStore>>,
) -> Result<impl IntoResponse, AppError> {
    let titles = catalog.snapshot().await.titles();
    Ok(Json(QuizTitles { titles }))
}

/// Retrieves one quiz by its exact title.
pub async fn get_quiz(
    State(catalog): State<Arc<CatalogStore>>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = catalog.snapshot().await;
    let quiz = snapshot
        .find(&title)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}
