// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    catalog::CatalogStore,
    error::AppError,
    models::quiz::{
        AddQuestionRequest, CreateQuizRequest, GenerateQuestionsRequest, Question,
        UpdateQuizRequest,
    },
    state::AppState,
};

fn warn_if_unanswerable(title: &str, question: &Question) {
    if !question.has_matching_option() {
        tracing::warn!(
            quiz = %title,
            question = %question.question,
            "Correct answer matches no option; it will always score as wrong"
        );
    }
}

/// Creates an empty quiz.
/// Admin only.
pub async fn create_quiz(
    State(catalog): State<Arc<CatalogStore>>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    catalog.update(|c| c.create_quiz(&payload.title)).await?;
    tracing::info!(quiz = %payload.title, "Quiz created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "title": payload.title })),
    ))
}

/// Renames a quiz. The new title must not be taken.
/// Admin only.
pub async fn update_quiz(
    State(catalog): State<Arc<CatalogStore>>,
    Path(title): Path<String>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    catalog
        .update(|c| c.rename_quiz(&title, &payload.title))
        .await?;
    tracing::info!(from = %title, to = %payload.title, "Quiz renamed");

    Ok(StatusCode::OK)
}

/// Deletes a quiz and all of its questions.
/// Admin only.
pub async fn delete_quiz(
    State(catalog): State<Arc<CatalogStore>>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = catalog.update(|c| c.delete_quiz(&title)).await?;
    tracing::info!(quiz = %title, questions = removed.questions.len(), "Quiz deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Appends a hand-written question to an existing quiz.
/// Admin only.
pub async fn add_question(
    State(catalog): State<Arc<CatalogStore>>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    warn_if_unanswerable(&payload.quiz_title, &payload.new_question);

    let AddQuestionRequest {
        quiz_title,
        new_question,
    } = payload;
    let index = catalog
        .update(|c| c.add_question(&quiz_title, new_question))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Question added successfully",
        "index": index
    })))
}

/// Appends a question to the quiz named in the path and returns its index.
/// Admin only.
pub async fn append_question(
    State(catalog): State<Arc<CatalogStore>>,
    Path(title): Path<String>,
    Json(payload): Json<Question>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    warn_if_unanswerable(&title, &payload);

    let index = catalog
        .update(|c| c.add_question(&title, payload))
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "index": index }))))
}

/// Replaces the question at `index`.
/// Admin only.
pub async fn update_question(
    State(catalog): State<Arc<CatalogStore>>,
    Path((title, index)): Path<(String, usize)>,
    Json(payload): Json<Question>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    warn_if_unanswerable(&title, &payload);

    catalog
        .update(|c| c.update_question(&title, index, payload))
        .await?;

    Ok(StatusCode::OK)
}

/// Removes the question at `index`; later questions shift down by one.
/// Admin only.
pub async fn delete_question(
    State(catalog): State<Arc<CatalogStore>>,
    Path((title, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    catalog
        .update(|c| c.delete_question(&title, index))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Asks the configured generator for questions about `topic` and files them
/// under the quiz of that name, creating it if needed.
/// Admin only.
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let generator = state.generator.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Question generation is not configured".to_string())
    })?;

    let questions = generator
        .generate(&payload.topic, payload.number_of_questions)
        .await?;
    let added = questions.len();

    let title = state
        .catalog
        .update(|c| Ok(c.merge_generated(&payload.topic, questions)))
        .await?;
    tracing::info!(quiz = %title, added, "Generated questions added");

    Ok(Json(json!({
        "success": true,
        "message": format!("Added {} questions to the \"{}\" quiz.", added, title)
    })))
}
