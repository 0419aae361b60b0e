// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    catalog::CatalogStore,
    engine::{LiveSession, SessionRegistry},
    error::AppError,
    models::session::{AnswerRequest, SessionCreated, StartSessionRequest},
};

async fn lookup(
    sessions: &SessionRegistry,
    id: &Uuid,
) -> Result<Arc<LiveSession>, AppError> {
    sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

/// Starts an attempt at a quiz.
///
/// The quiz is copied out of the current catalog snapshot, so later edits or
/// refreshes do not reach the running attempt.
pub async fn start_session(
    State(catalog): State<Arc<CatalogStore>>,
    State(sessions): State<Arc<SessionRegistry>>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let quiz = catalog
        .snapshot()
        .await
        .find(&payload.quiz_title)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    let (id, view) = sessions.start(Arc::new(quiz)).await;
    tracing::info!(%id, quiz = %payload.quiz_title, "Quiz session started");

    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            id,
            started_at: chrono::Utc::now(),
            view,
        }),
    ))
}

/// Current view of the attempt, including the live countdown.
pub async fn get_session(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id).await?;
    Ok(Json(session.view().await))
}

/// Answers the current question. 409 outside `awaitingAnswer`.
pub async fn answer(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id).await?;
    let view = session.select_option(payload.choice()).await?;
    Ok(Json(view))
}

/// Answer sheet for a finished attempt.
pub async fn review(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id).await?;
    Ok(Json(session.review().await?))
}

/// Back from the answer sheet to the result screen.
pub async fn close_review(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id).await?;
    Ok(Json(session.close_review().await?))
}

/// Plays the same quiz again from the first question.
pub async fn reset(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&sessions, &id).await?;
    let view = session.reset().await?;
    tracing::info!(%id, "Quiz session restarted");
    Ok(Json(view))
}

/// Leaves the attempt and cancels its timer.
pub async fn exit(
    State(sessions): State<Arc<SessionRegistry>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if !sessions.remove(&id).await {
        return Err(AppError::NotFound("Session not found".to_string()));
    }
    tracing::info!(%id, "Quiz session closed");
    Ok(StatusCode::NO_CONTENT)
}
