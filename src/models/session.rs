// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::engine::{Choice, SessionView};

/// DTO for starting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[validate(length(min = 1, max = 200))]
    pub quiz_title: String,
}

/// Response for a freshly started attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub view: SessionView,
}

/// DTO for answering the current question.
///
/// `index` is the chosen option. `null`, a missing field or a negative number
/// means the time ran out on the client.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub index: Option<i64>,
}

impl AnswerRequest {
    pub fn choice(&self) -> Choice {
        match self.index {
            Some(i) if i >= 0 => usize::try_from(i).map_or(Choice::Timeout, Choice::Option),
            _ => Choice::Timeout,
        }
    }
}

/// DTO for admin login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}
