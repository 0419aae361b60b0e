// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    models::session::LoginRequest,
    state::AdminAuth,
    utils::{
        hash::verify_password,
        jwt::{ADMIN_ROLE, sign_jwt},
    },
};

/// Exchanges the admin password for a bearer token.
///
/// The password is checked against the Argon2 hash built at startup.
pub async fn login(
    State(auth): State<AdminAuth>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !verify_password(&payload.password, &auth.password_hash)? {
        tracing::warn!("Admin login failed");
        return Err(AppError::AuthError("Incorrect password".to_string()));
    }

    let token = sign_jwt(
        "admin",
        ADMIN_ROLE,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;
    tracing::info!("Admin logged in");

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "expires_in": config.jwt_expiration
    })))
}
