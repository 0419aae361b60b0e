use std::sync::Arc;

use crate::{
    ai::QuestionGenerator,
    catalog::CatalogStore,
    config::Config,
    engine::SessionRegistry,
    error::AppError,
    utils::hash::hash_password,
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub sessions: Arc<SessionRegistry>,
    pub generator: Option<Arc<dyn QuestionGenerator>>,
    pub auth: AdminAuth,
    pub config: Config,
}

/// Argon2 hash of the configured admin password.
#[derive(Clone)]
pub struct AdminAuth {
    pub password_hash: Arc<str>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<CatalogStore>,
        generator: Option<Arc<dyn QuestionGenerator>>,
    ) -> Result<Self, AppError> {
        let password_hash = hash_password(&config.admin_password)?;
        Ok(Self {
            catalog,
            sessions: Arc::new(SessionRegistry::new(config.session_timing)),
            generator,
            auth: AdminAuth {
                password_hash: password_hash.into(),
            },
            config,
        })
    }
}

impl FromRef<AppState> for Arc<CatalogStore> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Arc<SessionRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for AdminAuth {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
