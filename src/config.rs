// src/config.rs

use std::{env, path::PathBuf, str::FromStr, time::Duration};
use dotenvy::dotenv;

use crate::{
    ai::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL},
    engine::SessionTiming,
    error::AppError,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub admin_password: String,
    pub rust_log: String,
    pub catalog_refresh: Duration,
    pub session_idle_ttl: Duration,
    pub session_timing: SessionTiming,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let jwt_secret = required("JWT_SECRET")?;
        let admin_password = required("ADMIN_PASSWORD")?;

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let session_timing = SessionTiming {
            question_seconds: parsed("QUESTION_SECONDS", 30)?,
            ..SessionTiming::default()
        };

        Ok(Self {
            catalog_path: env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "quizzes.json".to_string())
                .into(),
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),
            port: parsed("PORT", 3001)?,
            jwt_secret,
            jwt_expiration: parsed("JWT_EXPIRATION", 3600)?,
            admin_password,
            rust_log,
            catalog_refresh: seconds("CATALOG_REFRESH_SECS", 30)?,
            session_idle_ttl: seconds("SESSION_IDLE_TTL_SECS", 3600)?,
            session_timing,
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::InternalServerError(format!("{} must be set", name)))
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} is not valid: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// A positive number of seconds. Zero would stall the background loops.
fn seconds(name: &str, default: u64) -> Result<Duration, AppError> {
    match parsed(name, default)? {
        0 => Err(AppError::InternalServerError(format!("{} must be at least 1", name))),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Variable names are unique to each test so parallel tests never share one.
    fn set(name: &str, value: &str) {
        unsafe { env::set_var(name, value) };
    }

    #[test]
    fn zero_seconds_is_rejected() {
        set("QUIZDECK_TEST_ZERO_SECS", "0");
        assert!(matches!(
            seconds("QUIZDECK_TEST_ZERO_SECS", 30),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn seconds_fall_back_to_default() {
        assert_eq!(
            seconds("QUIZDECK_TEST_UNSET_SECS", 30).unwrap(),
            Duration::from_secs(30)
        );
        set("QUIZDECK_TEST_FIVE_SECS", "5");
        assert_eq!(
            seconds("QUIZDECK_TEST_FIVE_SECS", 30).unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn unparsable_value_is_rejected() {
        set("QUIZDECK_TEST_BAD_SECS", "soon");
        assert!(seconds("QUIZDECK_TEST_BAD_SECS", 30).is_err());
    }
}
