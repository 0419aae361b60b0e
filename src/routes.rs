// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, auth, quiz, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public catalog routes plus the session, auth and admin sub-routers.
/// * Serves the single-page front end from `static_dir` for everything else.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3001"),
        HeaderValue::from_static("http://127.0.0.1:3001"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let session_routes = Router::new()
        .route("/", post(session::start_session))
        .route("/{id}", get(session::get_session).delete(session::exit))
        .route("/{id}/answer", post(session::answer))
        .route("/{id}/review", get(session::review))
        .route("/{id}/review/close", post(session::close_review))
        .route("/{id}/reset", post(session::reset));

    let auth_routes = Router::new().route("/login", post(auth::login));

    let admin_routes = Router::new()
        .route("/quizzes", post(admin::create_quiz))
        .route(
            "/quizzes/{title}",
            put(admin::update_quiz).delete(admin::delete_quiz),
        )
        .route("/quizzes/{title}/questions", post(admin::append_question))
        .route(
            "/quizzes/{title}/questions/{index}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/add-question", post(admin::add_question))
        .route("/generate-questions", post(admin::generate_questions))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let static_dir = &state.config.static_dir;
    let spa = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/quizzes.json", get(quiz::get_catalog))
        .route("/api/quiz-titles", get(quiz::list_titles))
        .route("/api/quiz/{title}", get(quiz::get_quiz))
        .route("/api/health", get(quiz::health))
        .nest("/api/sessions", session_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .fallback_service(spa)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{catalog::CatalogStore, config::Config, engine::SessionTiming};

    async fn app_with_static_dir() -> Router {
        let root = std::env::temp_dir().join(format!("quizdeck-routes-{}", uuid::Uuid::new_v4()));
        let static_dir = root.join("public");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>quizdeck</h1>").unwrap();

        let config = Config {
            catalog_path: root.join("quizzes.json"),
            static_dir,
            port: 0,
            jwt_secret: "secret".to_string(),
            jwt_expiration: 60,
            admin_password: "pw".to_string(),
            rust_log: "error".to_string(),
            catalog_refresh: Duration::from_secs(30),
            session_idle_ttl: Duration::from_secs(3600),
            session_timing: SessionTiming::default(),
            gemini_api_key: None,
            gemini_model: String::new(),
            gemini_base_url: String::new(),
        };
        let catalog = Arc::new(CatalogStore::open(&config.catalog_path).await.unwrap());
        create_router(AppState::new(config, catalog, None).unwrap())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_index() {
        let app = app_with_static_dir().await;
        let (status, body) = get(app, "/some/client/route").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>quizdeck</h1>");
    }

    #[tokio::test]
    async fn api_routes_win_over_static_files() {
        let app = app_with_static_dir().await;
        let (status, body) = get(app.clone(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);

        let (status, body) = get(app, "/quizzes.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"quizzes":[]}"#);
    }

    #[tokio::test]
    async fn generation_without_generator_is_unavailable() {
        let app = app_with_static_dir().await;
        let token = crate::utils::jwt::sign_jwt("admin", crate::utils::jwt::ADMIN_ROLE, "secret", 60)
            .unwrap();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/generate-questions")
                    .header("authorization", format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"topic":"space","numberOfQuestions":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
