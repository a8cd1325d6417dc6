use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::Config;
use crate::handlers::{admin::create_admin_router, auth, dashboard, food, profile};
use crate::services::{Database, GenerativeModel, NutritionAnalyzer, UploadStore};

/// Room for the non-file multipart fields on top of the largest allowed upload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub model: Arc<dyn GenerativeModel>,
    pub analyzer: Arc<NutritionAnalyzer>,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<Config>,
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.uploads.max_bytes() + MULTIPART_OVERHEAD_BYTES;
    let uploads_dir = state.uploads.dir().to_path_buf();

    let api = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/food-entries", post(food::create_food_entry))
        .route("/food-entries/today", get(food::today_entries))
        .route("/food-entries/history", get(food::history))
        .route("/food-entries/:id", delete(food::delete_food_entry))
        .route("/analyze-food-image", post(food::analyze_food_image))
        .route("/dashboard/today", get(dashboard::today))
        .route("/progress", get(dashboard::progress))
        .route("/profile", get(profile::get_profile))
        .route("/motivational-quote", get(profile::motivational_quote))
        .nest("/admin", create_admin_router());

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "Protein Tracker API - see /api for endpoints"
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai_service::UpstreamError;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::path::{Path, PathBuf};
    use tower::ServiceExt;

    struct SilentModel;

    #[async_trait::async_trait]
    impl GenerativeModel for SilentModel {
        async fn describe_image(&self, _: &str, _: &[u8], _: &str) -> Result<String, UpstreamError> {
            Err(UpstreamError::RequestFailed("offline".to_string()))
        }

        async fn complete(&self, _: &str) -> Result<String, UpstreamError> {
            Err(UpstreamError::RequestFailed("offline".to_string()))
        }

        fn provider_name(&self) -> &'static str {
            "silent"
        }

        fn model_name(&self) -> &str {
            "none"
        }
    }

    /// Router over a lazy pool and a scratch uploads directory that is removed on drop.
    struct TestApp {
        router: Router,
        uploads_dir: PathBuf,
    }

    impl TestApp {
        fn new() -> Self {
            let suffix: u64 = rand::random();
            let uploads_dir = std::env::temp_dir().join(format!("protein-tracker-router-{}", suffix));
            let router = create_router(test_state(&uploads_dir));

            TestApp { router, uploads_dir }
        }

        async fn send(&self, request: Request<Body>) -> axum::response::Response {
            self.router.clone().oneshot(request).await.unwrap()
        }
    }

    impl Drop for TestApp {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.uploads_dir).ok();
        }
    }

    fn test_state(uploads_dir: &Path) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost:1/unused".to_string()),
            "SESSION_SECRET" => Some("router-test-secret".to_string()),
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "UPLOADS_DIR" => Some(uploads_dir.to_string_lossy().into_owned()),
            _ => None,
        })
        .unwrap();

        let model: Arc<dyn GenerativeModel> = Arc::new(SilentModel);
        AppState {
            db: Arc::new(Database::connect_lazy(&config.database_url).unwrap()),
            analyzer: Arc::new(NutritionAnalyzer::new(model.clone())),
            uploads: Arc::new(UploadStore::new(&config.uploads_dir, config.max_upload_bytes).unwrap()),
            model,
            config: Arc::new(config),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new();

        let response = app
            .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for (method, uri) in [
            ("GET", "/api/food-entries/today"),
            ("GET", "/api/dashboard/today"),
            ("GET", "/api/profile"),
            ("GET", "/api/motivational-quote"),
            ("DELETE", "/api/food-entries/3"),
            ("GET", "/api/admin/pending-users"),
        ] {
            let app = TestApp::new();
            let response = app
                .send(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await;

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(body_json(response).await["error"], "Access token required");
        }
    }

    #[tokio::test]
    async fn test_non_bearer_authorization_is_rejected() {
        let app = TestApp::new();

        let response = app
            .send(
                Request::builder()
                    .uri("/api/profile")
                    .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = TestApp::new();

        let response = app
            .send(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scratch_uploads_dir_is_removed_on_drop() {
        let app = TestApp::new();
        let dir = app.uploads_dir.clone();
        assert!(dir.is_dir());

        drop(app);
        assert!(!dir.exists());
    }
}
