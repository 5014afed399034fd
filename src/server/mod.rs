//! HTTP control surface
//!
//! Thin axum layer over the generation session and the output library.
//! Generation requests start a background cycle and return at once.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::app::{AppContainer, GenerationSession, LibraryInteractor};
use crate::config::AppConfig;
use crate::error::{ReelError, ReelResult};

pub mod error;
pub mod handlers;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<GenerationSession>,
    pub library: Arc<LibraryInteractor>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(container: &dyn AppContainer, config: AppConfig) -> Self {
        Self {
            session: container.session(),
            library: container.library_interactor(),
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/status", get(handlers::status))
        .route("/generate", post(handlers::generate))
        .route("/videos", get(handlers::list_videos))
        .route("/videos/:name", get(handlers::download_video))
        .route("/stats", get(handlers::stats))
        .route("/config", get(handlers::config))
        .route("/cleanup", post(handlers::cleanup))
        .with_state(state)
}

/// Bind `host:port` and serve until `shutdown` resolves
pub async fn serve<F>(state: AppState, host: &str, port: u16, shutdown: F) -> ReelResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| ReelError::ServerError {
            message: format!("Invalid bind address {}:{}: {}", host, port, e),
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ReelError::ServerError {
            message: format!("Failed to bind {}: {}", addr, e),
        })?;
    info!("Control surface listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::app::testing::Harness;

    fn router(h: &Harness) -> Router {
        create_router(AppState::new(&h.container, h.config.clone()))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(router, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn wait_idle(h: &Harness) {
        let session = h.container.session();
        for _ in 0..500 {
            if !session.is_generating() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("generation did not finish");
    }

    #[tokio::test]
    async fn test_index_and_status() {
        let h = Harness::new();
        let (status, body) = get_json(router(&h), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["/generate"].is_string());

        let (status, body) = get_json(router(&h), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generating"], false);
        assert_eq!(body["total_generated"], 0);
    }

    #[tokio::test]
    async fn test_generate_runs_in_background() {
        let h = Harness::new();
        let (status, body) = send(router(&h), post("/generate", r#"{"num_videos": 2}"#)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "processing");

        wait_idle(&h).await;
        assert_eq!(h.container.session().status().total_generated, 2);

        let (_, body) = get_json(router(&h), "/videos").await;
        assert_eq!(body["count"], 2);
    }

    #[tokio::test]
    async fn test_generate_defaults_to_one() {
        let h = Harness::new();
        let (status, _) = send(router(&h), post("/generate", "")).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        wait_idle(&h).await;
        assert_eq!(h.container.session().status().total_generated, 1);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_counts() {
        let h = Harness::new();
        for body in [r#"{"num_videos": 0}"#, r#"{"num_videos": 11}"#, r#"{"num_videos": -3}"#, "not json"] {
            let (status, body) = send(router(&h), post("/generate", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert!(body["detail"].is_string());
        }
        assert!(!h.container.session().is_generating());
    }

    #[tokio::test]
    async fn test_conflict_while_generating() {
        let h = Harness::new();
        *h.render.encode_delay.lock().unwrap() = Some(Duration::from_millis(100));

        let (status, _) = send(router(&h), post("/generate", "{}")).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, _) = send(router(&h), post("/generate", "{}")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(router(&h), post("/cleanup", "")).await;
        assert_eq!(status, StatusCode::CONFLICT);

        wait_idle(&h).await;
        let (status, _) = send(router(&h), post("/cleanup", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(h.scratch_files().is_empty());
    }

    #[tokio::test]
    async fn test_download_video() {
        let h = Harness::new();
        std::fs::create_dir_all(&h.config.output_dir).unwrap();
        std::fs::write(h.config.output_dir.join("motivational_1.mp4"), b"frames").unwrap();

        let request = Request::builder()
            .uri("/videos/motivational_1.mp4")
            .body(Body::empty())
            .unwrap();
        let response = router(&h).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "video/mp4");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"frames");

        let (status, _) = get_json(router(&h), "/videos/missing.mp4").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(router(&h), "/videos/..%2Fsecret.mp4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_and_config() {
        let h = Harness::new();
        std::fs::create_dir_all(&h.config.output_dir).unwrap();
        std::fs::write(h.config.output_dir.join("motivational_1.mp4"), b"frames").unwrap();

        let (status, body) = get_json(router(&h), "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["videos_generated"], 1);
        assert_eq!(body["status"]["generating"], false);

        let (status, body) = get_json(router(&h), "/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clips_per_video"], 3);
        assert_eq!(body["video_resolution"], "1080x1920");
        assert_eq!(body["keywords_count"], h.config.keywords.len());
    }
}
