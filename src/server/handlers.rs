//! Request handlers for the control surface

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::app::library_interactor::VideoEntry;
use crate::domain::model::SessionStatus;
use crate::domain::rules::{validate_video_count, OUTPUT_EXTENSION};
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::utils::path::is_plain_file_name;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub num_videos: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub count: usize,
    pub videos: Vec<VideoEntry>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub videos_generated: usize,
    pub disk_usage_mb: f64,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub output_dir: String,
    pub temp_dir: String,
    pub max_video_length: u32,
    pub min_video_length: u32,
    pub clips_per_video: usize,
    pub generation_interval_hours: u64,
    pub video_resolution: String,
    pub frame_rate: u32,
    pub keywords_count: usize,
    pub quotes_count: usize,
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "ReelMash",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/status": "GET - Current generation status",
            "/generate": "POST - Start generating video(s)",
            "/videos": "GET - List generated videos",
            "/videos/{name}": "GET - Download one video",
            "/stats": "GET - Library statistics",
            "/config": "GET - Effective configuration",
            "/cleanup": "POST - Clean up scratch files"
        }
    }))
}

pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status())
}

/// Start a cycle in the background. An empty body asks for one video.
pub async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?
    };

    let requested = request.num_videos.unwrap_or(1);
    let count = usize::try_from(requested)
        .map_err(|_| ApiError::bad_request("num_videos must be positive"))
        .and_then(|n| validate_video_count(n).map_err(ApiError::from))?;

    let handle = state.session.spawn_generate(count)?;
    tokio::spawn(async move {
        match handle.await {
            Ok(Ok(videos)) => info!("Background generation produced {} video(s)", videos.len()),
            Ok(Err(e)) => error!("Background generation failed: {}", e),
            Err(e) => error!("Background generation task aborted: {}", e),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            message: format!("Started generation of {} video(s)", count),
            status: "processing",
        }),
    ))
}

pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<VideoListResponse>> {
    let videos = state.library.list_videos().await?;
    Ok(Json(VideoListResponse {
        count: videos.len(),
        videos,
    }))
}

/// Stream a generated video back as `video/mp4`
pub async fn download_video(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    if !is_plain_file_name(&name) {
        return Err(ApiError::bad_request("Invalid video name"));
    }

    let path = state
        .library
        .find_video(&name)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("Video not found"))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .len();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format!("video/{}", OUTPUT_EXTENSION))
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(response)
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.library.statistics().await?;
    let usage = state.library.disk_usage().await?;
    Ok(Json(StatsResponse {
        videos_generated: stats.total_videos,
        disk_usage_mb: usage.total_mb,
        status: state.session.status(),
    }))
}

pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        output_dir: config.output_dir.display().to_string(),
        temp_dir: config.temp_dir.display().to_string(),
        max_video_length: config.max_video_length,
        min_video_length: config.min_video_length,
        clips_per_video: config.clips_per_video,
        generation_interval_hours: config.generation_interval_hours,
        video_resolution: config.video_resolution.to_string(),
        frame_rate: config.frame_rate,
        keywords_count: config.keywords.len(),
        quotes_count: config.quotes.len(),
    })
}

pub async fn cleanup(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = state.session.cleanup().await?;
    Ok(Json(json!({
        "message": "Cleanup complete",
        "deleted": report.deleted,
        "failed": report.failed
    })))
}
