//! Device-facing HTTP surface.
//!
//! | route              | purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `GET /api/setup`   | identity and image URL for a new device          |
//! | `GET /api/display` | polling contract, gated by `Access-Token`        |
//! | `GET /screen.bmp`  | latest published raster (BMP preferred, else PNG)|
//! | `GET /screen.png`  | same as above                                    |
//! | `POST /api/render` | render all views now                             |
//! | `GET /api/status`  | service state and last render statistics         |
//! | `GET /health`      | liveness                                         |
//! | `GET /`            | endpoint index                                   |
//!
//! Handlers only read published files and call into the pipeline.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use crate::trmnl_logic::state::AppState;

pub const ACCESS_TOKEN_HEADER: &str = "access-token";

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/setup", get(setup_handler))
        .route("/api/display", get(display_handler))
        .route("/api/render", post(render_handler))
        .route("/api/status", get(status_handler))
        .route("/screen.bmp", get(image_handler))
        .route("/screen.png", get(image_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn run(
    addr: SocketAddr,
    app_state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Downstream server listening on {}", addr);
    serve(listener, app_state, async move {
        shutdown.recv().await.ok();
        log::info!("Downstream server shutting down.");
    })
    .await
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    app_state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    axum::serve(listener, router(app_state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// `http://<Host header>`, falling back to the configured bind address.
fn base_url(headers: &HeaderMap, app_state: &AppState) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let server = &app_state.pipeline.config().server;
            format!("{}:{}", server.host, server.port)
        });
    format!("http://{}", host)
}

fn image_url(headers: &HeaderMap, app_state: &AppState) -> String {
    format!("{}/screen.bmp", base_url(headers, app_state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn index_handler(State(app_state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(&headers, &app_state);
    Json(json!({
        "service": "TRMNL Renderer",
        "endpoints": {
            "setup": format!("{base}/api/setup"),
            "display": format!("{base}/api/display"),
            "image": format!("{base}/screen.bmp"),
            "render": format!("{base}/api/render (POST)"),
            "status": format!("{base}/api/status"),
        }
    }))
}

async fn setup_handler(State(app_state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let device = &app_state.pipeline.config().trmnl;
    log::info!(
        "Device setup request (ID: {})",
        headers.get("id").and_then(|v| v.to_str().ok()).unwrap_or("-")
    );
    Json(json!({
        "api_key": device.api_key,
        "friendly_id": device.friendly_id,
        "image_url": image_url(&headers, &app_state),
    }))
}

async fn display_handler(State(app_state): State<AppState>, headers: HeaderMap) -> Response {
    let device = &app_state.pipeline.config().trmnl;
    let token = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token != device.api_key {
        log::warn!("Display request with invalid Access-Token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid Access-Token" })),
        )
            .into_response();
    }

    Json(json!({
        "status": 0,
        "image_url": image_url(&headers, &app_state),
        "filename": "current",
        "refresh_rate": device.refresh_rate_seconds.to_string(),
        "update_firmware": false,
        "reset_firmware": false,
    }))
    .into_response()
}

/// BMP sibling first, then PNG sibling of the configured output path.
fn image_candidates(output_path: &Path) -> [(PathBuf, &'static str); 2] {
    [
        (output_path.with_extension("bmp"), "image/bmp"),
        (output_path.with_extension("png"), "image/png"),
    ]
}

async fn image_handler(State(app_state): State<AppState>) -> Response {
    let output_path = &app_state.pipeline.config().render.output_path;
    for (path, content_type) in image_candidates(output_path) {
        // published files are swapped by rename, so a single read is consistent
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                return (
                    [
                        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                        (
                            header::CACHE_CONTROL,
                            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
                        ),
                        (header::PRAGMA, HeaderValue::from_static("no-cache")),
                        (header::EXPIRES, HeaderValue::from_static("0")),
                    ],
                    bytes,
                )
                    .into_response();
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to open image" })),
                )
                    .into_response();
            }
        }
    }
    (
        StatusCode::NOT_FOUND,
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate"))],
        Json(json!({ "error": "Image not yet generated" })),
    )
        .into_response()
}

async fn render_handler(State(app_state): State<AppState>) -> Response {
    match app_state.pipeline.render_all().await {
        Ok(stats) => Json(json!({ "success": true, "stats": stats })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn status_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let pipeline = &app_state.pipeline;
    let config = pipeline.config();
    let views: Vec<String> = pipeline.views().await.into_iter().map(|v| v.name).collect();
    let stats = pipeline.stats();

    let mut body = json!({
        "status": "running",
        "startedAt": app_state.started_at.to_rfc3339(),
        "config": {
            "refreshIntervalMinutes": config.render.refresh_interval_minutes,
            "outputPath": config.render.output_path,
            "width": config.render.width,
            "height": config.render.height,
        },
        "views": views,
        "currentView": pipeline.current_view_name().await,
    });
    if !stats.is_empty() {
        body["lastRender"] = json!(stats);
    }
    Json(body)
}
