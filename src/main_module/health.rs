//! Health check handler

use axum::http::StatusCode;
use axum::Json;

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "facebot",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
