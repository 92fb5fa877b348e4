use axum::{response::IntoResponse, Json};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Missing X-Line-Signature header")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid webhook body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("Upstream error: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl IntoResponse for BotError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let status = match &self {
            Self::MissingSignature | Self::InvalidSignature | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
