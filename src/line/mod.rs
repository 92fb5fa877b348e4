//! LINE Messaging API channel: webhook endpoint, event dispatch and the
//! image-to-report flow.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::botmodels::format_face_report;
use crate::shared::error::BotError;
use crate::shared::state::AppState;

pub mod client;
pub mod signature;

pub use client::{LineClient, MessagingApi};
pub use signature::{verify_signature, SIGNATURE_HEADER};

pub const NO_FACES_TEXT: &str = "No faces were detected.";
pub const ANALYSIS_FAILED_TEXT: &str = "Face analysis failed.";

static VERIFICATION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^0+$").expect("valid reply token pattern"));

#[derive(Debug, Deserialize, Serialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EventMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new().route("/callback", post(handle_callback))
}

pub async fn handle_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, BotError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(BotError::MissingSignature)?;
    debug!("signature={signature}");
    debug!("body={}", String::from_utf8_lossy(&body));

    if !verify_signature(&state.channel_secret, &body, signature) {
        warn!("Rejected LINE webhook with invalid signature");
        return Err(BotError::InvalidSignature);
    }

    let payload: WebhookBody = serde_json::from_slice(&body)?;
    info!("LINE webhook received: {} event(s)", payload.events.len());

    for event in &payload.events {
        dispatch_event(&state, event).await;
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Webhook verification requests from the LINE console carry a reply token
/// made only of zeros.
pub fn is_valid_reply_token(token: &str) -> bool {
    !VERIFICATION_TOKEN.is_match(token)
}

async fn dispatch_event(state: &AppState, event: &WebhookEvent) {
    let (Some(message), Some(reply_token)) = (&event.message, &event.reply_token) else {
        debug!("Ignoring {} event", event.event_type);
        return;
    };
    if event.event_type != "message" {
        debug!("Ignoring {} event", event.event_type);
        return;
    }

    match message.message_type.as_str() {
        "text" => {
            info!("TextMessageEvent: id={} text={:?}", message.id, message.text);
            if !is_valid_reply_token(reply_token) {
                debug!("Webhook verification event, not replying");
            }
        }
        "image" => {
            info!("ImageMessageEvent: id={}", message.id);
            if !is_valid_reply_token(reply_token) {
                debug!("Webhook verification event, not replying");
                return;
            }
            if let Err(e) = handle_image_message(state, &message.id, reply_token).await {
                error!("Failed to process LINE image message {}: {}", message.id, e);
            }
        }
        other => debug!("Ignoring {other} message {}", message.id),
    }
}

/// Fetches the image, runs face detection and replies with the report.
pub async fn handle_image_message(
    state: &AppState,
    message_id: &str,
    reply_token: &str,
) -> Result<(), BotError> {
    let image = state.messaging.get_message_content(message_id).await?;
    let detection = state.detector.detect_faces(image).await?;

    let text = match format_face_report(&detection) {
        Ok(report) if report.is_empty() => NO_FACES_TEXT.to_string(),
        Ok(report) => report,
        Err(e) => {
            error!("Could not build face report for message {message_id}: {e}");
            ANALYSIS_FAILED_TEXT.to_string()
        }
    };

    state.messaging.reply_text(reply_token, &text).await?;
    Ok(())
}
