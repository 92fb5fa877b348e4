use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Serialize;

use crate::shared::config::LineConfig;

/// LINE rejects text messages longer than this many characters.
pub const MAX_TEXT_LENGTH: usize = 5000;

/// The chat side of the bot: fetches posted images and delivers replies.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn get_message_content(&self, message_id: &str) -> Result<Bytes>;
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage>,
}

#[derive(Debug, Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: String,
}

pub struct LineClient {
    http: Client,
    access_token: String,
    api_base: String,
    data_api_base: String,
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            http: Client::new(),
            access_token: config.channel_access_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            data_api_base: config.data_api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MessagingApi for LineClient {
    async fn get_message_content(&self, message_id: &str) -> Result<Bytes> {
        let url = format!("{}/v2/bot/message/{}/content", self.data_api_base, message_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch content of message {message_id}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("LINE content API returned {status}: {body}"));
        }

        let content = response.bytes().await?;
        debug!("Fetched {} bytes for message {}", content.len(), message_id);
        Ok(content)
    }

    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
        let request = ReplyRequest {
            reply_token,
            messages: vec![TextMessage {
                message_type: "text",
                text: truncate_text(text),
            }],
        };

        let response = self
            .http
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .context("Failed to send LINE reply")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("LINE reply API returned {status}: {body}"));
        }

        info!("Reply delivered ({} chars)", text.chars().count());
        Ok(())
    }
}

fn truncate_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_LENGTH) {
        Some((cut, _)) => {
            warn!("Reply text exceeds {MAX_TEXT_LENGTH} characters, truncating");
            text[..cut].to_string()
        }
        None => text.to_string(),
    }
}
