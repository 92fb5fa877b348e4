use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_DATA_API_BASE: &str = "https://api-data.line.me";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub line: LineConfig,
    pub aws: AwsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub channel_secret: String,
    pub api_base: String,
    pub data_api_base: String,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Falls back to the AWS default provider chain when unset.
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl AppConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{key} must be set"))
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let port = match optional("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {port}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            line: LineConfig {
                channel_access_token: required("LINE_CHANNEL_ACCESS_TOKEN")?,
                channel_secret: required("LINE_CHANNEL_SECRET")?,
                api_base: optional("LINE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                data_api_base: optional("LINE_DATA_API_BASE")
                    .unwrap_or_else(|| DEFAULT_DATA_API_BASE.to_string()),
            },
            aws: AwsConfig {
                region: optional("AWS_REGION"),
            },
            server: ServerConfig {
                bind_address: optional("BIND_ADDRESS")
                    .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
                port,
            },
        })
    }
}
