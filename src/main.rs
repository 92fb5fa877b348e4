use facebot::botmodels::RekognitionDetector;
use facebot::line::LineClient;
use facebot::main_module::run_axum_server;
use facebot::shared::config::AppConfig;
use facebot::shared::state::AppState;
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e:#}");
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    info!("Starting facebot {}...", env!("CARGO_PKG_VERSION"));

    let detector = RekognitionDetector::from_region(config.aws.region.clone()).await;
    let messaging = LineClient::new(&config.line);
    let app_state = Arc::new(AppState::new(
        config.line.channel_secret.clone(),
        Arc::new(detector),
        Arc::new(messaging),
    ));

    run_axum_server(app_state, &config.server).await
}
