use std::sync::Arc;

use crate::botmodels::FaceDetector;
use crate::line::MessagingApi;

/// Shared by every request; immutable after start-up.
#[derive(Clone)]
pub struct AppState {
    pub channel_secret: String,
    pub detector: Arc<dyn FaceDetector>,
    pub messaging: Arc<dyn MessagingApi>,
}

impl AppState {
    pub fn new(
        channel_secret: impl Into<String>,
        detector: Arc<dyn FaceDetector>,
        messaging: Arc<dyn MessagingApi>,
    ) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            detector,
            messaging,
        }
    }
}
