use super::EmotionKind;

/// Failures of report construction. Either one aborts the whole report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaceReportError {
    #[error("Malformed face detail #{face}: missing or invalid {field}")]
    MalformedInput { face: usize, field: &'static str },
    #[error("Face #{face} has no confidence for emotion {emotion}")]
    MissingEmotion { face: usize, emotion: EmotionKind },
}
