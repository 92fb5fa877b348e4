//! Face-analysis models: the per-face record, the detection adapter and the
//! report formatter.

use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod rekognition;
pub mod report;

pub use error::FaceReportError;
pub use rekognition::{adapt, FaceDetector, RawDetection, RekognitionDetector};
pub use report::{format_face_report, format_report};

/// Emotion categories scored by the detection provider, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionKind {
    Happy,
    Angry,
    Sad,
    Calm,
    Confused,
    Fear,
    Disgusted,
    Surprised,
}

impl EmotionKind {
    pub const ALL: [EmotionKind; 8] = [
        EmotionKind::Happy,
        EmotionKind::Angry,
        EmotionKind::Sad,
        EmotionKind::Calm,
        EmotionKind::Confused,
        EmotionKind::Fear,
        EmotionKind::Disgusted,
        EmotionKind::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionKind::Happy => "HAPPY",
            EmotionKind::Angry => "ANGRY",
            EmotionKind::Sad => "SAD",
            EmotionKind::Calm => "CALM",
            EmotionKind::Confused => "CONFUSED",
            EmotionKind::Fear => "FEAR",
            EmotionKind::Disgusted => "DISGUSTED",
            EmotionKind::Surprised => "SURPRISED",
        }
    }

    /// Label used on the report line.
    pub fn label(&self) -> &'static str {
        match self {
            EmotionKind::Happy => "Happy",
            EmotionKind::Angry => "Angry",
            EmotionKind::Sad => "Sad",
            EmotionKind::Calm => "Calm",
            EmotionKind::Confused => "Confused",
            EmotionKind::Fear => "Fear",
            EmotionKind::Disgusted => "Disgusted",
            EmotionKind::Surprised => "Surprised",
        }
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmotionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown emotion type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smile {
    pub present: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionScore {
    pub kind: EmotionKind,
    pub confidence: f64,
}

/// One detected face, as handed from the adapter to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetail {
    pub age_low: u32,
    pub age_high: u32,
    pub smile: Smile,
    pub emotions: Vec<EmotionScore>,
}

impl FaceDetail {
    /// Confidence of the first entry of `kind`, in input order.
    pub fn emotion(&self, kind: EmotionKind) -> Option<f64> {
        self.emotions
            .iter()
            .find(|score| score.kind == kind)
            .map(|score| score.confidence)
    }
}
