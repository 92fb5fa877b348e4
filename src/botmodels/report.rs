//! Text report sent back to the chat for a face-detection result.

use bigdecimal::{BigDecimal, RoundingMode};
use std::str::FromStr;

use super::rekognition::{adapt, RawDetection};
use super::{EmotionKind, FaceDetail, FaceReportError};

pub const SEPARATOR: &str = "-------------";

/// Adapts a provider payload and formats it in one step.
pub fn format_face_report(raw: &RawDetection) -> Result<String, FaceReportError> {
    let faces = adapt(raw)?;
    format_report(&faces)
}

/// Renders one block per face, in input order. An empty slice yields `""`.
///
/// Any face failing to render aborts the whole report.
pub fn format_report(faces: &[FaceDetail]) -> Result<String, FaceReportError> {
    let mut lines = Vec::with_capacity(faces.len() * 11);

    for (index, face) in faces.iter().enumerate() {
        lines.push(SEPARATOR.to_string());
        lines.push(format!("Estimated age: {}–{}", face.age_low, face.age_high));
        lines.push(format!("Smile rate: {}%", smile_rate(index, face)?));

        for kind in EmotionKind::ALL {
            let confidence = face
                .emotion(kind)
                .ok_or(FaceReportError::MissingEmotion {
                    face: index,
                    emotion: kind,
                })?;
            let rate = percent(to_decimal(confidence).ok_or(
                FaceReportError::MalformedInput {
                    face: index,
                    field: "Emotions.Confidence",
                },
            )?);
            lines.push(format!("{}: {}%", kind.label(), rate));
        }
    }

    Ok(lines.join("\n").trim().to_string())
}

/// The provider's confidence is in whichever label it assigned, so a
/// "not smiling" verdict is inverted into an estimated smiling rate.
fn smile_rate(index: usize, face: &FaceDetail) -> Result<String, FaceReportError> {
    let confidence = to_decimal(face.smile.confidence).ok_or(FaceReportError::MalformedInput {
        face: index,
        field: "Smile.Confidence",
    })?;

    let rate = if face.smile.present {
        confidence
    } else {
        BigDecimal::from(100) - confidence
    };

    Ok(percent(rate))
}

fn to_decimal(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// Rounds half away from zero to two places and drops trailing zeros, keeping
/// at least one fractional digit.
fn percent(value: BigDecimal) -> String {
    let rounded = value.with_scale_round(2, RoundingMode::HalfUp).to_string();

    match rounded.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{rounded}.0"),
    }
}
