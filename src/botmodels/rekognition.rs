//! AWS Rekognition provider and the adapter from its `DetectFaces` response
//! shape into [`FaceDetail`] records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_rekognition::operation::detect_faces::DetectFacesOutput;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{Attribute, Image};
use aws_sdk_rekognition::Client;
use bytes::Bytes;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{EmotionKind, EmotionScore, FaceDetail, FaceReportError, Smile};

/// `DetectFaces` response as it appears on the wire. Every field is optional
/// here; [`adapt`] decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDetection {
    #[serde(default)]
    pub face_details: Vec<RawFaceDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawFaceDetail {
    #[serde(default)]
    pub age_range: Option<RawAgeRange>,
    #[serde(default)]
    pub smile: Option<RawSmile>,
    #[serde(default)]
    pub emotions: Option<Vec<RawEmotion>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawAgeRange {
    #[serde(default)]
    pub low: Option<i64>,
    #[serde(default)]
    pub high: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawSmile {
    #[serde(default)]
    pub value: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawEmotion {
    #[serde(default, rename = "Type")]
    pub emotion_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Maps provider records to [`FaceDetail`]s without rounding or derivation.
///
/// Zero faces is a valid, empty result. Emotion types outside [`EmotionKind`]
/// (the provider also reports `UNKNOWN`) are dropped. A missing `Smile.Value`
/// can only come from JSON payloads; the SDK conversion reads it as `false`.
pub fn adapt(raw: &RawDetection) -> Result<Vec<FaceDetail>, FaceReportError> {
    raw.face_details
        .iter()
        .enumerate()
        .map(|(face, detail)| adapt_face(face, detail))
        .collect()
}

fn adapt_face(face: usize, detail: &RawFaceDetail) -> Result<FaceDetail, FaceReportError> {
    let malformed = |field: &'static str| FaceReportError::MalformedInput { face, field };

    let age_range = detail.age_range.as_ref().ok_or_else(|| malformed("AgeRange"))?;
    let age_low = age_range.low.ok_or_else(|| malformed("AgeRange.Low"))?;
    let age_high = age_range.high.ok_or_else(|| malformed("AgeRange.High"))?;
    let age_low = u32::try_from(age_low).map_err(|_| malformed("AgeRange.Low"))?;
    let age_high = u32::try_from(age_high).map_err(|_| malformed("AgeRange.High"))?;
    if age_low > age_high {
        return Err(malformed("AgeRange"));
    }

    let smile = detail.smile.as_ref().ok_or_else(|| malformed("Smile"))?;
    let present = smile.value.ok_or_else(|| malformed("Smile.Value"))?;
    let confidence = smile
        .confidence
        .filter(|c| is_confidence(*c))
        .ok_or_else(|| malformed("Smile.Confidence"))?;

    let raw_emotions = detail.emotions.as_ref().ok_or_else(|| malformed("Emotions"))?;
    let mut emotions = Vec::with_capacity(raw_emotions.len());
    for emotion in raw_emotions {
        let name = emotion
            .emotion_type
            .as_deref()
            .ok_or_else(|| malformed("Emotions.Type"))?;
        let confidence = emotion
            .confidence
            .filter(|c| is_confidence(*c))
            .ok_or_else(|| malformed("Emotions.Confidence"))?;

        match name.parse::<EmotionKind>() {
            Ok(kind) => emotions.push(EmotionScore { kind, confidence }),
            Err(e) => debug!("Face #{face}: skipping emotion entry: {e}"),
        }
    }

    Ok(FaceDetail {
        age_low,
        age_high,
        smile: Smile {
            present,
            confidence,
        },
        emotions,
    })
}

fn is_confidence(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

/// Source of face-detection results for an image.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect_faces(&self, image: Bytes) -> Result<RawDetection>;
}

pub struct RekognitionDetector {
    client: Client,
}

impl RekognitionDetector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_region(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        info!(
            "Rekognition client initialized for region {:?}",
            config.region().map(|r| r.as_ref().to_string())
        );
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl FaceDetector for RekognitionDetector {
    async fn detect_faces(&self, image: Bytes) -> Result<RawDetection> {
        let output = self
            .client
            .detect_faces()
            .image(Image::builder().bytes(Blob::new(image.to_vec())).build())
            .attributes(Attribute::All)
            .send()
            .await
            .context("Rekognition DetectFaces request failed")?;

        let detection = RawDetection::from(&output);
        debug!("detect_faces: {:?}", detection);
        Ok(detection)
    }
}

/// The SDK reads an absent `Smile.Value` as `false`, so a missing value is only
/// reported as malformed for payloads decoded from JSON.
impl From<&DetectFacesOutput> for RawDetection {
    fn from(output: &DetectFacesOutput) -> Self {
        let face_details = output
            .face_details()
            .iter()
            .map(|detail| RawFaceDetail {
                age_range: detail.age_range().map(|range| RawAgeRange {
                    low: range.low().map(i64::from),
                    high: range.high().map(i64::from),
                }),
                smile: detail.smile().map(|smile| RawSmile {
                    value: Some(smile.value()),
                    confidence: smile.confidence().map(widen),
                }),
                emotions: Some(
                    detail
                        .emotions()
                        .iter()
                        .map(|emotion| RawEmotion {
                            emotion_type: emotion.r#type().map(|t| t.as_str().to_string()),
                            confidence: emotion.confidence().map(widen),
                        })
                        .collect(),
                ),
            })
            .collect();

        Self { face_details }
    }
}

/// Widens through the shortest decimal form so `91.2f32` stays `91.2`.
fn widen(value: f32) -> f64 {
    value
        .to_string()
        .parse()
        .unwrap_or_else(|_| f64::from(value))
}
