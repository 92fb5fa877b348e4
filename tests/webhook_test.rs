#[cfg(test)]
mod webhook_integration_tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use bytes::Bytes;
    use facebot::botmodels::{FaceDetector, RawDetection};
    use facebot::line::signature::sign;
    use facebot::line::{MessagingApi, ANALYSIS_FAILED_TEXT, NO_FACES_TEXT};
    use facebot::main_module::build_router;
    use facebot::shared::state::AppState;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    const SECRET: &str = "integration-secret";

    struct FakeDetector {
        result: serde_json::Value,
        seen: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl FaceDetector for FakeDetector {
        async fn detect_faces(&self, image: Bytes) -> Result<RawDetection> {
            self.seen.lock().unwrap().push(image);
            Ok(serde_json::from_value(self.result.clone())?)
        }
    }

    #[derive(Default)]
    struct FakeMessaging {
        replies: Mutex<Vec<(String, String)>>,
        unavailable_id: Option<&'static str>,
    }

    #[async_trait]
    impl MessagingApi for FakeMessaging {
        async fn get_message_content(&self, message_id: &str) -> Result<Bytes> {
            if self.unavailable_id == Some(message_id) {
                return Err(anyhow!("content unavailable for {message_id}"));
            }
            Ok(Bytes::from(format!("image-{message_id}")))
        }

        async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn one_face() -> serde_json::Value {
        json!({
            "FaceDetails": [{
                "AgeRange": { "Low": 20, "High": 30 },
                "Smile": { "Value": true, "Confidence": 91.2 },
                "Emotions": [
                    { "Type": "HAPPY", "Confidence": 70.1 },
                    { "Type": "ANGRY", "Confidence": 1.2 },
                    { "Type": "SAD", "Confidence": 0.5 },
                    { "Type": "CALM", "Confidence": 20.0 },
                    { "Type": "CONFUSED", "Confidence": 3.0 },
                    { "Type": "FEAR", "Confidence": 2.0 },
                    { "Type": "DISGUSTED", "Confidence": 1.0 },
                    { "Type": "SURPRISED", "Confidence": 2.2 }
                ]
            }]
        })
    }

    fn image_event(message_id: &str, reply_token: &str) -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": reply_token,
            "timestamp": 1462629479859_i64,
            "source": { "type": "user", "userId": "U4af4980629" },
            "message": { "id": message_id, "type": "image" }
        })
    }

    fn setup(
        result: serde_json::Value,
        messaging: FakeMessaging,
    ) -> (Arc<FakeDetector>, Arc<FakeMessaging>, axum::Router) {
        let detector = Arc::new(FakeDetector {
            result,
            seen: Mutex::new(Vec::new()),
        });
        let messaging = Arc::new(messaging);
        let state = Arc::new(AppState::new(SECRET, detector.clone(), messaging.clone()));
        (detector, messaging, build_router(state))
    }

    fn signed_request(body: &serde_json::Value) -> Request<Body> {
        let body = body.to_string();
        Request::builder()
            .method("POST")
            .uri("/callback")
            .header("X-Line-Signature", sign(SECRET, body.as_bytes()))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_image_message_gets_face_report() {
        let (detector, messaging, app) = setup(one_face(), FakeMessaging::default());
        let body = json!({ "destination": "U0", "events": [image_event("1001", "reply-1")] });

        let response = app.oneshot(signed_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true }));
        assert_eq!(
            detector.seen.lock().unwrap().as_slice(),
            &[Bytes::from("image-1001")]
        );

        let replies = messaging.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "reply-1");
        assert!(replies[0].1.starts_with("-------------\nEstimated age: 20–30\nSmile rate: 91.2%"));
        assert!(replies[0].1.ends_with("Surprised: 2.2%"));
    }

    #[tokio::test]
    async fn test_no_faces_reply() {
        let (_, messaging, app) = setup(json!({ "FaceDetails": [] }), FakeMessaging::default());
        let body = json!({ "events": [image_event("1002", "reply-2")] });

        let response = app.oneshot(signed_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let replies = messaging.replies.lock().unwrap();
        assert_eq!(replies.as_slice(), &[("reply-2".to_string(), NO_FACES_TEXT.to_string())]);
    }

    #[tokio::test]
    async fn test_missing_emotion_replies_generic_failure() {
        let mut result = one_face();
        result["FaceDetails"][0]["Emotions"]
            .as_array_mut()
            .unwrap()
            .retain(|e| e["Type"] != "CALM");
        let (_, messaging, app) = setup(result, FakeMessaging::default());
        let body = json!({ "events": [image_event("1003", "reply-3")] });

        let response = app.oneshot(signed_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let replies = messaging.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].1, ANALYSIS_FAILED_TEXT);
    }

    #[tokio::test]
    async fn test_invalid_signature_rejected() {
        let (detector, messaging, app) = setup(one_face(), FakeMessaging::default());
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("X-Line-Signature", sign("wrong-secret", b"{}"))
            .body(Body::from(json!({ "events": [image_event("1", "r")] }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert!(detector.seen.lock().unwrap().is_empty());
        assert!(messaging.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_signature_rejected() {
        let (_, _, app) = setup(one_face(), FakeMessaging::default());
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verification_event_is_not_answered() {
        let (detector, messaging, app) = setup(one_face(), FakeMessaging::default());
        let body = json!({
            "events": [
                image_event("1004", "00000000000000000000000000000000"),
                {
                    "type": "message",
                    "replyToken": "ffffffffffffffffffffffffffffffff",
                    "message": { "id": "1005", "type": "text", "text": "hello" }
                }
            ]
        });

        let response = app.oneshot(signed_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(detector.seen.lock().unwrap().is_empty());
        assert!(messaging.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_event_does_not_stop_request() {
        let (_, messaging, app) = setup(
            one_face(),
            FakeMessaging {
                unavailable_id: Some("1006"),
                ..FakeMessaging::default()
            },
        );
        let body = json!({ "events": [image_event("1006", "reply-6"), image_event("1007", "reply-7")] });

        let response = app.oneshot(signed_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let replies = messaging.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "reply-7");
        assert!(replies[0].1.starts_with("-------------\nEstimated age: 20–30"));
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let (_, _, app) = setup(one_face(), FakeMessaging::default());
        let body = "not json";
        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header("X-Line-Signature", sign(SECRET, body.as_bytes()))
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (_, _, app) = setup(one_face(), FakeMessaging::default());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "facebot");
    }
}
