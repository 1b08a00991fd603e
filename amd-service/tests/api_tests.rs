//! HTTP API integration tests
//!
//! Drive the router in-process with `oneshot`.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use helpers::{multipart_body, silent_wav, tone_wav, MultipartPart, WavConfig};

fn predict_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, helpers::multipart::content_type())
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn audio_body(file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    multipart_body(&[MultipartPart::audio(file_name, content_type, data)])
}

#[tokio::test]
async fn test_health_reports_loaded_model() {
    let (status, json) = send(
        helpers::ready_app(),
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "running");
    assert_eq!(json["model_loaded"], true);
    assert_eq!(json["device"], "cpu");
}

#[tokio::test]
async fn test_health_without_model() {
    let (status, json) = send(
        helpers::fallback_app(1),
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_with_loaded_model() {
    let wav = tone_wav(&WavConfig::default(), 440.0);
    let (status, json) = send(
        helpers::ready_app(),
        predict_request("/predict", audio_body("call.wav", "audio/wav", &wav)),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", json);
    let label = json["label"].as_str().unwrap();
    assert!(label == "human" || label == "voicemail");
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&confidence));
    assert!(json["processing_time"].as_f64().unwrap() >= 0.0);
    assert_eq!(json["simulated"], false);
}

#[tokio::test]
async fn test_fallback_results_are_simulated() {
    let wav = silent_wav(&WavConfig::default());
    for _ in 0..5 {
        let (status, json) = send(
            helpers::fallback_app(5),
            predict_request("/predict", audio_body("call.wav", "audio/wav", &wav)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["simulated"], true);
        let confidence = json["confidence"].as_f64().unwrap();
        assert!((0.75..0.95).contains(&confidence));
    }
}

#[tokio::test]
async fn test_fallback_ignores_undecodable_audio() {
    let (status, json) = send(
        helpers::fallback_app(5),
        predict_request("/predict", audio_body("notes.txt", "text/plain", b"hello")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["simulated"], true);
}

#[tokio::test]
async fn test_empty_audio_is_500() {
    let (status, json) = send(
        helpers::ready_app(),
        predict_request("/predict", audio_body("empty.wav", "audio/wav", b"")),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_audio_is_500() {
    let (status, json) = send(
        helpers::ready_app(),
        predict_request(
            "/predict",
            audio_body("notes.txt", "text/plain", b"this is plainly not audio data at all"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_route_matches_predict() {
    let wav = tone_wav(&WavConfig::default(), 300.0);

    let (status_a, a) = send(
        helpers::ready_app(),
        predict_request("/predict", audio_body("chunk.wav", "audio/wav", &wav)),
    )
    .await;
    let (status_b, b) = send(
        helpers::ready_app(),
        predict_request("/predict-stream", audio_body("chunk.wav", "audio/wav", &wav)),
    )
    .await;

    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(a["label"], b["label"]);
    assert_eq!(a["confidence"], b["confidence"]);
}

#[tokio::test]
async fn test_raw_mulaw_part() {
    // one second of mu-law silence at 8 kHz
    let payload = vec![0xFFu8; 8000];
    let (status, json) = send(
        helpers::ready_app(),
        predict_request(
            "/predict",
            audio_body("chunk.ulaw", "audio/x-mulaw;rate=8000", &payload),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {}", json);
    assert_eq!(json["simulated"], false);
}

#[tokio::test]
async fn test_raw_mulaw_with_implausible_rate_is_500() {
    let payload = vec![0xFFu8; 1024 * 1024];
    let (status, json) = send(
        helpers::ready_app(),
        predict_request(
            "/predict",
            audio_body("chunk.ulaw", "audio/x-mulaw;rate=1", &payload),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"].as_str().unwrap().contains("sample rate"));
}

#[tokio::test]
async fn test_missing_audio_field_is_422() {
    let body = multipart_body(&[MultipartPart {
        name: "file",
        file_name: Some("call.wav"),
        content_type: Some("audio/wav"),
        data: &silent_wav(&WavConfig::default()),
    }]);

    let (status, json) = send(helpers::ready_app(), predict_request("/predict", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("audio"));
}

#[tokio::test]
async fn test_non_multipart_body_is_422() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, json) = send(helpers::ready_app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = helpers::ready_app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://dialer.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
