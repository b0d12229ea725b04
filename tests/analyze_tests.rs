//! Endpoint tests for the analysis API.
//!
//! Mock inference units are injected through the readiness registry so the
//! tests cover the full handler path - readiness check, invocation,
//! normalization, response contract - without any model files on disk.
//!
//! Run with: `cargo test --test analyze_tests`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use bhaav::analysis::{
    RawClassification, RawScore, RawSummary, Summarizer, SummaryParams, TextClassifier,
};
use bhaav::config::ServerConfig;
use bhaav::handlers::{build_router, ServiceState};

// ═══════════════════════════════════════════════════════════════════════
// Test infrastructure
// ═══════════════════════════════════════════════════════════════════════

/// Classifier stub returning a canned shape and counting invocations.
struct MockClassifier {
    output: RawClassification,
    calls: Arc<AtomicUsize>,
}

impl TextClassifier for MockClassifier {
    fn classify(&self, _text: &str, _top_k: Option<usize>) -> anyhow::Result<RawClassification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Classifier stub whose every invocation fails.
struct FailingClassifier;

impl TextClassifier for FailingClassifier {
    fn classify(&self, _text: &str, _top_k: Option<usize>) -> anyhow::Result<RawClassification> {
        anyhow::bail!("tensor shape mismatch")
    }
}

/// Summarizer stub returning a canned record and counting invocations.
struct MockSummarizer {
    output: Vec<RawSummary>,
    calls: Arc<AtomicUsize>,
}

impl Summarizer for MockSummarizer {
    fn summarize(&self, _text: &str, _params: SummaryParams) -> anyhow::Result<Vec<RawSummary>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Self-contained test harness around a fresh registry.
struct Harness {
    state: Arc<ServiceState>,
}

impl Harness {
    fn new() -> Self {
        Self {
            state: Arc::new(ServiceState::new(ServerConfig::default())),
        }
    }

    fn app(&self) -> Router {
        build_router(self.state.clone())
    }

    fn install_sentiment(&self, output: RawClassification) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        self.state.registry().set_sentiment(Ok(Arc::new(MockClassifier {
            output,
            calls: calls.clone(),
        })));
        calls
    }

    fn install_emotion(&self, output: RawClassification) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        self.state.registry().set_emotion(Ok(Arc::new(MockClassifier {
            output,
            calls: calls.clone(),
        })));
        calls
    }

    fn install_summary(&self, output: Vec<RawSummary>) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        self.state.registry().set_summary(Ok(Arc::new(MockSummarizer {
            output,
            calls: calls.clone(),
        })));
        calls
    }
}

// ── request helpers ──

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    let bytes = serde_json::to_vec(&body).unwrap();
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

fn score(label: &str, score: f32) -> RawScore {
    RawScore {
        label: label.to_string(),
        score,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Root & health
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn root_is_reachable_before_any_model_loads() {
    let harness = Harness::new();

    let response = harness.app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn readiness_probe_aggregates_all_models() {
    let harness = Harness::new();

    let response = harness.app().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "loading");

    harness.install_sentiment(RawClassification::Flat(vec![]));
    harness.install_emotion(RawClassification::Flat(vec![]));
    harness.install_summary(vec![]);

    let response = harness.app().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn health_reports_per_model_state() {
    let harness = Harness::new();
    harness.install_sentiment(RawClassification::Flat(vec![]));

    let response = harness.app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 3);

    let state_of = |cap: &str| {
        models
            .iter()
            .find(|m| m["capability"] == cap)
            .map(|m| m["state"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(state_of("sentiment"), "ready");
    assert_eq!(state_of("emotion"), "not_loaded");
    assert_eq!(state_of("summary"), "not_loaded");
}

// ═══════════════════════════════════════════════════════════════════════
// Unavailability contract
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn sentiment_unavailable_before_load_and_unit_never_invoked() {
    // A unit that exists but was never published to the registry: the
    // handler must 503 without reaching any unit.
    let calls = Arc::new(AtomicUsize::new(0));
    let _unpublished = MockClassifier {
        output: RawClassification::Flat(vec![score("positive", 0.9)]),
        calls: calls.clone(),
    };

    let harness = Harness::new();
    let response = harness
        .app()
        .oneshot(post_json("/analyze/sentiment", json!({"text": "anything"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "MODEL_NOT_LOADED");
    assert_eq!(body["message"], "Sentiment model not loaded");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn each_capability_has_its_own_unavailable_detail() {
    let harness = Harness::new();

    for (uri, detail) in [
        ("/analyze/sentiment", "Sentiment model not loaded"),
        ("/analyze/emotion", "Emotion model not loaded"),
        ("/analyze/summary", "Summary model not loaded"),
    ] {
        let response = harness
            .app()
            .oneshot(post_json(uri, json!({"text": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["message"], detail, "{uri}");
    }
}

#[tokio::test]
async fn failed_load_is_surfaced_as_the_same_unavailable_detail() {
    let harness = Harness::new();
    harness
        .state
        .registry()
        .set_emotion(Err("download refused".to_string()));

    let response = harness
        .app()
        .oneshot(post_json("/analyze/emotion", json!({"text": "hi"})))
        .await
        .unwrap();

    // Failed and NotLoaded are indistinguishable to callers by design
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Emotion model not loaded");
}

#[tokio::test]
async fn capabilities_serve_independently_while_others_load() {
    let harness = Harness::new();
    harness.install_sentiment(RawClassification::Flat(vec![score("positive", 1.0)]));

    // Sentiment serves...
    let response = harness
        .app()
        .oneshot(post_json("/analyze/sentiment", json!({"text": "hi"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...while summary is still loading
    let response = harness
        .app()
        .oneshot(post_json("/analyze/summary", json!({"text": "hi"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ═══════════════════════════════════════════════════════════════════════
// Sentiment
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn sentiment_end_to_end_uppercases_top3() {
    let harness = Harness::new();
    let calls = harness.install_sentiment(RawClassification::Flat(vec![
        score("positive", 0.95),
        score("neutral", 0.04),
        score("negative", 0.01),
    ]));

    let response = harness
        .app()
        .oneshot(post_json("/analyze/sentiment", json!({"text": "I love this"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!([
            {"label": "POSITIVE", "score": 0.95},
            {"label": "NEUTRAL", "score": 0.04},
            {"label": "NEGATIVE", "score": 0.01},
        ])
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sentiment_passes_through_fewer_than_three_candidates() {
    let harness = Harness::new();
    harness.install_sentiment(RawClassification::Flat(vec![score("positive", 0.9)]));

    let response = harness
        .app()
        .oneshot(post_json("/analyze/sentiment", json!({"text": "short"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["label"], "POSITIVE");
}

// ═══════════════════════════════════════════════════════════════════════
// Emotion
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn emotion_nested_and_flat_forms_normalize_identically() {
    let nested = Harness::new();
    nested.install_emotion(RawClassification::Nested(vec![vec![
        score("joy", 0.9),
        score("anger", 0.1),
    ]]));

    let flat = Harness::new();
    flat.install_emotion(RawClassification::Flat(vec![
        score("joy", 0.9),
        score("anger", 0.1),
    ]));

    let mut bodies = Vec::new();
    for harness in [&nested, &flat] {
        let response = harness
            .app()
            .oneshot(post_json("/analyze/emotion", json!({"text": "so happy"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(body_json(response).await);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(
        bodies[0],
        json!([
            {"label": "joy", "score": 0.9},
            {"label": "anger", "score": 0.1},
        ])
    );
}

#[tokio::test]
async fn emotion_lowercases_labels() {
    let harness = Harness::new();
    harness.install_emotion(RawClassification::Flat(vec![score("Joy", 0.8)]));

    let response = harness
        .app()
        .oneshot(post_json("/analyze/emotion", json!({"text": "nice"})))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body[0]["label"], "joy");
}

// ═══════════════════════════════════════════════════════════════════════
// Summary
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn summary_empty_input_short_circuits_without_invoking_the_unit() {
    let harness = Harness::new();
    let calls = harness.install_summary(vec![RawSummary {
        summary_text: "should never appear".to_string(),
    }]);

    for text in ["", " ", "\t\n"] {
        let response = harness
            .app()
            .oneshot(post_json("/analyze/summary", json!({"text": text})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "text={text:?}");
        let body = body_json(response).await;
        assert_eq!(body, json!({"summary_text": ""}), "text={text:?}");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn summary_passes_the_first_record_through_verbatim() {
    let harness = Harness::new();
    let calls = harness.install_summary(vec![RawSummary {
        summary_text: "X.".to_string(),
    }]);

    let response = harness
        .app()
        .oneshot(post_json(
            "/analyze/summary",
            json!({"text": "  a long article worth summarizing  "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"summary_text": "X."}));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Failure & robustness
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn per_request_inference_failure_is_a_500_not_a_503() {
    let harness = Harness::new();
    harness
        .state
        .registry()
        .set_sentiment(Ok(Arc::new(FailingClassifier)));

    let response = harness
        .app()
        .oneshot(post_json("/analyze/sentiment", json!({"text": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INFERENCE_FAILED");
}

#[tokio::test]
async fn malformed_body_is_rejected_before_any_invocation() {
    let harness = Harness::new();
    let calls = harness.install_sentiment(RawClassification::Flat(vec![score("positive", 1.0)]));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze/sentiment")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = harness.app().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn readiness_is_monotonic_under_concurrent_readers() {
    let harness = Harness::new();
    harness.install_sentiment(RawClassification::Flat(vec![score("positive", 1.0)]));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let state = harness.state.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..100 {
                assert!(state.registry().sentiment().is_ready());
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // And the endpoint keeps serving
    let response = harness
        .app()
        .oneshot(post_json("/analyze/sentiment", json!({"text": "still up"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
