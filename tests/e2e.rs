//! End-to-end tests for the extraction + generation workflow.
//!
//! Every test except the last talks to a mock Ollama server: a tiny axum app
//! bound to `127.0.0.1:0` that replays scripted replies and records each
//! request body it receives. Nothing here needs a real model.
//!
//! The last test drives a real Ollama instance and is gated behind the
//! `E2E_ENABLED` environment variable:
//!   E2E_ENABLED=1 OLLAMA_MODEL=llama3:8b cargo test --test e2e -- --nocapture

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use style_copier::{CopierConfig, StyleCopier, StyleCopyError};

// ── Mock generation server ───────────────────────────────────────────────────

enum Reply {
    Text(&'static str),
    Status(u16, &'static str),
    /// 200 with no `response` field.
    Missing,
    /// Answer only after the delay.
    Stall(Duration),
}

#[derive(Default)]
struct Mock {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<Value>>,
}

impl Mock {
    fn scripted(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    fn prompt(&self, i: usize) -> String {
        self.requests()[i]["prompt"].as_str().unwrap().to_string()
    }
}

async fn mock_generate(State(mock): State<Arc<Mock>>, Json(body): Json<Value>) -> Response {
    mock.requests.lock().unwrap().push(body);
    let reply = mock
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(Reply::Status(500, "no reply scripted"));

    match reply {
        Reply::Text(t) => Json(json!({ "model": "mock", "response": t, "done": true })).into_response(),
        Reply::Status(code, body) => (StatusCode::from_u16(code).unwrap(), body).into_response(),
        Reply::Missing => Json(json!({ "model": "mock", "done": true })).into_response(),
        Reply::Stall(d) => {
            tokio::time::sleep(d).await;
            Json(json!({ "response": "too late" })).into_response()
        }
    }
}

/// Serve `mock` on an ephemeral port and return its base URL.
async fn spawn_mock(mock: Arc<Mock>) -> String {
    let app = Router::new()
        .route("/", get(|| async { "Ollama is running" }))
        .route("/api/generate", post(mock_generate))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn copier_for(mock: Arc<Mock>) -> StyleCopier {
    let base = spawn_mock(mock).await;
    let config = CopierConfig::builder().base_url(base).build().unwrap();
    StyleCopier::new(config).unwrap()
}

// ── Workflow against the mock ────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_two_calls_in_order() {
    let mock = Mock::scripted(vec![
        Reply::Text("Write short, punchy sentences. Make bold claims."),
        Reply::Text("Record quarter. Huge results. We crushed it."),
    ]);
    let copier = copier_for(mock.clone()).await;

    let references = ["Short punchy sentences. Bold claims."];
    let draft = "We are pleased to announce our quarterly results.";
    let outcome = copier.generate_edit(&references, draft).await.unwrap();

    assert_eq!(outcome.edited_article, "Record quarter. Huge results. We crushed it.");
    assert_eq!(
        outcome.style_guide,
        "Write short, punchy sentences. Make bold claims."
    );

    let requests = mock.requests();
    assert_eq!(requests.len(), 2, "exactly one call per stage");

    let analysis = mock.prompt(0);
    assert!(analysis.contains("Short punchy sentences. Bold claims."));
    assert!(analysis.contains("TONE & VOICE"));

    let editing = mock.prompt(1);
    assert!(editing.contains("Write short, punchy sentences. Make bold claims."));
    assert!(editing.contains(draft));

    for req in &requests {
        assert_eq!(req["model"], "llama3:8b");
        assert_eq!(req["stream"], false);
        assert_eq!(req["options"]["num_predict"], 2000);
        assert!(req["options"]["temperature"].is_number());
        assert!(req["options"]["top_p"].is_number());
    }
}

#[tokio::test]
async fn every_reference_reaches_the_analysis_prompt() {
    let mock = Mock::scripted(vec![Reply::Text("guide")]);
    let copier = copier_for(mock.clone()).await;

    copier
        .analyze_style(&["First article.", "Second article."])
        .await
        .unwrap();
    let prompt = mock.prompt(0);
    let first = prompt.find("First article.").unwrap();
    let second = prompt.find("Second article.").unwrap();
    assert!(first < second);
    assert!(prompt[first..second].contains("---ARTICLE SEPARATOR---"));
}

#[tokio::test]
async fn no_references_no_network_call() {
    let mock = Mock::scripted(vec![Reply::Text("unused")]);
    let copier = copier_for(mock.clone()).await;

    let refs: Vec<String> = Vec::new();
    let err = copier.generate_edit(&refs, "draft").await.unwrap_err();
    assert!(matches!(err, StyleCopyError::NoReferences));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn stalled_endpoint_is_timeout_not_generic() {
    let mock = Mock::scripted(vec![Reply::Stall(Duration::from_secs(5))]);
    let base = spawn_mock(mock.clone()).await;
    let config = CopierConfig::builder()
        .base_url(base)
        .request_timeout_secs(1)
        .build()
        .unwrap();
    let copier = StyleCopier::new(config).unwrap();

    let err = copier.analyze_style(&["ref"]).await.unwrap_err();
    assert!(matches!(err, StyleCopyError::Timeout { secs: 1 }), "got: {err:?}");
    assert!(err.to_string().contains("reducing"));
}

#[tokio::test]
async fn unreachable_endpoint_is_service_unavailable() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let config = CopierConfig::builder()
        .base_url(format!("http://127.0.0.1:{port}"))
        .build()
        .unwrap();
    let copier = StyleCopier::new(config).unwrap();

    let err = copier.generate_edit(&["ref"], "draft").await.unwrap_err();
    assert!(matches!(err, StyleCopyError::ServiceUnavailable { .. }), "got: {err:?}");
    assert!(err.to_string().contains("Ollama"));
}

#[tokio::test]
async fn upstream_status_and_body_surface() {
    let mock = Mock::scripted(vec![Reply::Status(404, "model 'llama3:8b' not found")]);
    let copier = copier_for(mock).await;

    match copier.analyze_style(&["ref"]).await.unwrap_err() {
        StyleCopyError::UpstreamStatus { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn loading_model_is_service_starting() {
    let mock = Mock::scripted(vec![Reply::Status(503, "loading model")]);
    let copier = copier_for(mock).await;

    let err = copier.analyze_style(&["ref"]).await.unwrap_err();
    assert!(matches!(err, StyleCopyError::ServiceStarting { .. }), "got: {err:?}");
}

#[tokio::test]
async fn missing_response_is_empty_response_error() {
    let mock = Mock::scripted(vec![Reply::Missing]);
    let copier = copier_for(mock).await;

    match copier.analyze_style(&["ref"]).await.unwrap_err() {
        StyleCopyError::EmptyResponse { stage } => assert_eq!(stage, "style analysis"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn analysis_failure_short_circuits_editing() {
    let mock = Mock::scripted(vec![
        Reply::Status(500, "out of memory"),
        Reply::Text("should never be requested"),
    ]);
    let copier = copier_for(mock.clone()).await;

    assert!(copier.generate_edit(&["ref"], "draft").await.is_err());
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn health_check_probes_then_generates() {
    let mock = Mock::scripted(vec![Reply::Text("Hello there, friend.")]);
    let copier = copier_for(mock.clone()).await;

    let health = copier.health_check().await;
    assert!(health.is_ok(), "{health:?}");
    assert_eq!(health.test_output.as_deref(), Some("Hello there, friend."));
    assert_eq!(mock.prompt(0), "Say hello in one sentence.");
}

#[tokio::test]
async fn extracted_files_feed_the_workflow() {
    use docx_rs::{Docx, Paragraph, Run};

    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("reference.txt");
    std::fs::write(&reference, "Short punchy sentences. Bold claims.").unwrap();

    let draft_path = dir.path().join("draft.DOCX");
    let file = std::fs::File::create(&draft_path).unwrap();
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("We are pleased to announce")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("our quarterly results.")))
        .build()
        .pack(file)
        .unwrap();

    let mock = Mock::scripted(vec![Reply::Text("guide"), Reply::Text("edited")]);
    let copier = copier_for(mock.clone()).await;

    let reference_text = copier.extract_file(&reference).await.unwrap().text;
    let draft = copier.extract_file(&draft_path).await.unwrap();
    assert_eq!(draft.text, "We are pleased to announce\nour quarterly results.");

    let outcome = copier
        .generate_edit(&[reference_text], &draft.text)
        .await
        .unwrap();
    assert_eq!(outcome.edited_article, "edited");
    assert!(mock.prompt(1).contains("our quarterly results."));
}

// ── Live Ollama (opt-in) ─────────────────────────────────────────────────────

#[tokio::test]
async fn live_ollama_round_trip() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run against a live Ollama");
        return;
    }
    let mut builder = CopierConfig::builder().request_timeout_secs(600);
    if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
        builder = builder.base_url(url);
    }
    if let Ok(model) = std::env::var("OLLAMA_MODEL") {
        builder = builder.model(model);
    }
    let copier = StyleCopier::new(builder.build().unwrap()).unwrap();

    let health = copier.health_check().await;
    assert!(health.is_ok(), "Ollama not ready: {health:?}");

    let draft = "We are pleased to announce our quarterly results.";
    let outcome = copier
        .generate_edit(&["Short punchy sentences. Bold claims."], draft)
        .await
        .unwrap();

    // Output is non-deterministic: only structural properties are checked.
    assert!(!outcome.style_guide.trim().is_empty());
    assert!(!outcome.edited_article.trim().is_empty());
    assert_ne!(outcome.edited_article.trim(), draft);
    println!("{}", outcome.edited_article);
}
