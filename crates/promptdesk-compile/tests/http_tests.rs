//! End-to-end compile runs against an in-process fake compiler service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use promptdesk_compile::{
    CompileEventKind, CompileRequestPipeline, DisplayState, HttpCompilerClient, PipelineOutcome,
    TokenIssuer,
};
use promptdesk_core::{
    CompileError, CompileMode, CompileStatus, LlmConfig, PromptField, Provider, Settings,
};
use serde_json::{Value, json};

type Calls = Arc<Mutex<Vec<Value>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn compile_handler(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
    let refined = body["v2"].as_bool().unwrap_or(false);
    calls.lock().unwrap().push(body);

    if refined {
        Json(json!({
            "system_prompt": "You are a tutor.",
            "user_prompt": "Explain recursion",
            "plan": "Draft plan",
            "expanded_prompt": "Explain recursion with examples",
            "plan_v2": "Refined plan",
            "system_prompt_v2": "You are a patient CS tutor.",
            "ir": {"intent": "explain"},
            "processing_ms": 1234.4
        }))
    } else {
        Json(json!({
            "system_prompt": "You are a tutor.",
            "user_prompt": "Explain recursion",
            "plan": "Draft plan",
            "expanded_prompt": "Explain recursion with examples",
            "ir": {"intent": "explain"},
            "processing_ms": 8
        }))
    }
}

async fn fake_service() -> (String, Calls) {
    let calls: Calls = Arc::default();
    let router = Router::new()
        .route("/compile", post(compile_handler))
        .with_state(Arc::clone(&calls));
    (serve(router).await, calls)
}

fn unused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn manual_generate_shows_draft_then_refined() {
    let (base, calls) = fake_service().await;
    let client = Arc::new(HttpCompilerClient::new(base).unwrap());
    let (pipeline, mut rx) = CompileRequestPipeline::new(client);

    let mut settings = Settings::default();
    settings.llm = LlmConfig::for_provider(Provider::Anthropic).with_api_key("sk-ant");

    let outcome = pipeline
        .run(TokenIssuer::new().issue(), "Explain recursion", &settings, CompileMode::Manual)
        .await;
    assert!(matches!(outcome, PipelineOutcome::Completed(_)));

    let bodies = calls.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["v2"], false);
    assert!(bodies[0].get("render_v2_prompts").is_none());
    assert_eq!(bodies[1]["v2"], true);
    assert_eq!(bodies[1]["render_v2_prompts"], true);
    assert_eq!(bodies[1]["text"], "Explain recursion");
    assert_eq!(bodies[1]["llm_provider"], "anthropic");
    assert_eq!(bodies[1]["llm_api_key"], "sk-ant");
    assert_eq!(bodies[1]["llm_base_url"], "https://api.anthropic.com/v1");

    let mut display = DisplayState::new();
    let mut plans = Vec::new();
    let mut last_status = None;
    while let Ok(event) = rx.try_recv() {
        display.apply(&event);
        match &event.kind {
            CompileEventKind::Result(_) => {
                plans.push(display.field(PromptField::Plan).unwrap().to_string());
            }
            CompileEventKind::Status(status) => last_status = Some(status.clone()),
        }
    }

    assert_eq!(plans, vec!["Draft plan", "Refined plan"]);
    assert_eq!(
        display.field(PromptField::SystemPrompt),
        Some("You are a patient CS tutor.")
    );
    // No refined variant: the base value stays
    assert_eq!(
        display.field(PromptField::ExpandedPrompt),
        Some("Explain recursion with examples")
    );
    assert_eq!(last_status.unwrap().to_string(), "Done in 1234ms");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base = serve(Router::new().route(
        "/compile",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;
    let client = Arc::new(HttpCompilerClient::new(base).unwrap());
    let (pipeline, mut rx) = CompileRequestPipeline::new(client);

    let outcome = pipeline
        .run(TokenIssuer::new().issue(), "x", &Settings::default(), CompileMode::Live)
        .await;

    assert_eq!(
        outcome,
        PipelineOutcome::Failed(CompileError::Status { code: 500 })
    );
    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        if let CompileEventKind::Status(status) = event.kind {
            last = Some(status);
        }
    }
    assert_eq!(last.unwrap().to_string(), "Error: API Error: 500");
}

#[tokio::test]
async fn timeout_is_distinct_from_refused_connection() {
    // Refused connection: transport failure
    let client = Arc::new(HttpCompilerClient::new(unused_base_url()).unwrap());
    let (pipeline, _rx) = CompileRequestPipeline::new(client);
    let refused = pipeline
        .run(TokenIssuer::new().issue(), "x", &Settings::default(), CompileMode::Live)
        .await;

    let PipelineOutcome::Failed(refused) = refused else {
        panic!("expected failure, got {refused:?}");
    };
    assert!(refused.is_transport(), "got {refused:?}");
    assert_eq!(
        CompileStatus::from_error(&refused).unwrap().to_string(),
        "Error: Connection Failed"
    );

    // Slow service: the refined deadline fires
    let base = serve(Router::new().route(
        "/compile",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    ))
    .await;
    let client = Arc::new(HttpCompilerClient::new(base).unwrap());
    let (pipeline, _rx) = CompileRequestPipeline::new(client);
    let pipeline = pipeline.with_refined_timeout(Duration::from_millis(200));

    let timed_out = pipeline
        .run(TokenIssuer::new().issue(), "x", &Settings::default(), CompileMode::Live)
        .await;

    let PipelineOutcome::Failed(timed_out) = timed_out else {
        panic!("expected failure, got {timed_out:?}");
    };
    assert!(timed_out.is_timeout());
    assert!(!timed_out.is_transport());
}
