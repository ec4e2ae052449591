//! HTTP surface tests: envelope shape, 404 mapping, and the SSE chat stream
//! served end-to-end through axum.

mod common;

use std::sync::Arc;

use serde_json::{Value, json};

use common::{MockBrowser, MockSandbox, ScriptedLlm, assistant_tool_call, plan_reply};
use famulus::ai::ChatMessage;
use famulus::config::Settings;
use famulus::gateway::build_router;
use famulus::runtime::AgentRuntime;

/// Serve the full router on an ephemeral port, returning the base URL.
async fn serve(runtime: Arc<AgentRuntime>) -> String {
    let app = build_router(runtime);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn runtime(llm: Arc<ScriptedLlm>) -> Arc<AgentRuntime> {
    Arc::new(AgentRuntime::new(Settings::default(), llm, None))
}

/// Event names in arrival order from a raw SSE body.
fn sse_event_names(body: &str) -> Vec<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect()
}

#[tokio::test]
async fn unknown_agent_shell_view_is_404_with_envelope() {
    let base = serve(runtime(ScriptedLlm::new(vec![]))).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/agents/deadbeef/shell"))
        .json(&json!({"session_id": "main"}))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["code"], 404);
    assert!(body["msg"].as_str().expect("msg").contains("Agent not found"));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn shell_view_round_trips_through_the_sandbox() {
    let rt = runtime(ScriptedLlm::new(vec![]));
    let agent = rt
        .create_agent_with(MockSandbox::reliable(), Arc::new(MockBrowser))
        .await;
    let base = serve(rt).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/api/v1/agents/{}/shell", agent.id))
        .json(&json!({"session_id": "main"}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["session_id"], "main");
    assert_eq!(body["data"]["console"][0]["command"], "ls");
}

#[tokio::test]
async fn file_view_round_trips_through_the_sandbox() {
    let rt = runtime(ScriptedLlm::new(vec![]));
    let agent = rt
        .create_agent_with(MockSandbox::reliable(), Arc::new(MockBrowser))
        .await;
    let base = serve(rt).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/api/v1/agents/{}/file", agent.id))
        .json(&json!({"file": "/home/ubuntu/notes.txt"}))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json body");

    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["file"], "/home/ubuntu/notes.txt");
    assert_eq!(body["data"]["content"], "file body");
}

#[tokio::test]
async fn chat_with_unknown_agent_streams_an_error_event() {
    let base = serve(runtime(ScriptedLlm::new(vec![]))).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/agents/deadbeef/chat"))
        .json(&json!({"timestamp": 1, "message": "hello"}))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body = response.text().await.expect("body");
    assert_eq!(sse_event_names(&body), vec!["error"]);
    assert!(body.contains("Agent not initialized"));
}

#[tokio::test]
async fn chat_streams_a_full_turn_over_sse() {
    let llm = ScriptedLlm::new(vec![
        plan_reply("greet", "say hi", "ok", &[("1", "emit hi")]),
        assistant_tool_call("call_1", "message_notify_user", json!({"text": "hi"})),
        ChatMessage::assistant("done"),
    ]);
    let rt = runtime(llm);
    let agent = rt
        .create_agent_with(MockSandbox::reliable(), Arc::new(MockBrowser))
        .await;
    let base = serve(rt).await;

    let body = reqwest::Client::new()
        .post(format!("{base}/api/v1/agents/{}/chat", agent.id))
        .json(&json!({"timestamp": 1, "message": "say hello"}))
        .send()
        .await
        .expect("request")
        .text()
        .await
        .expect("stream to completion");

    assert_eq!(
        sse_event_names(&body),
        vec![
            "title", "message", "plan", // plan_created
            "step", // running
            "tool", // message_notify_user, calling phase
            "step", "message", // completed + result
            "plan", // plan_completed
            "done",
        ]
    );
    assert!(body.contains(r#""title":"greet""#));
    assert!(body.contains(r#""status":"calling""#));
}
