/// Integration tests for the dashboard request handling.
///
/// Requests go straight through `Dashboard::handle`, so no socket is bound.
/// A gated generator holds an answer back until the test releases it, which
/// makes the in-flight state observable.
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rare_earths::analytics::logger::AskLogger;
use rare_earths::chat::PanelState;
use rare_earths::config::schema::AppConfig;
use rare_earths::llm::{ChatMessage, GenerationError, TextGenerator};
use rare_earths::web::{Dashboard, Reply};
use serde_json::Value;
use tiny_http::Method;

/// Answers "gated answer" once the paired sender fires.
struct Gated {
    release: Mutex<Receiver<()>>,
    configured: bool,
}

impl TextGenerator for Gated {
    fn generate(&self, _prompt: &str, _history: &[ChatMessage]) -> Result<String, GenerationError> {
        if !self.configured {
            return Err(GenerationError::NotConfigured);
        }
        let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(10));
        Ok("gated answer".to_string())
    }

    fn model_name(&self) -> &str {
        "gated"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

fn dashboard(configured: bool) -> (Dashboard, Sender<()>) {
    let (tx, rx) = mpsc::channel();
    let generator = Gated {
        release: Mutex::new(rx),
        configured,
    };
    let dashboard = Dashboard::new(AppConfig::default(), Arc::new(generator), AskLogger::disabled());
    (dashboard, tx)
}

fn json(reply: &Reply) -> Value {
    serde_json::from_slice(&reply.body).unwrap()
}

fn post_question(dashboard: &mut Dashboard, question: &str) -> Reply {
    let body = serde_json::json!({ "question": question }).to_string();
    dashboard.handle(&Method::Post, "/api/chat", Some(&body))
}

// ---------------------------------------------------------------------------
// Page and data
// ---------------------------------------------------------------------------

#[test]
fn index_serves_page_with_live_panel() {
    let (mut dashboard, _tx) = dashboard(true);

    let reply = dashboard.handle(&Method::Get, "/", None);
    assert_eq!(reply.status, 200);
    assert!(reply.content_type.starts_with("text/html"));

    let html = reply.text();
    assert!(html.contains("chat-panel"));
    assert!(html.contains("<script>"));
    assert!(!html.contains("not configured in environment variables"));
}

#[test]
fn dashboard_endpoint_lists_sections_in_order() {
    let (mut dashboard, _tx) = dashboard(true);

    let body = json(&dashboard.handle(&Method::Get, "/api/dashboard?x=1", None));
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 10);
    assert_eq!(sections[0]["view"]["type"], "text");
    assert_eq!(sections[8]["view"]["id"], "world-reserves");
}

#[test]
fn summary_endpoint_returns_context() {
    let (mut dashboard, _tx) = dashboard(true);

    let body = json(&dashboard.handle(&Method::Get, "/api/summary", None));
    assert!(body["summary"].as_str().unwrap().contains("44,000,000"));
}

#[test]
fn unknown_route_is_404() {
    let (mut dashboard, _tx) = dashboard(true);

    let reply = dashboard.handle(&Method::Get, "/nope", None);
    assert_eq!(reply.status, 404);
    assert_eq!(json(&reply)["error"], "not found");
}

// ---------------------------------------------------------------------------
// Chat lifecycle
// ---------------------------------------------------------------------------

#[test]
fn blank_or_unreadable_questions_are_rejected() {
    let (mut dashboard, _tx) = dashboard(true);

    assert_eq!(post_question(&mut dashboard, "   ").status, 400);
    assert_eq!(
        dashboard.handle(&Method::Post, "/api/chat", Some("not json")).status,
        400
    );
    assert!(dashboard.panel().transcript().is_empty());
}

#[test]
fn one_question_at_a_time_then_answer_arrives() {
    let (mut dashboard, release) = dashboard(true);

    let accepted = post_question(&mut dashboard, "Who has the largest reserves?");
    assert_eq!(accepted.status, 202);
    assert_eq!(json(&accepted)["state"], "awaiting_response");
    assert_eq!(json(&accepted)["accepting"], false);

    let health = json(&dashboard.handle(&Method::Get, "/api/health", None));
    assert_eq!(health["question_in_flight"], true);

    let busy = post_question(&mut dashboard, "And the smallest?");
    assert_eq!(busy.status, 409);
    assert_eq!(dashboard.panel().transcript().len(), 1);

    release.send(()).unwrap();
    assert!(dashboard.wait_for_answer(Duration::from_secs(5)));
    assert_eq!(dashboard.panel().state(), PanelState::Idle);

    let chat = json(&dashboard.handle(&Method::Get, "/api/chat", None));
    let messages = chat["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "model");
    assert_eq!(messages[1]["text"], "gated answer");
}

#[test]
fn missing_credential_warns_and_reports_error() {
    let (mut dashboard, _tx) = dashboard(false);

    let html = dashboard.handle(&Method::Get, "/", None).text();
    assert!(html.contains("not configured in environment variables"));

    let health = json(&dashboard.handle(&Method::Get, "/api/health", None));
    assert_eq!(health["credential_configured"], false);
    assert_eq!(health["model"], "gated");

    assert_eq!(post_question(&mut dashboard, "anything").status, 202);
    assert!(dashboard.wait_for_answer(Duration::from_secs(5)));

    let chat = json(&dashboard.handle(&Method::Get, "/api/chat", None));
    assert_eq!(
        chat["messages"][1]["text"],
        "Error: API Key not configured. Please set the API_KEY environment variable."
    );
    assert!(chat["last_error"].is_string());
}
