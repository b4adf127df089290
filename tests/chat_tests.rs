/// Integration tests for the question panel driven by a scripted generator.
///
/// The stub counts calls so tests can assert that rejected submissions never
/// reach the model.
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rare_earths::chat::{ChatPanel, PanelState, SubmitError};
use rare_earths::dataset::context_summary;
use rare_earths::llm::{ChatMessage, GenerationError, TextGenerator};

/// Replies from a fixed script, recording every prompt it receives.
struct Scripted {
    replies: Mutex<Vec<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for Scripted {
    fn generate(&self, prompt: &str, _history: &[ChatMessage]) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok("default".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        true
    }
}

fn panel() -> ChatPanel {
    ChatPanel::new(context_summary(), 6)
}

#[test]
fn round_trip_appends_question_then_answer() {
    let generator = Scripted::new(vec![Ok("Catalysts.".to_string())]);
    let mut panel = panel();

    panel.ask(&generator, "What is the leading end use?").unwrap();

    assert_eq!(
        panel.transcript(),
        &[
            ChatMessage::user("What is the leading end use?"),
            ChatMessage::model("Catalysts."),
        ]
    );
    assert_eq!(panel.state(), PanelState::Idle);
    assert_eq!(generator.calls(), 1);
}

#[test]
fn prompt_embeds_summary_and_literal_question() {
    let generator = Scripted::new(vec![]);
    let mut panel = panel();

    panel.ask(&generator, "Trend in <Nd> prices?").unwrap();

    let prompts = generator.prompts.lock().unwrap();
    let prompt = &prompts[0];
    assert!(prompt.starts_with(&format!("Context:\n{}\n---\n", context_summary())));
    assert!(prompt.ends_with("\nQuestion: Trend in <Nd> prices?"));
}

#[test]
fn blank_submissions_never_call_the_model() {
    let generator = Scripted::new(vec![]);
    let mut panel = panel();

    for text in ["", "   ", "\n\t"] {
        assert_eq!(panel.ask(&generator, text).unwrap_err(), SubmitError::Empty);
    }

    assert!(panel.transcript().is_empty());
    assert_eq!(generator.calls(), 0);
}

#[test]
fn second_submission_while_waiting_is_rejected() {
    let mut panel = panel();
    panel.submit_text("first").unwrap();

    assert_eq!(panel.submit_text("second").unwrap_err(), SubmitError::Busy);
    assert!(!panel.can_submit());
    assert_eq!(panel.transcript().len(), 1);

    panel.resolve(Ok("done".to_string()));
    assert_eq!(panel.transcript().len(), 2);
    assert!(panel.submit_text("second").is_ok());
}

#[test]
fn failures_are_shown_and_do_not_block_the_panel() {
    let generator = Scripted::new(vec![
        Err(GenerationError::Provider {
            status: 500,
            message: "internal".to_string(),
        }),
        Ok("Recovered.".to_string()),
    ]);
    let mut panel = panel();

    let reply = panel.ask(&generator, "one").unwrap().clone();
    assert_eq!(reply.text(), "Error: Gemini returned HTTP 500: internal");
    assert_eq!(panel.last_error(), Some("Gemini returned HTTP 500: internal"));

    panel.ask(&generator, "two").unwrap();
    assert_eq!(panel.last_error(), None);
    assert_eq!(panel.transcript().len(), 4);
    assert_eq!(panel.transcript()[3].text(), "Recovered.");
}

#[test]
fn missing_credential_surfaces_fixed_message() {
    let generator = Scripted::new(vec![Err(GenerationError::NotConfigured)]);
    let mut panel = panel();

    let reply = panel.ask(&generator, "anything").unwrap().clone();
    assert_eq!(
        reply.text(),
        "Error: API Key not configured. Please set the API_KEY environment variable."
    );
}

#[test]
fn transcript_grows_by_two_per_completed_question() {
    let generator = Scripted::new(vec![]);
    let mut panel = panel();

    for (i, question) in ["a", "b", "c"].into_iter().enumerate() {
        panel.ask(&generator, question).unwrap();
        assert_eq!(panel.transcript().len(), 2 * (i + 1));
    }
    let _ = panel.ask(&generator, " ");
    assert_eq!(panel.transcript().len(), 6);
}
