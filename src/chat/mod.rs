//! Conversational panel: transcript, grounded prompts, request lifecycle.
//!
//! The panel is a two-state machine. `Idle` accepts a submission, records the
//! user message, and hands back a [`PendingRequest`] for the caller to run
//! against a [`TextGenerator`]. The panel then sits in `AwaitingResponse`
//! until [`ChatPanel::resolve`] delivers the outcome. Running the request is
//! the caller's business: the CLI does it inline via [`ChatPanel::ask`], the
//! web server on a worker thread.
//!
//! At most one request is in flight per panel. Nothing is queued.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::analytics::logger::{AskLogEntry, AskLogger};
use crate::llm::prompts::build_grounded_prompt;
use crate::llm::{ChatMessage, GenerationError, NO_RESPONSE, TextGenerator};

/// Shown beneath the panel while no credential is configured.
pub const CREDENTIAL_WARNING: &str = "Warning: Gemini API key (API_KEY) is not configured in \
environment variables. This feature may not work.";

/// Shown in place of an empty transcript.
pub const EMPTY_HINT: &str = "Ask a question about the displayed rare earths data. For example: \
\"What was the trend in Neodymium Oxide prices?\" or \"Which country has the largest reserves?\"";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelState {
    Idle,
    AwaitingResponse,
}

/// Why a submission was refused. Neither case changes the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("question is empty")]
    Empty,
    #[error("a question is already being answered")]
    Busy,
}

/// Everything needed to run one generation call.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// The question exactly as typed.
    pub question: String,
    /// Grounded prompt: context summary plus the question.
    pub prompt: String,
    /// Prior answered turns, oldest first.
    pub history: Vec<ChatMessage>,
}

/// Serializable view of the panel for the page and the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSnapshot {
    pub state: PanelState,
    pub messages: Vec<ChatMessage>,
    pub last_error: Option<String>,
    /// The panel takes a new question. Unlike [`ChatPanel::can_submit`],
    /// this ignores the input draft, which lives in the browser.
    pub accepting: bool,
    pub credential_warning: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChatPanel {
    context: String,
    history_turns: usize,
    credential_warning: bool,
    /// Everything shown to the user, including error entries. Append-only.
    transcript: Vec<ChatMessage>,
    /// Answered question/answer pairs only; source of request history.
    grounding: Vec<ChatMessage>,
    state: PanelState,
    input: String,
    pending_question: Option<String>,
    last_error: Option<String>,
}

impl ChatPanel {
    /// New idle panel grounded on `context`, sending at most
    /// `history_turns` prior messages with each question.
    pub fn new(context: impl Into<String>, history_turns: usize) -> Self {
        Self {
            context: context.into(),
            history_turns,
            credential_warning: false,
            transcript: Vec::new(),
            grounding: Vec::new(),
            state: PanelState::Idle,
            input: String::new(),
            pending_question: None,
            last_error: None,
        }
    }

    /// Show [`CREDENTIAL_WARNING`] when `missing` is true.
    pub fn with_credential_warning(mut self, missing: bool) -> Self {
        self.credential_warning = missing;
        self
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the input draft.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.state == PanelState::Idle && !self.input.trim().is_empty()
    }

    /// Message of the most recent failed request, cleared on the next
    /// submission.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Submit the current input draft.
    pub fn submit(&mut self) -> Result<PendingRequest, SubmitError> {
        if self.state == PanelState::AwaitingResponse {
            return Err(SubmitError::Busy);
        }
        if self.input.trim().is_empty() {
            return Err(SubmitError::Empty);
        }

        let question = self.input.clone();
        let request = PendingRequest {
            prompt: build_grounded_prompt(&self.context, &question),
            history: self.history_window(),
            question: question.clone(),
        };

        self.transcript.push(ChatMessage::user(question.clone()));
        self.pending_question = Some(question);
        self.last_error = None;
        self.state = PanelState::AwaitingResponse;

        Ok(request)
    }

    /// Set the draft to `text` and submit it.
    ///
    /// A busy panel keeps its draft untouched.
    pub fn submit_text(&mut self, text: &str) -> Result<PendingRequest, SubmitError> {
        if self.state == PanelState::AwaitingResponse {
            return Err(SubmitError::Busy);
        }
        self.set_input(text);
        self.submit()
    }

    /// Deliver the outcome of the in-flight request.
    ///
    /// Returns the appended model message, or `None` (and changes nothing)
    /// when no request is in flight.
    pub fn resolve(&mut self, outcome: Result<String, GenerationError>) -> Option<&ChatMessage> {
        if self.state != PanelState::AwaitingResponse {
            return None;
        }
        Some(self.finish(outcome))
    }

    fn finish(&mut self, outcome: Result<String, GenerationError>) -> &ChatMessage {
        let question = self.pending_question.take().unwrap_or_default();

        match outcome {
            Ok(text) => {
                if text != NO_RESPONSE {
                    self.grounding.push(ChatMessage::user(question));
                    self.grounding.push(ChatMessage::model(text.clone()));
                }
                self.transcript.push(ChatMessage::model(text));
            }
            Err(e) => {
                let message = e.to_string();
                self.transcript
                    .push(ChatMessage::model(format!("Error: {message}")));
                self.last_error = Some(message);
            }
        }

        self.input.clear();
        self.state = PanelState::Idle;
        &self.transcript[self.transcript.len() - 1]
    }

    /// One full round-trip on the calling thread.
    pub fn ask(
        &mut self,
        generator: &dyn TextGenerator,
        text: &str,
    ) -> Result<&ChatMessage, SubmitError> {
        self.ask_with(text, |request| {
            generator.generate(&request.prompt, &request.history)
        })
    }

    /// Submit `text`, run the request with `run`, and resolve with its
    /// outcome.
    pub fn ask_with<F>(&mut self, text: &str, run: F) -> Result<&ChatMessage, SubmitError>
    where
        F: FnOnce(&PendingRequest) -> Result<String, GenerationError>,
    {
        let request = self.submit_text(text)?;
        let outcome = run(&request);
        Ok(self.finish(outcome))
    }

    /// Clear the conversation. Any late outcome for a request made before
    /// the reset is ignored.
    pub fn reset(&mut self) {
        let warning = self.credential_warning;
        *self = Self::new(std::mem::take(&mut self.context), self.history_turns)
            .with_credential_warning(warning);
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            state: self.state,
            messages: self.transcript.clone(),
            last_error: self.last_error.clone(),
            accepting: self.state == PanelState::Idle,
            credential_warning: self.credential_warning.then_some(CREDENTIAL_WARNING),
        }
    }

    /// The most recent answered messages, bounded by `history_turns` and
    /// always starting on a user turn.
    fn history_window(&self) -> Vec<ChatMessage> {
        let keep = self.history_turns.min(self.grounding.len()) & !1;
        self.grounding[self.grounding.len() - keep..].to_vec()
    }
}

// ---------------------------------------------------------------------------
// Running requests
// ---------------------------------------------------------------------------

/// Run `request` against `generator`, recording the outcome in `logger`.
pub fn run_request(
    generator: &dyn TextGenerator,
    request: &PendingRequest,
    logger: &AskLogger,
    surface: &str,
) -> Result<String, GenerationError> {
    let started = Instant::now();
    let outcome = generator.generate(&request.prompt, &request.history);
    let latency_ms = started.elapsed().as_millis() as u64;

    logger.record(&AskLogEntry::new(
        surface,
        request.question.chars().count(),
        request.history.len(),
        &outcome,
        generator.model_name(),
        generator.is_configured().then_some(latency_ms),
    ));

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    struct Echo;

    impl TextGenerator for Echo {
        fn generate(&self, prompt: &str, _history: &[ChatMessage]) -> Result<String, GenerationError> {
            Ok(format!("len {}", prompt.len()))
        }
        fn model_name(&self) -> &str {
            "echo"
        }
        fn is_configured(&self) -> bool {
            true
        }
    }

    #[test]
    fn submit_moves_to_awaiting_and_records_question() {
        let mut panel = ChatPanel::new("S", 6);
        let request = panel.submit_text("  How much? ").unwrap();

        assert_eq!(panel.state(), PanelState::AwaitingResponse);
        assert_eq!(panel.transcript(), &[ChatMessage::user("  How much? ")]);
        assert!(request.prompt.starts_with("Context:\nS\n---\n"));
        assert!(request.prompt.ends_with("Question:   How much? "));
        assert!(request.history.is_empty());
        assert!(!panel.can_submit());
    }

    #[test]
    fn whitespace_is_rejected_without_change() {
        let mut panel = ChatPanel::new("S", 6);
        assert_eq!(panel.submit_text(" \t\n").unwrap_err(), SubmitError::Empty);
        assert_eq!(panel.state(), PanelState::Idle);
        assert!(panel.transcript().is_empty());
    }

    #[test]
    fn busy_panel_rejects_and_keeps_draft() {
        let mut panel = ChatPanel::new("S", 6);
        panel.submit_text("first").unwrap();
        assert_eq!(panel.submit_text("second").unwrap_err(), SubmitError::Busy);
        assert_eq!(panel.transcript().len(), 1);
        assert_eq!(panel.input(), "first");
    }

    #[test]
    fn error_outcome_becomes_transcript_entry() {
        let mut panel = ChatPanel::new("S", 6);
        panel.submit_text("q").unwrap();
        let message = panel
            .resolve(Err(GenerationError::Timeout(30_000)))
            .unwrap()
            .clone();

        assert_eq!(message.role(), Role::Model);
        assert_eq!(message.text(), "Error: Gemini did not respond within 30000 ms");
        assert_eq!(panel.last_error(), Some("Gemini did not respond within 30000 ms"));
        assert_eq!(panel.input(), "");
        assert_eq!(panel.state(), PanelState::Idle);
    }

    #[test]
    fn next_submission_clears_last_error() {
        let mut panel = ChatPanel::new("S", 6);
        panel.submit_text("q").unwrap();
        panel.resolve(Err(GenerationError::NotConfigured));
        panel.submit_text("again").unwrap();
        assert_eq!(panel.last_error(), None);
    }

    #[test]
    fn resolve_while_idle_is_ignored() {
        let mut panel = ChatPanel::new("S", 6);
        assert!(panel.resolve(Ok("late".into())).is_none());
        assert!(panel.transcript().is_empty());
    }

    #[test]
    fn history_holds_only_answered_pairs() {
        let mut panel = ChatPanel::new("S", 6);
        panel.ask(&Echo, "one").unwrap();
        panel.submit_text("two").unwrap();
        panel.resolve(Err(GenerationError::Transport("refused".into())));

        let request = panel.submit_text("three").unwrap();
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[0], ChatMessage::user("one"));
        assert_eq!(request.history[1].role(), Role::Model);
    }

    #[test]
    fn history_window_is_bounded_and_even() {
        let mut panel = ChatPanel::new("S", 3);
        for q in ["a", "b", "c"] {
            panel.ask(&Echo, q).unwrap();
        }
        let request = panel.submit_text("d").unwrap();
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[0], ChatMessage::user("c"));

        let mut single = ChatPanel::new("S", 0);
        single.ask(&Echo, "a").unwrap();
        assert!(single.submit_text("b").unwrap().history.is_empty());
    }

    #[test]
    fn reset_clears_conversation_and_ignores_late_outcome() {
        let mut panel = ChatPanel::new("S", 6).with_credential_warning(true);
        panel.ask(&Echo, "one").unwrap();
        panel.submit_text("two").unwrap();
        panel.reset();

        assert!(panel.transcript().is_empty());
        assert!(panel.resolve(Ok("late".into())).is_none());
        assert_eq!(panel.snapshot().credential_warning, Some(CREDENTIAL_WARNING));
    }

    #[test]
    fn snapshot_serializes_state() {
        let mut panel = ChatPanel::new("S", 6);
        panel.submit_text("q").unwrap();
        let json = serde_json::to_value(panel.snapshot()).unwrap();
        assert_eq!(json["state"], "awaiting_response");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["accepting"], false);
        assert!(json["credential_warning"].is_null());
    }
}
