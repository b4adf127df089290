/// Text generation for the question-answering panel.
///
/// A single remote call: given a prompt (plus optional prior turns), return
/// the generated text or a typed [`GenerationError`]. The hosted provider is
/// Google Gemini (`generateContent`), reached with the synchronous `ureq`
/// client in [`gemini`].
///
/// # Configuration
///
/// The credential is read once at startup (`API_KEY`, falling back to
/// `GEMINI_API_KEY`) and handed to the client through
/// [`config::GenerationConfig`]. Without it every call short-circuits with
/// [`GenerationError::NotConfigured`] and no request is made.
///
/// # History
///
/// Prior turns are transmitted as real multi-turn `contents`, bounded by
/// `generation.history_turns`. Setting that to `0` sends only the latest
/// grounded prompt.
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod gemini;
pub mod prompts;

/// Returned in place of an empty provider answer.
pub const NO_RESPONSE: &str = "No response text from Gemini.";

/// User-facing message for a missing credential.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "API Key not configured. Please set the API_KEY environment variable.";

// ---------------------------------------------------------------------------
// Transcript messages
// ---------------------------------------------------------------------------

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    text: String,
}

impl ChatMessage {
    /// Build a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Build a model message.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a generation call produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No credential configured; no request was attempted.
    #[error("API Key not configured. Please set the API_KEY environment variable.")]
    NotConfigured,
    /// Connection, DNS, or TLS failure.
    #[error("request to Gemini failed: {0}")]
    Transport(String),
    /// The provider answered with a non-success status.
    #[error("Gemini returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },
    /// The provider answered 2xx with a body we could not read.
    #[error("malformed response from Gemini: {0}")]
    Malformed(String),
    /// The prompt was refused by the provider's safety filters.
    #[error("Gemini declined to answer ({0})")]
    Blocked(String),
    /// No answer within the configured timeout.
    #[error("Gemini did not respond within {0} ms")]
    Timeout(u64),
}

impl GenerationError {
    /// Short outcome tag for the question log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Transport(_) => "transport",
            Self::Provider { .. } => "provider",
            Self::Malformed(_) => "malformed",
            Self::Blocked(_) => "blocked",
            Self::Timeout(_) => "timeout",
        }
    }
}

// ---------------------------------------------------------------------------
// Generator seam
// ---------------------------------------------------------------------------

/// Anything that can turn a prompt into text.
///
/// `Send + Sync` so the web server can run a call on a worker thread.
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`, with `history` as prior turns (oldest
    /// first, not including `prompt`). Exactly one outbound request per call.
    fn generate(&self, prompt: &str, history: &[ChatMessage]) -> Result<String, GenerationError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Whether a credential is present.
    fn is_configured(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
