/// Resolved settings for the text-generation client.
///
/// Built once at process startup from the layered app config
/// ([`crate::config::load`]) plus the credential from the environment, then
/// passed into [`super::gemini::GeminiClient::from_config`]. Nothing in the
/// client reads the environment itself, so tests can construct any
/// combination directly.
use std::time::Duration;

use crate::config::schema::{AppConfig, GenerationSettings};

/// Environment variables searched for the credential, in order.
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Fully resolved configuration for the Gemini client.
#[derive(Clone)]
pub struct GenerationConfig {
    /// Access credential. `None` puts the client in degraded mode.
    pub api_key: Option<String>,
    /// Gemini model name (e.g. `"gemini-2.5-flash"`).
    pub model: String,
    /// API base URL, up to and including the version segment.
    pub api_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Prior messages transmitted with each question. `0` = single turn.
    pub history_turns: usize,
}

// Keeps the credential out of logs and panic messages.
impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("history_turns", &self.history_turns)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::from_settings(&GenerationSettings::default(), None)
    }
}

impl GenerationConfig {
    /// Resolve from the loaded app config and the process environment.
    pub fn load(app: &AppConfig) -> Self {
        Self::from_settings(&app.generation, resolve_api_key())
    }

    /// Combine file/env settings with an explicit credential.
    pub fn from_settings(settings: &GenerationSettings, api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            api_url: settings.api_url.clone(),
            timeout_ms: settings.timeout_ms,
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            history_turns: settings.history_turns,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Read the credential from the first non-empty variable in [`API_KEY_VARS`].
pub fn resolve_api_key() -> Option<String> {
    API_KEY_VARS.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
