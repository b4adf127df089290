/// Configuration schema and defaults for rare-earths.
///
/// Defines the TOML-serializable structure with three sections:
/// `[server]`, `[generation]`, and `[logging]`. Every field has a built-in
/// default; users only set what they want to override.
///
/// The model credential is deliberately absent: it only ever comes from the
/// environment (see [`crate::llm::config::API_KEY_VARS`]).
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration, mapping to `~/.rare-earths/config.toml` and
/// `.rare-earths.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub generation: GenerationSettings,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Embedded dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `rare-earths serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [generation]
// ---------------------------------------------------------------------------

/// Text-generation settings (Gemini).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Gemini model name.
    pub model: String,
    /// API base URL including the version segment.
    pub api_url: String,
    /// Request timeout (milliseconds). Expiry is reported as an error.
    pub timeout_ms: u64,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens per answer.
    pub max_output_tokens: u32,
    /// Prior transcript messages sent with each question (0 = none).
    pub history_turns: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_ms: 30_000,
            temperature: 0.7,
            max_output_tokens: 1024,
            history_turns: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Question-log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one JSONL entry per question to `~/.rare-earths/ask-log.jsonl`.
    pub enabled: bool,
    /// Print an access-log line per request in `serve`.
    pub access_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            access_log: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl AppConfig {
    /// The annotated default config written by `rare-earths config init`.
    pub fn default_toml() -> String {
        r#"# rare-earths configuration
#
# Precedence (lowest to highest): built-in defaults, ~/.rare-earths/config.toml,
# ./.rare-earths.toml, RARE_EARTHS_* environment variables.
#
# The Gemini credential is never read from this file. Export API_KEY
# (or GEMINI_API_KEY) before starting.

[server]
# Listen address for `rare-earths serve`
addr = "127.0.0.1:9747"
# Open the dashboard in the default browser on start
open_browser = true

[generation]
model = "gemini-2.5-flash"
api_url = "https://generativelanguage.googleapis.com/v1beta"
# Requests running longer than this fail with a timeout error
timeout_ms = 30000
temperature = 0.7
max_output_tokens = 1024
# Prior messages sent along with each question (0 = single turn)
history_turns = 6

[logging]
# Record each question (length, outcome, latency) in ~/.rare-earths/ask-log.jsonl
enabled = true
# Print one line per HTTP request while serving
access_log = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr, "127.0.0.1:9747");
        assert!(config.server.open_browser);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.generation.timeout_ms, 30_000);
        assert_eq!(config.generation.history_turns, 6);
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[generation]
history_turns = 0
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generation.history_turns, 0);
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn default_toml_parses_back() {
        let config: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
