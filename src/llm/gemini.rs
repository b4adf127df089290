/// Gemini HTTP client for grounded question answering.
///
/// Talks to the `generateContent` endpoint with the synchronous `ureq`
/// client. Provides:
///
/// - **Generate**: send the grounded prompt (plus bounded prior turns) and
///   return the first candidate's text.
/// - **Reachability probe**: `GET models/{model}` with a short timeout, for
///   `rare-earths health`.
///
/// One call is one request: no retries. Every failure is mapped to a
/// [`GenerationError`]; nothing here panics or propagates a raw transport
/// error.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;
use super::{ChatMessage, GenerationError, NO_RESPONSE, TextGenerator};

/// Timeout for the health probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Request / response types for the Gemini API
// ---------------------------------------------------------------------------

/// Request body for `POST models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationOptions,
}

/// One conversation turn.
#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationOptions {
    temperature: f32,
    max_output_tokens: u32,
}

/// Response body (non-streaming). Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous Gemini client.
///
/// Created once at startup from a [`GenerationConfig`] and shared (behind an
/// `Arc` in the web server) for the life of the process.
#[derive(Debug)]
pub struct GeminiClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Check whether the provider accepts our credential for the model.
    ///
    /// Returns `false` without a request when no credential is set.
    pub fn is_reachable(&self) -> bool {
        let Some(key) = self.api_key.as_deref() else {
            return false;
        };
        let url = format!("{}/models/{}", self.base_url, self.model);
        ureq::get(&url)
            .timeout(PROBE_TIMEOUT)
            .set("x-goog-api-key", key)
            .call()
            .is_ok()
    }

    fn build_request<'a>(&self, prompt: &'a str, history: &'a [ChatMessage]) -> GenerateRequest<'a> {
        let mut contents: Vec<Content<'a>> = history
            .iter()
            .map(|m| Content {
                role: m.role().as_str(),
                parts: [Part { text: m.text() }],
            })
            .collect();
        contents.push(Content {
            role: "user",
            parts: [Part { text: prompt }],
        });

        GenerateRequest {
            contents,
            generation_config: GenerationOptions {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    fn map_error(&self, err: ureq::Error) -> GenerationError {
        match err {
            ureq::Error::Status(status, resp) => {
                let message = resp
                    .into_json::<ErrorEnvelope>()
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| "no error details".to_string());
                GenerationError::Provider { status, message }
            }
            ureq::Error::Transport(transport) => {
                if is_timeout(&transport) {
                    GenerationError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    GenerationError::Transport(transport.to_string())
                }
            }
        }
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str, history: &[ChatMessage]) -> Result<String, GenerationError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(GenerationError::NotConfigured);
        };

        let body = self.build_request(prompt, history);
        let resp = ureq::post(&self.generate_url())
            .timeout(self.timeout)
            .set("x-goog-api-key", key)
            .send_json(&body)
            .map_err(|e| self.map_error(e))?;

        let parsed: GenerateResponse = resp.into_json().map_err(|e| {
            if is_timeout_kind(e.kind()) {
                GenerationError::Timeout(self.timeout.as_millis() as u64)
            } else {
                GenerationError::Malformed(e.to_string())
            }
        })?;

        let text = parsed.text();
        if !text.trim().is_empty() {
            return Ok(text);
        }
        match parsed.block_reason() {
            Some(reason) => Err(GenerationError::Blocked(reason.to_string())),
            None => Ok(NO_RESPONSE.to_string()),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Whether a transport failure was the socket timing out.
fn is_timeout(err: &ureq::Transport) -> bool {
    std::error::Error::source(err)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(|io| is_timeout_kind(io.kind()))
}

/// Socket read timeouts surface as `TimedOut` or `WouldBlock` depending on
/// the platform.
fn is_timeout_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GenerationConfig {
        GenerationConfig {
            api_key: Some("test-key".to_string()),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn client_strips_trailing_slash() {
        let mut config = configured();
        config.api_url = "http://localhost:8080/v1beta/".to_string();
        let client = GeminiClient::from_config(&config);
        assert_eq!(
            client.generate_url(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_appends_prompt_after_history() {
        let client = GeminiClient::from_config(&configured());
        let history = vec![ChatMessage::user("q1"), ChatMessage::model("a1")];
        let body = serde_json::to_value(client.build_request("q2", &history)).unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "q2");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}},
                       {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), "Hello, world");
    }

    #[test]
    fn response_without_candidates_has_empty_text() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(parsed.text(), "");
        assert_eq!(parsed.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn unconfigured_client_short_circuits() {
        let mut config = GenerationConfig::default();
        // Unroutable: a request would surface as a transport error.
        config.api_url = "http://127.0.0.1:9".to_string();
        let client = GeminiClient::from_config(&config);
        assert!(!client.is_configured());
        assert!(!client.is_reachable());
        assert_eq!(
            client.generate("anything", &[]),
            Err(GenerationError::NotConfigured)
        );
    }
}
