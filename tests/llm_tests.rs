/// Integration tests for the Gemini client against a local stub provider.
///
/// Each test starts a one-shot `tiny_http` server on an ephemeral port that
/// plays the provider, so no test touches the real API or reads the
/// process environment.
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rare_earths::config::schema::GenerationSettings;
use rare_earths::llm::config::GenerationConfig;
use rare_earths::llm::gemini::GeminiClient;
use rare_earths::llm::prompts::build_grounded_prompt;
use rare_earths::llm::{ChatMessage, GenerationError, NO_RESPONSE, NOT_CONFIGURED_MESSAGE, TextGenerator};
use tiny_http::{Header, Response, Server, StatusCode};

/// What the stub provider saw.
#[derive(Debug)]
struct Captured {
    url: String,
    api_key: Option<String>,
    body: String,
}

/// Serve one request with `status` and `body`. The handle yields what was
/// received, or `None` if nothing arrived within `wait`.
fn stub_provider(status: u16, body: &'static str, wait: Duration) -> (String, JoinHandle<Option<Captured>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = thread::spawn(move || {
        let mut request = server.recv_timeout(wait).ok()??;

        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).ok()?;
        let captured = Captured {
            url: request.url().to_string(),
            api_key: request
                .headers()
                .iter()
                .find(|h| h.field.equiv("x-goog-api-key"))
                .map(|h| h.value.to_string()),
            body: received,
        };

        let response = Response::from_string(body)
            .with_status_code(StatusCode(status))
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
        let _ = request.respond(response);
        Some(captured)
    });

    (format!("http://{addr}/v1beta"), handle)
}

fn client(api_url: &str, api_key: Option<&str>) -> GeminiClient {
    client_with_timeout(api_url, api_key, 5_000)
}

fn client_with_timeout(api_url: &str, api_key: Option<&str>, timeout_ms: u64) -> GeminiClient {
    let settings = GenerationSettings {
        api_url: api_url.to_string(),
        timeout_ms,
        ..GenerationSettings::default()
    };
    GeminiClient::from_config(&GenerationConfig::from_settings(
        &settings,
        api_key.map(str::to_string),
    ))
}

const WAIT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[test]
fn answer_text_is_returned_verbatim() {
    let (url, handle) = stub_provider(
        200,
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"China holds "},{"text":"44,000,000 tons."}]}}]}"#,
        WAIT,
    );
    let prompt = build_grounded_prompt("Reserves: China 44,000,000", "Who has the most?");

    let result = client(&url, Some("test-key")).generate(&prompt, &[]);
    assert_eq!(result, Ok("China holds 44,000,000 tons.".to_string()));

    let captured = handle.join().unwrap().expect("provider saw no request");
    assert_eq!(captured.url, "/v1beta/models/gemini-2.5-flash:generateContent");
    assert_eq!(captured.api_key.as_deref(), Some("test-key"));

    let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(body["contents"][0]["parts"][0]["text"], prompt.as_str());
}

#[test]
fn empty_answer_becomes_no_response_sentinel() {
    let (url, handle) = stub_provider(
        200,
        r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#,
        WAIT,
    );

    let result = client(&url, Some("test-key")).generate("prompt", &[]);
    assert_eq!(result, Ok(NO_RESPONSE.to_string()));
    assert!(handle.join().unwrap().is_some());
}

#[test]
fn history_is_sent_before_the_prompt() {
    let (url, handle) = stub_provider(
        200,
        r#"{"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}"#,
        WAIT,
    );
    let history = [ChatMessage::user("first"), ChatMessage::model("answer")];

    client(&url, Some("test-key"))
        .generate("second", &history)
        .unwrap();

    let captured = handle.join().unwrap().unwrap();
    let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    let roles: Vec<&str> = body["contents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, ["user", "model", "user"]);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn missing_credential_makes_no_request() {
    let (url, handle) = stub_provider(200, "{}", Duration::from_millis(300));

    let result = client(&url, None).generate("prompt", &[]);
    assert_eq!(result, Err(GenerationError::NotConfigured));
    assert_eq!(
        result.unwrap_err().to_string(),
        NOT_CONFIGURED_MESSAGE
    );
    assert!(handle.join().unwrap().is_none(), "no request should reach the provider");
}

#[test]
fn provider_error_carries_status_and_message() {
    let (url, handle) = stub_provider(
        429,
        r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
        WAIT,
    );

    let result = client(&url, Some("test-key")).generate("prompt", &[]);
    assert_eq!(
        result,
        Err(GenerationError::Provider {
            status: 429,
            message: "Resource has been exhausted".to_string(),
        })
    );
    handle.join().unwrap();
}

#[test]
fn provider_error_without_envelope_still_maps() {
    let (url, handle) = stub_provider(503, "upstream unavailable", WAIT);

    let err = client(&url, Some("test-key"))
        .generate("prompt", &[])
        .unwrap_err();
    assert!(matches!(err, GenerationError::Provider { status: 503, .. }));
    handle.join().unwrap();
}

#[test]
fn unreadable_success_body_is_malformed() {
    let (url, handle) = stub_provider(200, "not json", WAIT);

    let err = client(&url, Some("test-key"))
        .generate("prompt", &[])
        .unwrap_err();
    assert_eq!(err.kind(), "malformed");
    handle.join().unwrap();
}

#[test]
fn blocked_prompt_is_reported() {
    let (url, handle) = stub_provider(200, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#, WAIT);

    let result = client(&url, Some("test-key")).generate("prompt", &[]);
    assert_eq!(result, Err(GenerationError::Blocked("SAFETY".to_string())));
    handle.join().unwrap();
}

#[test]
fn refused_connection_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = client(&format!("http://127.0.0.1:{port}/v1beta"), Some("test-key"))
        .generate("prompt", &[])
        .unwrap_err();
    assert_eq!(err.kind(), "transport");
}

/// Accept one connection, read the request, optionally write `head`, then
/// hold the socket open without finishing the response.
fn stalled_provider(head: Option<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        if let Some(head) = head {
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.flush();
        }
        thread::sleep(Duration::from_secs(3));
    });

    format!("http://{addr}/v1beta")
}

#[test]
fn silent_provider_times_out() {
    let url = stalled_provider(None);

    let result = client_with_timeout(&url, Some("test-key"), 500).generate("prompt", &[]);
    assert_eq!(result, Err(GenerationError::Timeout(500)));
}

#[test]
fn stalled_body_times_out_rather_than_malformed() {
    let url = stalled_provider(Some(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 200\r\n\r\n{\"candidates\":",
    ));

    let result = client_with_timeout(&url, Some("test-key"), 500).generate("prompt", &[]);
    assert_eq!(result, Err(GenerationError::Timeout(500)));
}
