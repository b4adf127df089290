//! Embedded web dashboard for rare-earths.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - the server-rendered dashboard page with a live question panel
//! - JSON endpoints for the dashboard views, the context summary, the chat
//!   panel, health and configuration
//!
//! Launched via `rare-earths serve` (default: `http://127.0.0.1:9747`).
//!
//! Requests are handled one at a time on the serving thread, which owns the
//! [`ChatPanel`]. A question runs on a worker thread and reports back over a
//! channel; the loop drains that channel between requests, so the page stays
//! responsive while the model is thinking.

mod api;
pub mod frontend;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::analytics::logger::AskLogger;
use crate::chat::{self, ChatPanel, PendingRequest};
use crate::config::schema::AppConfig;
use crate::dataset;
use crate::llm::{GenerationError, TextGenerator};

/// How long the loop waits for a request before checking the worker.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Outcome = Result<String, GenerationError>;

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A finished HTTP reply, independent of the server connection.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_JSON,
            body: body.into_bytes(),
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: CONTENT_TYPE_HTML,
            body: body.into_bytes(),
        }
    }

    /// `{"error": message}` with the given status.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }).to_string())
    }

    /// Body as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        if let Ok(header) = Header::from_bytes("Content-Type", self.content_type) {
            response = response.with_header(header);
        }
        response
    }
}

const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Everything the server loop owns: the panel, the generator, and the
/// channel of the question in flight (if any).
pub struct Dashboard {
    config: AppConfig,
    panel: ChatPanel,
    generator: Arc<dyn TextGenerator>,
    logger: AskLogger,
    inflight: Option<Receiver<Outcome>>,
}

impl Dashboard {
    pub fn new(config: AppConfig, generator: Arc<dyn TextGenerator>, logger: AskLogger) -> Self {
        let panel = ChatPanel::new(
            dataset::context_summary(),
            config.generation.history_turns,
        )
        .with_credential_warning(!generator.is_configured());

        Self {
            config,
            panel,
            generator,
            logger,
            inflight: None,
        }
    }

    pub fn panel(&self) -> &ChatPanel {
        &self.panel
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    pub fn logger(&self) -> &AskLogger {
        &self.logger
    }

    /// Handle one request. Handler failures become a 500 JSON error.
    pub fn handle(&mut self, method: &Method, url: &str, body: Option<&str>) -> Reply {
        self.poll_inflight();
        match self.dispatch(method, url, body) {
            Ok(reply) => reply,
            Err(e) => Reply::error(500, &format!("{e:#}")),
        }
    }

    fn dispatch(&mut self, method: &Method, url: &str, body: Option<&str>) -> Result<Reply> {
        // Strip query string for path matching
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            // Page
            (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(api::get_page(self)),

            // API: data
            (&Method::Get, "/api/dashboard") => api::get_dashboard(),
            (&Method::Get, "/api/summary") => api::get_summary(),

            // API: chat
            (&Method::Get, "/api/chat") => api::get_chat(self),
            (&Method::Post, "/api/chat") => api::post_chat(self, body.unwrap_or("")),

            // API: diagnostics
            (&Method::Get, "/api/health") => api::get_health(self),
            (&Method::Get, "/api/config") => api::get_config(self),

            _ => Ok(Reply::error(404, "not found")),
        }
    }

    /// Start answering `request` on a worker thread.
    fn start_request(&mut self, request: PendingRequest) {
        let (tx, rx) = mpsc::channel();
        let generator = Arc::clone(&self.generator);
        let logger = self.logger.clone();

        let spawned = thread::Builder::new()
            .name("gemini-request".to_string())
            .spawn(move || {
                let outcome = chat::run_request(generator.as_ref(), &request, &logger, "web");
                let _ = tx.send(outcome);
            });

        match spawned {
            Ok(_) => self.inflight = Some(rx),
            Err(e) => {
                self.panel
                    .resolve(Err(GenerationError::Transport(format!(
                        "could not start request: {e}"
                    ))));
            }
        }
    }

    /// Deliver a finished outcome to the panel, if one is waiting.
    ///
    /// Returns `true` when the panel was resolved.
    pub fn poll_inflight(&mut self) -> bool {
        let Some(rx) = &self.inflight else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(worker_stopped()),
        };
        self.deliver(outcome);
        true
    }

    /// Block up to `timeout` for the question in flight to finish.
    ///
    /// Returns `true` when nothing is left in flight.
    pub fn wait_for_answer(&mut self, timeout: Duration) -> bool {
        let Some(rx) = &self.inflight else {
            return true;
        };
        let outcome = match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => Err(worker_stopped()),
        };
        self.deliver(outcome);
        true
    }

    fn deliver(&mut self, outcome: Outcome) {
        self.inflight = None;
        self.panel.resolve(outcome);
    }
}

fn worker_stopped() -> GenerationError {
    GenerationError::Transport("request worker stopped unexpectedly".to_string())
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on `addr`.
///
/// Blocks the current thread. Errors are handled per request without
/// stopping the server.
pub fn serve(addr: &str, open: bool, dashboard: Dashboard) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("rare-earths dashboard running at http://{addr}");
    if !dashboard.generator().is_configured() {
        println!("{}", chat::CREDENTIAL_WARNING);
    }
    println!("Press Ctrl+C to stop.\n");

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    run_loop(&server, dashboard)
}

fn run_loop(server: &Server, mut dashboard: Dashboard) -> Result<()> {
    let access_log = dashboard.config().logging.access_log;

    loop {
        dashboard.poll_inflight();

        let Some(mut request) = server
            .recv_timeout(POLL_INTERVAL)
            .context("failed to receive HTTP request")?
        else {
            continue;
        };

        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = dashboard.handle(&method, &url, body.as_deref());
        let status = reply.status;
        let _ = request.respond(reply.into_response());

        if access_log {
            println!(
                "{} {} {} {}",
                chrono::Local::now().format("%H:%M:%S"),
                method,
                url,
                status
            );
        }
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
