//! Handlers for the dashboard's HTTP endpoints.
//!
//! Each handler returns a [`Reply`]; JSON bodies are built from `Serialize`
//! types so the wire shape is visible in one place.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{Dashboard, Reply, frontend};
use crate::chat::{PanelSnapshot, SubmitError};
use crate::config::{self, schema::AppConfig};
use crate::dataset::{self, tables::SOURCE_NOTE};
use crate::render::{self, Section, page};

// ---------------------------------------------------------------------------
// JSON request / response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DashboardResponse {
    source: &'static str,
    sections: Vec<Section>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

/// `POST /api/chat` body.
#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

#[derive(Serialize)]
struct ConfigResponse<'a> {
    config: &'a AppConfig,
    toml_text: String,
}

#[derive(Serialize)]
struct HealthResponse {
    credential_configured: bool,
    model: String,
    question_in_flight: bool,
    config_exists: bool,
    log_enabled: bool,
    log_exists: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with `status`.
fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Reply> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Reply::json(status, body))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — the dashboard page with the live panel script.
pub fn get_page(dashboard: &Dashboard) -> Reply {
    Reply::html(page::render_dashboard(
        &dashboard.panel().snapshot(),
        Some(frontend::CHAT_SCRIPT),
    ))
}

/// `GET /api/dashboard` — every section view in page order.
pub fn get_dashboard() -> Result<Reply> {
    json_response(
        200,
        &DashboardResponse {
            source: SOURCE_NOTE,
            sections: render::dashboard_sections(),
        },
    )
}

/// `GET /api/summary` — the context summary sent with each question.
pub fn get_summary() -> Result<Reply> {
    json_response(
        200,
        &SummaryResponse {
            summary: dataset::context_summary(),
        },
    )
}

/// `GET /api/chat` — current panel snapshot.
pub fn get_chat(dashboard: &Dashboard) -> Result<Reply> {
    json_response(200, &dashboard.panel().snapshot())
}

/// `POST /api/chat` — submit a question.
///
/// `202` with the new snapshot when accepted, `400` for an empty question or
/// unreadable body, `409` while another question is being answered.
pub fn post_chat(dashboard: &mut Dashboard, body: &str) -> Result<Reply> {
    let Ok(req) = serde_json::from_str::<ChatRequest>(body) else {
        return Ok(Reply::error(400, "expected JSON body {\"question\": \"...\"}"));
    };

    match dashboard.panel.submit_text(&req.question) {
        Ok(request) => {
            dashboard.start_request(request);
            let snapshot: PanelSnapshot = dashboard.panel().snapshot();
            json_response(202, &snapshot)
        }
        Err(e @ SubmitError::Empty) => Ok(Reply::error(400, &e.to_string())),
        Err(e @ SubmitError::Busy) => Ok(Reply::error(409, &e.to_string())),
    }
}

/// `GET /api/config` — effective configuration.
pub fn get_config(dashboard: &Dashboard) -> Result<Reply> {
    let toml_text =
        toml::to_string_pretty(dashboard.config()).context("failed to serialize config")?;
    json_response(
        200,
        &ConfigResponse {
            config: dashboard.config(),
            toml_text,
        },
    )
}

/// `GET /api/health` — credential, model and log status.
pub fn get_health(dashboard: &Dashboard) -> Result<Reply> {
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false)
        || config::project_config_file()
            .map(|p| p.exists())
            .unwrap_or(false);

    let resp = HealthResponse {
        credential_configured: dashboard.generator().is_configured(),
        model: dashboard.generator().model_name().to_string(),
        question_in_flight: dashboard.inflight.is_some(),
        config_exists,
        log_enabled: dashboard.logger().path().is_some(),
        log_exists: dashboard.logger().path().is_some_and(|p| p.exists()),
    };

    json_response(200, &resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
