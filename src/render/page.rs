//! The single dashboard page.
//!
//! Sections come from [`super::dashboard_sections`] in page order; runs of
//! half-width sections share a two-column grid. The chat panel closes the
//! page and is rendered from a [`PanelSnapshot`]. Without a script the
//! panel is read-only (static export).

use std::fmt::Write;

use super::{Section, View, Width, dashboard_sections, escape, svg};
use crate::chat::{EMPTY_HINT, PanelSnapshot, PanelState};
use crate::dataset::tables::SOURCE_NOTE;
use crate::llm::{ChatMessage, Role};

pub const PAGE_TITLE: &str = "Rare Earths Data Visualizer";
pub const CHAT_TITLE: &str = "Ask Gemini About Rare Earths Data";

const STYLE: &str = r#"
:root {
  --bg: #f1f5f9;
  --surface: #ffffff;
  --header: #1e293b;
  --border: #e2e8f0;
  --text: #1e293b;
  --text-muted: #64748b;
  --accent: #2563eb;
  --user: #dbeafe;
  --model: #e2e8f0;
  --red: #ef4444;
  --orange: #f97316;
  --radius: 12px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }

header { background: var(--header); color: #fff; padding: 16px 32px; box-shadow: 0 2px 6px rgba(0,0,0,0.2); }
header h1 { font-size: 28px; font-weight: 700; letter-spacing: -0.02em; }
header .subtitle { color: #cbd5e1; font-size: 13px; }

main { max-width: 1200px; margin: 0 auto; padding: 32px; display: flex; flex-direction: column; gap: 24px; }
.grid { display: grid; grid-template-columns: 1fr; gap: 24px; }
@media (min-width: 1024px) { .grid { grid-template-columns: 1fr 1fr; } }

.card { background: var(--surface); border-radius: var(--radius); box-shadow: 0 4px 12px rgba(15,23,42,0.08); padding: 24px; overflow-x: auto; }
.card h3 { font-size: 18px; font-weight: 600; color: #334155; margin-bottom: 16px; }
.card p.text { color: #475569; white-space: pre-line; }
svg.chart { width: 100%; height: auto; }

table { width: 100%; border-collapse: collapse; }
th { text-align: left; font-size: 11px; text-transform: uppercase; letter-spacing: 0.05em; color: var(--text-muted); background: #f8fafc; padding: 8px 12px; }
td { padding: 8px 12px; border-top: 1px solid var(--border); white-space: nowrap; }
tr:hover td { background: #f8fafc; }

.chat-log { background: #f1f5f9; border: 1px solid var(--border); border-radius: 8px; padding: 12px; max-height: 240px; overflow-y: auto; margin-bottom: 16px; }
.chat-log .hint { color: var(--text-muted); }
.msg { max-width: 85%; padding: 8px; border-radius: 6px; margin-bottom: 8px; white-space: pre-wrap; }
.msg.user { background: var(--user); color: #1e40af; margin-left: auto; }
.msg.model { background: var(--model); margin-right: auto; }
.thinking { color: var(--text-muted); padding: 8px; text-align: center; }

form.chat { display: flex; gap: 8px; }
form.chat input { flex: 1; padding: 8px; border: 1px solid #cbd5e1; border-radius: 6px; font: inherit; }
form.chat button { background: var(--accent); color: #fff; border: none; border-radius: 6px; padding: 8px 16px; font-weight: 600; cursor: pointer; }
form.chat button:disabled, form.chat input:disabled { opacity: 0.5; cursor: default; }
.error { color: var(--red); margin-top: 8px; }
.warning { color: var(--orange); font-size: 12px; margin-top: 8px; }
.note { color: var(--text-muted); font-size: 12px; margin-top: 8px; }

footer { text-align: center; padding: 16px; color: var(--text-muted); font-size: 13px; }
"#;

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// The complete HTML document. `script` is inlined at the end of the body.
pub fn render_dashboard(panel: &PanelSnapshot, script: Option<&str>) -> String {
    let mut out = String::with_capacity(64 * 1024);
    let _ = write_page(&mut out, panel, script);
    out
}

fn write_page(out: &mut String, panel: &PanelSnapshot, script: Option<&str>) -> std::fmt::Result {
    write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{PAGE_TITLE}</title>
<style>{STYLE}</style>
</head>
<body>
<header>
<h1>{PAGE_TITLE}</h1>
<p class="subtitle">Insights from U.S. Geological Survey &amp; Gemini API</p>
</header>
<main>
"#
    )?;

    let sections = dashboard_sections();
    let mut in_grid = false;
    for section in &sections {
        let half = section.width == Width::Half;
        if half && !in_grid {
            out.push_str("<div class=\"grid\">\n");
        } else if !half && in_grid {
            out.push_str("</div>\n");
        }
        in_grid = half;
        out.push_str(&render_section(section));
    }
    if in_grid {
        out.push_str("</div>\n");
    }

    out.push_str(&render_chat_panel(panel, script.is_some()));

    writeln!(
        out,
        "</main>\n<footer><p>{}</p></footer>",
        escape(SOURCE_NOTE)
    )?;

    if let Some(script) = script {
        writeln!(out, "<script>{script}</script>")?;
    }
    out.push_str("</body>\n</html>\n");
    Ok(())
}

/// One dashboard card.
pub fn render_section(section: &Section) -> String {
    let mut out = String::new();
    let _ = match &section.view {
        View::Chart(chart) => writeln!(
            out,
            "<section class=\"card\" id=\"{}\"><h3>{}</h3>{}</section>",
            chart.id,
            escape(&chart.title),
            svg::render(chart)
        ),
        View::Table(table) => {
            let head: String = table
                .headers
                .iter()
                .map(|h| format!("<th>{}</th>", escape(h)))
                .collect();
            let body: String = table
                .rows
                .iter()
                .map(|row| {
                    let cells: String = row
                        .iter()
                        .map(|c| format!("<td>{}</td>", escape(c)))
                        .collect();
                    format!("<tr>{cells}</tr>")
                })
                .collect();
            writeln!(
                out,
                "<section class=\"card\" id=\"{}\"><h3>{}</h3><table><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table></section>",
                table.id,
                escape(&table.title)
            )
        }
        View::Text(text) => writeln!(
            out,
            "<section class=\"card\" id=\"{}\"><h3>{}</h3><p class=\"text\">{}</p></section>",
            text.id,
            escape(&text.title),
            escape(&text.text)
        ),
    };
    out
}

// ---------------------------------------------------------------------------
// Chat panel
// ---------------------------------------------------------------------------

/// A transcript entry as shown in the panel.
pub fn render_message(message: &ChatMessage) -> String {
    let (class, speaker) = match message.role() {
        Role::User => ("user", "You"),
        Role::Model => ("model", "Gemini"),
    };
    format!(
        "<div class=\"msg {class}\"><strong>{speaker}:</strong> {}</div>",
        escape(message.text())
    )
}

/// The question panel. `interactive` enables the form.
pub fn render_chat_panel(panel: &PanelSnapshot, interactive: bool) -> String {
    let hint = escape(EMPTY_HINT);
    let log: String = if panel.messages.is_empty() {
        format!("<p class=\"hint\">{hint}</p>")
    } else {
        panel.messages.iter().map(render_message).collect()
    };

    let busy = panel.state == PanelState::AwaitingResponse;
    let input_disabled = if busy || !interactive { " disabled" } else { "" };
    let button_label = if busy { "Sending..." } else { "Ask" };
    let thinking_hidden = if busy { "" } else { " hidden" };

    let mut out = format!(
        "<section class=\"card\" id=\"chat-panel\"><h3>{CHAT_TITLE}</h3>\
<div class=\"chat-log\" id=\"chat-log\" data-hint=\"{hint}\">{log}</div>\
<div class=\"thinking\" id=\"chat-thinking\"{thinking_hidden}>Gemini is thinking...</div>\
<form class=\"chat\" id=\"chat-form\">\
<input type=\"text\" id=\"chat-input\" placeholder=\"Ask Gemini...\" autocomplete=\"off\"{input_disabled}>\
<button type=\"submit\" id=\"chat-submit\" disabled>{button_label}</button>\
</form>"
    );

    match &panel.last_error {
        Some(error) => {
            let _ = write!(out, "<p class=\"error\" id=\"chat-error\">{}</p>", escape(error));
        }
        None => out.push_str("<p class=\"error\" id=\"chat-error\" hidden></p>"),
    }
    if let Some(warning) = panel.credential_warning {
        let _ = write!(out, "<p class=\"warning\">{}</p>", escape(warning));
    }
    if !interactive {
        out.push_str("<p class=\"note\">Run <code>rare-earths serve</code> to ask questions.</p>");
    }
    out.push_str("</section>\n");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{CREDENTIAL_WARNING, ChatPanel};

    fn idle() -> PanelSnapshot {
        ChatPanel::new("S", 6).snapshot()
    }

    #[test]
    fn sections_appear_in_page_order() {
        let html = render_dashboard(&idle(), None);
        let order = [
            "id=\"domestic-production\"",
            "id=\"mineral-concentrates\"",
            "id=\"compounds-metals\"",
            "id=\"imports\"",
            "id=\"prices\"",
            "id=\"import-sources\"",
            "id=\"tariffs\"",
            "id=\"world-production\"",
            "id=\"world-reserves\"",
            "id=\"recycling\"",
            "id=\"chat-panel\"",
        ];
        let positions: Vec<usize> = order.iter().map(|id| html.find(id).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_transcript_shows_hint() {
        let html = render_chat_panel(&idle(), true);
        assert!(html.contains("What was the trend in Neodymium Oxide prices?"));
        assert!(!html.contains("class=\"warning\""));
    }

    #[test]
    fn messages_are_escaped_and_labelled() {
        let mut panel = ChatPanel::new("S", 6);
        panel.submit_text("<script>").unwrap();
        let html = render_chat_panel(&panel.snapshot(), true);
        assert!(html.contains("<strong>You:</strong> &lt;script&gt;"));
        assert!(html.contains("Sending..."));
        assert!(html.contains("id=\"chat-input\" placeholder=\"Ask Gemini...\" autocomplete=\"off\" disabled"));
    }

    #[test]
    fn missing_credential_shows_warning() {
        let snapshot = ChatPanel::new("S", 6).with_credential_warning(true).snapshot();
        let html = render_dashboard(&snapshot, Some("/* js */"));
        assert!(html.contains(CREDENTIAL_WARNING));
        assert!(html.contains("<script>/* js */</script>"));
        assert!(!html.contains("rare-earths serve"));
    }
}
