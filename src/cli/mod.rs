//! CLI command implementations for rare-earths.
//!
//! Provides subcommand handlers for:
//! - `rare-earths serve` — the web dashboard
//! - `rare-earths ask "question"` / `rare-earths chat` — grounded questions
//! - `rare-earths summary` / `rare-earths render` — the dataset as text or HTML
//! - `rare-earths stats` — question log summary
//! - `rare-earths health` — credential, provider, config and log checks
//! - `rare-earths config show|init|set|reset` — configuration management

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::AskLogger;
use crate::analytics::reporter::{self, AskStats};
use crate::chat::{self, ChatPanel, SubmitError};
use crate::config::{self, schema::AppConfig};
use crate::dataset;
use crate::llm::config::GenerationConfig;
use crate::llm::gemini::GeminiClient;
use crate::llm::{ChatMessage, TextGenerator};
use crate::render::page;
use crate::web::{self, Dashboard};

/// Output format for `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Everything a question-answering command needs, resolved once.
struct Session {
    config: AppConfig,
    client: GeminiClient,
    logger: AskLogger,
}

impl Session {
    fn load() -> Self {
        let config = config::load();
        let client = GeminiClient::from_config(&GenerationConfig::load(&config));
        let logger = AskLogger::from_config(&config.logging);
        Self {
            config,
            client,
            logger,
        }
    }

    fn panel(&self) -> ChatPanel {
        ChatPanel::new(
            dataset::context_summary(),
            self.config.generation.history_turns,
        )
        .with_credential_warning(!self.client.is_configured())
    }

    /// Ask through `panel`, logging the outcome.
    fn ask<'p>(
        &self,
        panel: &'p mut ChatPanel,
        question: &str,
    ) -> Result<&'p ChatMessage, SubmitError> {
        panel.ask_with(question, |request| {
            chat::run_request(&self.client, request, &self.logger, "cli")
        })
    }
}

// ---------------------------------------------------------------------------
// rare-earths serve
// ---------------------------------------------------------------------------

/// Run the dashboard server until interrupted.
pub fn run_serve(addr: Option<String>, no_browser: bool) -> Result<()> {
    let session = Session::load();
    let addr = addr.unwrap_or_else(|| session.config.server.addr.clone());
    let open = session.config.server.open_browser && !no_browser;

    let dashboard = Dashboard::new(session.config, Arc::new(session.client), session.logger);
    web::serve(&addr, open, dashboard)
}

// ---------------------------------------------------------------------------
// rare-earths ask | chat
// ---------------------------------------------------------------------------

/// Answer a single question and print the reply.
pub fn run_ask(question: &str) -> Result<()> {
    let session = Session::load();
    let mut panel = session.panel();
    let reply = session.ask(&mut panel, question)?.text().to_string();

    if let Some(error) = panel.last_error() {
        anyhow::bail!("{error}");
    }
    println!("{reply}");
    Ok(())
}

/// Interactive question loop on stdin. Ends on EOF, `exit` or `quit`.
pub fn run_chat() -> Result<()> {
    let session = Session::load();
    let mut panel = session.panel();

    println!("{}", page::CHAT_TITLE.bold().cyan());
    println!("{}", chat::EMPTY_HINT.dimmed());
    if !session.client.is_configured() {
        println!("{}", chat::CREDENTIAL_WARNING.yellow());
    }
    println!("{}", "Type `exit` to leave.".dimmed());
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "You:".bold().blue());
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("failed to read from stdin")?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        match session.ask(&mut panel, &line) {
            Ok(reply) => {
                let text = reply.text().to_string();
                if panel.last_error().is_some() {
                    println!("{} {}", "Gemini:".bold(), text.red());
                } else {
                    println!("{} {text}", "Gemini:".bold());
                }
                println!();
            }
            Err(SubmitError::Empty) => continue,
            Err(e) => println!("{}", e.to_string().yellow()),
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// rare-earths summary | render
// ---------------------------------------------------------------------------

/// Print the context summary sent with every question.
pub fn run_summary() -> Result<()> {
    println!("{}", dataset::context_summary());
    Ok(())
}

/// Write the dashboard page as static HTML to `output`, or stdout.
pub fn run_render(output: Option<&Path>) -> Result<()> {
    let session = Session::load();
    let html = page::render_dashboard(&session.panel().snapshot(), None);

    match output {
        Some(path) => {
            fs::write(path, html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} Dashboard written to {}",
                "✓".green().bold(),
                path.display()
            );
        }
        None => print!("{html}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// rare-earths stats
// ---------------------------------------------------------------------------

/// Summarise the question log.
pub fn run_stats(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let config = config::load();
    let logger = AskLogger::from_config(&config.logging);
    let stats = reporter::compute_stats(&logger, days);

    if stats.total_questions == 0 {
        println!(
            "{}",
            "No questions logged yet. Ask something with `rare-earths ask` or the dashboard."
                .yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_stats_json(&stats)?,
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => print_stats_table(&stats),
    }

    Ok(())
}

fn print_stats_table(stats: &AskStats) {
    println!("{}", "Rare Earths Question Report".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();

    println!("  {} {}", "Questions:   ".bold(), stats.total_questions);
    println!("  {} {}", "Answered:    ".bold(), stats.answered);
    println!("  {} {}", "No response: ".bold(), stats.no_response);
    println!("  {} {}", "Failed:      ".bold(), stats.failed);
    println!("  {} {:.1}%", "Success rate:".bold(), stats.success_pct());
    if let Some(latency) = stats.avg_latency_ms {
        println!("  {} {latency} ms", "Avg latency: ".bold());
    }
    println!();

    if !stats.failures.is_empty() {
        println!("{}", "Failures by Kind".bold().cyan());
        for failure in &stats.failures {
            println!("  {:<20} {:>6}", failure.kind.red(), failure.count);
        }
        println!();
    }

    println!("{}", "Daily Activity".bold().cyan());
    println!("  {:<12} {:>10} {:>8}", "Date", "Questions", "Failed");
    println!("  {}", "-".repeat(32));
    for (i, day) in stats.daily.iter().enumerate() {
        let line = format!("  {:<12} {:>10} {:>8}", day.date, day.questions, day.failed);
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_stats_json(stats: &AskStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("failed to serialize stats")?;
    println!("{json}");
    Ok(())
}

fn print_stats_csv(stats: &AskStats) {
    println!("date,questions,failed");
    for day in &stats.daily {
        println!("{},{},{}", day.date, day.questions, day.failed);
    }
}

// ---------------------------------------------------------------------------
// rare-earths health
// ---------------------------------------------------------------------------

/// Check credential, provider reachability, config files and the question log.
pub fn run_health() -> Result<()> {
    println!("{}", "Rare Earths Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.rare-earths/config.toml found"
        } else {
            "not found (run `rare-earths config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".rare-earths.toml found"
        } else {
            "none (optional)"
        },
    );

    let session = Session::load();
    let configured = session.client.is_configured();
    print_health_item(
        "API key",
        configured,
        if configured {
            "set"
        } else {
            "missing (export API_KEY or GEMINI_API_KEY)"
        },
    );

    if configured {
        let reachable = session.client.is_reachable();
        let detail = if reachable {
            format!("{} reachable", session.client.model_name())
        } else {
            format!(
                "could not reach {} at {}",
                session.client.model_name(),
                session.config.generation.api_url
            )
        };
        print_health_item("Gemini", reachable, &detail);
    }

    let total = dataset::share_total(dataset::tables::IMPORT_SOURCES);
    print_health_item(
        "Dataset",
        (total - 100.0).abs() < 0.5,
        &format!("import shares total {total}%"),
    );

    match session.logger.path() {
        None => print_health_item("Question log", true, "disabled"),
        Some(path) => {
            let exists = path.exists();
            let detail = if exists {
                format!("{} entries", session.logger.read_all().len())
            } else {
                "no log file yet".to_string()
            };
            print_health_item("Question log", exists, &detail);
        }
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// rare-earths config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.rare-earths/config.toml");
    print_source(project_exists, ".rare-earths.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "RARE_EARTHS_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.rare-earths/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    let path = config::set_config_value(key, value)?;
    println!(
        "{} Set {} = {} in {}",
        "✓".green().bold(),
        key.bold(),
        value,
        path.display()
    );
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
