use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use rare_earths::cli;

#[derive(Debug, Parser)]
#[command(name = "rare-earths")]
#[command(about = "Rare-earth market statistics dashboard with grounded Gemini Q&A")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the web dashboard
    Serve {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser window
        #[arg(long)]
        no_browser: bool,
    },
    /// Ask one question about the dataset and print the answer
    Ask {
        /// The question
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },
    /// Interactive question session in the terminal
    Chat,
    /// Print the context summary sent with every question
    Summary,
    /// Write the dashboard as a static HTML page
    Render {
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show question log statistics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Check credential, provider, config and question log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.rare-earths/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `generation.model gemini-2.5-pro`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_browser } => cli::run_serve(addr, no_browser),
        Commands::Ask { question } => cli::run_ask(&question.join(" ")),
        Commands::Chat => cli::run_chat(),
        Commands::Summary => cli::run_summary(),
        Commands::Render { output } => cli::run_render(output.as_deref()),
        Commands::Stats { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(fmt, days)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
