/// Configuration system for rare-earths.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — [`schema::AppConfig::default()`]
/// 2. **User global config** — `~/.rare-earths/config.toml`
/// 3. **Project local config** — `.rare-earths.toml` in the current directory
/// 4. **Environment variables** — `RARE_EARTHS_*` overrides (highest precedence)
///
/// The result is resolved once at process startup and passed down
/// explicitly; no module reads configuration on its own.
///
/// # Usage
///
/// ```rust,ignore
/// use rare_earths::config;
///
/// let cfg = config::load();
/// println!("serving on {}", cfg.server.addr);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::AppConfig;

/// Directory under the home directory holding config and logs.
pub const APP_DIR: &str = ".rare-earths";

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env.
pub fn load() -> AppConfig {
    let mut config = AppConfig::default();

    // Layer 2: user global config (~/.rare-earths/config.toml)
    if let Some(global) = load_toml_file(global_config_path()) {
        merge_config(&mut config, &global);
    }

    // Layer 3: project local config (.rare-earths.toml)
    if let Some(project) = load_toml_file(project_config_path()) {
        merge_config(&mut config, &project);
    }

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken file never stops the dashboard.
fn load_toml_file(path: Option<PathBuf>) -> Option<AppConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge a loaded config layer into the base config.
///
/// Each file is deserialized with `serde(default)`, so keys a user did not
/// set already hold the built-in defaults; the overlay simply replaces the
/// base.
fn merge_config(base: &mut AppConfig, overlay: &AppConfig) {
    *base = overlay.clone();
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.rare-earths/`.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR))
}

/// Path to the user global config: `~/.rare-earths/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config: `.rare-earths.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".rare-earths.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// `lookup` is `std::env::var` in production; tests pass a map.
///
/// Supported variables:
/// - `RARE_EARTHS_ADDR` — server listen address
/// - `RARE_EARTHS_MODEL` — Gemini model name
/// - `RARE_EARTHS_API_URL` — Gemini API base URL
/// - `RARE_EARTHS_TIMEOUT_MS` — request timeout
/// - `RARE_EARTHS_HISTORY_TURNS` — prior messages sent per question
/// - `RARE_EARTHS_LOG` — question log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("RARE_EARTHS_ADDR")
        && !val.is_empty()
    {
        config.server.addr = val;
    }
    if let Some(val) = lookup("RARE_EARTHS_MODEL")
        && !val.is_empty()
    {
        config.generation.model = val;
    }
    if let Some(val) = lookup("RARE_EARTHS_API_URL")
        && !val.is_empty()
    {
        config.generation.api_url = val;
    }
    if let Some(val) = lookup("RARE_EARTHS_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.generation.timeout_ms = ms;
    }
    if let Some(val) = lookup("RARE_EARTHS_HISTORY_TURNS")
        && let Ok(turns) = val.parse::<usize>()
    {
        config.generation.history_turns = turns;
    }
    if let Some(val) = lookup("RARE_EARTHS_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.rare-earths/config.toml`.
///
/// Creates the directory if needed. Refuses to overwrite unless `force`.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.rare-earths/ directory")?;
    }

    fs::write(&path, AppConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `generation.model`) in the global config file.
///
/// Starts from the existing file, or from the annotated defaults when there
/// is none, so the key must exist in the schema.
pub fn set_config_value(key: &str, value: &str) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    let current = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        AppConfig::default_toml()
    };

    let mut root: toml::Value =
        toml::from_str(&current).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would make the file unreadable as a config.
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<AppConfig>(&updated)
        .with_context(|| format!("'{value}' is not a valid value for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(path)
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The existing value's type decides how `raw_value` is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section_path, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must look like 'section.key', got '{key}'");
    };

    let mut current = root;
    for part in section_path.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section_path}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' cannot be set from the command line"),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
