//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.glance/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! The result of resolution is a `ResolvedConfig`, built once at startup and
//! shared (behind an `Arc`) with the controller and both views.

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GlanceConfig {
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub style: Option<StyleName>,
    pub width: Option<u16>,
    pub show_all_files: Option<bool>,
    pub high_performance_pager: Option<bool>,
    pub log_level: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub ignore_patterns: Option<Vec<String>>,
}

/// Render style. `Auto` is resolved to `Dark` or `Light` during resolution,
/// so nothing downstream of `resolve` ever sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StyleName {
    #[default]
    Auto,
    Dark,
    Light,
    #[value(name = "notty")]
    NoTty,
}

impl StyleName {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(StyleName::Auto),
            "dark" => Some(StyleName::Dark),
            "light" => Some(StyleName::Light),
            "notty" => Some(StyleName::NoTty),
            _ => None,
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "mdown", "mkdn", "mkd", "markdown"];
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub style: StyleName,
    /// Maximum render width in columns; 0 means use the terminal width.
    pub width: u16,
    pub show_all_files: bool,
    pub high_performance_pager: bool,
    pub log_level: String,
    pub extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            style: StyleName::Dark,
            width: 0,
            show_all_files: false,
            high_performance_pager: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Values given on the command line. `None` / `false` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub style: Option<StyleName>,
    pub width: Option<u16>,
    pub show_all_files: bool,
    pub high_performance_pager: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "config I/O error ({}): {e}", path.display()),
            ConfigError::Parse(path, e) => {
                write!(f, "config parse error ({}): {e}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.glance/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".glance").join("config.toml"))
}

/// Load config from `explicit` if given, otherwise `~/.glance/config.toml`.
///
/// A missing default file is generated and treated as empty. A missing
/// explicit file is an error: the user asked for it by name.
pub fn load_config(explicit: Option<&Path>) -> Result<GlanceConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(GlanceConfig::default());
            }
        },
    };

    if explicit.is_none() && !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(GlanceConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
    let config = parse_config(&contents).map_err(|e| ConfigError::Parse(path.clone(), e))?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<GlanceConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Glance Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# style = "auto"                   # "auto", "dark", "light", "notty"  (env: GLANCE_STYLE)
# width = 0                        # max render width, 0 = terminal width (env: GLANCE_WIDTH)
# show_all_files = false           # ignore .gitignore and show hidden files
# high_performance_pager = false   # full repaint after scrolling
# log_level = "info"               # "error", "warn", "info", "debug", "trace"
# extensions = ["md", "mdown", "mkdn", "mkd", "markdown"]
# ignore_patterns = ["node_modules", "vendor"]
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &GlanceConfig, cli: &CliOverrides) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();
    let general = &config.general;

    // Style: CLI → env → config → auto
    let style = cli
        .style
        .or_else(|| {
            std::env::var("GLANCE_STYLE")
                .ok()
                .and_then(|v| StyleName::from_env_value(&v))
        })
        .or(general.style)
        .unwrap_or_default();

    // Width: CLI → env → config → 0
    let width = cli
        .width
        .or_else(|| {
            std::env::var("GLANCE_WIDTH")
                .ok()
                .and_then(|v| v.trim().parse().ok())
        })
        .or(general.width)
        .unwrap_or(defaults.width);

    let extensions = general
        .extensions
        .clone()
        .filter(|exts| !exts.is_empty())
        .unwrap_or(defaults.extensions);

    ResolvedConfig {
        style: resolve_style(style, std::env::var("COLORFGBG").ok().as_deref()),
        width,
        show_all_files: cli.show_all_files || general.show_all_files.unwrap_or(false),
        high_performance_pager: cli.high_performance_pager
            || general.high_performance_pager.unwrap_or(false),
        log_level: general
            .log_level
            .clone()
            .unwrap_or(defaults.log_level),
        extensions,
        ignore_patterns: general.ignore_patterns.clone().unwrap_or_default(),
    }
}

/// Resolve `Auto` against the terminal's `COLORFGBG` hint ("fg;bg").
/// Background colours 7 and 15 are light; anything else, or no hint, is dark.
pub fn resolve_style(style: StyleName, colorfgbg: Option<&str>) -> StyleName {
    if style != StyleName::Auto {
        return style;
    }
    let light = colorfgbg
        .and_then(|v| v.rsplit(';').next())
        .map(|bg| matches!(bg.trim(), "7" | "15"))
        .unwrap_or(false);
    if light { StyleName::Light } else { StyleName::Dark }
}
