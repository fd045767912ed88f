//! Configuration loading and resolution
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `KITODO_CONFIG`
//! 3. Platform configuration directory (`~/.config/kitodo/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable configuration file never aborts startup: the
//! resolver logs a warning and continues with the compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "KITODO_CONFIG";

/// Accepted values of `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging section of the TOML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
    /// Include the module path of the event in log lines
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Metadata language priority list, e.g. `"de, en;q=0.8"`
    pub metadata_language: Option<String>,
    /// Acquisition stage passed to the ruleset when views are requested
    pub acquisition_stage: Option<String>,
    /// Default ruleset file
    pub ruleset: Option<PathBuf>,
    /// Directory holding the documents of linkable processes
    pub process_directory: Option<PathBuf>,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Language priority list, falling back to English
    pub fn language_priority(&self) -> Vec<String> {
        match self.metadata_language.as_deref() {
            Some(languages) if !languages.trim().is_empty() => language_priority(languages),
            _ => vec!["en".to_string()],
        }
    }

    /// Acquisition stage, empty when not configured
    pub fn acquisition_stage(&self) -> &str {
        self.acquisition_stage.as_deref().unwrap_or("")
    }

    /// Reject settings that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "unknown logging.level \"{}\" (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Values used when no configuration file is available
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub config_file: Option<PathBuf>,
    pub log_level: String,
    pub metadata_language: String,
}

impl CompiledDefaults {
    /// Defaults for the platform the binary runs on
    pub fn for_current_platform() -> Self {
        Self {
            config_file: dirs::config_dir().map(|d| d.join("kitodo").join("config.toml")),
            log_level: "info".to_string(),
            metadata_language: "en".to_string(),
        }
    }
}

/// Resolves and loads the configuration file
pub struct ConfigResolver {
    module_name: String,
}

impl ConfigResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
        }
    }

    /// Path of the configuration file to use, if any
    pub fn resolve_path(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        CompiledDefaults::for_current_platform()
            .config_file
            .filter(|path| path.exists())
    }

    /// Load the configuration, degrading to defaults on any problem
    pub fn resolve(&self, cli_arg: Option<&Path>) -> TomlConfig {
        let Some(path) = self.resolve_path(cli_arg) else {
            debug!("{}: no configuration file found, using defaults", self.module_name);
            return TomlConfig::default();
        };

        match load_toml_config(&path) {
            Ok(config) => {
                debug!("{}: loaded configuration from {}", self.module_name, path.display());
                config
            }
            Err(e) => {
                warn!(
                    "{}: ignoring configuration {}: {}",
                    self.module_name,
                    path.display(),
                    e
                );
                TomlConfig::default()
            }
        }
    }
}

/// Read and parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Err(Error::NotFound(format!("Config file not found: {}", path.display())));
    }
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Write a TOML configuration file (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Parse an HTTP-style language priority list (`"de-DE, en;q=0.8, fr;q=0.5"`)
///
/// Entries are ordered by descending quality; entries with equal quality keep
/// their written order. Entries with `q=0` are dropped.
pub fn language_priority(languages: &str) -> Vec<String> {
    let mut ranges: Vec<(String, f32)> = languages
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() {
                return None;
            }
            let quality = pieces
                .filter_map(|p| p.trim().strip_prefix("q="))
                .filter_map(|q| q.trim().parse::<f32>().ok())
                .next()
                .unwrap_or(1.0);
            Some((tag.to_ascii_lowercase(), quality))
        })
        .filter(|(_, quality)| *quality > 0.0)
        .collect();

    // stable sort keeps the written order for equal weights
    ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranges.into_iter().map(|(tag, _)| tag).collect()
}
