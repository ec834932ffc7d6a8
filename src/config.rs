//! Configuration for coresolve.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CORESOLVE_MODEL_COMMAND, CORESOLVE_MODEL_TIMEOUT,
//!    CORESOLVE_GROUP_PREFIX)
//! 2. Project config file (.coresolve/config.yaml)
//! 3. User config file (~/.coresolve/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .coresolve/config.yaml
//! - Falls back to the user config file if no project config exists
//! - Model arguments are passed through verbatim (relative paths resolve
//!   against the working directory of the process)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::ResolverSettings;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".coresolve";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub model: Option<ModelConfig>,
    #[serde(default)]
    pub resolver: Option<ResolverConfig>,
    #[serde(default)]
    pub collate: Option<CollateConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    /// Program printing an analysis JSON for the document on stdin
    pub command: Option<String>,
    /// Arguments passed to the program
    pub args: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverConfig {
    /// Span group key prefix marking coreference clusters
    pub group_prefix: Option<String>,
    pub max_input_size_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollateConfig {
    /// Language folders to collate
    pub langs: Option<Vec<String>>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// External model invocation
    pub model: ModelSettings,
    /// Resolver settings
    pub resolver: ResolverSettings,
    /// Default language folders for collation
    pub langs: Vec<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec!["scripts/spacy_coref.py".to_string()],
            timeout_seconds: 300,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            resolver: ResolverSettings::default(),
            langs: default_langs(),
            config_file: None,
        }
    }
}

fn default_langs() -> Vec<String> {
    vec!["EN".to_string()]
}

/// Find config file by searching `start` and its parents, then the user's
/// home directory
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge a parsed config file over the defaults
fn apply_file(mut config: ResolvedConfig, file: ConfigFile) -> ResolvedConfig {
    if let Some(model) = file.model {
        if let Some(command) = model.command {
            config.model.command = command;
        }
        if let Some(args) = model.args {
            config.model.args = args;
        }
        if let Some(timeout) = model.timeout_seconds {
            config.model.timeout_seconds = timeout;
        }
    }

    if let Some(resolver) = file.resolver {
        if let Some(prefix) = resolver.group_prefix {
            config.resolver.group_prefix = prefix;
        }
        if let Some(max_bytes) = resolver.max_input_size_bytes {
            config.resolver.max_input_bytes = max_bytes;
        }
    }

    if let Some(langs) = file.collate.and_then(|c| c.langs) {
        config.langs = langs;
    }

    config
}

/// Apply environment overrides, reading variables through `var`
fn apply_env<F>(mut config: ResolvedConfig, var: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(command) = var("CORESOLVE_MODEL_COMMAND") {
        // A command line: program followed by whitespace-separated arguments
        let mut parts = command.split_whitespace().map(str::to_string);
        if let Some(program) = parts.next() {
            config.model.command = program;
            config.model.args = parts.collect();
        }
    }

    if let Some(timeout) = var("CORESOLVE_MODEL_TIMEOUT") {
        config.model.timeout_seconds = timeout
            .trim()
            .parse()
            .with_context(|| format!("Invalid CORESOLVE_MODEL_TIMEOUT: {}", timeout))?;
    }

    if let Some(prefix) = var("CORESOLVE_GROUP_PREFIX") {
        config.resolver.group_prefix = prefix;
    }

    Ok(config)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file(&cwd);

    let mut config = ResolvedConfig::default();
    if let Some(ref path) = config_file {
        config = apply_file(config, load_config_file(path)?);
    }
    config.config_file = config_file;

    apply_env(config, |name| std::env::var(name).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
