//! Configuration file reading and resolution.
//!
//! Settings come from, in order of precedence: command-line flags (and the
//! `GITHUB_TOKEN` environment variable), the TOML config file, defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::format::TargetFormat;
use crate::source::GitHubSourceConfig;
use crate::task::GeneratorKind;

const ENV_CONFIG_FILE: &str = "REPOPICK_CONFIG";
const APP_DIR: &str = "repopick";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The on-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub default_format: Option<String>,
    pub default_generator: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Locate the config file: the explicit path, then `$REPOPICK_CONFIG`, then
/// `<config dir>/repopick/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var(ENV_CONFIG_FILE) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Read the config file. An explicitly requested file must exist; the
/// default location is allowed to be absent.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = config_path(explicit) else {
        return Ok(FileConfig::default());
    };
    if !path.exists() {
        if explicit.is_some() {
            return Err(ConfigError::FileNotFound(path));
        }
        log::debug!("No config file at {}", path.display());
        return Ok(FileConfig::default());
    }
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
        path: path.clone(),
        source,
    })?;
    log::debug!("Loaded config from {}", path.display());
    FileConfig::parse(&text, &path)
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub format: Option<TargetFormat>,
    pub generator: Option<GeneratorKind>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source: GitHubSourceConfig,
    pub format: Option<TargetFormat>,
    pub generator: Option<GeneratorKind>,
}

impl Settings {
    pub fn resolve(file: &FileConfig, overrides: Overrides) -> Result<Settings> {
        let file_format = file
            .default_format
            .as_deref()
            .map(|raw| {
                raw.parse::<TargetFormat>()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: "default_format".to_string(),
                        message,
                    })
            })
            .transpose()?;
        let file_generator = file
            .default_generator
            .as_deref()
            .map(|raw| {
                raw.parse::<GeneratorKind>()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: "default_generator".to_string(),
                        message,
                    })
            })
            .transpose()?;
        if file.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let generator = overrides.generator.or(file_generator);
        // A generator picked on the command line brings its own format and
        // outranks the file's default format.
        let format = overrides
            .format
            .or(overrides.generator.map(GeneratorKind::default_format))
            .or(file_format)
            .or(generator.map(GeneratorKind::default_format));

        let defaults = GitHubSourceConfig::default();
        let source = GitHubSourceConfig {
            api_url: overrides
                .api_url
                .or_else(|| file.api_url.clone())
                .unwrap_or(defaults.api_url),
            token: overrides
                .token
                .filter(|t| !t.is_empty())
                .or_else(|| file.token.clone()),
            user_agent: file.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout: file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        Ok(Settings {
            source,
            format,
            generator,
        })
    }
}
