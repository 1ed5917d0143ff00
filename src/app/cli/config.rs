//! TOML configuration file loading
//!
//! The file uses the same option names as the command line in snake_case.
//! An explicitly named file must exist; the default location is only read
//! when present.

use crate::app::config::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "SubmissionCheck";
const CONFIG_FILE_NAME: &str = "submission-check.toml";

/// Values read from the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub webhook_secret: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    pub discord_webhook_url: Option<String>,
    pub listen_addr: Option<String>,
    pub scratch_dir: Option<PathBuf>,
    pub clone_timeout_secs: Option<u64>,
    pub notify_timeout_secs: Option<u64>,
    pub review_url_template: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub color: Option<bool>,
    pub allow_insecure_transports: Option<bool>,
}

/// `<config dir>/SubmissionCheck/submission-check.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl FileConfig {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::FileRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::parse(&contents).map_err(|source| ConfigError::FileParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load the explicit file, or the default one if it exists
    pub fn discover(explicit: Option<&Path>) -> ConfigResult<Option<Self>> {
        match explicit {
            Some(path) => Self::load(path).map(Some),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path).map(Some),
                _ => Ok(None),
            },
        }
    }
}
