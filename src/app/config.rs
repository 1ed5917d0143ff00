//! Validated runtime configuration
//!
//! [`Config`] is assembled once at startup from command line / environment
//! values layered over the optional configuration file, then shared
//! immutably. Request handling never reads the environment.

use super::cli::{Args, FileConfig};
use crate::credentials::expand_tilde;
use crate::fetcher::DEFAULT_CLONE_TIMEOUT;
use crate::notifications::DEFAULT_NOTIFY_TIMEOUT;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const SCRATCH_DIR_NAME: &str = "submission-check";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("WEBHOOK_SECRET is required and must not be empty")]
    MissingSecret,

    #[error("SSH_KEY_PATH is required")]
    MissingKeyPath,

    #[error("{name} must be greater than zero")]
    InvalidTimeout { name: &'static str },

    // The URL carries a token, so it stays out of the message
    #[error("DISCORD_WEBHOOK_URL must be an http(s) URL")]
    InvalidWebhookUrl(String),

    #[error("invalid listen address '{0}'")]
    InvalidListenAddr(String),

    #[error("configuration file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read configuration file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {}: {source}", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::FileRead { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::MissingSecret => Some("Set WEBHOOK_SECRET or --webhook-secret"),
            ConfigError::MissingKeyPath => Some("Set SSH_KEY_PATH or --ssh-key"),
            ConfigError::InvalidTimeout { .. } => Some("Timeouts are whole seconds greater than zero"),
            ConfigError::InvalidWebhookUrl(_) => Some("DISCORD_WEBHOOK_URL must start with http:// or https://"),
            ConfigError::InvalidListenAddr(_) => Some("LISTEN_ADDR must look like 0.0.0.0:8080"),
            ConfigError::FileNotFound(_) => Some("The configuration file given with --config-file does not exist"),
            ConfigError::FileParse { .. } => Some("Fix the syntax or unknown keys in the configuration file"),
            ConfigError::FileRead { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub webhook_secret: String,
    pub ssh_key_path: PathBuf,
    pub discord_webhook_url: Option<String>,
    pub listen_addr: SocketAddr,
    pub scratch_dir: PathBuf,
    pub clone_timeout: Duration,
    pub notify_timeout: Duration,
    pub review_url_template: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub color: bool,
    pub allow_insecure_transports: bool,
}

impl Config {
    /// Merge command line / environment values over file values and validate
    pub fn from_sources(args: Args, file: Option<FileConfig>) -> ConfigResult<Self> {
        let file = file.unwrap_or_default();

        let webhook_secret = args
            .webhook_secret
            .or(file.webhook_secret)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let ssh_key_path = args
            .ssh_key_path
            .or(file.ssh_key_path)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| expand_tilde(&p))
            .ok_or(ConfigError::MissingKeyPath)?;

        let discord_webhook_url = args
            .discord_webhook_url
            .or(file.discord_webhook_url)
            .filter(|u| !u.is_empty());
        if let Some(url) = &discord_webhook_url {
            validate_webhook_url(url)?;
        }

        let listen_addr = match args.listen_addr {
            Some(addr) => addr,
            None => {
                let raw = file
                    .listen_addr
                    .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
                raw.parse::<SocketAddr>()
                    .map_err(|_| ConfigError::InvalidListenAddr(raw.clone()))?
            }
        };

        let scratch_dir = args
            .scratch_dir
            .or(file.scratch_dir)
            .map(|p| expand_tilde(&p))
            .unwrap_or_else(default_scratch_dir);

        let clone_timeout = timeout(
            "CLONE_TIMEOUT_SECS",
            args.clone_timeout_secs.or(file.clone_timeout_secs),
            DEFAULT_CLONE_TIMEOUT,
        )?;
        let notify_timeout = timeout(
            "NOTIFY_TIMEOUT_SECS",
            args.notify_timeout_secs.or(file.notify_timeout_secs),
            DEFAULT_NOTIFY_TIMEOUT,
        )?;

        // "none" and "-" disable file logging
        let log_file = args
            .log_file
            .or(file.log_file)
            .filter(|p| !(p.as_os_str().eq_ignore_ascii_case("none") || p.as_os_str() == "-"));

        Ok(Self {
            webhook_secret,
            ssh_key_path,
            discord_webhook_url,
            listen_addr,
            scratch_dir,
            clone_timeout,
            notify_timeout,
            review_url_template: args
                .review_url_template
                .or(file.review_url_template)
                .filter(|t| !t.is_empty()),
            log_level: args.log_level.or(file.log_level),
            log_format: args.log_format.or(file.log_format),
            log_file,
            color: !args.no_color && file.color.unwrap_or(true),
            allow_insecure_transports: args.allow_insecure_transports
                || file.allow_insecure_transports.unwrap_or(false),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("webhook_secret", &"<redacted>")
            .field("ssh_key_path", &self.ssh_key_path)
            .field(
                "discord_webhook_url",
                &self.discord_webhook_url.as_ref().map(|_| "<redacted>"),
            )
            .field("listen_addr", &self.listen_addr)
            .field("scratch_dir", &self.scratch_dir)
            .field("clone_timeout", &self.clone_timeout)
            .field("notify_timeout", &self.notify_timeout)
            .field("review_url_template", &self.review_url_template)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("log_file", &self.log_file)
            .field("color", &self.color)
            .field("allow_insecure_transports", &self.allow_insecure_transports)
            .finish()
    }
}

fn timeout(name: &'static str, secs: Option<u64>, default: Duration) -> ConfigResult<Duration> {
    match secs {
        Some(0) => Err(ConfigError::InvalidTimeout { name }),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(default),
    }
}

fn validate_webhook_url(url: &str) -> ConfigResult<()> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidWebhookUrl(url.to_string())),
    }
}

pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}
