//! Command line arguments
//!
//! Every option can also be supplied through its environment variable, which
//! is how the service is normally configured in a container.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "submission-check")]
#[command(about = "Webhook that checks submitted repositories for non-source files")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", env = "CONFIG_FILE", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Shared secret expected in the X-Secret header
    #[arg(long = "webhook-secret", env = "WEBHOOK_SECRET", value_name = "SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// Private key used to clone submissions over SSH
    #[arg(short = 'k', long = "ssh-key", env = "SSH_KEY_PATH", value_name = "FILE")]
    pub ssh_key_path: Option<PathBuf>,

    /// Discord webhook receiving outcome notifications
    #[arg(long = "discord-webhook-url", env = "DISCORD_WEBHOOK_URL", value_name = "URL", hide_env_values = true)]
    pub discord_webhook_url: Option<String>,

    /// Address to listen on
    #[arg(short = 'a', long = "listen", env = "LISTEN_ADDR", value_name = "ADDR")]
    pub listen_addr: Option<SocketAddr>,

    /// Directory holding per-request clones
    #[arg(short = 's', long = "scratch-dir", env = "SCRATCH_DIR", value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Clone timeout in seconds
    #[arg(long = "clone-timeout", env = "CLONE_TIMEOUT_SECS", value_name = "SECS")]
    pub clone_timeout_secs: Option<u64>,

    /// Notification request timeout in seconds
    #[arg(long = "notify-timeout", env = "NOTIFY_TIMEOUT_SECS", value_name = "SECS")]
    pub notify_timeout_secs: Option<u64>,

    /// Link added to notifications ({slug}, {projects_user_id}, {login})
    #[arg(long = "review-url-template", env = "REVIEW_URL_TEMPLATE", value_name = "TEMPLATE")]
    pub review_url_template: Option<String>,

    /// Log level
    #[arg(short = 'l', long = "log-level", env = "LOG_LEVEL", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", env = "LOG_FORMAT", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", env = "LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Also accept local paths, file://, git:// and http:// repository URLs
    #[arg(long = "allow-insecure-transports", env = "ALLOW_INSECURE_TRANSPORTS")]
    pub allow_insecure_transports: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
