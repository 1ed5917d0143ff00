//! Process startup
//!
//! Configuration problems are printed to stderr since logging is not set up
//! yet. Everything after logging initialization reports through
//! [`log_error_with_context`].

use super::cli::{Args, FileConfig};
use super::config::{Config, ConfigResult};
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version;
use crate::credentials::{load_key, KeyLoadError};
use crate::fetcher::{RepositoryFetcher, ScratchManager, WorkspaceError};
use crate::notifications::{NotifyError, OutcomeNotifier};
use crate::server::{self, AppState};
use clap::Parser;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::process::ExitCode;

/// Errors that stop the service after logging is running
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Key(#[from] KeyLoadError),

    #[error(transparent)]
    Scratch(#[from] WorkspaceError),

    #[error(transparent)]
    Notifier(#[from] NotifyError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl StartupError {
    fn context(&self) -> &'static str {
        match self {
            StartupError::Key(_) => "Loading SSH key",
            StartupError::Scratch(_) => "Preparing scratch directory",
            StartupError::Notifier(_) => "Creating notification client",
            StartupError::Bind { .. } => "Binding listener",
            StartupError::Serve(_) => "Serving requests",
        }
    }
}

impl ContextualError for StartupError {
    fn is_user_actionable(&self) -> bool {
        match self {
            StartupError::Key(e) => e.is_user_actionable(),
            StartupError::Scratch(e) => e.is_user_actionable(),
            StartupError::Notifier(e) => e.is_user_actionable(),
            StartupError::Bind { .. } => true,
            StartupError::Serve(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StartupError::Key(e) => e.user_message(),
            StartupError::Scratch(e) => e.user_message(),
            StartupError::Notifier(e) => e.user_message(),
            StartupError::Bind { .. } => Some("LISTEN_ADDR is unavailable or already in use"),
            StartupError::Serve(_) => None,
        }
    }
}

/// Binary entry point
pub fn run() -> ExitCode {
    let config = match load_config(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(hint) = e.user_message().filter(|_| e.is_user_actionable()) {
                eprintln!("Hint: {}", hint);
            }
            return ExitCode::FAILURE;
        }
    };

    let use_color = config.color && std::io::stderr().is_terminal();
    if let Err(e) = init_logging(
        config.log_level.as_deref(),
        config.log_format.as_deref(),
        config.log_file.as_deref().and_then(|p| p.to_str()),
        use_color,
    ) {
        eprintln!("Error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("FATAL: failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(start(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error_with_context(&e, e.context());
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: Args) -> ConfigResult<Config> {
    let file = FileConfig::discover(args.config_file.as_deref())?;
    Config::from_sources(args, file)
}

async fn start(config: Config) -> Result<(), StartupError> {
    log::info!("submission-check {} starting", version::describe());
    log::debug!("Configuration: {:?}", config);

    let key = load_key(&config.ssh_key_path)?;
    log::info!(
        "Using {} key {} ({})",
        key.algorithm(),
        key.fingerprint().unwrap_or("without fingerprint"),
        key.encoding()
    );

    let scratch = ScratchManager::new(&config.scratch_dir);
    let purged = scratch.prepare_root()?;
    if purged > 0 {
        log::info!(
            "Removed {} stale entr{} from {}",
            purged,
            if purged == 1 { "y" } else { "ies" },
            scratch.root().display()
        );
    }

    let notifier = OutcomeNotifier::new(
        config.discord_webhook_url.clone(),
        config.review_url_template.clone(),
        config.notify_timeout,
    )?;
    if !notifier.is_enabled() {
        log::warn!("DISCORD_WEBHOOK_URL is not set; outcome notifications are disabled");
    }

    if config.allow_insecure_transports {
        log::warn!("Accepting local, git:// and http:// repository URLs");
    }
    let fetcher =
        RepositoryFetcher::new(config.clone_timeout).with_insecure_transports(config.allow_insecure_transports);

    let state = AppState::new(
        config.webhook_secret.clone(),
        key,
        fetcher,
        scratch,
        notifier,
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.listen_addr,
            source,
        })?;

    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    server::serve(listener, state, shutdown)
        .await
        .map_err(StartupError::Serve)
}
