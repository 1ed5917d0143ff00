//! Shutdown Coordination
//!
//! Turns process signals into a broadcast that the HTTP server uses to stop
//! accepting connections and drain in-flight requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the application
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request shutdown and wake every subscriber
    pub fn trigger_shutdown(&self) {
        // Release pairs with the Acquire load in is_shutdown_requested()
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested
    ///
    /// Suitable for `axum::serve(..).with_graceful_shutdown(..)`.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown_requested() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Trigger shutdown on SIGINT, SIGTERM or SIGHUP
    ///
    /// A second signal exits the process immediately with status 130.
    pub fn install_signal_handlers(&self) {
        #[cfg(unix)]
        {
            use std::sync::atomic::AtomicUsize;
            use tokio::signal::unix::{signal, SignalKind};

            let signal_count = Arc::new(AtomicUsize::new(0));
            let signals = [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::hangup(),
            ];

            for kind in signals {
                let coordinator = self.clone();
                let sig_ctr = signal_count.clone();

                tokio::spawn(async move {
                    if let Ok(mut sig) = signal(kind) {
                        while sig.recv().await.is_some() {
                            let prev = sig_ctr.fetch_add(1, Ordering::AcqRel);
                            if prev >= 1 {
                                log::warn!("Second shutdown signal received; exiting");
                                std::process::exit(130);
                            }
                            log::info!("Shutdown signal received; draining requests");
                            coordinator.trigger_shutdown();
                        }
                    }
                });
            }
        }

        #[cfg(not(unix))]
        {
            let coordinator = self.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    coordinator.trigger_shutdown();
                }
            });
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
