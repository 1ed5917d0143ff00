//! HTTP front end
//!
//! `POST /webhook` runs the submission pipeline, `GET /health` answers
//! liveness checks. Serving stops accepting connections when the shutdown
//! coordinator fires and waits for in-flight requests to finish.

pub mod handler;
pub mod request_id;
pub mod response;
pub mod state;

pub use handler::{handle_webhook, health, SECRET_HEADER};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use response::{ProcessedResponse, RequestError, SUCCESS_MESSAGE, VIOLATION_MESSAGE};
pub use state::AppState;

use crate::core::shutdown::ShutdownCoordinator;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve until shutdown is requested
pub async fn serve(listener: TcpListener, state: AppState, shutdown: ShutdownCoordinator) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on {}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    log::info!("Server stopped");
    Ok(())
}
