//! The task page.
//!
//! Routes:
//! - `GET /?view=all|completed|due` shows the form, the list and recent alerts
//! - `POST /tasks` creates a task and redirects back, or re-renders with the error
//! - `POST /tasks/{id}/complete` marks a task done and redirects back
//! - `GET /api/tasks?view=...` lists tasks as JSON
//! - `GET /health` reports liveness

mod handlers;
pub mod page;

use crate::alerts::AlertFeed;
use crate::error::Result;
use crate::tasks::TaskStore;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Where tasks live.
    pub store: Arc<dyn TaskStore + Send + Sync>,
    /// Recent checker activity shown on the page.
    pub alerts: Arc<AlertFeed>,
}

impl AppState {
    /// Bundle the store and the alert feed.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore + Send + Sync>, alerts: Arc<AlertFeed>) -> Self {
        Self { store, alerts }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/{id}/complete", post(handlers::complete_task))
        .route("/api/tasks", get(handlers::api_tasks))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the page on `listener` until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "serving task page");
    }
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await?;
    info!("task page stopped");
    Ok(())
}
