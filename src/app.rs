//! Wiring the pieces together from a configuration.

use crate::alerts::AlertFeed;
use crate::checker::{CheckerService, DeadlineChecker, TickReport};
use crate::config::AppConfig;
use crate::error::Result;
use crate::notifier::{build_notifier, Notifier};
use crate::tasks::{local_now, SqliteTaskStore, TaskStore};
use crate::templates;
use crate::web::{self, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// The store, notifier and checker built from one configuration.
pub struct App {
    config: AppConfig,
    store: Arc<dyn TaskStore + Send + Sync>,
    alerts: Arc<AlertFeed>,
    checker: Arc<DeadlineChecker>,
}

impl App {
    /// Open the database and build the checker with the configured notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let notifier = build_notifier(config.notifier);
        Self::with_notifier(config, notifier)
    }

    /// Like [`App::from_config`], with an explicit notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub fn with_notifier(config: AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn TaskStore + Send + Sync> =
            Arc::new(SqliteTaskStore::new(&config.database_path)?);
        let alerts = Arc::new(AlertFeed::new(config.alert_history));
        let checker = Arc::new(
            DeadlineChecker::new(Arc::clone(&store), notifier, Arc::clone(&alerts))
                .with_notification_timeout(config.notification_timeout_secs),
        );

        Ok(Self { config, store, alerts, checker })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// State for the web handlers.
    #[must_use]
    pub fn web_state(&self) -> AppState {
        AppState::new(Arc::clone(&self.store), Arc::clone(&self.alerts))
    }

    /// The deadline checker.
    #[must_use]
    pub fn checker(&self) -> Arc<DeadlineChecker> {
        Arc::clone(&self.checker)
    }

    /// Run a single deadline check now.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried or updated.
    pub fn check_once(&self) -> Result<TickReport> {
        self.checker.tick(local_now())
    }

    /// Serve the page and run the checker until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if templates fail to load, the address cannot be
    /// bound, or the server fails.
    pub async fn serve(self) -> Result<()> {
        templates::init_templates(self.config.templates_dir.as_deref())?;

        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;

        let service = CheckerService::global();
        if !service.start(self.checker(), self.config.check_interval()) {
            warn!("deadline checker was already running");
        }

        let result = web::serve(listener, self.web_state(), shutdown_signal()).await;
        service.shutdown().await;
        info!("shutdown complete");
        result
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
