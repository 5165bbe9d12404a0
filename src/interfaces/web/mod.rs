pub(crate) mod auth;
mod handlers;
mod router;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::info;

use crate::core::config;
use crate::core::discovery;
use crate::core::error::{PacekeeperError, Result};
use crate::core::openclaw::CronGateway;
use crate::core::store::CacheStore;
use crate::core::terminal::{LOOKING_GLASS, print_warn};

/// Minimum spacing between manual refresh passes.
pub(crate) const REFRESH_DEBOUNCE: Duration = Duration::from_secs(10);

pub struct DashboardOptions {
    pub host: String,
    pub port: u16,
    pub token: Option<String>,
    pub config: String,
    pub db_path: PathBuf,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) db_path: PathBuf,
    pub(crate) config: String,
    pub(crate) token: Option<String>,
    pub(crate) last_refresh: Arc<Mutex<Option<Instant>>>,
    pub(crate) gateway: Arc<dyn CronGateway>,
}

impl AppState {
    /// Connections are cheap to open and never shared across requests.
    pub(crate) fn store(&self) -> Result<CacheStore> {
        CacheStore::open(&self.db_path)
    }
}

/// Run the dashboard API until the process is stopped. Performs one
/// discovery pass up front so the first page load has data.
pub async fn serve(gateway: Arc<dyn CronGateway>, options: DashboardOptions) -> Result<()> {
    let state = AppState {
        db_path: options.db_path,
        config: options.config,
        token: options.token,
        last_refresh: Arc::new(Mutex::new(None)),
        gateway,
    };

    println!("{}Refreshing heartbeat data...", LOOKING_GLASS);
    let store = state.store()?;
    let config_path = config::find_config_path(&state.config);
    if let Err(err) = discovery::discover(state.gateway.as_ref(), &store, config_path.as_deref()).await
    {
        print_warn(&format!("Initial discovery failed: {err}"));
    }
    drop(store);

    let addr = format!("{}:{}", options.host, options.port);
    let app = router::build_router(state, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PacekeeperError::Server(format!("failed to bind {addr}: {e}")))?;
    info!("dashboard API listening at http://{addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| PacekeeperError::Server(e.to_string()))?;
    Ok(())
}
