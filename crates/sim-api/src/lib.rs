//! Carpark occupancy simulator service: SQLite store, tick executor, background
//! scheduler loop, heartbeat reporting, and the HTTP control API.

pub mod config;
pub mod executor;
pub mod heartbeat;
pub mod persistence;
pub mod scheduler;
mod server;

use std::sync::Arc;

use sim_core::{Clock, NoiseSource, SeededNoise, SimController, SystemClock};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub use config::{ConfigError, SimConfig};
pub use executor::{TickExecutor, TickReport};
pub use heartbeat::{HeartbeatSink, HttpHeartbeat, NoopHeartbeat, RecordingHeartbeat};
pub use persistence::{NewFacility, PersistenceError, SqliteFacilityStore};
pub use scheduler::{spawn_simulation_loop, SharedStore, SimulationHandle, SimulationLoop};
pub use server::{serve_control_api, AppState, ServerError};

/// Opens the store, starts the simulation loop, and serves the control API
/// until Ctrl-C. A store that cannot be opened stops startup before the loop
/// is spawned.
pub async fn serve(config: SimConfig) -> Result<(), ServerError> {
    let store = SqliteFacilityStore::open(&config.db_path)?;
    let store: SharedStore = Arc::new(Mutex::new(store));

    let controller = Arc::new(SimController::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let noise: Box<dyn NoiseSource> = match config.seed {
        Some(seed) => Box::new(SeededNoise::from_seed(seed)),
        None => Box::new(SeededNoise::from_entropy()),
    };
    let heartbeat: Arc<dyn HeartbeatSink> = match &config.heartbeat_url {
        Some(url) => Arc::new(HttpHeartbeat::new(url.clone())),
        None => Arc::new(NoopHeartbeat),
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        db_path = %config.db_path.display(),
        heartbeat = config.heartbeat_url.as_deref().unwrap_or("disabled"),
        "carpark simulation engine starting"
    );

    let handle = spawn_simulation_loop(
        TickExecutor::new(Arc::clone(&clock), noise),
        Arc::clone(&store),
        Arc::clone(&controller),
        heartbeat,
        config.tick_interval,
    );

    let state = AppState::new(controller, store, clock, config.fast_forward_ticks);
    let served = serve_control_api(listener, state, shutdown_signal()).await;

    handle.shutdown().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
