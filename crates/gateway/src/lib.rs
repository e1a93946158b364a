//! Vizora Display Gateway
//!
//! Pairing service and realtime gateway for digital-signage displays.
//! Provides:
//! - The pairing handshake: a display shows a short code, a dashboard user
//!   claims it, the display receives a long-lived device credential
//! - Device WebSocket sessions with heartbeats and liveness tracking
//! - Content, playlist and command pushes to connected displays
//! - Dashboard event streams (`display:paired`, `device:status`)
//!
//! ## Architecture
//!
//! ```text
//!   Device (player)              Dashboard
//!     │  REST pairing              │  REST claim / push
//!     │  /ws/device                │  /ws/events
//!  ┌──▼────────────────────────────▼──┐
//!  │ presentation (axum)              │
//!  ├──────────────────────────────────┤
//!  │ application: use cases, registry │
//!  ├──────────────────────────────────┤
//!  │ infrastructure: pairing store,   │
//!  │ credentials, status writer, ...  │
//!  └──────────────┬───────────────────┘
//!                 │ DisplayDirectory port
//!          external persistence
//! ```

pub mod application;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use error::GatewayError;
pub use infrastructure::{ConfigError, GatewayConfig};
pub use presentation::{ApiError, AppState, create_router};

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;
use vizora_clock::SystemClock;
use vizora_ports::Clock;

use crate::infrastructure::tasks;

/// The gateway server: shared state plus its background workers
pub struct DisplayGateway<C: Clock + 'static> {
    state: Arc<AppState<C>>,
}

impl<C: Clock + 'static> DisplayGateway<C> {
    /// Create a gateway with the given clock
    pub fn with_clock(config: GatewayConfig, clock: Arc<C>) -> Result<Self, GatewayError> {
        let state = AppState::from_config(config, clock)?;
        Ok(DisplayGateway {
            state: Arc::new(state),
        })
    }

    pub fn state(&self) -> &Arc<AppState<C>> {
        &self.state
    }

    /// Create the REST + WebSocket router
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state))
    }

    /// Start the liveness sweep, status flush and the two purge loops
    pub fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let config = &self.state.config;
        vec![
            tasks::spawn_liveness_sweep(
                self.state.presence(),
                config.heartbeat.sweep_interval(),
                config.heartbeat.timeout(),
            ),
            tasks::spawn_status_flush(
                (*self.state.status_writer).clone(),
                config.heartbeat.flush_interval(),
            ),
            tasks::spawn_pairing_purge(
                Arc::clone(&self.state.clock),
                Arc::clone(&self.state.pairing_store),
                config.pairing.purge_interval(),
                config.pairing.retention(),
            ),
            tasks::spawn_rate_limit_prune(
                Arc::clone(&self.state.rate_limiter),
                config.pairing.purge_interval(),
            ),
        ]
    }

    /// Run the gateway until Ctrl-C
    pub async fn run(self) -> Result<(), GatewayError> {
        let addr = format!(
            "{}:{}",
            self.state.config.server.host, self.state.config.server.port
        );
        let listener = TcpListener::bind(&addr).await?;
        info!("Display gateway listening on {}", addr);

        let workers = self.spawn_background_tasks();
        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        for worker in workers {
            worker.abort();
        }
        let report = self.state.status_writer.flush().await;
        info!(
            written = report.written,
            failed = report.failed,
            "Flushed pending status updates on shutdown"
        );
        Ok(())
    }
}

impl DisplayGateway<SystemClock> {
    /// Create a gateway on wall-clock time
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }
}

/// Serve `router` on an already bound listener, exposing peer addresses
/// to handlers
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown requested");
}
