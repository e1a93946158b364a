use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vizora_ports::Clock;

use super::{display_handlers, handlers};
use crate::application::{
    AuthenticateDeviceUseCase, CompletePairingUseCase, ConnectionRegistry, DevicePresenceUseCase,
    DispatchUseCase, ListActivePairingsUseCase, PlaybackUseCase, PollPairingStatusUseCase,
    RequestPairingUseCase,
};
use crate::infrastructure::{
    BroadcastEventPublisher, ConfigError, GatewayConfig, JwtCredentialIssuer,
    InMemoryDisplayDirectory, InMemoryPairingStore, StatusWriter, TokenBucketRateLimiter,
};
use crate::presentation::websocket;

pub type Presence<C> =
    DevicePresenceUseCase<C, StatusWriter<InMemoryDisplayDirectory>, BroadcastEventPublisher>;

/// Application state shared across handlers - uses concrete infrastructure types
pub struct AppState<C: Clock> {
    pub config: Arc<GatewayConfig>,
    pub clock: Arc<C>,
    pub pairing_store: Arc<InMemoryPairingStore<C>>,
    pub directory: Arc<InMemoryDisplayDirectory>,
    pub issuer: Arc<JwtCredentialIssuer<C>>,
    pub registry: Arc<ConnectionRegistry>,
    pub status_writer: Arc<StatusWriter<InMemoryDisplayDirectory>>,
    pub event_publisher: Arc<BroadcastEventPublisher>,
    pub rate_limiter: Arc<TokenBucketRateLimiter>,
}

impl<C: Clock + 'static> AppState<C> {
    /// Wire the in-memory infrastructure from a validated configuration
    pub fn from_config(config: GatewayConfig, clock: Arc<C>) -> Result<Self, ConfigError> {
        Self::with_directory(config, clock, Arc::new(InMemoryDisplayDirectory::new()))
    }

    /// Same as [`AppState::from_config`] over an existing display directory
    pub fn with_directory(
        config: GatewayConfig,
        clock: Arc<C>,
        directory: Arc<InMemoryDisplayDirectory>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pairing_store = Arc::new(InMemoryPairingStore::with_code_length(
            Arc::clone(&clock),
            config.pairing.ttl(),
            config.pairing.code_length,
        ));
        let issuer = Arc::new(JwtCredentialIssuer::new(
            config.credentials.signing_key(),
            config.credentials.validity(),
            Arc::clone(&clock),
        ));
        let status_writer = Arc::new(StatusWriter::new(Arc::clone(&directory)));
        let event_publisher = Arc::new(BroadcastEventPublisher::new(config.server.event_capacity));
        let rate_limiter = Arc::new(TokenBucketRateLimiter::new(config.rate_limits.clone()));

        Ok(AppState {
            config: Arc::new(config),
            clock,
            pairing_store,
            directory,
            issuer,
            registry: Arc::new(ConnectionRegistry::new()),
            status_writer,
            event_publisher,
            rate_limiter,
        })
    }

    pub fn request_pairing(
        &self,
    ) -> RequestPairingUseCase<C, InMemoryPairingStore<C>, InMemoryDisplayDirectory> {
        RequestPairingUseCase::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.pairing_store),
            Arc::clone(&self.directory),
            self.config.server.public_url.clone(),
        )
    }

    pub fn pairing_status(&self) -> PollPairingStatusUseCase<C, InMemoryPairingStore<C>> {
        PollPairingStatusUseCase::new(Arc::clone(&self.clock), Arc::clone(&self.pairing_store))
    }

    pub fn complete_pairing(
        &self,
    ) -> CompletePairingUseCase<
        C,
        InMemoryPairingStore<C>,
        InMemoryDisplayDirectory,
        JwtCredentialIssuer<C>,
        BroadcastEventPublisher,
    > {
        CompletePairingUseCase::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.pairing_store),
            Arc::clone(&self.directory),
            Arc::clone(&self.issuer),
            Arc::clone(&self.event_publisher),
        )
    }

    pub fn active_pairings(&self) -> ListActivePairingsUseCase<InMemoryPairingStore<C>> {
        ListActivePairingsUseCase::new(Arc::clone(&self.pairing_store))
    }

    pub fn authenticator(
        &self,
    ) -> AuthenticateDeviceUseCase<JwtCredentialIssuer<C>, InMemoryDisplayDirectory> {
        AuthenticateDeviceUseCase::new(Arc::clone(&self.issuer), Arc::clone(&self.directory))
    }

    pub fn presence(&self) -> Presence<C> {
        DevicePresenceUseCase::new(
            Arc::clone(&self.clock),
            Arc::clone(&self.registry),
            Arc::clone(&self.status_writer),
            Arc::clone(&self.event_publisher),
        )
    }

    pub fn dispatcher(&self) -> DispatchUseCase {
        DispatchUseCase::new(
            Arc::clone(&self.registry),
            self.config.dispatch.send_timeout(),
        )
    }

    pub fn playback(&self) -> PlaybackUseCase<InMemoryDisplayDirectory> {
        PlaybackUseCase::new(Arc::clone(&self.directory))
    }
}

/// Create the REST and WebSocket router
pub fn create_router<C: Clock + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::<C>))
        // Device pairing handshake
        .route(
            "/devices/pairing/request",
            post(handlers::request_pairing::<C>),
        )
        .route(
            "/devices/pairing/status/{code}",
            get(handlers::pairing_status::<C>),
        )
        .route(
            "/devices/pairing/complete",
            post(handlers::complete_pairing::<C>),
        )
        .route(
            "/devices/pairing/active",
            get(handlers::active_pairings::<C>),
        )
        // Pushes to connected displays
        .route(
            "/displays/{id}/push-content",
            post(display_handlers::push_content::<C>),
        )
        .route(
            "/displays/{id}/playlist",
            post(display_handlers::push_playlist::<C>),
        )
        .route(
            "/displays/{id}/command",
            post(display_handlers::send_command::<C>),
        )
        .route(
            "/displays/{id}/connection",
            get(display_handlers::connection::<C>),
        )
        // Realtime
        .route("/ws/device", get(websocket::device_ws_handler::<C>))
        .route("/ws/events", get(websocket::listener_ws_handler::<C>))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
