pub mod ports;
pub mod registry;
pub mod use_cases;

pub use ports::{
    ConnectionRateLimiter, EventPublisher, MessageRateLimiter, RateLimitConfig, RateLimitResult,
    StatusSink, Topic,
};
pub use registry::{
    ConnectionHandle, ConnectionRegistry, DeliveryFailure, ExpiredConnection, OutboundMessage,
    TouchOutcome,
};
pub use use_cases::{
    // Pairing
    ActivePairing,
    // Device sessions
    AuthError,
    AuthenticateDeviceUseCase,
    AuthenticatedDevice,
    CompletePairingCommand,
    CompletePairingResult,
    CompletePairingUseCase,
    // Dispatch
    Delivery,
    DevicePresenceUseCase,
    DispatchError,
    DispatchUseCase,
    HeartbeatReport,
    ListActivePairingsUseCase,
    PairingStatusView,
    PairingUseCaseError,
    PlaybackUseCase,
    PollPairingStatusUseCase,
    RequestPairingCommand,
    RequestPairingResult,
    RequestPairingUseCase,
};
