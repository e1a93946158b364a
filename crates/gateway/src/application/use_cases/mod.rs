mod authenticate_device;
mod complete_pairing;
mod device_presence;
mod dispatch;
mod list_pairings;
mod pairing_error;
mod pairing_status;
mod playback;
mod request_pairing;

pub use authenticate_device::{AuthError, AuthenticateDeviceUseCase, AuthenticatedDevice};
pub use complete_pairing::{
    CompletePairingCommand, CompletePairingResult, CompletePairingUseCase,
};
pub use device_presence::{DevicePresenceUseCase, HeartbeatReport};
pub use dispatch::{Delivery, DispatchError, DispatchUseCase};
pub use list_pairings::{ActivePairing, ListActivePairingsUseCase};
pub use pairing_error::PairingUseCaseError;
pub use pairing_status::{PairingStatusView, PollPairingStatusUseCase};
pub use playback::PlaybackUseCase;
pub use request_pairing::{RequestPairingCommand, RequestPairingResult, RequestPairingUseCase};
