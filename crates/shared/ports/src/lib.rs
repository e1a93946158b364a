//! Vizora Ports
//!
//! Port definitions (traits) for display pairing and the realtime gateway.
//! These define the boundaries between use cases and infrastructure: the
//! pairing store, the credential issuer, and the external display directory.

mod clock;
mod credentials;
mod display_directory;
mod error;
mod pairing_store;

pub use clock::Clock;
pub use credentials::CredentialIssuer;
pub use display_directory::{DisplayDirectory, DisplayReader, DisplayWriter, PairedDisplay};
pub use error::{CredentialError, DirectoryError, DirectoryResult, PairingError, PairingResult};
pub use pairing_store::PairingStore;
