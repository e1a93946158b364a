use thiserror::Error;

/// Pairing store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    #[error("Pairing code not found")]
    NotFound,

    #[error("Pairing code has expired")]
    Expired,

    #[error("Pairing code was already claimed")]
    AlreadyClaimed,

    #[error("Device is already paired; unpair it first")]
    AlreadyPaired,

    #[error("Unable to generate a unique pairing code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
}

pub type PairingResult<T> = std::result::Result<T, PairingError>;

/// Device credential validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Malformed credential: {0}")]
    Malformed(String),

    #[error("Credential signature is invalid")]
    SignatureInvalid,

    #[error("Credential has expired")]
    Expired,

    #[error("Credential is not a device credential")]
    WrongType,

    #[error("Credential could not be signed: {0}")]
    Signing(String),
}

/// External display persistence failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Display not found")]
    NotFound,

    #[error("Display directory unavailable: {0}")]
    Unavailable(String),
}

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;
