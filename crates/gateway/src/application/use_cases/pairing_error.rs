use vizora_ports::{CredentialError, DirectoryError, PairingError};

/// Failures of the pairing use cases
#[derive(Debug, Clone, PartialEq)]
pub enum PairingUseCaseError {
    InvalidRequest(String),
    Pairing(PairingError),
    Credential(CredentialError),
    DirectoryUnavailable(String),
}

impl From<PairingError> for PairingUseCaseError {
    fn from(e: PairingError) -> Self {
        PairingUseCaseError::Pairing(e)
    }
}

impl From<CredentialError> for PairingUseCaseError {
    fn from(e: CredentialError) -> Self {
        PairingUseCaseError::Credential(e)
    }
}

impl From<DirectoryError> for PairingUseCaseError {
    fn from(e: DirectoryError) -> Self {
        PairingUseCaseError::DirectoryUnavailable(e.to_string())
    }
}

impl std::fmt::Display for PairingUseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairingUseCaseError::InvalidRequest(s) => write!(f, "Invalid request: {}", s),
            PairingUseCaseError::Pairing(e) => write!(f, "{}", e),
            PairingUseCaseError::Credential(e) => write!(f, "Credential error: {}", e),
            PairingUseCaseError::DirectoryUnavailable(s) => {
                write!(f, "Display directory unavailable: {}", s)
            }
        }
    }
}

impl std::error::Error for PairingUseCaseError {}
