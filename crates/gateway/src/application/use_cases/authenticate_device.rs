use std::sync::Arc;
use vizora_core::{DisplayId, OrganizationId};
use vizora_ports::{CredentialError, CredentialIssuer, DisplayReader};

/// Identity established for a device connection
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedDevice {
    pub display_id: DisplayId,
    pub organization_id: OrganizationId,
    pub device_identifier: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    MissingCredential,
    InvalidCredential(CredentialError),
    DisplayNotFound,
    /// Display deactivated, or re-paired with a newer credential
    DisplayUnpaired,
    OrganizationMismatch,
    DirectoryUnavailable(String),
}

impl AuthError {
    /// Machine-readable code sent in `auth:error`
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "AUTH_REQUIRED",
            AuthError::InvalidCredential(CredentialError::Expired) => "TOKEN_EXPIRED",
            AuthError::InvalidCredential(_) => "INVALID_TOKEN",
            AuthError::DisplayNotFound => "DEVICE_NOT_FOUND",
            AuthError::DisplayUnpaired => "DEVICE_UNPAIRED",
            AuthError::OrganizationMismatch => "ORGANIZATION_MISMATCH",
            AuthError::DirectoryUnavailable(_) => "DIRECTORY_UNAVAILABLE",
        }
    }

    /// True when the credential is known to be no longer acceptable, as
    /// opposed to the check itself being impossible right now
    pub fn is_revocation(&self) -> bool {
        !matches!(self, AuthError::DirectoryUnavailable(_))
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Device credential required"),
            AuthError::InvalidCredential(e) => write!(f, "{}", e),
            AuthError::DisplayNotFound => write!(f, "Display not found"),
            AuthError::DisplayUnpaired => write!(f, "Display is no longer paired"),
            AuthError::OrganizationMismatch => {
                write!(f, "Display belongs to a different organization")
            }
            AuthError::DirectoryUnavailable(s) => {
                write!(f, "Display directory unavailable: {}", s)
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Validate a device credential and cross-check it against the directory
///
/// A correctly signed token is not enough: the display must still exist, be
/// active, belong to the token's organization and store this exact token.
pub struct AuthenticateDeviceUseCase<I: CredentialIssuer, D: DisplayReader> {
    issuer: Arc<I>,
    directory: Arc<D>,
}

impl<I: CredentialIssuer, D: DisplayReader> AuthenticateDeviceUseCase<I, D> {
    pub fn new(issuer: Arc<I>, directory: Arc<D>) -> Self {
        Self { issuer, directory }
    }

    pub async fn execute(&self, token: Option<&str>) -> Result<AuthenticatedDevice, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let claims = self
            .issuer
            .validate(token)
            .map_err(AuthError::InvalidCredential)?;

        let display = self
            .directory
            .get(claims.display_id())
            .await
            .map_err(|e| AuthError::DirectoryUnavailable(e.to_string()))?
            .ok_or(AuthError::DisplayNotFound)?;

        if display.organization_id != claims.organization_id {
            return Err(AuthError::OrganizationMismatch);
        }
        if !display.accepts_token(token) {
            return Err(AuthError::DisplayUnpaired);
        }

        Ok(AuthenticatedDevice {
            display_id: display.id,
            organization_id: display.organization_id,
            device_identifier: claims.device_identifier,
            nickname: display.nickname,
        })
    }
}
