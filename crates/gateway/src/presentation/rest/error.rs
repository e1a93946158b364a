use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use vizora_ports::PairingError;

use crate::application::{DispatchError, PairingUseCaseError};
use crate::presentation::rest::dto::ErrorResponse;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status,
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "DIRECTORY_UNAVAILABLE",
            message,
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    pub fn invalid_parameter(param: &str, reason: &str) -> Self {
        Self::bad_request(
            "INVALID_PARAMETER",
            format!("Illegal parameter '{}': {}", param, reason),
        )
    }
}

impl From<PairingUseCaseError> for ApiError {
    fn from(e: PairingUseCaseError) -> Self {
        let message = e.to_string();
        match e {
            PairingUseCaseError::InvalidRequest(_) => {
                ApiError::bad_request("INVALID_REQUEST", message)
            }
            PairingUseCaseError::Pairing(PairingError::NotFound) => {
                ApiError::not_found("PAIRING_NOT_FOUND", message)
            }
            PairingUseCaseError::Pairing(PairingError::Expired) => {
                ApiError::new(StatusCode::GONE, "PAIRING_EXPIRED", message)
            }
            PairingUseCaseError::Pairing(PairingError::AlreadyClaimed) => {
                ApiError::new(StatusCode::CONFLICT, "ALREADY_CLAIMED", message)
            }
            PairingUseCaseError::Pairing(PairingError::AlreadyPaired) => {
                ApiError::bad_request("ALREADY_PAIRED", message)
            }
            PairingUseCaseError::Pairing(PairingError::CodeSpaceExhausted { .. }) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "CODE_SPACE_EXHAUSTED", message)
            }
            PairingUseCaseError::Credential(_) => ApiError::internal(message),
            PairingUseCaseError::DirectoryUnavailable(_) => ApiError::unavailable(message),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Forbidden => ApiError::forbidden(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.code, self.message));
        (self.status, body).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
