use axum::{extract::FromRequestParts, http::request::Parts};
use vizora_core::OrganizationId;

use super::ApiError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const USER_HEADER: &str = "x-user-id";

/// Caller identity established by the dashboard's authentication layer
///
/// The dashboard authenticates users upstream and forwards the active
/// organization in `X-Organization-Id` (and the user in `X-User-Id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationContext {
    pub organization_id: OrganizationId,
    pub user_id: Option<String>,
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for OrganizationContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id = header_value(parts, ORGANIZATION_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Organization context required"))?;

        Ok(OrganizationContext {
            organization_id,
            user_id: header_value(parts, USER_HEADER),
        })
    }
}
