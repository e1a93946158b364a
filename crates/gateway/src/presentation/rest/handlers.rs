use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;
use vizora_core::PairingCode;
use vizora_ports::{Clock, PairingError};

use crate::application::{
    CompletePairingCommand, EventPublisher, PairingUseCaseError, RequestPairingCommand,
};
use crate::presentation::rest::{ApiError, OrganizationContext, dto::*};

use super::AppState;

/// A code that cannot exist was never issued
fn parse_code(raw: &str) -> Result<PairingCode, ApiError> {
    PairingCode::parse(raw)
        .map_err(|_| PairingUseCaseError::Pairing(PairingError::NotFound).into())
}

/// GET /health
pub async fn health<C: Clock>(State(state): State<Arc<AppState<C>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connected_devices: state.registry.len(),
        dashboard_listeners: state.event_publisher.subscriber_count(),
    })
}

/// POST /devices/pairing/request
pub async fn request_pairing<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Json(req): Json<RequestPairingRequest>,
) -> Result<(StatusCode, Json<RequestPairingResponse>), ApiError> {
    let result = state
        .request_pairing()
        .execute(RequestPairingCommand {
            device_identifier: req.device_identifier,
            nickname: req.nickname,
            metadata: req.metadata.unwrap_or(serde_json::Value::Null),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestPairingResponse {
            code: result.session.code.to_string(),
            expires_at: result.session.expires_at,
            expires_in_seconds: result.expires_in_secs,
            pairing_url: result.pairing_url,
        }),
    ))
}

/// GET /devices/pairing/status/{code}
pub async fn pairing_status<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(code): Path<String>,
) -> Result<Json<PairingStatusResponse>, ApiError> {
    let code = parse_code(&code)?;
    let view = state.pairing_status().execute(&code).await?;

    Ok(Json(PairingStatusResponse {
        status: view.status,
        device_token: view.device_token,
        display_id: view.display_id,
        organization_id: view.organization_id,
        expires_at: Some(view.expires_at),
    }))
}

/// POST /devices/pairing/complete
pub async fn complete_pairing<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    ctx: OrganizationContext,
    Json(req): Json<CompletePairingRequest>,
) -> Result<Json<CompletePairingResponse>, ApiError> {
    let code = parse_code(&req.code)?;

    let result = state
        .complete_pairing()
        .execute(CompletePairingCommand {
            code,
            organization_id: ctx.organization_id,
            user_id: ctx.user_id,
            nickname: req.nickname,
        })
        .await?;

    info!(display_id = %result.display.id, "Pairing completed via API");

    Ok(Json(CompletePairingResponse {
        display: result.display.into(),
        device_token: result.device_token,
    }))
}

/// GET /devices/pairing/active
pub async fn active_pairings<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    _ctx: OrganizationContext,
) -> Json<Vec<ActivePairingResponse>> {
    let pairings = state.active_pairings().execute().await;
    Json(pairings.into_iter().map(Into::into).collect())
}
