use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;
use vizora_core::{DeviceConnection, Playlist};
use vizora_ports::Clock;

use crate::application::OutboundMessage;
use crate::presentation::rest::{ApiError, OrganizationContext, dto::*};

use super::AppState;

fn parse_display_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_parameter("id", "must be a UUID"))
}

async fn dispatch<C: Clock + 'static>(
    state: &AppState<C>,
    raw_id: &str,
    ctx: &OrganizationContext,
    message: OutboundMessage,
) -> Result<(StatusCode, Json<DeliveryResponse>), ApiError> {
    let display_id = parse_display_id(raw_id)?;
    let delivery = state
        .dispatcher()
        .execute(display_id, &ctx.organization_id, message)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(DeliveryResponse { delivery })))
}

/// POST /displays/{id}/push-content
pub async fn push_content<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<String>,
    ctx: OrganizationContext,
    Json(req): Json<PushContentRequest>,
) -> Result<(StatusCode, Json<DeliveryResponse>), ApiError> {
    if req.content_id.trim().is_empty() {
        return Err(ApiError::invalid_parameter("contentId", "must not be empty"));
    }
    let message = OutboundMessage::ContentPush {
        content_id: req.content_id,
        duration: req.duration,
    };
    dispatch(&state, &id, &ctx, message).await
}

/// POST /displays/{id}/playlist
pub async fn push_playlist<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<String>,
    ctx: OrganizationContext,
    Json(req): Json<PushPlaylistRequest>,
) -> Result<(StatusCode, Json<DeliveryResponse>), ApiError> {
    let message = OutboundMessage::PlaylistPush(Playlist {
        playlist_id: req.playlist_id,
        items: req.items,
    });
    dispatch(&state, &id, &ctx, message).await
}

/// POST /displays/{id}/command
pub async fn send_command<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<String>,
    ctx: OrganizationContext,
    Json(req): Json<CommandRequest>,
) -> Result<(StatusCode, Json<DeliveryResponse>), ApiError> {
    if req.command.trim().is_empty() {
        return Err(ApiError::invalid_parameter("command", "must not be empty"));
    }
    let message = OutboundMessage::Command {
        command: req.command,
        args: req.args,
    };
    dispatch(&state, &id, &ctx, message).await
}

/// GET /displays/{id}/connection
pub async fn connection<C: Clock + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path(id): Path<String>,
    ctx: OrganizationContext,
) -> Result<Json<DeviceConnection>, ApiError> {
    let display_id = parse_display_id(&id)?;
    let snapshot = state
        .registry
        .snapshot(display_id)
        .filter(|c| c.organization_id == ctx.organization_id)
        .ok_or_else(|| ApiError::not_found("NOT_CONNECTED", "Display is not connected"))?;

    Ok(Json(snapshot))
}
