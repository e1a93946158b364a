use serde::{Deserialize, Serialize};
use vizora_core::{
    ConnectionStatus, DeviceMetrics, DisplayId, PlaybackReport, Playlist, Timestamp,
};

use crate::application::{HeartbeatReport, OutboundMessage};

/// Frame sent by a device
///
/// Frames look like `{"event": "heartbeat", "data": {...}}`; `data` may be
/// omitted when the event carries nothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum DeviceRequest {
    #[serde(rename = "heartbeat", rename_all = "camelCase")]
    Heartbeat {
        #[serde(default)]
        id: Option<String>,
        /// Device clock, unix milliseconds
        #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
        timestamp: Option<Timestamp>,
        #[serde(default)]
        content_id: Option<String>,
        #[serde(default)]
        metrics: Option<DeviceMetrics>,
        #[serde(default)]
        status: Option<ConnectionStatus>,
    },
    #[serde(rename = "content:impression", rename_all = "camelCase")]
    Impression {
        content_id: String,
        #[serde(default)]
        playlist_id: Option<String>,
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        completion_percentage: Option<f64>,
        #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
        timestamp: Option<Timestamp>,
    },
    #[serde(rename = "content:error", rename_all = "camelCase")]
    ContentError {
        #[serde(default)]
        content_id: Option<String>,
        error_type: String,
        #[serde(default)]
        error_message: Option<String>,
        #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
        timestamp: Option<Timestamp>,
    },
    #[serde(rename = "playlist:request")]
    PlaylistRequest {
        #[serde(default)]
        id: Option<String>,
    },
}

impl DeviceRequest {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let mut frame: serde_json::Value = serde_json::from_str(text)?;
        if let Some(obj) = frame.as_object_mut() {
            obj.entry("data")
                .or_insert_with(|| serde_json::Value::Object(Default::default()));
        }
        serde_json::from_value(frame)
    }

    /// Correlation id echoed back in acks and errors
    pub fn id(&self) -> Option<&str> {
        match self {
            DeviceRequest::Heartbeat { id, .. } | DeviceRequest::PlaylistRequest { id } => {
                id.as_deref()
            }
            _ => None,
        }
    }

    pub fn heartbeat_report(&self) -> Option<HeartbeatReport> {
        match self {
            DeviceRequest::Heartbeat {
                timestamp,
                content_id,
                metrics,
                status,
                ..
            } => Some(HeartbeatReport {
                timestamp: *timestamp,
                status: *status,
                metrics: metrics.clone(),
                content_id: content_id.clone(),
            }),
            _ => None,
        }
    }

    /// Playback telemetry carried by the frame, stamped `now` when the
    /// device sent no timestamp
    pub fn playback_report(&self, now: Timestamp) -> Option<PlaybackReport> {
        match self {
            DeviceRequest::Impression {
                content_id,
                playlist_id,
                duration,
                completion_percentage,
                timestamp,
            } => Some(PlaybackReport::Impression {
                content_id: content_id.clone(),
                playlist_id: playlist_id.clone(),
                duration: *duration,
                completion_percentage: *completion_percentage,
                at: timestamp.unwrap_or(now),
            }),
            DeviceRequest::ContentError {
                content_id,
                error_type,
                error_message,
                timestamp,
            } => Some(PlaybackReport::Error {
                content_id: content_id.clone(),
                error_type: error_type.clone(),
                error_message: error_message.clone(),
                at: timestamp.unwrap_or(now),
            }),
            _ => None,
        }
    }
}

/// Frame sent to a device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum DeviceEvent {
    /// First frame after a successful handshake
    #[serde(rename = "config", rename_all = "camelCase")]
    Config {
        heartbeat_interval_ms: u64,
        missed_heartbeat_limit: u32,
        cache_size_bytes: u64,
        auto_update: bool,
        display_id: DisplayId,
        server_time: i64,
    },
    #[serde(rename = "ack", rename_all = "camelCase")]
    Ack {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        success: bool,
        next_heartbeat_in_ms: u64,
        timestamp: i64,
    },
    #[serde(rename = "content:push", rename_all = "camelCase")]
    ContentPush {
        content_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u32>,
    },
    #[serde(rename = "playlist:push")]
    PlaylistPush(Playlist),
    /// Reply to `playlist:request`; `playlist` is null when none is assigned
    #[serde(rename = "playlist", rename_all = "camelCase")]
    PlaylistState {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        playlist: Option<Playlist>,
    },
    #[serde(rename = "command")]
    Command {
        command: String,
        args: serde_json::Value,
    },
    #[serde(rename = "auth:error")]
    AuthError { code: String, message: String },
    #[serde(rename = "error")]
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        code: String,
        message: String,
    },
}

impl DeviceEvent {
    pub fn error(id: Option<&str>, code: &str, message: impl Into<String>) -> Self {
        DeviceEvent::Error {
            id: id.map(str::to_string),
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn auth_error(code: &str, message: impl Into<String>) -> Self {
        DeviceEvent::AuthError {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<OutboundMessage> for DeviceEvent {
    fn from(message: OutboundMessage) -> Self {
        match message {
            OutboundMessage::ContentPush {
                content_id,
                duration,
            } => DeviceEvent::ContentPush {
                content_id,
                duration,
            },
            OutboundMessage::PlaylistPush(playlist) => DeviceEvent::PlaylistPush(playlist),
            OutboundMessage::Command { command, args } => DeviceEvent::Command { command, args },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_heartbeat() {
        let req = DeviceRequest::parse(
            r#"{"event":"heartbeat","data":{"id":"hb-1","timestamp":1735732800000,"contentId":"c-9","status":"idle","metrics":{"cpuUsage":12.5}}}"#,
        )
        .unwrap();

        assert_eq!(req.id(), Some("hb-1"));
        let report = req.heartbeat_report().unwrap();
        assert_eq!(
            report.timestamp,
            Some(chrono::Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(report.status, Some(ConnectionStatus::Idle));
        assert_eq!(report.content_id.as_deref(), Some("c-9"));
        assert_eq!(report.metrics.unwrap().cpu_usage, Some(12.5));
    }

    #[test]
    fn test_parse_without_data() {
        assert_eq!(
            DeviceRequest::parse(r#"{"event":"playlist:request"}"#).unwrap(),
            DeviceRequest::PlaylistRequest { id: None }
        );
        assert!(matches!(
            DeviceRequest::parse(r#"{"event":"heartbeat"}"#).unwrap(),
            DeviceRequest::Heartbeat { timestamp: None, .. }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_events() {
        assert!(DeviceRequest::parse(r#"{"event":"reboot","data":{}}"#).is_err());
        assert!(DeviceRequest::parse("not json").is_err());
        assert!(DeviceRequest::parse(r#"{"event":"content:impression","data":{}}"#).is_err());
    }

    #[test]
    fn test_impression_defaults_to_receive_time() {
        let now = chrono::Utc::now();
        let req = DeviceRequest::parse(
            r#"{"event":"content:impression","data":{"contentId":"c-1","duration":12.5}}"#,
        )
        .unwrap();

        match req.playback_report(now).unwrap() {
            PlaybackReport::Impression {
                content_id,
                duration,
                at,
                ..
            } => {
                assert_eq!(content_id, "c-1");
                assert_eq!(duration, Some(12.5));
                assert_eq!(at, now);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_event_wire_shape() {
        let ack = DeviceEvent::Ack {
            id: Some("hb-1".into()),
            success: true,
            next_heartbeat_in_ms: 15000,
            timestamp: 1,
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({
                "event": "ack",
                "data": {"id": "hb-1", "success": true, "nextHeartbeatInMs": 15000, "timestamp": 1}
            })
        );

        let push: DeviceEvent = OutboundMessage::ContentPush {
            content_id: "c-42".into(),
            duration: None,
        }
        .into();
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({"event": "content:push", "data": {"contentId": "c-42"}})
        );

        let none = DeviceEvent::PlaylistState {
            id: None,
            playlist: None,
        };
        assert_eq!(
            serde_json::to_value(&none).unwrap(),
            json!({"event": "playlist", "data": {"playlist": null}})
        );
    }
}
