//! Server -> client events
//!
//! Serialized as one JSON object per frame, tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::domain::entities::ParticipantInfo;
use crate::domain::value_objects::{PartyCode, SyncAction, SyncEvent};

/// Full state a client needs to (re)align with the party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub sequence_number: u64,
    pub position: f64,
    pub is_playing: bool,
    pub rate: f64,
    pub video_id: String,
    pub server_timestamp: i64,
    pub host_id: Option<String>,
    pub provisional: bool,
    pub participants: Vec<ParticipantInfo>,
    /// Deviation (seconds) clients tolerate before a hard correction
    pub drift_tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    PartyCreated {
        party_code: PartyCode,
        snapshot: SyncState,
    },
    #[serde(rename_all = "camelCase")]
    PartyJoined {
        party_code: PartyCode,
        snapshot: SyncState,
    },
    #[serde(rename_all = "camelCase")]
    PartyLeft { party_code: PartyCode },
    #[serde(rename_all = "camelCase")]
    PartyEnded { reason: String },
    #[serde(rename_all = "camelCase")]
    UserJoined {
        user: ParticipantInfo,
        participant_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        user_id: String,
        participant_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    UserDisconnected { user_id: String },
    #[serde(rename_all = "camelCase")]
    HostChanged { new_host_id: String },
    #[serde(rename_all = "camelCase")]
    PlaybackUpdate {
        sequence_number: u64,
        action: SyncAction,
        position: f64,
        video_id: String,
        server_timestamp: i64,
        rate: f64,
        is_playing: bool,
        issued_by: String,
    },
    #[serde(rename_all = "camelCase")]
    PlaybackAck {
        sequence_number: u64,
        server_timestamp: i64,
    },
    SyncState(SyncState),
    #[serde(rename_all = "camelCase")]
    NewMessage {
        sender_id: String,
        sender_name: String,
        text: String,
        timestamp: i64,
    },
    #[serde(rename_all = "camelCase")]
    NewReaction {
        sender_id: String,
        emoji: String,
        timestamp: i64,
    },
    Error { code: String, message: String },
}

impl ServerEvent {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Chat and reactions may be shed under backpressure; nothing else may
    pub fn is_critical(&self) -> bool {
        !matches!(
            self,
            ServerEvent::NewMessage { .. } | ServerEvent::NewReaction { .. }
        )
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::PartyCreated { .. } => "party-created",
            ServerEvent::PartyJoined { .. } => "party-joined",
            ServerEvent::PartyLeft { .. } => "party-left",
            ServerEvent::PartyEnded { .. } => "party-ended",
            ServerEvent::UserJoined { .. } => "user-joined",
            ServerEvent::UserLeft { .. } => "user-left",
            ServerEvent::UserDisconnected { .. } => "user-disconnected",
            ServerEvent::HostChanged { .. } => "host-changed",
            ServerEvent::PlaybackUpdate { .. } => "playback-update",
            ServerEvent::PlaybackAck { .. } => "playback-ack",
            ServerEvent::SyncState(_) => "sync-state",
            ServerEvent::NewMessage { .. } => "new-message",
            ServerEvent::NewReaction { .. } => "new-reaction",
            ServerEvent::Error { .. } => "error",
        }
    }
}

impl From<&SyncEvent> for ServerEvent {
    fn from(event: &SyncEvent) -> Self {
        ServerEvent::PlaybackUpdate {
            sequence_number: event.sequence_number,
            action: event.action,
            position: event.position,
            video_id: event.video_id.clone(),
            server_timestamp: event.server_timestamp,
            rate: event.rate,
            is_playing: event.is_playing,
            issued_by: event.issued_by.clone(),
        }
    }
}
