use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{PlaybackCommand, SyncAction};

/// Client -> server commands, one JSON object per frame tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    CreateWatchParty { content_id: String },
    #[serde(rename_all = "camelCase")]
    JoinWatchParty { party_code: String },
    #[serde(rename_all = "camelCase")]
    LeaveWatchParty { party_code: String },
    #[serde(rename_all = "camelCase")]
    SyncPlayback {
        party_code: String,
        action: SyncAction,
        position: f64,
        video_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rate: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    RequestSync { party_code: String },
    #[serde(rename_all = "camelCase")]
    PartyMessage { party_code: String, text: String },
    #[serde(rename_all = "camelCase")]
    PartyReaction { party_code: String, emoji: String },
    #[serde(rename_all = "camelCase")]
    EndWatchParty { party_code: String },
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::CreateWatchParty { .. } => "create-watch-party",
            ClientCommand::JoinWatchParty { .. } => "join-watch-party",
            ClientCommand::LeaveWatchParty { .. } => "leave-watch-party",
            ClientCommand::SyncPlayback { .. } => "sync-playback",
            ClientCommand::RequestSync { .. } => "request-sync",
            ClientCommand::PartyMessage { .. } => "party-message",
            ClientCommand::PartyReaction { .. } => "party-reaction",
            ClientCommand::EndWatchParty { .. } => "end-watch-party",
        }
    }

    /// Build a `sync-playback` command from a playback command
    pub fn sync_playback(party_code: &str, command: PlaybackCommand) -> Self {
        ClientCommand::SyncPlayback {
            party_code: party_code.to_string(),
            action: command.action,
            position: command.position,
            video_id: command.video_id,
            rate: command.rate,
        }
    }
}

/// Error body for REST routes
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
