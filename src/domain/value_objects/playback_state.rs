//! PlaybackState - the canonical transport state of a party
//!
//! Positions are seconds into the title. Elapsed time is measured on the
//! monotonic clock; `server_timestamp` is the wall-clock stamp (ms) sent to
//! clients so they can extrapolate on their side.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::domain::errors::PartyError;

/// Highest accepted playback rate
pub const MAX_RATE: f64 = 4.0;

/// Transport action carried by a SyncEvent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Play,
    Pause,
    Seek,
    #[serde(rename = "ratechange")]
    RateChange,
    Heartbeat,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Play => "play",
            SyncAction::Pause => "pause",
            SyncAction::Seek => "seek",
            SyncAction::RateChange => "ratechange",
            SyncAction::Heartbeat => "heartbeat",
        }
    }
}

/// Host-issued transport command, before stamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCommand {
    pub action: SyncAction,
    pub position: f64,
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

impl PlaybackCommand {
    pub fn validate(&self) -> Result<(), PartyError> {
        if !self.position.is_finite() || self.position < 0.0 {
            return Err(PartyError::InvalidCommand(
                "Position must be a non-negative number of seconds".into(),
            ));
        }
        if self.video_id.trim().is_empty() {
            return Err(PartyError::InvalidCommand("videoId is required".into()));
        }
        if let Some(rate) = self.rate {
            if !rate.is_finite() || rate <= 0.0 || rate > MAX_RATE {
                return Err(PartyError::InvalidCommand(format!(
                    "Rate must be in (0, {}]",
                    MAX_RATE
                )));
            }
        } else if self.action == SyncAction::RateChange {
            return Err(PartyError::InvalidCommand("ratechange requires a rate".into()));
        }
        Ok(())
    }
}

/// A stamped, totally ordered playback event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub sequence_number: u64,
    pub action: SyncAction,
    pub position: f64,
    pub video_id: String,
    pub server_timestamp: i64,
    pub issued_by: String,
    pub rate: f64,
    pub is_playing: bool,
}

/// Canonical playback state owned by a party
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub position: f64,
    pub is_playing: bool,
    pub rate: f64,
    pub video_id: String,
    pub last_sequence: u64,
    /// Wall-clock stamp (ms) of the last mutation
    pub server_timestamp: i64,
    /// Monotonic instant of the last mutation
    pub stamped_at: Instant,
    /// Set after host migration until the new host issues a command
    pub provisional: bool,
}

impl PlaybackState {
    pub fn new(video_id: String, now: Instant, wall_ms: i64) -> Self {
        Self {
            position: 0.0,
            is_playing: false,
            rate: 1.0,
            video_id,
            last_sequence: 0,
            server_timestamp: wall_ms,
            stamped_at: now,
            provisional: false,
        }
    }

    /// Authoritative position extrapolated to `now`
    pub fn position_at(&self, now: Instant) -> f64 {
        if !self.is_playing {
            return self.position;
        }
        let elapsed = now.saturating_duration_since(self.stamped_at).as_secs_f64();
        self.position + elapsed * self.rate
    }

    /// Apply a validated host command and stamp the next sequence number
    pub fn apply(
        &mut self,
        command: &PlaybackCommand,
        issued_by: &str,
        now: Instant,
        wall_ms: i64,
    ) -> SyncEvent {
        let current = self.position_at(now);
        let switches_video = command.video_id != self.video_id;

        // Only seek, pause or a new title may move a playing timeline backwards
        let position = match command.action {
            SyncAction::Seek | SyncAction::Pause => command.position,
            _ if switches_video || !self.is_playing => command.position,
            _ => command.position.max(current),
        };

        match command.action {
            SyncAction::Play => self.is_playing = true,
            SyncAction::Pause => self.is_playing = false,
            SyncAction::RateChange => {
                if let Some(rate) = command.rate {
                    self.rate = rate;
                }
            }
            SyncAction::Seek | SyncAction::Heartbeat => {}
        }

        self.position = position;
        self.video_id = command.video_id.clone();
        self.provisional = false;
        self.stamp(command.action, issued_by, now, wall_ms)
    }

    /// Server-originated heartbeat from the extrapolated state
    pub fn heartbeat(&mut self, issued_by: &str, now: Instant, wall_ms: i64) -> SyncEvent {
        self.position = self.position_at(now);
        self.stamp(SyncAction::Heartbeat, issued_by, now, wall_ms)
    }

    fn stamp(&mut self, action: SyncAction, issued_by: &str, now: Instant, wall_ms: i64) -> SyncEvent {
        self.last_sequence += 1;
        self.stamped_at = now;
        // Wall clocks can step backwards; keep stamps non-decreasing
        self.server_timestamp = wall_ms.max(self.server_timestamp);

        SyncEvent {
            sequence_number: self.last_sequence,
            action,
            position: self.position,
            video_id: self.video_id.clone(),
            server_timestamp: self.server_timestamp,
            issued_by: issued_by.to_string(),
            rate: self.rate,
            is_playing: self.is_playing,
        }
    }
}
