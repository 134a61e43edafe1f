//! PartyViewState - what a client knows about its party
//!
//! Built by folding server events through [`reduce`]. The reducer is pure:
//! the caller passes the local receipt time in, and nothing here touches the
//! media engine.

use std::collections::VecDeque;
use std::time::Duration;

use crate::client::clock::ClockSync;
use crate::client::drift::DriftCorrector;
use crate::domain::entities::{ConnectionState, ParticipantInfo, Role};
use crate::domain::events::{ServerEvent, SyncState};
use crate::domain::value_objects::{PartyCode, SyncAction};

/// Recent chat lines kept per party
pub const CHAT_HISTORY: usize = 200;

/// Admits sync events strictly newer than the last one applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceGate {
    last_applied: Option<u64>,
}

impl SequenceGate {
    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Record `sequence` if it is newer; false means the event is stale
    pub fn admit(&mut self, sequence: u64) -> bool {
        match self.last_applied {
            Some(last) if sequence <= last => false,
            _ => {
                self.last_applied = Some(sequence);
                true
            }
        }
    }

    /// Snapshots carry the current sequence, so an equal one is not stale
    fn admit_snapshot(&mut self, sequence: u64) -> bool {
        match self.last_applied {
            Some(last) if sequence < last => false,
            _ => {
                self.last_applied = Some(sequence);
                true
            }
        }
    }
}

/// Authoritative playback as last reported by the server
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackTarget {
    pub sequence_number: u64,
    pub action: Option<SyncAction>,
    pub position: f64,
    pub is_playing: bool,
    pub rate: f64,
    pub video_id: String,
    /// Server wall-clock stamp (ms) the position was taken at
    pub server_timestamp: i64,
    /// Local clock (ms) when the event arrived
    pub received_at_ms: i64,
}

impl PlaybackTarget {
    /// Position extrapolated to `local_now_ms`
    ///
    /// Elapsed time runs from the server stamp once the clock offset is
    /// known, otherwise from local receipt. The local clock is only ever
    /// used for deltas.
    pub fn position_at(&self, clock: &ClockSync, local_now_ms: i64) -> f64 {
        if !self.is_playing {
            return self.position;
        }
        let elapsed_ms = match clock.server_now(local_now_ms) {
            Some(server_now_ms) => server_now_ms - self.server_timestamp,
            None => local_now_ms - self.received_at_ms,
        }
        .max(0);
        self.position + (elapsed_ms as f64 / 1000.0) * self.rate
    }

    fn from_snapshot(snapshot: &SyncState, received_at_ms: i64) -> Self {
        Self {
            sequence_number: snapshot.sequence_number,
            action: None,
            position: snapshot.position,
            is_playing: snapshot.is_playing,
            rate: snapshot.rate,
            video_id: snapshot.video_id.clone(),
            server_timestamp: snapshot.server_timestamp,
            received_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveReaction {
    pub sender_id: String,
    pub emoji: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewError {
    pub code: String,
    pub message: String,
}

/// Client-side view of one watch party
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyViewState {
    pub party_code: Option<PartyCode>,
    pub participants: Vec<ParticipantInfo>,
    pub host_id: Option<String>,
    /// Host was promoted by migration and has not issued a command yet
    pub provisional: bool,
    pub playback: Option<PlaybackTarget>,
    pub gate: SequenceGate,
    /// Last sequence the server acknowledged for our own host command
    pub last_ack: Option<u64>,
    pub chat: VecDeque<ChatLine>,
    pub reactions: Vec<LiveReaction>,
    pub last_error: Option<ViewError>,
    /// Set once the party is over, with the server's reason
    pub ended: Option<String>,
    /// Correction threshold announced by the server (seconds)
    pub drift_tolerance: Option<f64>,
}

impl PartyViewState {
    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id.as_deref() == Some(user_id)
    }

    pub fn in_party(&self) -> bool {
        self.party_code.is_some() && self.ended.is_none()
    }

    pub fn active_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.connection_state == ConnectionState::Active)
            .count()
    }

    /// Corrector using the party's tolerance, or the default before one is known
    pub fn drift_corrector(&self) -> DriftCorrector {
        self.drift_tolerance
            .map(DriftCorrector::new)
            .unwrap_or_default()
    }

    fn load_snapshot(&mut self, snapshot: &SyncState, received_at_ms: i64) {
        self.participants = snapshot.participants.clone();
        self.host_id = snapshot.host_id.clone();
        self.provisional = snapshot.provisional;
        self.drift_tolerance = Some(snapshot.drift_tolerance);
        if self.gate.admit_snapshot(snapshot.sequence_number) {
            self.playback = Some(PlaybackTarget::from_snapshot(snapshot, received_at_ms));
        }
    }

    fn set_host(&mut self, new_host_id: &str) {
        for p in self.participants.iter_mut() {
            p.role = if p.user_id == new_host_id {
                Role::Host
            } else {
                Role::Guest
            };
        }
        self.host_id = Some(new_host_id.to_string());
    }
}

/// Fold one server event, received at local time `received_at_ms`, into the view
pub fn reduce(
    mut state: PartyViewState,
    event: &ServerEvent,
    received_at_ms: i64,
) -> PartyViewState {
    match event {
        ServerEvent::PartyCreated {
            party_code,
            snapshot,
        }
        | ServerEvent::PartyJoined {
            party_code,
            snapshot,
        } => {
            // Sequence numbers are per party; a different party starts over
            if state.party_code.as_ref() != Some(party_code) || state.ended.is_some() {
                state = PartyViewState {
                    party_code: Some(party_code.clone()),
                    ..PartyViewState::default()
                };
            }
            state.load_snapshot(snapshot, received_at_ms);
        }
        ServerEvent::SyncState(snapshot) => {
            if state.party_code.is_some() {
                state.load_snapshot(snapshot, received_at_ms);
            }
        }
        ServerEvent::PartyLeft { .. } => {
            state = PartyViewState::default();
        }
        ServerEvent::PartyEnded { reason } => {
            state.ended = Some(reason.clone());
        }
        ServerEvent::UserJoined { user, .. } => {
            match state
                .participants
                .iter_mut()
                .find(|p| p.user_id == user.user_id)
            {
                Some(existing) => *existing = user.clone(),
                None => state.participants.push(user.clone()),
            }
        }
        ServerEvent::UserLeft { user_id, .. } => {
            state.participants.retain(|p| &p.user_id != user_id);
        }
        ServerEvent::UserDisconnected { user_id } => {
            if let Some(p) = state
                .participants
                .iter_mut()
                .find(|p| &p.user_id == user_id)
            {
                p.connection_state = ConnectionState::Disconnected;
            }
        }
        ServerEvent::HostChanged { new_host_id } => {
            state.set_host(new_host_id);
            state.provisional = true;
        }
        ServerEvent::PlaybackUpdate {
            sequence_number,
            action,
            position,
            video_id,
            server_timestamp,
            rate,
            is_playing,
            ..
        } => {
            if state.gate.admit(*sequence_number) {
                if *action != SyncAction::Heartbeat {
                    state.provisional = false;
                }
                state.playback = Some(PlaybackTarget {
                    sequence_number: *sequence_number,
                    action: Some(*action),
                    position: *position,
                    is_playing: *is_playing,
                    rate: *rate,
                    video_id: video_id.clone(),
                    server_timestamp: *server_timestamp,
                    received_at_ms,
                });
            }
        }
        ServerEvent::PlaybackAck {
            sequence_number, ..
        } => {
            // Our own command is the newest state; anything older is stale
            state.gate.admit(*sequence_number);
            state.last_ack = Some(*sequence_number);
            state.provisional = false;
        }
        ServerEvent::NewMessage {
            sender_id,
            sender_name,
            text,
            timestamp,
        } => {
            if state.chat.len() == CHAT_HISTORY {
                state.chat.pop_front();
            }
            state.chat.push_back(ChatLine {
                sender_id: sender_id.clone(),
                sender_name: sender_name.clone(),
                text: text.clone(),
                timestamp: *timestamp,
            });
        }
        ServerEvent::NewReaction {
            sender_id,
            emoji,
            timestamp,
        } => {
            state.reactions.push(LiveReaction {
                sender_id: sender_id.clone(),
                emoji: emoji.clone(),
                timestamp: *timestamp,
            });
        }
        ServerEvent::Error { code, message } => {
            state.last_error = Some(ViewError {
                code: code.clone(),
                message: message.clone(),
            });
        }
    }
    state
}

/// Drop reactions older than `ttl` as of `now_ms`
pub fn prune_reactions(state: &mut PartyViewState, now_ms: i64, ttl: Duration) {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    state
        .reactions
        .retain(|r| now_ms.saturating_sub(r.timestamp) < ttl_ms);
}
