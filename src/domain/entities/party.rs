//! Party - the single-writer state machine behind one watch party
//!
//! Every method is synchronous and returns the events it wants delivered;
//! the party actor owns the only instance and performs the fan-out.

use std::time::Duration;

use serde::Serialize;
use smallvec::SmallVec;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::entities::{ConnectionState, Identity, Participant, Role};
use crate::domain::errors::PartyError;
use crate::domain::events::{ServerEvent, SyncState};
use crate::domain::value_objects::{
    Moment, PartyCode, PlaybackCommand, PlaybackState, SyncEvent, SyncSettings,
};

/// Maximum chat message length (chars)
pub const MAX_MESSAGE_CHARS: usize = 500;
/// Maximum reaction length (chars)
pub const MAX_EMOJI_CHARS: usize = 16;
/// Issuer recorded on heartbeats while the host slot is vacant
pub const SERVER_ISSUER: &str = "server";

/// Party lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyStatus {
    Created,
    Active,
    Idle,
    Destroyed,
}

/// Who an outbound event is for; only Active participants ever receive
#[derive(Debug, Clone, PartialEq)]
pub enum Audience {
    All,
    AllExcept(String),
    Only(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Outbound {
    fn new(audience: Audience, event: ServerEvent) -> Self {
        Self { audience, event }
    }
}

#[derive(Debug)]
pub struct JoinOutcome {
    pub snapshot: SyncState,
    /// The participant was Disconnected and got its slot back
    pub resumed: bool,
    /// A previous connection of the same user that no longer belongs here
    pub replaced_connection: Option<Uuid>,
    pub outbound: Vec<Outbound>,
}

#[derive(Debug, Default)]
pub struct ExpireOutcome {
    pub outbound: Vec<Outbound>,
    pub destroy: bool,
}

/// Read-only view for the REST surface
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub party_code: PartyCode,
    pub content_id: String,
    pub host_id: Option<String>,
    pub status: PartyStatus,
    pub capacity: usize,
    pub participant_count: usize,
    pub created_at: i64,
    pub snapshot: SyncState,
}

/// Watch party state
#[derive(Debug)]
pub struct Party {
    pub code: PartyCode,
    pub content_id: String,
    pub host_user_id: Option<String>,
    pub playback: PlaybackState,
    pub created_at: i64,
    pub capacity: usize,
    pub status: PartyStatus,
    participants: SmallVec<[Participant; 8]>,
    idle_deadline: Option<Instant>,
    reconnect_grace: Duration,
    idle_ttl: Duration,
    drift_tolerance: f64,
}

impl Party {
    pub fn new(
        code: PartyCode,
        content_id: String,
        video_id: String,
        settings: &SyncSettings,
        at: Moment,
    ) -> Self {
        Self {
            code,
            content_id,
            host_user_id: None,
            playback: PlaybackState::new(video_id, at.instant, at.wall_ms),
            created_at: at.wall_ms,
            capacity: settings.capacity,
            status: PartyStatus::Created,
            participants: SmallVec::new(),
            // Reclaimed if the founding host never arrives
            idle_deadline: Some(at.instant + settings.idle_party_ttl),
            reconnect_grace: settings.reconnect_grace,
            idle_ttl: settings.idle_party_ttl,
            drift_tolerance: settings.drift_tolerance_secs,
        }
    }

    // ========== Roster queries ==========

    /// Participants holding a slot (Active, Connecting or reconnecting)
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn active_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_active()).count()
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_user_id.as_deref() == Some(user_id)
    }

    /// Connections an audience resolves to
    pub fn recipients(&self, audience: &Audience) -> Vec<Uuid> {
        self.participants
            .iter()
            .filter(|p| p.is_active())
            .filter(|p| match audience {
                Audience::All => true,
                Audience::AllExcept(user_id) => &p.user_id != user_id,
                Audience::Only(user_id) => &p.user_id == user_id,
            })
            .map(|p| p.connection_id)
            .collect()
    }

    /// Earliest pending grace or idle deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.participants
            .iter()
            .filter_map(|p| p.grace_deadline)
            .chain(self.idle_deadline)
            .min()
    }

    pub fn snapshot(&self, at: Moment) -> SyncState {
        SyncState {
            sequence_number: self.playback.last_sequence,
            position: self.playback.position_at(at.instant),
            is_playing: self.playback.is_playing,
            rate: self.playback.rate,
            video_id: self.playback.video_id.clone(),
            server_timestamp: at.wall_ms.max(self.playback.server_timestamp),
            host_id: self.host_user_id.clone(),
            provisional: self.playback.provisional,
            participants: self.participants.iter().map(Participant::info).collect(),
            drift_tolerance: self.drift_tolerance,
        }
    }

    pub fn summary(&self, at: Moment) -> PartySummary {
        PartySummary {
            party_code: self.code.clone(),
            content_id: self.content_id.clone(),
            host_id: self.host_user_id.clone(),
            status: self.status,
            capacity: self.capacity,
            participant_count: self.participant_count(),
            created_at: self.created_at,
            snapshot: self.snapshot(at),
        }
    }

    /// An Active participant speaking on its current connection
    fn member(&self, user_id: &str, connection_id: Uuid) -> Result<&Participant, PartyError> {
        self.participants
            .iter()
            .find(|p| p.user_id == user_id && p.connection_id == connection_id && p.is_active())
            .ok_or(PartyError::PartyNotMember)
    }

    // ========== Presence ==========

    /// Join, resume a reserved slot, or take over from an older connection
    pub fn join(
        &mut self,
        identity: &Identity,
        connection_id: Uuid,
        at: Moment,
    ) -> Result<JoinOutcome, PartyError> {
        let mut outbound = Vec::new();
        let mut resumed = false;
        let mut replaced_connection = None;

        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.user_id == identity.user_id)
        {
            match existing.state {
                ConnectionState::Disconnected => {
                    existing.transition(ConnectionState::Active);
                    resumed = true;
                }
                _ => {
                    if existing.connection_id != connection_id {
                        replaced_connection = Some(existing.connection_id);
                    }
                    existing.transition(ConnectionState::Active);
                }
            }
            existing.connection_id = connection_id;
            existing.display_name = identity.display_name.clone();
        } else {
            if self.participant_count() >= self.capacity {
                return Err(PartyError::PartyFull);
            }
            let mut participant = Participant::new(identity, connection_id, Role::Guest, at.wall_ms);
            participant.transition(ConnectionState::Active);
            self.participants.push(participant);
        }

        if self.host_user_id.is_none() {
            self.promote(&identity.user_id, &mut outbound);
        }

        if let Some(user) = self.participant(&identity.user_id).map(Participant::info) {
            outbound.push(Outbound::new(
                Audience::AllExcept(identity.user_id.clone()),
                ServerEvent::UserJoined {
                    user,
                    participant_count: self.participant_count(),
                },
            ));
        }

        self.idle_deadline = None;
        self.status = PartyStatus::Active;

        Ok(JoinOutcome {
            snapshot: self.snapshot(at),
            resumed,
            replaced_connection,
            outbound,
        })
    }

    /// Explicit leave; a no-op for non-members and superseded connections
    pub fn leave(&mut self, user_id: &str, connection_id: Uuid, at: Moment) -> Vec<Outbound> {
        let Some(index) = self
            .participants
            .iter()
            .position(|p| p.user_id == user_id && p.connection_id == connection_id)
        else {
            return Vec::new();
        };
        self.remove_at(index, at)
    }

    /// Transport dropped: hold the slot for the grace window
    pub fn disconnect(&mut self, user_id: &str, connection_id: Uuid, at: Moment) -> Vec<Outbound> {
        let grace = self.reconnect_grace;
        let Some(participant) = self
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id && p.connection_id == connection_id)
        else {
            return Vec::new();
        };
        if !participant.transition(ConnectionState::Disconnected) {
            return Vec::new();
        }
        participant.grace_deadline = Some(at.instant + grace);

        let outbound = vec![Outbound::new(
            Audience::AllExcept(user_id.to_string()),
            ServerEvent::UserDisconnected {
                user_id: user_id.to_string(),
            },
        )];
        self.refresh_idle(at);
        outbound
    }

    /// Fire every grace and idle deadline that has passed
    pub fn expire(&mut self, at: Moment) -> ExpireOutcome {
        let mut outcome = ExpireOutcome::default();

        while let Some(index) = self
            .participants
            .iter()
            .position(|p| p.grace_deadline.is_some_and(|d| d <= at.instant))
        {
            let outbound = self.remove_at(index, at);
            outcome.outbound.extend(outbound);
        }

        if self.idle_deadline.is_some_and(|d| d <= at.instant) && self.active_count() == 0 {
            self.status = PartyStatus::Destroyed;
            outcome.destroy = true;
        }
        outcome
    }

    fn remove_at(&mut self, index: usize, at: Moment) -> Vec<Outbound> {
        let mut outbound = Vec::new();
        let mut participant = self.participants.remove(index);
        participant.transition(ConnectionState::Removed);

        if self.is_host(&participant.user_id) {
            self.migrate_host(&mut outbound);
        }

        outbound.push(Outbound::new(
            Audience::All,
            ServerEvent::UserLeft {
                user_id: participant.user_id,
                participant_count: self.participant_count(),
            },
        ));
        self.refresh_idle(at);
        outbound
    }

    // ========== Host authority ==========

    /// Hand the host role to the earliest-joined Active participant
    fn migrate_host(&mut self, outbound: &mut Vec<Outbound>) {
        let successor = self
            .participants
            .iter()
            .filter(|p| p.is_active() && !self.is_host(&p.user_id))
            .min_by_key(|p| p.joined_at)
            .map(|p| p.user_id.clone());

        self.host_user_id = None;
        match successor {
            Some(user_id) => self.promote(&user_id, outbound),
            None => {
                for p in self.participants.iter_mut() {
                    p.role = Role::Guest;
                }
            }
        }
    }

    fn promote(&mut self, user_id: &str, outbound: &mut Vec<Outbound>) {
        for p in self.participants.iter_mut() {
            p.role = if p.user_id == user_id {
                Role::Host
            } else {
                Role::Guest
            };
        }
        self.host_user_id = Some(user_id.to_string());

        // The founding host is not a migration
        if self.status != PartyStatus::Created {
            self.playback.provisional = true;
            outbound.push(Outbound::new(
                Audience::All,
                ServerEvent::HostChanged {
                    new_host_id: user_id.to_string(),
                },
            ));
        }
    }

    fn refresh_idle(&mut self, at: Moment) {
        if self.active_count() == 0 {
            if self.idle_deadline.is_none() {
                self.idle_deadline = Some(at.instant + self.idle_ttl);
            }
            self.status = PartyStatus::Idle;
        } else {
            self.idle_deadline = None;
            self.status = PartyStatus::Active;
        }
    }

    // ========== Sync coordination ==========

    pub fn apply_host_command(
        &mut self,
        user_id: &str,
        connection_id: Uuid,
        command: &PlaybackCommand,
        at: Moment,
    ) -> Result<(SyncEvent, Vec<Outbound>), PartyError> {
        self.member(user_id, connection_id)?;
        if !self.is_host(user_id) {
            return Err(PartyError::NotHost);
        }
        command.validate()?;

        let event = self.playback.apply(command, user_id, at.instant, at.wall_ms);
        let outbound = vec![
            Outbound::new(
                Audience::AllExcept(user_id.to_string()),
                ServerEvent::from(&event),
            ),
            Outbound::new(
                Audience::Only(user_id.to_string()),
                ServerEvent::PlaybackAck {
                    sequence_number: event.sequence_number,
                    server_timestamp: event.server_timestamp,
                },
            ),
        ];
        Ok((event, outbound))
    }

    /// Periodic heartbeat; nothing to do without an Active participant
    pub fn heartbeat(&mut self, at: Moment) -> Option<(SyncEvent, Vec<Outbound>)> {
        if self.active_count() == 0 {
            return None;
        }
        let issuer = self
            .host_user_id
            .clone()
            .unwrap_or_else(|| SERVER_ISSUER.to_string());
        let event = self.playback.heartbeat(&issuer, at.instant, at.wall_ms);
        let outbound = vec![Outbound::new(Audience::All, ServerEvent::from(&event))];
        Some((event, outbound))
    }

    pub fn request_sync(
        &self,
        user_id: &str,
        connection_id: Uuid,
        at: Moment,
    ) -> Result<SyncState, PartyError> {
        self.member(user_id, connection_id)?;
        Ok(self.snapshot(at))
    }

    /// Host termination
    pub fn end(
        &mut self,
        user_id: &str,
        connection_id: Uuid,
    ) -> Result<Vec<Outbound>, PartyError> {
        self.member(user_id, connection_id)?;
        if !self.is_host(user_id) {
            return Err(PartyError::NotHost);
        }
        self.status = PartyStatus::Destroyed;
        Ok(vec![Outbound::new(
            Audience::All,
            ServerEvent::PartyEnded {
                reason: "Host ended the party".into(),
            },
        )])
    }

    // ========== Chat & reactions ==========

    pub fn chat(
        &self,
        user_id: &str,
        connection_id: Uuid,
        text: &str,
        at: Moment,
    ) -> Result<Vec<Outbound>, PartyError> {
        let sender = self.member(user_id, connection_id)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(PartyError::InvalidCommand("Message text is required".into()));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(PartyError::InvalidCommand(format!(
                "Message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(vec![Outbound::new(
            Audience::All,
            ServerEvent::NewMessage {
                sender_id: sender.user_id.clone(),
                sender_name: sender.display_name.clone(),
                text: text.to_string(),
                timestamp: at.wall_ms,
            },
        )])
    }

    pub fn react(
        &self,
        user_id: &str,
        connection_id: Uuid,
        emoji: &str,
        at: Moment,
    ) -> Result<Vec<Outbound>, PartyError> {
        let sender = self.member(user_id, connection_id)?;
        let emoji = emoji.trim();
        if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_CHARS {
            return Err(PartyError::InvalidCommand("Invalid reaction".into()));
        }
        Ok(vec![Outbound::new(
            Audience::All,
            ServerEvent::NewReaction {
                sender_id: sender.user_id.clone(),
                emoji: emoji.to_string(),
                timestamp: at.wall_ms,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SyncAction;

    fn identity(user_id: &str) -> Identity {
        Identity {
            user_id: user_id.into(),
            display_name: user_id.to_uppercase(),
        }
    }

    fn party(start: Instant) -> Party {
        Party::new(
            PartyCode::parse("ABC234").unwrap(),
            "content-1".into(),
            "v1".into(),
            &SyncSettings::default(),
            Moment::at(start, 1_000),
        )
    }

    /// Join users at increasing wall times; returns their connection ids
    fn join_all(party: &mut Party, start: Instant, users: &[&str]) -> Vec<Uuid> {
        users
            .iter()
            .enumerate()
            .map(|(i, user)| {
                let conn = Uuid::new_v4();
                party
                    .join(&identity(user), conn, Moment::at(start, 1_000 + i as i64))
                    .unwrap();
                conn
            })
            .collect()
    }

    fn host_changes(outbound: &[Outbound]) -> Vec<String> {
        outbound
            .iter()
            .filter_map(|o| match &o.event {
                ServerEvent::HostChanged { new_host_id } => Some(new_host_id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_first_joiner_is_host_without_host_changed() {
        let start = Instant::now();
        let mut party = party(start);
        let outcome = party
            .join(&identity("alice"), Uuid::new_v4(), Moment::at(start, 1_000))
            .unwrap();
        assert!(party.is_host("alice"));
        assert!(host_changes(&outcome.outbound).is_empty());
        assert_eq!(party.status, PartyStatus::Active);
        assert_eq!(outcome.snapshot.host_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_capacity_rejects_ninth_join() {
        let start = Instant::now();
        let mut party = party(start);
        let users: Vec<String> = (0..8).map(|i| format!("user{}", i)).collect();
        for (i, user) in users.iter().enumerate() {
            party
                .join(&identity(user), Uuid::new_v4(), Moment::at(start, i as i64))
                .unwrap();
            assert_eq!(party.participant_count(), i + 1);
        }
        let result = party.join(&identity("late"), Uuid::new_v4(), Moment::at(start, 99));
        assert_eq!(result.unwrap_err(), PartyError::PartyFull);
        assert_eq!(party.participant_count(), 8);
    }

    #[test]
    fn test_guest_command_rejected_without_mutation() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice", "bob"]);
        let command = PlaybackCommand {
            action: SyncAction::Seek,
            position: 40.0,
            video_id: "v1".into(),
            rate: None,
        };
        let result = party.apply_host_command("bob", conns[1], &command, Moment::at(start, 2_000));
        assert_eq!(result.unwrap_err(), PartyError::NotHost);
        assert_eq!(party.playback.last_sequence, 0);
        assert_eq!(party.playback.position, 0.0);
    }

    #[test]
    fn test_host_command_broadcasts_to_others_and_acks_host() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice", "bob", "carol"]);
        let command = PlaybackCommand {
            action: SyncAction::Seek,
            position: 125.0,
            video_id: "v1".into(),
            rate: None,
        };
        let (event, outbound) = party
            .apply_host_command("alice", conns[0], &command, Moment::at(start, 2_000))
            .unwrap();
        assert_eq!(event.sequence_number, 1);
        assert_eq!(event.position, 125.0);

        let update = &outbound[0];
        let mut recipients = party.recipients(&update.audience);
        recipients.sort();
        let mut expected = vec![conns[1], conns[2]];
        expected.sort();
        assert_eq!(recipients, expected);
        assert_eq!(party.recipients(&outbound[1].audience), vec![conns[0]]);
    }

    #[test]
    fn test_host_grace_expiry_promotes_earliest_active_once() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice", "bob", "carol"]);

        let outbound = party.disconnect("alice", conns[0], Moment::at(start, 2_000));
        assert!(host_changes(&outbound).is_empty());
        assert!(party.is_host("alice"));
        assert_eq!(party.participant_count(), 3);

        // Inside the grace window nothing happens
        let early = party.expire(Moment::at(start + Duration::from_secs(29), 3_000));
        assert!(early.outbound.is_empty());

        let outcome = party.expire(Moment::at(start + Duration::from_secs(31), 4_000));
        assert_eq!(host_changes(&outcome.outbound), vec!["bob".to_string()]);
        assert!(party.is_host("bob"));
        assert!(party.playback.provisional);
        assert_eq!(party.participant_count(), 2);
        assert!(!outcome.destroy);

        let again = party.expire(Moment::at(start + Duration::from_secs(60), 5_000));
        assert!(host_changes(&again.outbound).is_empty());
    }

    #[test]
    fn test_reconnect_within_grace_resumes_slot() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice", "bob"]);
        party.disconnect("bob", conns[1], Moment::at(start, 2_000));

        let new_conn = Uuid::new_v4();
        let outcome = party
            .join(&identity("bob"), new_conn, Moment::at(start + Duration::from_secs(10), 3_000))
            .unwrap();
        assert!(outcome.resumed);
        assert_eq!(party.participant_count(), 2);
        assert_eq!(party.participant("bob").unwrap().joined_at, 1_001);
        assert!(party.next_deadline().is_none());
    }

    #[test]
    fn test_leave_twice_is_noop() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice", "bob", "carol"]);

        let first = party.leave("bob", conns[1], Moment::at(start, 2_000));
        assert_eq!(first.len(), 1);
        assert_eq!(party.participant_count(), 2);

        let second = party.leave("bob", conns[1], Moment::at(start, 2_001));
        assert!(second.is_empty());
        assert_eq!(party.participant_count(), 2);
        assert!(party.is_host("alice"));
    }

    #[test]
    fn test_host_leave_without_active_guests_leaves_vacancy() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice", "bob"]);
        party.disconnect("bob", conns[1], Moment::at(start, 2_000));
        let outbound = party.leave("alice", conns[0], Moment::at(start, 2_001));
        assert!(host_changes(&outbound).is_empty());
        assert_eq!(party.host_user_id, None);
        assert_eq!(party.status, PartyStatus::Idle);

        let outcome = party
            .join(&identity("bob"), Uuid::new_v4(), Moment::at(start, 3_000))
            .unwrap();
        assert_eq!(host_changes(&outcome.outbound), vec!["bob".to_string()]);
        assert!(party.is_host("bob"));
    }

    #[test]
    fn test_idle_party_destroyed_after_ttl() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice"]);
        party.leave("alice", conns[0], Moment::at(start, 2_000));
        assert_eq!(party.status, PartyStatus::Idle);

        let before = party.expire(Moment::at(start + Duration::from_secs(299), 3_000));
        assert!(!before.destroy);
        let after = party.expire(Moment::at(start + Duration::from_secs(300), 3_000));
        assert!(after.destroy);
        assert_eq!(party.status, PartyStatus::Destroyed);
    }

    #[test]
    fn test_superseded_connection_is_not_a_member() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice"]);
        let new_conn = Uuid::new_v4();
        let outcome = party
            .join(&identity("alice"), new_conn, Moment::at(start, 2_000))
            .unwrap();
        assert_eq!(outcome.replaced_connection, Some(conns[0]));
        assert_eq!(
            party.chat("alice", conns[0], "hi", Moment::at(start, 2_001)),
            Err(PartyError::PartyNotMember)
        );
        assert!(party.chat("alice", new_conn, "hi", Moment::at(start, 2_001)).is_ok());
    }

    #[test]
    fn test_chat_validation() {
        let start = Instant::now();
        let mut party = party(start);
        let conns = join_all(&mut party, start, &["alice"]);
        let at = Moment::at(start, 2_000);
        assert!(party.chat("alice", conns[0], "   ", at).is_err());
        assert!(party.chat("alice", conns[0], &"x".repeat(501), at).is_err());
        assert!(party.react("alice", conns[0], "", at).is_err());
        let outbound = party.react("alice", conns[0], "🍿", at).unwrap();
        assert_eq!(outbound[0].audience, Audience::All);
    }

    #[test]
    fn test_heartbeat_requires_active_participant() {
        let start = Instant::now();
        let mut party = party(start);
        assert!(party.heartbeat(Moment::at(start, 1_000)).is_none());
        join_all(&mut party, start, &["alice"]);
        let (event, _) = party.heartbeat(Moment::at(start, 1_500)).unwrap();
        assert_eq!(event.issued_by, "alice");
        assert_eq!(event.sequence_number, 1);
    }

    #[test]
    fn test_snapshot_carries_configured_drift_tolerance() {
        let start = Instant::now();
        let settings = SyncSettings {
            drift_tolerance_secs: 0.75,
            ..SyncSettings::default()
        };
        let mut party = Party::new(
            PartyCode::parse("ABC234").unwrap(),
            "content-1".into(),
            "v1".into(),
            &settings,
            Moment::at(start, 1_000),
        );
        let outcome = party
            .join(&identity("alice"), Uuid::new_v4(), Moment::at(start, 1_000))
            .unwrap();
        assert_eq!(outcome.snapshot.drift_tolerance, 0.75);
    }
}
