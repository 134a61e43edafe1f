use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

/// Per-participant presence state
///
/// `Connecting -> Active -> Disconnected -> Removed`; a Disconnected
/// participant may return to Active within its grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Connecting,
    Active,
    Disconnected,
    Removed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Active)
                | (Connecting, Removed)
                | (Active, Disconnected)
                | (Active, Removed)
                | (Disconnected, Active)
                | (Disconnected, Removed)
        )
    }
}

/// Verified identity supplied by the auth service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
}

/// A member of a party
#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: String,
    pub display_name: String,
    pub connection_id: Uuid,
    pub role: Role,
    /// Wall-clock join time (ms)
    pub joined_at: i64,
    pub state: ConnectionState,
    /// Grace deadline while Disconnected
    pub grace_deadline: Option<Instant>,
}

impl Participant {
    pub fn new(identity: &Identity, connection_id: Uuid, role: Role, joined_at: i64) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            display_name: identity.display_name.clone(),
            connection_id,
            role,
            joined_at,
            state: ConnectionState::Connecting,
            grace_deadline: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    /// Move to `next`, returning false if the transition is not allowed
    pub fn transition(&mut self, next: ConnectionState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        if next != ConnectionState::Disconnected {
            self.grace_deadline = None;
        }
        true
    }

    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            joined_at: self.joined_at,
            connection_state: self.state,
        }
    }
}

/// Roster entry as seen on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
    pub joined_at: i64,
    pub connection_state: ConnectionState,
}
