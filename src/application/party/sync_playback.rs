use uuid::Uuid;

use crate::domain::errors::PartyError;
use crate::domain::events::SyncState;
use crate::domain::value_objects::{PlaybackCommand, SyncEvent};
use crate::infrastructure::services::PartyHandle;

/// Sync playback input
pub struct SyncPlaybackInput {
    pub user_id: String,
    pub connection_id: Uuid,
    pub command: PlaybackCommand,
}

/// Host transport command use case
pub struct SyncPlayback {
    handle: PartyHandle,
}

impl SyncPlayback {
    pub fn new(handle: PartyHandle) -> Self {
        Self { handle }
    }

    pub async fn execute(&self, input: SyncPlaybackInput) -> Result<SyncEvent, PartyError> {
        self.handle
            .sync_playback(&input.user_id, input.connection_id, input.command)
            .await
    }
}

/// Reconciliation for late joiners and reconnecting clients
pub struct RequestSync {
    handle: PartyHandle,
}

impl RequestSync {
    pub fn new(handle: PartyHandle) -> Self {
        Self { handle }
    }

    pub async fn execute(&self, user_id: &str, connection_id: Uuid) -> Result<SyncState, PartyError> {
        self.handle.request_sync(user_id, connection_id).await
    }
}
