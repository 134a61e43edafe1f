use uuid::Uuid;

use crate::infrastructure::services::PartyHandle;

/// Leave watch party input
pub struct LeaveWatchPartyInput {
    pub user_id: String,
    pub connection_id: Uuid,
}

/// Leave watch party use case
///
/// Always succeeds; repeated leaves and leaves after teardown are no-ops.
pub struct LeaveWatchParty {
    handle: PartyHandle,
}

impl LeaveWatchParty {
    pub fn new(handle: PartyHandle) -> Self {
        Self { handle }
    }

    pub async fn execute(&self, input: LeaveWatchPartyInput) {
        self.handle
            .leave(&input.user_id, input.connection_id)
            .await;
    }
}
