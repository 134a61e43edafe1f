use uuid::Uuid;

use crate::domain::errors::PartyError;
use crate::infrastructure::services::PartyHandle;

/// End watch party use case (host only)
pub struct EndWatchParty {
    handle: PartyHandle,
}

impl EndWatchParty {
    pub fn new(handle: PartyHandle) -> Self {
        Self { handle }
    }

    pub async fn execute(&self, user_id: &str, connection_id: Uuid) -> Result<(), PartyError> {
        self.handle.end(user_id, connection_id).await
    }
}
