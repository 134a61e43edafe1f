use uuid::Uuid;

use crate::domain::errors::PartyError;
use crate::infrastructure::services::PartyHandle;

/// What to relay
pub enum RelayPayload {
    Message(String),
    Reaction(String),
}

/// Relay input
pub struct RelayInput {
    pub user_id: String,
    pub connection_id: Uuid,
    pub payload: RelayPayload,
}

/// Best-effort chat and reaction fan-out, outside sequence gating
pub struct RelayChat {
    handle: PartyHandle,
}

impl RelayChat {
    pub fn new(handle: PartyHandle) -> Self {
        Self { handle }
    }

    pub async fn execute(&self, input: RelayInput) -> Result<(), PartyError> {
        match input.payload {
            RelayPayload::Message(text) => {
                self.handle
                    .relay_chat(&input.user_id, input.connection_id, text)
                    .await
            }
            RelayPayload::Reaction(emoji) => {
                self.handle
                    .relay_reaction(&input.user_id, input.connection_id, emoji)
                    .await
            }
        }
    }
}
