use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::Identity;
use crate::domain::errors::PartyError;
use crate::domain::events::SyncState;
use crate::domain::value_objects::PartyCode;
use crate::infrastructure::services::{Outbox, PartyDirectory, PartyHandle};

/// Join watch party input
pub struct JoinWatchPartyInput {
    pub party_code: String,
    pub identity: Identity,
    pub connection_id: Uuid,
    pub outbox: Arc<Outbox>,
}

/// Join watch party output
pub struct JoinWatchPartyOutput {
    pub party_code: PartyCode,
    pub handle: PartyHandle,
    pub snapshot: SyncState,
}

/// Join watch party use case
///
/// Unknown codes are rejected; parties are never created on demand.
pub struct JoinWatchParty {
    directory: Arc<PartyDirectory>,
}

impl JoinWatchParty {
    pub fn new(directory: Arc<PartyDirectory>) -> Self {
        Self { directory }
    }

    pub async fn execute(
        &self,
        input: JoinWatchPartyInput,
    ) -> Result<JoinWatchPartyOutput, PartyError> {
        let party_code = PartyCode::parse(&input.party_code)?;
        let handle = self.directory.resolve(&party_code)?;

        let snapshot = handle
            .join(input.identity, input.connection_id, input.outbox)
            .await?;

        Ok(JoinWatchPartyOutput {
            party_code,
            handle,
            snapshot,
        })
    }
}
