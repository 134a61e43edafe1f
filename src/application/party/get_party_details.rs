use std::sync::Arc;

use crate::domain::entities::PartySummary;
use crate::domain::errors::PartyError;
use crate::domain::value_objects::PartyCode;
use crate::infrastructure::services::PartyDirectory;

/// Get party details output
pub struct GetPartyDetailsOutput {
    pub summary: PartySummary,
    pub is_member: bool,
    pub is_host: bool,
}

/// Get party details use case
pub struct GetPartyDetails {
    directory: Arc<PartyDirectory>,
}

impl GetPartyDetails {
    pub fn new(directory: Arc<PartyDirectory>) -> Self {
        Self { directory }
    }

    pub async fn execute(
        &self,
        party_code: &str,
        user_id: &str,
    ) -> Result<GetPartyDetailsOutput, PartyError> {
        let code = PartyCode::parse(party_code)?;
        let summary = self.directory.resolve(&code)?.summary().await?;

        let is_member = summary
            .snapshot
            .participants
            .iter()
            .any(|p| p.user_id == user_id);
        let is_host = summary.host_id.as_deref() == Some(user_id);

        Ok(GetPartyDetailsOutput {
            summary,
            is_member,
            is_host,
        })
    }
}
