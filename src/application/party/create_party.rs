use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::Identity;
use crate::domain::errors::PartyError;
use crate::domain::events::SyncState;
use crate::domain::repositories::{CatalogError, ContentCatalog};
use crate::domain::value_objects::PartyCode;
use crate::infrastructure::services::{DirectoryError, Outbox, PartyDirectory, PartyHandle};

/// Create watch party input
pub struct CreateWatchPartyInput {
    pub content_id: String,
    pub host: Identity,
    pub connection_id: Uuid,
    pub outbox: Arc<Outbox>,
}

/// Create watch party output
pub struct CreateWatchPartyOutput {
    pub party_code: PartyCode,
    pub handle: PartyHandle,
    pub snapshot: SyncState,
}

/// Create watch party use case
pub struct CreateWatchParty<C: ContentCatalog + ?Sized> {
    catalog: Arc<C>,
    directory: Arc<PartyDirectory>,
}

impl<C: ContentCatalog + ?Sized> CreateWatchParty<C> {
    pub fn new(catalog: Arc<C>, directory: Arc<PartyDirectory>) -> Self {
        Self { catalog, directory }
    }

    pub async fn execute(
        &self,
        input: CreateWatchPartyInput,
    ) -> Result<CreateWatchPartyOutput, CreateWatchPartyError> {
        let content_id = input.content_id.trim();
        if content_id.is_empty() {
            return Err(CreateWatchPartyError::Validation("contentId is required".into()));
        }

        let video_id = self
            .catalog
            .resolve_video(content_id)
            .await?
            .ok_or(CreateWatchPartyError::ContentNotFound)?;

        let handle = self.directory.create_party(content_id, &video_id)?;

        // The creator is the first participant and therefore the host
        let snapshot = handle
            .join(input.host, input.connection_id, input.outbox)
            .await?;

        Ok(CreateWatchPartyOutput {
            party_code: handle.code.clone(),
            handle,
            snapshot,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateWatchPartyError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Content not found")]
    ContentNotFound,
    #[error("{0}")]
    CreateFailed(#[from] DirectoryError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Party(#[from] PartyError),
}

impl CreateWatchPartyError {
    pub fn code(&self) -> &'static str {
        match self {
            CreateWatchPartyError::Validation(_) => "InvalidCommand",
            CreateWatchPartyError::ContentNotFound => "ContentNotFound",
            // Catalog outages are transient from the caller's point of view
            CreateWatchPartyError::CreateFailed(_) | CreateWatchPartyError::Catalog(_) => {
                "CreateFailed"
            }
            CreateWatchPartyError::Party(e) => e.code(),
        }
    }
}
