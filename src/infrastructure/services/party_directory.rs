use std::sync::{Arc, Mutex, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::domain::errors::PartyError;
use crate::domain::value_objects::{PartyCode, SyncSettings};
use crate::infrastructure::services::party_actor::{PartyActor, PartyHandle};

/// Sharded code table shared between the directory and party actors
pub type PartyRegistry = Arc<DashMap<PartyCode, PartyHandle>>;

/// Source of candidate party codes
pub trait CodeSource: Send {
    fn next_code(&mut self) -> PartyCode;
}

/// Uniform codes from any RNG
pub struct RandomCodes<R: RngCore + Send>(pub R);

impl<R: RngCore + Send> CodeSource for RandomCodes<R> {
    fn next_code(&mut self) -> PartyCode {
        PartyCode::generate(&mut self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Could not allocate a party code after {0} attempts")]
    CreateFailed(u32),
}

/// Process-wide registry of active parties
pub struct PartyDirectory {
    parties: PartyRegistry,
    codes: Mutex<Box<dyn CodeSource>>,
    settings: SyncSettings,
}

impl PartyDirectory {
    pub fn new(settings: SyncSettings) -> Self {
        Self::with_code_source(settings, Box::new(RandomCodes(ChaCha20Rng::from_entropy())))
    }

    pub fn with_code_source(settings: SyncSettings, codes: Box<dyn CodeSource>) -> Self {
        Self {
            parties: Arc::new(DashMap::new()),
            codes: Mutex::new(codes),
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    fn next_code(&self) -> PartyCode {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_code()
    }

    /// Allocate a fresh code and start a party actor behind it
    ///
    /// A colliding code is never overwritten; a new one is drawn, up to the
    /// configured number of attempts.
    pub fn create_party(
        &self,
        content_id: &str,
        video_id: &str,
    ) -> Result<PartyHandle, DirectoryError> {
        let attempts = self.settings.code_retry_attempts;
        for attempt in 1..=attempts {
            let code = self.next_code();
            match self.parties.entry(code.clone()) {
                Entry::Occupied(_) => {
                    tracing::debug!(party_code = %code, attempt, "Party code collision, retrying");
                }
                Entry::Vacant(slot) => {
                    let handle = PartyActor::spawn(
                        code.clone(),
                        content_id.to_string(),
                        video_id.to_string(),
                        self.settings.clone(),
                        self.parties.clone(),
                    );
                    slot.insert(handle.clone());
                    tracing::info!(party_code = %code, content_id, "Party created");
                    return Ok(handle);
                }
            }
        }

        tracing::warn!(attempts, "Party code space exhausted");
        Err(DirectoryError::CreateFailed(attempts))
    }

    pub fn resolve(&self, code: &PartyCode) -> Result<PartyHandle, PartyError> {
        self.parties
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or(PartyError::PartyNotFound)
    }

    pub fn count(&self) -> usize {
        self.parties.len()
    }
}

/// Remove `code` only while it still belongs to `actor_id`
pub fn release_code(registry: &PartyRegistry, code: &PartyCode, actor_id: uuid::Uuid) {
    registry.remove_if(code, |_, current| current.actor_id == actor_id);
}
