use std::sync::Arc;

use crate::domain::repositories::ContentCatalog;
use crate::domain::value_objects::SyncSettings;
use crate::infrastructure::auth::JwtService;
use crate::infrastructure::services::{HttpContentCatalog, PartyDirectory, PassthroughCatalog};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// JWT service for verifying auth-service tokens
    pub jwt_service: Arc<JwtService>,

    /// Session directory: party code -> party actor
    pub directory: Arc<PartyDirectory>,

    /// Content catalog collaborator
    pub catalog: Arc<dyn ContentCatalog>,

    /// Timing and sizing knobs
    pub settings: SyncSettings,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = SyncSettings::from_env();
        settings
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid sync settings: {}", e))?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "watchparty-secret-key-change-in-production".to_string());

        let catalog: Arc<dyn ContentCatalog> = match std::env::var("CATALOG_URL") {
            Ok(url) => {
                tracing::info!("Resolving content through catalog at {}", url);
                Arc::new(HttpContentCatalog::new(url)?)
            }
            Err(_) => {
                tracing::info!("CATALOG_URL not set - content ids are used as video ids");
                Arc::new(PassthroughCatalog)
            }
        };

        Ok(Self::with_parts(jwt_secret, settings, catalog))
    }

    /// Assemble state from explicit parts
    pub fn with_parts(
        jwt_secret: String,
        settings: SyncSettings,
        catalog: Arc<dyn ContentCatalog>,
    ) -> Self {
        tracing::debug!(?settings, "Sync settings");
        Self {
            jwt_service: Arc::new(JwtService::new(jwt_secret)),
            directory: Arc::new(PartyDirectory::new(settings.clone())),
            catalog,
            settings,
        }
    }
}
