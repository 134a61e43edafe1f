//! Connection gateway: per-connection command dispatch
//!
//! A `ConnectionSession` belongs to one authenticated socket. It is attached
//! to at most one party and forwards every effect to that party's actor;
//! errors go back to this connection only.

use std::sync::Arc;

use uuid::Uuid;

use crate::api::dto::ClientCommand;
use crate::application::party::{
    CreateWatchParty, CreateWatchPartyError, CreateWatchPartyInput, EndWatchParty,
    JoinWatchParty, JoinWatchPartyInput, LeaveWatchParty, LeaveWatchPartyInput, RelayChat,
    RelayInput, RelayPayload, RequestSync, SyncPlayback, SyncPlaybackInput,
};
use crate::domain::entities::Identity;
use crate::domain::errors::PartyError;
use crate::domain::events::ServerEvent;
use crate::domain::value_objects::{PartyCode, PlaybackCommand};
use crate::infrastructure::app_state::AppState;
use crate::infrastructure::services::{Outbox, PartyHandle, PushOutcome};

/// Error returned to the issuing connection
#[derive(Debug)]
struct CommandError {
    code: &'static str,
    message: String,
}

impl From<PartyError> for CommandError {
    fn from(e: PartyError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

impl From<CreateWatchPartyError> for CommandError {
    fn from(e: CreateWatchPartyError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

pub struct ConnectionSession {
    state: Arc<AppState>,
    identity: Identity,
    connection_id: Uuid,
    outbox: Arc<Outbox>,
    attached: Option<PartyHandle>,
}

impl ConnectionSession {
    pub fn new(state: Arc<AppState>, identity: Identity, outbox: Arc<Outbox>) -> Self {
        Self {
            state,
            identity,
            connection_id: Uuid::new_v4(),
            outbox,
            attached: None,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn attached_code(&self) -> Option<&PartyCode> {
        self.attached.as_ref().map(|h| &h.code)
    }

    /// Parse and handle one text frame
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientCommand>(text) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                tracing::warn!(connection_id = %self.connection_id, "Invalid message format: {}", e);
                self.send(ServerEvent::error(
                    "InvalidCommand",
                    format!("Invalid message format: {}", e),
                ));
            }
        }
    }

    pub async fn handle(&mut self, command: ClientCommand) {
        let name = command.name();
        tracing::debug!(
            connection_id = %self.connection_id,
            user_id = %self.identity.user_id,
            command = name,
            "Command received"
        );

        if let Err(e) = self.dispatch(command).await {
            tracing::debug!(
                connection_id = %self.connection_id,
                command = name,
                code = e.code,
                "Command rejected: {}",
                e.message
            );
            self.send(ServerEvent::Error {
                code: e.code.to_string(),
                message: e.message,
            });
        }
    }

    async fn dispatch(&mut self, command: ClientCommand) -> Result<(), CommandError> {
        match command {
            ClientCommand::CreateWatchParty { content_id } => {
                self.detach().await;
                let output = CreateWatchParty::new(
                    self.state.catalog.clone(),
                    self.state.directory.clone(),
                )
                .execute(CreateWatchPartyInput {
                    content_id,
                    host: self.identity.clone(),
                    connection_id: self.connection_id,
                    outbox: self.outbox.clone(),
                })
                .await?;

                self.attached = Some(output.handle);
                self.send(ServerEvent::PartyCreated {
                    party_code: output.party_code,
                    snapshot: output.snapshot,
                });
            }
            ClientCommand::JoinWatchParty { party_code } => {
                let code = PartyCode::parse(&party_code)?;

                // Joining the party we are already in just re-sends the snapshot
                if let Some(handle) = self.attached.clone().filter(|h| h.code == code) {
                    if let Ok(snapshot) = handle
                        .request_sync(&self.identity.user_id, self.connection_id)
                        .await
                    {
                        self.send(ServerEvent::PartyJoined {
                            party_code: code,
                            snapshot,
                        });
                        return Ok(());
                    }
                }

                // One party per connection: the previous one is left first
                self.detach().await;

                let output = JoinWatchParty::new(self.state.directory.clone())
                    .execute(JoinWatchPartyInput {
                        party_code,
                        identity: self.identity.clone(),
                        connection_id: self.connection_id,
                        outbox: self.outbox.clone(),
                    })
                    .await?;

                self.attached = Some(output.handle);
                self.send(ServerEvent::PartyJoined {
                    party_code: output.party_code,
                    snapshot: output.snapshot,
                });
            }
            ClientCommand::LeaveWatchParty { party_code } => {
                let code = PartyCode::parse(&party_code)?;
                if self.attached.as_ref().is_some_and(|h| h.code == code) {
                    self.detach().await;
                }
                self.send(ServerEvent::PartyLeft { party_code: code });
            }
            ClientCommand::SyncPlayback {
                party_code,
                action,
                position,
                video_id,
                rate,
            } => {
                let handle = self.attached(&party_code)?;
                let result = SyncPlayback::new(handle)
                    .execute(SyncPlaybackInput {
                        user_id: self.identity.user_id.clone(),
                        connection_id: self.connection_id,
                        command: PlaybackCommand {
                            action,
                            position,
                            video_id,
                            rate,
                        },
                    })
                    .await;
                self.settle(result)?;
            }
            ClientCommand::RequestSync { party_code } => {
                let handle = self.attached(&party_code)?;
                let result = RequestSync::new(handle)
                    .execute(&self.identity.user_id, self.connection_id)
                    .await;
                let snapshot = self.settle(result)?;
                self.send(ServerEvent::SyncState(snapshot));
            }
            ClientCommand::PartyMessage { party_code, text } => {
                self.relay(&party_code, RelayPayload::Message(text)).await?;
            }
            ClientCommand::PartyReaction { party_code, emoji } => {
                self.relay(&party_code, RelayPayload::Reaction(emoji)).await?;
            }
            ClientCommand::EndWatchParty { party_code } => {
                let handle = self.attached(&party_code)?;
                let result = EndWatchParty::new(handle)
                    .execute(&self.identity.user_id, self.connection_id)
                    .await;
                self.settle(result)?;
                self.attached = None;
            }
        }
        Ok(())
    }

    async fn relay(&mut self, party_code: &str, payload: RelayPayload) -> Result<(), CommandError> {
        let handle = self.attached(party_code)?;
        let result = RelayChat::new(handle)
            .execute(RelayInput {
                user_id: self.identity.user_id.clone(),
                connection_id: self.connection_id,
                payload,
            })
            .await;
        self.settle(result)?;
        Ok(())
    }

    /// The attached party, if `party_code` names it
    fn attached(&self, party_code: &str) -> Result<PartyHandle, PartyError> {
        let code = PartyCode::parse(party_code)?;
        match &self.attached {
            Some(handle) if handle.code == code => Ok(handle.clone()),
            _ => Err(PartyError::PartyNotMember),
        }
    }

    /// Forget a party whose actor has gone away
    fn settle<T>(&mut self, result: Result<T, PartyError>) -> Result<T, PartyError> {
        if matches!(result, Err(PartyError::PartyNotFound)) {
            self.attached = None;
        }
        result
    }

    async fn leave(&self, handle: PartyHandle) {
        LeaveWatchParty::new(handle)
            .execute(LeaveWatchPartyInput {
                user_id: self.identity.user_id.clone(),
                connection_id: self.connection_id,
            })
            .await;
    }

    async fn detach(&mut self) {
        if let Some(handle) = self.attached.take() {
            self.leave(handle).await;
        }
    }

    /// Transport is gone: keep the slot for the grace window
    pub async fn on_transport_closed(&mut self) {
        if let Some(handle) = self.attached.take() {
            handle
                .disconnect(&self.identity.user_id, self.connection_id)
                .await;
        }
    }

    fn send(&self, event: ServerEvent) {
        if self.outbox.push(event) == PushOutcome::Overflowed {
            tracing::warn!(connection_id = %self.connection_id, "Outbound buffer overflow on reply");
        }
    }
}
