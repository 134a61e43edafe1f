//! Party actor: one tokio task per party, the only writer of its state
//!
//! Commands arrive on a bounded queue and are applied one at a time, so the
//! playback state, roster and sequence counter need no locks. Grace and idle
//! deadlines plus the heartbeat are driven from the same loop.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::domain::entities::{Identity, Outbound, Party, PartyStatus, PartySummary};
use crate::domain::errors::PartyError;
use crate::domain::events::SyncState;
use crate::domain::value_objects::{Moment, PartyCode, PlaybackCommand, SyncEvent, SyncSettings};
use crate::infrastructure::services::outbox::{Outbox, PushOutcome};
use crate::infrastructure::services::party_directory::{release_code, PartyRegistry};

/// Command queue depth per party
const COMMAND_BUFFER_SIZE: usize = 256;

type Reply<T> = oneshot::Sender<Result<T, PartyError>>;

/// Everything that can mutate or observe a party
pub enum PartyCommand {
    Join {
        identity: Identity,
        connection_id: Uuid,
        outbox: Arc<Outbox>,
        reply: Reply<SyncState>,
    },
    Leave {
        user_id: String,
        connection_id: Uuid,
        reply: oneshot::Sender<()>,
    },
    Disconnect {
        user_id: String,
        connection_id: Uuid,
    },
    Playback {
        user_id: String,
        connection_id: Uuid,
        command: PlaybackCommand,
        reply: Reply<SyncEvent>,
    },
    RequestSync {
        user_id: String,
        connection_id: Uuid,
        reply: Reply<SyncState>,
    },
    Chat {
        user_id: String,
        connection_id: Uuid,
        text: String,
        reply: Reply<()>,
    },
    Reaction {
        user_id: String,
        connection_id: Uuid,
        emoji: String,
        reply: Reply<()>,
    },
    End {
        user_id: String,
        connection_id: Uuid,
        reply: Reply<()>,
    },
    Summary {
        reply: oneshot::Sender<PartySummary>,
    },
}

/// Cloneable address of a running party
#[derive(Clone)]
pub struct PartyHandle {
    pub code: PartyCode,
    /// Distinguishes this actor from a later party reusing the code
    pub actor_id: Uuid,
    tx: mpsc::Sender<PartyCommand>,
}

impl std::fmt::Debug for PartyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartyHandle")
            .field("code", &self.code)
            .field("actor_id", &self.actor_id)
            .finish()
    }
}

impl PartyHandle {
    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> PartyCommand,
    ) -> Result<T, PartyError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| PartyError::PartyNotFound)?;
        rx.await.map_err(|_| PartyError::PartyNotFound)
    }

    pub async fn join(
        &self,
        identity: Identity,
        connection_id: Uuid,
        outbox: Arc<Outbox>,
    ) -> Result<SyncState, PartyError> {
        self.call(|reply| PartyCommand::Join {
            identity,
            connection_id,
            outbox,
            reply,
        })
        .await?
    }

    /// Always accepted; leaving twice or after teardown is a no-op
    pub async fn leave(&self, user_id: &str, connection_id: Uuid) {
        let _ = self
            .call(|reply| PartyCommand::Leave {
                user_id: user_id.to_string(),
                connection_id,
                reply,
            })
            .await;
    }

    pub async fn disconnect(&self, user_id: &str, connection_id: Uuid) {
        let command = PartyCommand::Disconnect {
            user_id: user_id.to_string(),
            connection_id,
        };
        if self.tx.send(command).await.is_err() {
            tracing::debug!(party_code = %self.code, "Disconnect for a party that is gone");
        }
    }

    pub async fn sync_playback(
        &self,
        user_id: &str,
        connection_id: Uuid,
        command: PlaybackCommand,
    ) -> Result<SyncEvent, PartyError> {
        self.call(|reply| PartyCommand::Playback {
            user_id: user_id.to_string(),
            connection_id,
            command,
            reply,
        })
        .await?
    }

    pub async fn request_sync(
        &self,
        user_id: &str,
        connection_id: Uuid,
    ) -> Result<SyncState, PartyError> {
        self.call(|reply| PartyCommand::RequestSync {
            user_id: user_id.to_string(),
            connection_id,
            reply,
        })
        .await?
    }

    pub async fn relay_chat(
        &self,
        user_id: &str,
        connection_id: Uuid,
        text: String,
    ) -> Result<(), PartyError> {
        self.call(|reply| PartyCommand::Chat {
            user_id: user_id.to_string(),
            connection_id,
            text,
            reply,
        })
        .await?
    }

    pub async fn relay_reaction(
        &self,
        user_id: &str,
        connection_id: Uuid,
        emoji: String,
    ) -> Result<(), PartyError> {
        self.call(|reply| PartyCommand::Reaction {
            user_id: user_id.to_string(),
            connection_id,
            emoji,
            reply,
        })
        .await?
    }

    pub async fn end(&self, user_id: &str, connection_id: Uuid) -> Result<(), PartyError> {
        self.call(|reply| PartyCommand::End {
            user_id: user_id.to_string(),
            connection_id,
            reply,
        })
        .await?
    }

    pub async fn summary(&self) -> Result<PartySummary, PartyError> {
        self.call(|reply| PartyCommand::Summary { reply }).await
    }
}

pub struct PartyActor {
    party: Party,
    actor_id: Uuid,
    connections: HashMap<Uuid, Arc<Outbox>>,
    rx: mpsc::Receiver<PartyCommand>,
    registry: PartyRegistry,
    settings: SyncSettings,
}

impl PartyActor {
    /// Spawn the actor task and return its handle
    pub fn spawn(
        code: PartyCode,
        content_id: String,
        video_id: String,
        settings: SyncSettings,
        registry: PartyRegistry,
    ) -> PartyHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let actor_id = Uuid::new_v4();
        let party = Party::new(code.clone(), content_id, video_id, &settings, Moment::now());

        let actor = PartyActor {
            party,
            actor_id,
            connections: HashMap::new(),
            rx,
            registry,
            settings,
        };
        tokio::spawn(actor.run());

        PartyHandle { code, actor_id, tx }
    }

    async fn run(mut self) {
        let period = self.settings.heartbeat_interval;
        let mut heartbeat = time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(party_code = %self.party.code, "Party actor started");

        loop {
            let deadline = self.party.next_deadline();
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = heartbeat.tick() => self.on_heartbeat(),
                _ = wait_until(deadline) => self.on_deadline(),
            }

            if self.party.status == PartyStatus::Destroyed {
                break;
            }
        }

        self.teardown();
    }

    fn handle(&mut self, command: PartyCommand) {
        let at = Moment::now();
        match command {
            PartyCommand::Join {
                identity,
                connection_id,
                outbox,
                reply,
            } => {
                let result = self.party.join(&identity, connection_id, at);
                match result {
                    Ok(outcome) => {
                        if let Some(old) = outcome.replaced_connection {
                            self.connections.remove(&old);
                        }
                        self.connections.insert(connection_id, outbox);
                        tracing::info!(
                            party_code = %self.party.code,
                            user_id = %identity.user_id,
                            connection_id = %connection_id,
                            resumed = outcome.resumed,
                            participants = self.party.participant_count(),
                            "Participant joined"
                        );
                        self.deliver(outcome.outbound);
                        let _ = reply.send(Ok(outcome.snapshot));
                    }
                    Err(e) => {
                        tracing::debug!(party_code = %self.party.code, user_id = %identity.user_id, error = %e, "Join rejected");
                        let _ = reply.send(Err(e));
                    }
                }
            }
            PartyCommand::Leave {
                user_id,
                connection_id,
                reply,
            } => {
                let outbound = self.party.leave(&user_id, connection_id, at);
                if !outbound.is_empty() {
                    self.connections.remove(&connection_id);
                    tracing::info!(party_code = %self.party.code, user_id = %user_id, "Participant left");
                }
                self.deliver(outbound);
                let _ = reply.send(());
            }
            PartyCommand::Disconnect {
                user_id,
                connection_id,
            } => self.disconnect(&user_id, connection_id, at),
            PartyCommand::Playback {
                user_id,
                connection_id,
                command,
                reply,
            } => {
                match self
                    .party
                    .apply_host_command(&user_id, connection_id, &command, at)
                {
                    Ok((event, outbound)) => {
                        tracing::debug!(
                            party_code = %self.party.code,
                            sequence = event.sequence_number,
                            action = event.action.as_str(),
                            position = event.position,
                            "Playback event stamped"
                        );
                        self.deliver(outbound);
                        let _ = reply.send(Ok(event));
                    }
                    Err(e) => {
                        tracing::debug!(party_code = %self.party.code, user_id = %user_id, error = %e, "Playback command rejected");
                        let _ = reply.send(Err(e));
                    }
                }
            }
            PartyCommand::RequestSync {
                user_id,
                connection_id,
                reply,
            } => {
                let _ = reply.send(self.party.request_sync(&user_id, connection_id, at));
            }
            PartyCommand::Chat {
                user_id,
                connection_id,
                text,
                reply,
            } => {
                let result = self.party.chat(&user_id, connection_id, &text, at);
                let _ = reply.send(result.map(|outbound| self.deliver(outbound)));
            }
            PartyCommand::Reaction {
                user_id,
                connection_id,
                emoji,
                reply,
            } => {
                let result = self.party.react(&user_id, connection_id, &emoji, at);
                let _ = reply.send(result.map(|outbound| self.deliver(outbound)));
            }
            PartyCommand::End {
                user_id,
                connection_id,
                reply,
            } => {
                let result = self.party.end(&user_id, connection_id);
                if result.is_ok() {
                    tracing::info!(party_code = %self.party.code, user_id = %user_id, "Host ended the party");
                }
                let _ = reply.send(result.map(|outbound| self.deliver(outbound)));
            }
            PartyCommand::Summary { reply } => {
                let _ = reply.send(self.party.summary(at));
            }
        }
    }

    fn disconnect(&mut self, user_id: &str, connection_id: Uuid, at: Moment) {
        let outbound = self.party.disconnect(user_id, connection_id, at);
        if outbound.is_empty() {
            return;
        }
        self.connections.remove(&connection_id);
        tracing::info!(
            party_code = %self.party.code,
            user_id = %user_id,
            grace_secs = self.settings.reconnect_grace.as_secs(),
            "Participant disconnected, holding slot"
        );
        self.deliver(outbound);
    }

    fn on_heartbeat(&mut self) {
        if let Some((event, outbound)) = self.party.heartbeat(Moment::now()) {
            tracing::trace!(party_code = %self.party.code, sequence = event.sequence_number, "Heartbeat");
            self.deliver(outbound);
        }
    }

    fn on_deadline(&mut self) {
        let host_before = self.party.host_user_id.clone();
        let outcome = self.party.expire(Moment::now());
        if self.party.host_user_id != host_before {
            tracing::info!(
                party_code = %self.party.code,
                previous_host = ?host_before,
                new_host = ?self.party.host_user_id,
                "Host migrated"
            );
        }
        self.deliver(outcome.outbound);
        if outcome.destroy {
            tracing::info!(party_code = %self.party.code, "Idle party expired");
        }
    }

    /// Fan out to each recipient's outbox without waiting on any of them
    fn deliver(&mut self, outbound: Vec<Outbound>) {
        let mut pending: VecDeque<Outbound> = outbound.into();

        while let Some(Outbound { audience, event }) = pending.pop_front() {
            let mut overflowed = Vec::new();
            for connection_id in self.party.recipients(&audience) {
                let Some(outbox) = self.connections.get(&connection_id) else {
                    continue;
                };
                match outbox.push(event.clone()) {
                    PushOutcome::Queued => {}
                    PushOutcome::DroppedNonCritical => {
                        tracing::debug!(connection_id = %connection_id, "Dropped non-critical event for slow consumer");
                    }
                    PushOutcome::Overflowed | PushOutcome::Closed => overflowed.push(connection_id),
                }
            }

            // Persistently overflowing consumers are treated as dropped transports
            for connection_id in overflowed {
                let user_id = self
                    .party
                    .participants()
                    .find(|p| p.connection_id == connection_id)
                    .map(|p| p.user_id.clone());
                if let Some(user_id) = user_id {
                    tracing::warn!(
                        party_code = %self.party.code,
                        user_id = %user_id,
                        "Outbound buffer overflow, disconnecting"
                    );
                    let more = self.party.disconnect(&user_id, connection_id, Moment::now());
                    self.connections.remove(&connection_id);
                    pending.extend(more);
                }
            }
        }
    }

    fn teardown(&mut self) {
        self.party.status = PartyStatus::Destroyed;
        release_code(&self.registry, &self.party.code, self.actor_id);
        self.connections.clear();
        tracing::info!(party_code = %self.party.code, "Party destroyed, code released");
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
