//! Connection gateway tests
//!
//! Each session writes into an outbox the test drains directly, standing in
//! for the socket writer task.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use watchparty_backend::api::dto::ClientCommand;
use watchparty_backend::api::gateway::ConnectionSession;
use watchparty_backend::api::AppState;
use watchparty_backend::client::{reduce, PartyViewState};
use watchparty_backend::domain::entities::{Identity, Role};
use watchparty_backend::domain::events::ServerEvent;
use watchparty_backend::domain::repositories::{CatalogError, ContentCatalog};
use watchparty_backend::domain::value_objects::{
    PartyCode, PlaybackCommand, SyncAction, SyncSettings,
};
use watchparty_backend::infrastructure::services::{Outbox, PassthroughCatalog};

/// Knows a single title
struct OneTitleCatalog;

#[async_trait]
impl ContentCatalog for OneTitleCatalog {
    async fn resolve_video(&self, content_id: &str) -> Result<Option<String>, CatalogError> {
        Ok((content_id == "movie-1").then(|| "video-1".to_string()))
    }
}

struct Client {
    session: ConnectionSession,
    outbox: Arc<Outbox>,
}

impl Client {
    fn connect(state: &Arc<AppState>, user_id: &str) -> Self {
        let outbox = Outbox::new(64);
        let identity = Identity {
            user_id: user_id.to_string(),
            display_name: format!("User {}", user_id),
        };
        Self {
            session: ConnectionSession::new(state.clone(), identity, outbox.clone()),
            outbox,
        }
    }

    async fn send(&mut self, command: serde_json::Value) {
        self.session.handle_text(&command.to_string()).await;
    }

    async fn drain(&self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while !self.outbox.is_empty() {
            if let Some(event) = self.outbox.next().await {
                events.push(event);
            }
        }
        events
    }

    /// Fold everything queued so far into `view`
    async fn fold_into(&self, view: PartyViewState) -> PartyViewState {
        self.drain()
            .await
            .iter()
            .fold(view, |view, event| reduce(view, event, 0))
    }

    async fn last(&self) -> ServerEvent {
        self.drain().await.pop().expect("an event")
    }

    async fn last_error_code(&self) -> String {
        match self.last().await {
            ServerEvent::Error { code, .. } => code,
            other => panic!("expected an error, got {:?}", other),
        }
    }
}

fn app_state() -> Arc<AppState> {
    Arc::new(AppState::with_parts(
        "test-secret".to_string(),
        SyncSettings::default(),
        Arc::new(PassthroughCatalog),
    ))
}

/// Host creates a party, guest joins it
async fn party_of_two(state: &Arc<AppState>) -> (Client, Client, PartyCode) {
    let mut host = Client::connect(state, "host");
    host.send(json!({"type": "create-watch-party", "contentId": "movie-1"}))
        .await;
    let code = match host.last().await {
        ServerEvent::PartyCreated {
            party_code,
            snapshot,
        } => {
            assert_eq!(snapshot.host_id.as_deref(), Some("host"));
            assert_eq!(snapshot.video_id, "movie-1");
            party_code
        }
        other => panic!("expected party-created, got {:?}", other),
    };

    let mut guest = Client::connect(state, "guest");
    // Codes are case-insensitive on input
    guest
        .send(json!({"type": "join-watch-party", "partyCode": code.as_str().to_lowercase()}))
        .await;
    match guest.last().await {
        ServerEvent::PartyJoined { snapshot, .. } => {
            assert_eq!(snapshot.participants.len(), 2);
            let me = snapshot
                .participants
                .iter()
                .find(|p| p.user_id == "guest")
                .unwrap();
            assert_eq!(me.role, Role::Guest);
        }
        other => panic!("expected party-joined, got {:?}", other),
    }

    (host, guest, code)
}

#[tokio::test]
async fn test_host_playback_reaches_guest_and_is_acked() {
    let state = app_state();
    let (mut host, guest, code) = party_of_two(&state).await;
    host.drain().await;

    host.session
        .handle(ClientCommand::sync_playback(
            code.as_str(),
            PlaybackCommand {
                action: SyncAction::Seek,
                position: 125.0,
                video_id: "movie-1".into(),
                rate: None,
            },
        ))
        .await;

    match guest.last().await {
        ServerEvent::PlaybackUpdate {
            sequence_number,
            action,
            position,
            issued_by,
            ..
        } => {
            assert_eq!(sequence_number, 1);
            assert_eq!(action, SyncAction::Seek);
            assert_eq!(position, 125.0);
            assert_eq!(issued_by, "host");
        }
        other => panic!("expected playback-update, got {:?}", other),
    }
    assert!(matches!(
        host.last().await,
        ServerEvent::PlaybackAck {
            sequence_number: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_guest_playback_is_rejected() {
    let state = app_state();
    let (host, mut guest, code) = party_of_two(&state).await;
    host.drain().await;

    guest
        .send(json!({
            "type": "sync-playback",
            "partyCode": code.as_str(),
            "action": "play",
            "position": 3.0,
            "videoId": "movie-1"
        }))
        .await;

    assert_eq!(guest.last_error_code().await, "NotHost");
    assert!(host.drain().await.is_empty());
}

#[tokio::test]
async fn test_malformed_guest_playback_is_not_host() {
    let state = app_state();
    let (host, mut guest, code) = party_of_two(&state).await;
    host.drain().await;

    // Authority is checked before the command itself
    guest
        .send(json!({
            "type": "sync-playback",
            "partyCode": code.as_str(),
            "action": "seek",
            "position": -1.0,
            "videoId": "movie-1"
        }))
        .await;

    assert_eq!(guest.last_error_code().await, "NotHost");
    assert!(host.drain().await.is_empty());
}

#[tokio::test]
async fn test_invalid_playback_is_rejected() {
    let state = app_state();
    let (mut host, _guest, code) = party_of_two(&state).await;
    host.drain().await;

    host.send(json!({
        "type": "sync-playback",
        "partyCode": code.as_str(),
        "action": "ratechange",
        "position": 3.0,
        "videoId": "movie-1",
        "rate": 9.0
    }))
    .await;
    assert_eq!(host.last_error_code().await, "InvalidCommand");
}

#[tokio::test]
async fn test_chat_and_reactions_reach_everyone() {
    let state = app_state();
    let (host, mut guest, code) = party_of_two(&state).await;
    host.drain().await;

    guest
        .send(json!({"type": "party-message", "partyCode": code.as_str(), "text": " hello "}))
        .await;
    guest
        .send(json!({"type": "party-reaction", "partyCode": code.as_str(), "emoji": "🔥"}))
        .await;

    for client in [&host, &guest] {
        let events = client.drain().await;
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::NewMessage { sender_id, text, .. } if sender_id == "guest" && text == "hello"
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::NewReaction { emoji, .. } if emoji == "🔥")));
    }

    let long = "x".repeat(501);
    guest
        .send(json!({"type": "party-message", "partyCode": code.as_str(), "text": long}))
        .await;
    assert_eq!(guest.last_error_code().await, "InvalidCommand");
}

#[tokio::test]
async fn test_join_errors() {
    let state = app_state();
    let mut client = Client::connect(&state, "lonely");

    client
        .send(json!({"type": "join-watch-party", "partyCode": "ZZZZZZ"}))
        .await;
    assert_eq!(client.last_error_code().await, "PartyNotFound");

    client
        .send(json!({"type": "join-watch-party", "partyCode": "no!"}))
        .await;
    assert_eq!(client.last_error_code().await, "InvalidCode");

    // Joining is never a way to create a party
    assert_eq!(state.directory.count(), 0);
}

#[tokio::test]
async fn test_commands_for_other_parties_are_refused() {
    let state = app_state();
    let (_host, mut guest, _code) = party_of_two(&state).await;

    guest
        .send(json!({"type": "request-sync", "partyCode": "ZZZZZZ"}))
        .await;
    assert_eq!(guest.last_error_code().await, "PartyNotMember");
}

#[tokio::test]
async fn test_malformed_frames_get_an_error() {
    let state = app_state();
    let mut client = Client::connect(&state, "user");

    client.session.handle_text("{not json").await;
    assert_eq!(client.last_error_code().await, "InvalidCommand");

    client.send(json!({"type": "dance"})).await;
    assert_eq!(client.last_error_code().await, "InvalidCommand");
}

#[tokio::test]
async fn test_request_sync_returns_snapshot() {
    let state = app_state();
    let (_host, mut guest, code) = party_of_two(&state).await;

    guest
        .send(json!({"type": "request-sync", "partyCode": code.as_str()}))
        .await;
    match guest.last().await {
        ServerEvent::SyncState(snapshot) => {
            assert_eq!(snapshot.host_id.as_deref(), Some("host"));
            assert!(!snapshot.is_playing);
        }
        other => panic!("expected sync-state, got {:?}", other),
    }
}

#[tokio::test]
async fn test_leave_is_acknowledged_and_idempotent() {
    let state = app_state();
    let (host, mut guest, code) = party_of_two(&state).await;
    host.drain().await;

    let leave = json!({"type": "leave-watch-party", "partyCode": code.as_str()});
    guest.send(leave.clone()).await;
    guest.send(leave).await;

    let events = guest.drain().await;
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| matches!(e, ServerEvent::PartyLeft { .. })));
    assert_eq!(guest.session.attached_code(), None);

    let to_host = host.drain().await;
    assert_eq!(
        to_host
            .iter()
            .filter(|e| matches!(e, ServerEvent::UserLeft { user_id, .. } if user_id == "guest"))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_transport_close_holds_the_slot() {
    let state = app_state();
    let (host, mut guest, code) = party_of_two(&state).await;
    host.drain().await;

    guest.session.on_transport_closed().await;

    // Disconnect is fire-and-forget; a round trip orders it
    let handle = state.directory.resolve(&code).unwrap();
    let summary = handle.summary().await.unwrap();
    assert_eq!(summary.participant_count, 2);
    assert_eq!(
        host.drain().await,
        vec![ServerEvent::UserDisconnected {
            user_id: "guest".into()
        }]
    );
}

#[tokio::test]
async fn test_switching_parties_leaves_the_previous_one() {
    let state = app_state();
    let (first_host, mut guest, first) = party_of_two(&state).await;
    first_host.drain().await;

    let mut other_host = Client::connect(&state, "other");
    other_host
        .send(json!({"type": "create-watch-party", "contentId": "movie-2"}))
        .await;
    let second = match other_host.last().await {
        ServerEvent::PartyCreated { party_code, .. } => party_code,
        other => panic!("expected party-created, got {:?}", other),
    };

    guest
        .send(json!({"type": "join-watch-party", "partyCode": second.as_str()}))
        .await;
    assert_eq!(guest.session.attached_code(), Some(&second));
    assert!(first_host
        .drain()
        .await
        .iter()
        .any(|e| matches!(e, ServerEvent::UserLeft { user_id, .. } if user_id == "guest")));

    let summary = state.directory.resolve(&first).unwrap().summary().await.unwrap();
    assert_eq!(summary.participant_count, 1);
}

#[tokio::test]
async fn test_end_party_notifies_guests() {
    let state = app_state();
    let (mut host, guest, code) = party_of_two(&state).await;

    host.send(json!({"type": "end-watch-party", "partyCode": code.as_str()}))
        .await;

    assert!(guest
        .drain()
        .await
        .iter()
        .any(|e| matches!(e, ServerEvent::PartyEnded { .. })));
    assert_eq!(host.session.attached_code(), None);
}

#[tokio::test]
async fn test_unknown_content_is_rejected() {
    let state = Arc::new(AppState::with_parts(
        "test-secret".to_string(),
        SyncSettings::default(),
        Arc::new(OneTitleCatalog),
    ));
    let mut client = Client::connect(&state, "host");

    client
        .send(json!({"type": "create-watch-party", "contentId": "missing"}))
        .await;
    assert_eq!(client.last_error_code().await, "ContentNotFound");

    client
        .send(json!({"type": "create-watch-party", "contentId": "movie-1"}))
        .await;
    match client.last().await {
        ServerEvent::PartyCreated { snapshot, .. } => assert_eq!(snapshot.video_id, "video-1"),
        other => panic!("expected party-created, got {:?}", other),
    }
}

#[tokio::test]
async fn test_guests_converge_on_latest_seek_and_drop_stale_updates() {
    let state = app_state();
    let (mut host, first, code) = party_of_two(&state).await;
    let mut second = Client::connect(&state, "guest2");
    second
        .send(json!({"type": "join-watch-party", "partyCode": code.as_str()}))
        .await;

    // The first guest's join snapshot was consumed while setting up
    let first_view = PartyViewState {
        party_code: Some(code.clone()),
        ..PartyViewState::default()
    };
    let first_view = first.fold_into(first_view).await;
    let second_view = second.fold_into(PartyViewState::default()).await;
    assert_eq!(second_view.participants.len(), 3);

    let steps = [
        ("play", 0.0),
        ("pause", 12.0),
        ("seek", 40.0),
        ("play", 40.0),
        ("pause", 55.0),
        ("play", 55.0),
    ];
    for (action, position) in steps {
        host.send(json!({
            "type": "sync-playback",
            "partyCode": code.as_str(),
            "action": action,
            "position": position,
            "videoId": "movie-1"
        }))
        .await;
    }
    let first_view = first.fold_into(first_view).await;
    let second_view = second.fold_into(second_view).await;
    for view in [&first_view, &second_view] {
        assert_eq!(view.playback.as_ref().unwrap().sequence_number, 6);
    }

    host.send(json!({
        "type": "sync-playback",
        "partyCode": code.as_str(),
        "action": "seek",
        "position": 125.0,
        "videoId": "movie-1"
    }))
    .await;
    assert!(matches!(
        host.last().await,
        ServerEvent::PlaybackAck {
            sequence_number: 7,
            ..
        }
    ));

    let stale = ServerEvent::PlaybackUpdate {
        sequence_number: 5,
        action: SyncAction::Pause,
        position: 55.0,
        video_id: "movie-1".into(),
        server_timestamp: 0,
        rate: 1.0,
        is_playing: false,
        issued_by: "host".into(),
    };
    for (guest, view) in [(&first, first_view), (&second, second_view)] {
        let view = guest.fold_into(view).await;
        let view = reduce(view, &stale, 0);
        let target = view.playback.unwrap();
        assert_eq!(target.sequence_number, 7);
        assert_eq!(target.action, Some(SyncAction::Seek));
        assert_eq!(target.position, 125.0);
        assert!(target.is_playing);
    }
}
