//! Subscriptions over the server's text frames
//!
//! Frames go in, parsed events and successive view states come out. The
//! transport is whatever produces a `Stream<Item = String>`.

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::client::view_state::{reduce, PartyViewState};
use crate::domain::events::ServerEvent;

/// Parse one text frame
pub fn parse_event(frame: &str) -> Result<ServerEvent, serde_json::Error> {
    serde_json::from_str(frame)
}

/// Adapt a channel of raw frames into a stream
pub fn frames_from_channel(rx: mpsc::Receiver<String>) -> ReceiverStream<String> {
    ReceiverStream::new(rx)
}

/// Parsed server events; malformed frames are logged and skipped
pub fn events<S>(frames: S) -> impl Stream<Item = ServerEvent>
where
    S: Stream<Item = String>,
{
    stream! {
        let mut frames = std::pin::pin!(frames);
        while let Some(frame) = frames.next().await {
            match parse_event(&frame) {
                Ok(event) => yield event,
                Err(e) => tracing::warn!("Skipping unparseable frame: {}", e),
            }
        }
    }
}

/// Local wall clock in milliseconds
pub fn local_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One view state per applied event, starting from `initial`
///
/// Each event is stamped with `local_clock` on arrival.
pub fn view_states<S, C>(
    initial: PartyViewState,
    events: S,
    mut local_clock: C,
) -> impl Stream<Item = PartyViewState>
where
    S: Stream<Item = ServerEvent>,
    C: FnMut() -> i64,
{
    stream! {
        let mut events = std::pin::pin!(events);
        let mut state = initial;
        while let Some(event) = events.next().await {
            state = reduce(state, &event, local_clock());
            yield state.clone();
        }
    }
}
