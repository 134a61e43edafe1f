//! Bounded per-connection output buffer
//!
//! The party actor pushes without ever waiting. When the buffer is full the
//! oldest chat/reaction is shed to make room; if only critical events are
//! queued the connection is closed instead of silently losing one.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::domain::events::ServerEvent;

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// A non-critical event (queued or incoming) was discarded
    DroppedNonCritical,
    /// Buffer full of critical events; the outbox is now closed
    Overflowed,
    Closed,
}

struct OutboxInner {
    queue: VecDeque<ServerEvent>,
    closed: bool,
    dropped: u64,
}

pub struct Outbox {
    inner: Mutex<OutboxInner>,
    notify: Notify,
    capacity: usize,
}

impl Outbox {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(OutboxInner {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
                dropped: 0,
            }),
            notify: Notify::new(),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, OutboxInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, event: ServerEvent) -> PushOutcome {
        let outcome = {
            let mut inner = self.lock();
            if inner.closed {
                return PushOutcome::Closed;
            }

            if inner.queue.len() < self.capacity {
                inner.queue.push_back(event);
                PushOutcome::Queued
            } else if let Some(idx) = inner.queue.iter().position(|e| !e.is_critical()) {
                inner.queue.remove(idx);
                inner.queue.push_back(event);
                inner.dropped += 1;
                PushOutcome::DroppedNonCritical
            } else if !event.is_critical() {
                inner.dropped += 1;
                PushOutcome::DroppedNonCritical
            } else {
                inner.closed = true;
                inner.queue.clear();
                PushOutcome::Overflowed
            }
        };
        self.notify.notify_one();
        outcome
    }

    /// Next event for the writer; `None` once closed and drained
    pub async fn next(&self) -> Option<ServerEvent> {
        loop {
            {
                let mut inner = self.lock();
                if let Some(event) = inner.queue.pop_front() {
                    return Some(event);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Stop accepting events; queued ones are still handed out
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-critical events shed so far
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}
