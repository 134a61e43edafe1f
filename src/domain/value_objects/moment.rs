use tokio::time::Instant;

/// A point in time on both clocks the party cares about
#[derive(Debug, Clone, Copy)]
pub struct Moment {
    /// Monotonic time, used for elapsed-time math and deadlines
    pub instant: Instant,
    /// Wall-clock milliseconds, used for wire stamps
    pub wall_ms: i64,
}

impl Moment {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn at(instant: Instant, wall_ms: i64) -> Self {
        Self { instant, wall_ms }
    }
}
