use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and sizing knobs for every party in the process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Maximum participants per party
    pub capacity: usize,
    /// Slot reservation after a transport drop
    pub reconnect_grace: Duration,
    /// Lifetime of a party with zero Active participants
    pub idle_party_ttl: Duration,
    /// Interval between server heartbeat SyncEvents
    pub heartbeat_interval: Duration,
    /// Drift (seconds) below which clients leave playback alone
    pub drift_tolerance_secs: f64,
    /// Bounded per-connection output buffer
    pub outbox_capacity: usize,
    /// Code generation attempts before CreateFailed
    pub code_retry_attempts: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            capacity: 8,
            reconnect_grace: Duration::from_secs(30),
            idle_party_ttl: Duration::from_secs(5 * 60),
            heartbeat_interval: Duration::from_secs(10),
            drift_tolerance_secs: 1.5,
            outbox_capacity: 64,
            code_retry_attempts: 5,
        }
    }
}

impl SyncSettings {
    /// Read overrides from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_parse("PARTY_CAPACITY").unwrap_or(defaults.capacity),
            reconnect_grace: env_parse("RECONNECT_GRACE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_grace),
            idle_party_ttl: env_parse("IDLE_PARTY_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_party_ttl),
            heartbeat_interval: env_parse("HEARTBEAT_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat_interval),
            drift_tolerance_secs: env_parse("DRIFT_TOLERANCE_SECS")
                .unwrap_or(defaults.drift_tolerance_secs),
            outbox_capacity: env_parse("OUTBOX_CAPACITY").unwrap_or(defaults.outbox_capacity),
            code_retry_attempts: env_parse("CODE_RETRY_ATTEMPTS")
                .unwrap_or(defaults.code_retry_attempts),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.capacity < 1 {
            return Err("Party capacity must be at least 1");
        }
        if self.heartbeat_interval.is_zero() {
            return Err("Heartbeat interval must be positive");
        }
        if !(self.drift_tolerance_secs.is_finite() && self.drift_tolerance_secs > 0.0) {
            return Err("Drift tolerance must be a positive number of seconds");
        }
        if self.outbox_capacity < 2 {
            return Err("Outbox capacity must be at least 2");
        }
        if self.code_retry_attempts == 0 {
            return Err("At least one code generation attempt is required");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
