//! Drift correction for non-host clients
//!
//! Small deviations are left alone; past the tolerance the local engine is
//! hard-corrected to the extrapolated authoritative position.

use crate::client::clock::ClockSync;
use crate::client::view_state::PlaybackTarget;

/// Default tolerance before a hard correction (seconds)
pub const DEFAULT_DRIFT_TOLERANCE: f64 = 1.5;

/// Rates closer than this are treated as equal
const RATE_EPSILON: f64 = 1e-3;

/// What the local playback engine reports about itself
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPlayback {
    pub video_id: String,
    pub position: f64,
    pub is_playing: bool,
    pub rate: f64,
}

/// Instruction for the local playback engine
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackIntent {
    Load { video_id: String, position: f64 },
    Seek(f64),
    Play,
    Pause,
    SetRate(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct DriftCorrector {
    tolerance: f64,
}

impl Default for DriftCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_DRIFT_TOLERANCE)
    }
}

impl DriftCorrector {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Intents that bring `local` in line with `target` at `local_now_ms`
    ///
    /// The host is the source of truth and never corrects itself.
    pub fn correct(
        &self,
        target: &PlaybackTarget,
        local: &LocalPlayback,
        clock: &ClockSync,
        local_now_ms: i64,
        is_host: bool,
    ) -> Vec<PlaybackIntent> {
        if is_host {
            return Vec::new();
        }

        let expected = target.position_at(clock, local_now_ms);
        let mut intents = Vec::new();

        if target.video_id != local.video_id {
            intents.push(PlaybackIntent::Load {
                video_id: target.video_id.clone(),
                position: expected,
            });
        } else if (local.position - expected).abs() > self.tolerance {
            intents.push(PlaybackIntent::Seek(expected));
        }

        if (target.rate - local.rate).abs() > RATE_EPSILON {
            intents.push(PlaybackIntent::SetRate(target.rate));
        }

        match (target.is_playing, local.is_playing) {
            (true, false) => intents.push(PlaybackIntent::Play),
            (false, true) => intents.push(PlaybackIntent::Pause),
            _ => {}
        }

        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::SyncAction;

    fn target(position: f64, is_playing: bool) -> PlaybackTarget {
        PlaybackTarget {
            sequence_number: 1,
            action: Some(SyncAction::Play),
            position,
            is_playing,
            rate: 1.0,
            video_id: "v1".into(),
            server_timestamp: 50_000,
            received_at_ms: 50_000,
        }
    }

    fn local(position: f64, is_playing: bool) -> LocalPlayback {
        LocalPlayback {
            video_id: "v1".into(),
            position,
            is_playing,
            rate: 1.0,
        }
    }

    #[test]
    fn test_corrects_to_extrapolated_position() {
        let corrector = DriftCorrector::default();
        // Stamped at 100s, received 3s later while still showing 100s
        let intents = corrector.correct(&target(100.0, true), &local(100.0, true), &ClockSync::new(), 53_000, false);
        assert_eq!(intents, vec![PlaybackIntent::Seek(103.0)]);
    }

    #[test]
    fn test_small_drift_is_left_alone() {
        let corrector = DriftCorrector::default();
        let intents = corrector.correct(&target(100.0, true), &local(102.0, true), &ClockSync::new(), 53_000, false);
        assert!(intents.is_empty());
    }

    #[test]
    fn test_host_never_self_corrects() {
        let corrector = DriftCorrector::default();
        let intents = corrector.correct(&target(100.0, true), &local(0.0, false), &ClockSync::new(), 90_000, true);
        assert!(intents.is_empty());
    }

    #[test]
    fn test_pause_and_seek_together() {
        let corrector = DriftCorrector::default();
        let intents = corrector.correct(&target(125.0, false), &local(10.0, true), &ClockSync::new(), 99_000, false);
        assert_eq!(
            intents,
            vec![PlaybackIntent::Seek(125.0), PlaybackIntent::Pause]
        );
    }

    #[test]
    fn test_new_title_and_rate() {
        let corrector = DriftCorrector::default();
        let mut t = target(0.0, true);
        t.video_id = "v2".into();
        t.rate = 2.0;
        let intents = corrector.correct(&t, &local(40.0, false), &ClockSync::new(), 51_000, false);
        assert_eq!(
            intents,
            vec![
                PlaybackIntent::Load {
                    video_id: "v2".into(),
                    position: 2.0,
                },
                PlaybackIntent::SetRate(2.0),
                PlaybackIntent::Play,
            ]
        );
    }

    #[test]
    fn test_fast_local_clock_before_first_sample() {
        let corrector = DriftCorrector::default();
        // Client wall clock runs 60s ahead of the server
        let mut t = target(100.0, true);
        t.received_at_ms = 110_000;
        let clock = ClockSync::new();

        let intents = corrector.correct(&t, &local(100.0, true), &clock, 110_000, false);
        assert!(intents.is_empty());

        let intents = corrector.correct(&t, &local(100.0, true), &clock, 113_000, false);
        assert_eq!(intents, vec![PlaybackIntent::Seek(103.0)]);
    }

    #[test]
    fn test_sampled_clock_maps_to_server_time() {
        let corrector = DriftCorrector::default();
        let mut t = target(100.0, true);
        t.received_at_ms = 110_000;
        let mut clock = ClockSync::new();
        clock.record(111_000, 51_000, 111_000);

        // 112s local is 52s server, two seconds past the stamp
        let intents = corrector.correct(&t, &local(100.0, true), &clock, 112_000, false);
        assert_eq!(intents, vec![PlaybackIntent::Seek(102.0)]);
    }
}
