//! Round lifecycle types
//!
//! Phases, the enum-tagged input stream, the notices handed to collaborators,
//! and the per-trial configuration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::score::SessionSummary;
use crate::track::PathSpec;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Session not started
    Idle,
    /// Instructions shown, no scoring input accepted
    Presenting,
    /// Attempt state created and timer running; tracking games wait for a drag
    Armed,
    /// Drag in progress (continuous games)
    Tracking,
    /// Waiting for the go signal and the tap that answers it (signal games)
    AwaitingSignal,
    /// Outcome being recorded
    Resolving,
    /// Feedback dwell before the next step
    Feedback,
    /// Moving to the next round
    Advancing,
    /// All rounds resolved
    Complete,
}

/// How a trial ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Miss,
    Timeout,
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Immutable record of one resolved attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round index (0-based)
    pub round: u32,
    /// Attempt number within the round (1-based)
    pub attempt: u32,
    pub outcome: Outcome,
    pub progress_at_end: f32,
    /// Time from arming to resolution
    pub elapsed_ms: u64,
}

/// Continuous path-following trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTrial {
    pub path: PathSpec,
    /// Maximum distance from the path that still counts as on track
    pub tolerance: f32,
    /// Progress needed at release for a success
    pub completion_threshold: f32,
    /// Snap progress to 1.0 near the final point of open paths
    pub snap_to_end: bool,
    /// Any excursion off the path turns a release into a miss
    pub strict: bool,
}

/// Tap-timing trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalTrial {
    /// Delay from arming until the go signal opens the window
    pub delay_ms: u64,
}

/// Configuration for one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrialSpec {
    Tracking(TrackingTrial),
    Signal(SignalTrial),
}

impl TrialSpec {
    pub fn is_signal(&self) -> bool {
        matches!(self, TrialSpec::Signal(_))
    }
}

/// Identifier of an attempt timer; stale ids are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Input events (all in play-area coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundInput {
    /// Start the session
    Begin,
    /// Presentation finished early (skips the remaining presentation time)
    PresentationDone,
    DragStart(Vec2),
    DragMove(Vec2),
    DragEnd(Vec2),
    Tap,
    /// An externally scheduled attempt timer fired
    TimerFired(TimerId),
    /// Service internal deadlines up to the current time
    Tick,
    /// Leaving the game screen
    Cancel,
}

/// State-change notifications for collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    PhaseChanged {
        phase: Phase,
    },
    Instructions {
        round: u32,
        trial: TrialSpec,
    },
    Armed {
        round: u32,
        attempt: u32,
        timer: Option<TimerId>,
        deadline_ms: Option<u64>,
    },
    SignalShown {
        round: u32,
    },
    OnTrack {
        on_track: bool,
    },
    Progress {
        progress: f32,
        /// Displayed position of the tracked object
        position: Vec2,
    },
    OffTrackWarning {
        distance: f32,
    },
    RoundResolved {
        result: RoundResult,
    },
    /// Tracked object returns to the start after a miss
    SpringBack {
        to: Vec2,
    },
    /// The round could not be set up and was skipped
    RoundAborted {
        round: u32,
        reason: String,
    },
    SessionComplete {
        summary: SessionSummary,
    },
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_correctness() {
        assert!(Outcome::Success.is_correct());
        assert!(!Outcome::Miss.is_correct());
        assert!(!Outcome::Timeout.is_correct());
    }

    #[test]
    fn test_notice_json_is_tagged() {
        let json = serde_json::to_string(&Notice::OnTrack { on_track: false }).unwrap();
        assert_eq!(json, r#"{"type":"on_track","on_track":false}"#);

        let json = serde_json::to_string(&Notice::Cancelled).unwrap();
        assert_eq!(json, r#"{"type":"cancelled"}"#);
    }

    #[test]
    fn test_trial_spec_round_trips_with_mode_tag() {
        let trial = TrialSpec::Signal(SignalTrial { delay_ms: 1200 });
        let json = serde_json::to_string(&trial).unwrap();
        assert_eq!(json, r#"{"mode":"signal","delay_ms":1200}"#);
        let back: TrialSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trial);
    }
}
