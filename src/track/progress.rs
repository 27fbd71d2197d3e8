//! Progress accumulation and on/off-track classification
//!
//! `ProgressAccumulator::update` is a pure reducer: it takes the previous
//! `TrackState` and one proximity evaluation and returns the next state. The
//! caller owns the state; nothing here mutates shared values.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::path::PathModel;
use super::proximity::Proximity;
use crate::consts::{WARNING_INTERVAL_MS, WRAP_HIGH, WRAP_LOW};

/// Per-attempt tracking record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    /// Normalized progress in [0, 1]; never decreases within an attempt
    pub progress: f32,
    /// Last accepted (on-track) query point
    pub last_point: Vec2,
    pub on_track: bool,
    /// Latched true the first time the pointer leaves the tolerance band
    pub ever_left_track: bool,
    /// Timestamp of the last off-track warning
    pub last_warning_at: Option<u64>,
}

impl TrackState {
    /// Fresh state for an attempt starting at `start`
    pub fn new(start: Vec2) -> Self {
        Self {
            progress: 0.0,
            last_point: start,
            on_track: true,
            ever_left_track: false,
            last_warning_at: None,
        }
    }

    /// Fresh state positioned at the model's start point
    pub fn armed(model: &PathModel) -> Self {
        Self::new(model.start())
    }
}

/// Output of one reducer step
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStep {
    pub state: TrackState,
    /// `on_track` flipped compared to the previous state
    pub on_track_changed: bool,
    /// A throttled off-track warning is due
    pub warn: bool,
    /// Recorded progress increased
    pub advanced: bool,
}

/// Reducer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressAccumulator {
    /// On open paths, force progress to 1.0 once the sample is within the
    /// tolerance radius of the final point
    pub snap_to_end: bool,
    /// Minimum spacing between off-track warnings
    pub warning_interval_ms: u64,
}

impl Default for ProgressAccumulator {
    fn default() -> Self {
        Self {
            snap_to_end: true,
            warning_interval_ms: WARNING_INTERVAL_MS,
        }
    }
}

impl ProgressAccumulator {
    pub fn new(snap_to_end: bool) -> Self {
        Self {
            snap_to_end,
            ..Self::default()
        }
    }

    /// Fold one proximity evaluation into the tracking state
    pub fn update(
        &self,
        state: &TrackState,
        eval: &Proximity,
        model: &PathModel,
        now_ms: u64,
    ) -> TrackStep {
        let tolerance = model.tolerance();

        if !eval.within(tolerance) {
            // Off the path: the tracked point freezes where it last was valid
            let warn = match state.last_warning_at {
                None => true,
                Some(at) => now_ms.saturating_sub(at) >= self.warning_interval_ms,
            };
            let next = TrackState {
                on_track: false,
                ever_left_track: true,
                last_warning_at: if warn { Some(now_ms) } else { state.last_warning_at },
                ..state.clone()
            };
            return TrackStep {
                on_track_changed: state.on_track,
                warn,
                advanced: false,
                state: next,
            };
        }

        let mut candidate = eval.arc_progress(model);
        if model.is_closed() {
            // Crossing the seam of a closed outline after (nearly) a full circuit
            if candidate < WRAP_LOW && state.progress > WRAP_HIGH {
                candidate += 1.0;
            } else if candidate > WRAP_HIGH && state.progress < WRAP_LOW {
                // Touching the closing edge just behind the start is not a lap
                candidate = state.progress;
            }
        } else if self.snap_to_end && eval.point.distance(model.end()) <= tolerance {
            candidate = 1.0;
        }

        let progress = state.progress.max(candidate).min(1.0);
        let next = TrackState {
            progress,
            last_point: eval.point,
            on_track: true,
            ..state.clone()
        };

        TrackStep {
            on_track_changed: !state.on_track,
            warn: false,
            advanced: progress > state.progress,
            state: next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::path::PathSpec;
    use crate::track::proximity::evaluate;
    use proptest::prelude::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn straight() -> PathModel {
        PathModel::build(
            &PathSpec::Line {
                from: v(0.0, 50.0),
                to: v(100.0, 50.0),
            },
            10.0,
        )
        .unwrap()
    }

    fn feed(acc: &ProgressAccumulator, model: &PathModel, state: &TrackState, p: Vec2, t: u64) -> TrackStep {
        acc.update(state, &evaluate(p, model), model, t)
    }

    #[test]
    fn test_progress_advances_on_track() {
        let model = straight();
        let acc = ProgressAccumulator::new(false);
        let state = TrackState::armed(&model);

        let step = feed(&acc, &model, &state, v(40.0, 53.0), 0);
        assert!(step.state.on_track);
        assert!(step.advanced);
        assert!((step.state.progress - 0.4).abs() < 1e-6);
        assert_eq!(step.state.last_point, v(40.0, 53.0));
    }

    #[test]
    fn test_backward_drag_keeps_progress() {
        let model = straight();
        let acc = ProgressAccumulator::new(false);
        let mut state = TrackState::armed(&model);

        for x in [10.0, 30.0, 60.0, 45.0, 20.0] {
            state = feed(&acc, &model, &state, v(x, 50.0), 0).state;
        }
        assert!((state.progress - 0.6).abs() < 1e-6);
        assert_eq!(state.last_point, v(20.0, 50.0));
    }

    #[test]
    fn test_off_track_freezes_and_latches() {
        let model = straight();
        let acc = ProgressAccumulator::new(false);
        let state = feed(&acc, &model, &TrackState::armed(&model), v(30.0, 50.0), 0).state;

        let off = feed(&acc, &model, &state, v(70.0, 80.0), 100);
        assert!(!off.state.on_track);
        assert!(off.on_track_changed);
        assert!(off.state.ever_left_track);
        assert_eq!(off.state.progress, state.progress);
        assert_eq!(off.state.last_point, state.last_point);

        // Coming back on track does not clear the latch
        let back = feed(&acc, &model, &off.state, v(35.0, 50.0), 200);
        assert!(back.state.on_track);
        assert!(back.on_track_changed);
        assert!(back.state.ever_left_track);
    }

    #[test]
    fn test_warnings_are_throttled() {
        let model = straight();
        let acc = ProgressAccumulator::new(false);
        let mut state = TrackState::armed(&model);
        let mut warnings = Vec::new();

        for t in [0u64, 100, 499, 500, 700, 1000] {
            let step = feed(&acc, &model, &state, v(50.0, 90.0), t);
            if step.warn {
                warnings.push(t);
            }
            state = step.state;
        }
        assert_eq!(warnings, vec![0, 500, 1000]);
    }

    #[test]
    fn test_snap_to_end_on_open_path() {
        let model = straight();
        let snapping = ProgressAccumulator::new(true);
        let state = TrackState::armed(&model);

        // Cutting inside the band near the end: arc length says ~0.92
        let step = feed(&snapping, &model, &state, v(92.0, 55.0), 0);
        assert_eq!(step.state.progress, 1.0);

        let plain = ProgressAccumulator::new(false);
        let step = feed(&plain, &model, &state, v(92.0, 55.0), 0);
        assert!((step.state.progress - 0.92).abs() < 1e-5);
    }

    #[test]
    fn test_closed_path_wraps_to_full() {
        let square = PathModel::build(
            &PathSpec::Polygon {
                vertices: vec![v(20.0, 20.0), v(80.0, 20.0), v(80.0, 80.0), v(20.0, 80.0)],
            },
            8.0,
        )
        .unwrap();
        let acc = ProgressAccumulator::default();
        let mut state = TrackState::armed(&square);

        // Snap never fires on closed paths: standing on the start stays at 0
        state = feed(&acc, &square, &state, v(21.0, 20.0), 0).state;
        assert!(state.progress < 0.01);

        let circuit = [
            v(80.0, 21.0),
            v(80.0, 79.0),
            v(21.0, 80.0),
            v(20.0, 30.0),
            v(20.0, 22.0),
        ];
        for p in circuit {
            state = feed(&acc, &square, &state, p, 0).state;
        }
        assert!(state.progress > 0.9);

        // Crossing the seam reports a completed circuit instead of resetting
        state = feed(&acc, &square, &state, v(24.0, 20.0), 0).state;
        assert_eq!(state.progress, 1.0);
    }

    #[test]
    fn test_closed_path_seam_touch_is_not_a_lap() {
        let square = PathModel::build(
            &PathSpec::Polygon {
                vertices: vec![v(20.0, 20.0), v(80.0, 20.0), v(80.0, 80.0), v(20.0, 80.0)],
            },
            15.0,
        )
        .unwrap();
        let acc = ProgressAccumulator::default();
        let state = TrackState::armed(&square);

        // Projects onto the closing edge, ~0.99 of the way round
        let eval = evaluate(v(19.0, 22.0), &square);
        assert_eq!(eval.segment_index, 3);
        assert!(eval.arc_progress(&square) > 0.9);

        let step = acc.update(&state, &eval, &square, 0);
        assert!(step.state.on_track);
        assert_eq!(step.state.progress, 0.0);
        assert!(!step.advanced);
        assert_eq!(step.state.last_point, v(19.0, 22.0));
    }

    proptest! {
        #[test]
        fn prop_progress_never_decreases(xs in proptest::collection::vec(0.0f32..100.0, 1..40),
                                          ys in proptest::collection::vec(20.0f32..80.0, 40)) {
            let model = straight();
            let acc = ProgressAccumulator::default();
            let mut state = TrackState::armed(&model);
            for (i, x) in xs.iter().enumerate() {
                let before = state.progress;
                state = feed(&acc, &model, &state, v(*x, ys[i]), i as u64 * 16).state;
                prop_assert!(state.progress >= before);
                prop_assert!((0.0..=1.0).contains(&state.progress));
            }
        }
    }
}
