//! Per-round trial generation
//!
//! Each round gets a fresh path or signal configuration. Generation is seeded,
//! so a given seed always yields the same sequence of trials.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{SignalTrial, TrackingTrial, TrialSpec};
use crate::settings::{GameKind, GameSettings};
use crate::track::PathSpec;

/// Source of the trial configuration for each round
pub trait TrialGenerator {
    fn next_trial(&mut self, round: u32) -> TrialSpec;
}

/// Fixed list of trials, cycled when there are more rounds than entries
#[derive(Debug, Clone)]
pub struct ScriptedTrials {
    trials: Vec<TrialSpec>,
}

impl ScriptedTrials {
    /// Returns `None` for an empty list
    pub fn new(trials: Vec<TrialSpec>) -> Option<Self> {
        if trials.is_empty() {
            None
        } else {
            Some(Self { trials })
        }
    }
}

impl TrialGenerator for ScriptedTrials {
    fn next_trial(&mut self, round: u32) -> TrialSpec {
        self.trials[round as usize % self.trials.len()].clone()
    }
}

/// Procedural trials for a game, driven by the settings seed
#[derive(Debug, Clone)]
pub struct SeededTrials {
    settings: GameSettings,
    rng: Pcg32,
}

impl SeededTrials {
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            settings: settings.clone(),
            rng: Pcg32::seed_from_u64(settings.seed),
        }
    }

    fn tracking(&self, path: PathSpec) -> TrialSpec {
        TrialSpec::Tracking(TrackingTrial {
            path,
            tolerance: self.settings.tolerance,
            completion_threshold: self.settings.completion_threshold,
            snap_to_end: self.settings.snap_to_end,
            strict: self.settings.strict,
        })
    }

    /// Left-to-right bezier sweep with random control points
    fn bezier_sweep(&mut self) -> PathSpec {
        let rng = &mut self.rng;
        PathSpec::CubicBezier {
            p0: Vec2::new(10.0, rng.random_range(20.0..80.0)),
            c1: Vec2::new(rng.random_range(30.0..45.0), rng.random_range(10.0..90.0)),
            c2: Vec2::new(rng.random_range(55.0..70.0), rng.random_range(10.0..90.0)),
            p1: Vec2::new(90.0, rng.random_range(20.0..80.0)),
        }
    }

    fn straight(&mut self, x_from: (f32, f32), x_to: (f32, f32)) -> PathSpec {
        let rng = &mut self.rng;
        PathSpec::Line {
            from: Vec2::new(rng.random_range(x_from.0..x_from.1), rng.random_range(15.0..85.0)),
            to: Vec2::new(rng.random_range(x_to.0..x_to.1), rng.random_range(15.0..85.0)),
        }
    }

    /// Zig-zag across the play area
    fn zigzag(&mut self) -> PathSpec {
        let count = self.rng.random_range(4..=6usize);
        let step = 80.0 / (count - 1) as f32;
        let points = (0..count)
            .map(|i| Vec2::new(10.0 + step * i as f32, self.rng.random_range(20.0..80.0)))
            .collect();
        PathSpec::Polyline { points }
    }

    /// Sine-like snake wave
    fn snake(&mut self) -> PathSpec {
        let amplitude: f32 = self.rng.random_range(15.0..25.0);
        let waves: f32 = self.rng.random_range(1.0..2.0);
        let baseline: f32 = self.rng.random_range(40.0..60.0);
        let points = (0..=8)
            .map(|i| {
                let t = i as f32 / 8.0;
                Vec2::new(10.0 + 80.0 * t, baseline + amplitude * (t * waves * TAU).sin())
            })
            .collect();
        PathSpec::Polyline { points }
    }

    /// Regular polygon centred in the play area
    fn shape(&mut self) -> PathSpec {
        let sides = self.rng.random_range(3..=6usize);
        let radius: f32 = self.rng.random_range(25.0..35.0);
        let rotation: f32 = self.rng.random_range(0.0..TAU);
        let center = Vec2::splat(50.0);
        let vertices = (0..sides)
            .map(|i| {
                let theta = rotation + TAU * i as f32 / sides as f32;
                center + Vec2::new(theta.cos(), theta.sin()) * radius
            })
            .collect();
        PathSpec::Polygon { vertices }
    }
}

impl TrialGenerator for SeededTrials {
    fn next_trial(&mut self, round: u32) -> TrialSpec {
        let trial = match self.settings.game {
            GameKind::PathFollow => {
                let path = self.bezier_sweep();
                self.tracking(path)
            }
            GameKind::DragSlowly => {
                let path = self.straight((10.0, 20.0), (80.0, 90.0));
                self.tracking(path)
            }
            GameKind::BallRoll => {
                let path = self.straight((10.0, 30.0), (70.0, 90.0));
                self.tracking(path)
            }
            GameKind::FollowTheLine => {
                let path = self.zigzag();
                self.tracking(path)
            }
            GameKind::SnakeSlide => {
                let path = self.snake();
                self.tracking(path)
            }
            GameKind::PaintTheShape => {
                let path = self.shape();
                self.tracking(path)
            }
            GameKind::TrackAndFreeze | GameKind::StopOnSignal | GameKind::TapOnYourTurn => {
                let (lo, hi) = (
                    self.settings.signal_delay_min_ms,
                    self.settings.signal_delay_max_ms.max(self.settings.signal_delay_min_ms),
                );
                TrialSpec::Signal(SignalTrial {
                    delay_ms: self.rng.random_range(lo..=hi),
                })
            }
        };
        log::debug!("Round {} trial generated for {}", round, self.settings.game.as_str());
        trial
    }
}
