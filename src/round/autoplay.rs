//! Scripted player
//!
//! Generates a plausible child's input stream for whatever the controller is
//! currently waiting on: a jittered drag along the path with the occasional
//! excursion or early release, and reaction-delayed taps that are sometimes
//! impulsive. Used by the demo binary and for end-to-end tests.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::controller::RoundController;
use super::state::{Phase, RoundInput, TrialSpec};
use crate::persistence::ScoreSink;
use crate::session::{Presenter, Session};
use crate::track::PathModel;

/// Safety bound for `play`
const MAX_FRAMES: u32 = 500_000;

/// Drag in progress
#[derive(Debug, Clone)]
struct Stroke {
    progress: f32,
    /// Progress gained per frame
    step: f32,
    /// Progress at which the finger lifts
    release_at: f32,
    /// Progress where the hand wanders off and for how many frames
    excursion: Option<(f32, u32)>,
}

/// Seeded input generator
#[derive(Debug, Clone)]
pub struct Autoplayer {
    rng: Pcg32,
    /// Simulated input sampling interval
    pub frame_ms: u64,
    /// Chance a signal attempt gets tapped before the signal
    pub impulsive_chance: f64,
    /// Chance a stroke wanders off the path once
    pub excursion_chance: f64,
    /// Chance a stroke is released before the end
    pub give_up_chance: f64,
    stroke: Option<Stroke>,
    /// (armed_at, planned tap time) for the current signal attempt
    tap_plan: Option<(u64, u64)>,
}

impl Autoplayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            frame_ms: 16,
            impulsive_chance: 0.15,
            excursion_chance: 0.2,
            give_up_chance: 0.1,
            stroke: None,
            tap_plan: None,
        }
    }

    /// Input to deliver at `now_ms` given the controller's current phase
    pub fn next_input(&mut self, ctl: &RoundController, now_ms: u64) -> RoundInput {
        match ctl.phase() {
            Phase::Idle if !ctl.is_cancelled() => RoundInput::Begin,
            Phase::Armed => match ctl.model() {
                Some(model) => self.start_stroke(model),
                None => RoundInput::Tick,
            },
            Phase::Tracking => match ctl.model() {
                Some(model) => self.continue_stroke(model),
                None => RoundInput::Tick,
            },
            Phase::AwaitingSignal => self.respond_to_signal(ctl, now_ms),
            _ => RoundInput::Tick,
        }
    }

    /// Drive a session to completion; returns the clock at the end
    pub fn play<P: Presenter, S: ScoreSink>(&mut self, session: &mut Session<P, S>, start_ms: u64) -> u64 {
        let mut now = start_ms;
        for _ in 0..MAX_FRAMES {
            if session.is_finished() {
                return now;
            }
            let input = self.next_input(session.controller(), now);
            session.handle(input, now);
            now += self.frame_ms;
        }
        log::warn!("Autoplay stopped after {} frames without finishing", MAX_FRAMES);
        now
    }

    /// Point on the path at `progress` plus hand tremor
    fn aim(&mut self, model: &PathModel, progress: f32) -> Vec2 {
        let jitter = model.tolerance() * 0.3;
        let offset = Vec2::new(
            self.rng.random_range(-jitter..=jitter),
            self.rng.random_range(-jitter..=jitter),
        );
        model.point_at(progress) + offset
    }

    fn start_stroke(&mut self, model: &PathModel) -> RoundInput {
        let duration_ms: f32 = self.rng.random_range(1800.0..3200.0);
        let release_at = if self.rng.random_bool(self.give_up_chance) {
            self.rng.random_range(0.4..0.85)
        } else {
            1.0
        };
        let excursion = if self.rng.random_bool(self.excursion_chance) {
            Some((self.rng.random_range(0.2..0.7), self.rng.random_range(3..8u32)))
        } else {
            None
        };
        self.stroke = Some(Stroke {
            progress: 0.0,
            step: self.frame_ms as f32 / duration_ms,
            release_at,
            excursion,
        });
        RoundInput::DragStart(self.aim(model, 0.0))
    }

    fn continue_stroke(&mut self, model: &PathModel) -> RoundInput {
        let Some(mut stroke) = self.stroke.take() else {
            // Drag started elsewhere; let go where we are
            return RoundInput::DragEnd(model.start());
        };

        stroke.progress = (stroke.progress + stroke.step).min(stroke.release_at);
        if stroke.progress >= stroke.release_at {
            return RoundInput::DragEnd(self.aim(model, stroke.release_at));
        }

        let mut point = self.aim(model, stroke.progress);
        if let Some((at, frames)) = stroke.excursion {
            if stroke.progress >= at && frames > 0 {
                let ahead = model.point_at((stroke.progress + 0.01).min(1.0));
                let normal = (ahead - model.point_at(stroke.progress)).perp().normalize_or_zero();
                point += normal * model.tolerance() * 1.8;
                stroke.excursion = Some((at, frames - 1));
            }
        }
        self.stroke = Some(stroke);
        RoundInput::DragMove(point)
    }

    fn respond_to_signal(&mut self, ctl: &RoundController, now_ms: u64) -> RoundInput {
        let (Some(armed_at), Some(TrialSpec::Signal(signal))) = (ctl.armed_at(), ctl.trial()) else {
            return RoundInput::Tick;
        };

        let planned = match self.tap_plan {
            Some((armed, at)) if armed == armed_at => at,
            _ => {
                let at = if self.rng.random_bool(self.impulsive_chance) {
                    armed_at + self.rng.random_range(0..signal.delay_ms.max(1))
                } else {
                    armed_at + signal.delay_ms + self.rng.random_range(250..700)
                };
                self.tap_plan = Some((armed_at, at));
                at
            }
        };

        if now_ms >= planned {
            RoundInput::Tap
        } else {
            RoundInput::Tick
        }
    }
}
