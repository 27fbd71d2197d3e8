//! Round lifecycle state machine
//!
//! One controller drives a whole session of any game: present -> arm ->
//! track/await -> resolve -> feedback -> advance. It is driven by
//! `RoundInput` events stamped with the caller's clock and never blocks; all
//! deadlines (presentation, attempt timeout, feedback dwell) are serviced
//! whenever an input arrives, so a host can either poll with `Tick` or deliver
//! `TimerFired` from its own timers.

use glam::Vec2;

use super::generator::TrialGenerator;
use super::state::{
    Notice, Outcome, Phase, RoundInput, RoundResult, SignalTrial, TimerId, TrackingTrial,
    TrialSpec,
};
use crate::score::{ScoreKeeper, SessionSummary};
use crate::settings::GameSettings;
use crate::track::{PathModel, ProgressAccumulator, TrackState, evaluate};

/// Session-level timing and length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundConfig {
    pub total_rounds: u32,
    /// Per-attempt timeout from arming (None = untimed)
    pub timeout_ms: Option<u64>,
    pub present_ms: u64,
    pub feedback_ms: u64,
}

impl From<&GameSettings> for RoundConfig {
    fn from(settings: &GameSettings) -> Self {
        Self {
            total_rounds: settings.total_rounds,
            timeout_ms: settings.timeout_ms,
            present_ms: settings.present_ms,
            feedback_ms: settings.feedback_ms,
        }
    }
}

/// Decide the outcome of releasing a drag at `release`
pub fn judge_release(
    state: &TrackState,
    model: &PathModel,
    trial: &TrackingTrial,
    release: Vec2,
) -> Outcome {
    if trial.strict && state.ever_left_track {
        return Outcome::Miss;
    }
    let complete = state.progress >= trial.completion_threshold;
    let at_end = release.distance(model.end()) <= model.tolerance();
    if complete && at_end {
        Outcome::Success
    } else {
        Outcome::Miss
    }
}

/// Trial configuration plus its sampled geometry
#[derive(Debug, Clone)]
struct ActiveTrial {
    spec: TrialSpec,
    model: Option<PathModel>,
    accumulator: ProgressAccumulator,
}

/// One armed attempt at the current trial
#[derive(Debug, Clone)]
struct Attempt {
    number: u32,
    armed_at: u64,
    /// Pending timeout: id and deadline. Cleared on resolution.
    timer: Option<(TimerId, u64)>,
    /// One-shot latch; every resolution after the first is a no-op
    resolved: bool,
    track: Option<TrackState>,
    signal_shown: bool,
}

/// Finite-state machine for a session of trials
pub struct RoundController {
    config: RoundConfig,
    generator: Box<dyn TrialGenerator>,
    score: ScoreKeeper,
    phase: Phase,
    /// Current round index (0-based)
    round: u32,
    trial: Option<ActiveTrial>,
    attempt: Option<Attempt>,
    present_until: Option<u64>,
    feedback_until: Option<u64>,
    /// Re-arm the same trial after feedback instead of advancing
    retry: bool,
    next_timer: u64,
    cancelled: bool,
    summary: Option<SessionSummary>,
}

impl RoundController {
    pub fn new(config: RoundConfig, generator: Box<dyn TrialGenerator>, score: ScoreKeeper) -> Self {
        Self {
            config,
            generator,
            score,
            phase: Phase::Idle,
            round: 0,
            trial: None,
            attempt: None,
            present_until: None,
            feedback_until: None,
            retry: false,
            next_timer: 1,
            cancelled: false,
            summary: None,
        }
    }

    /// Controller configured from game settings
    pub fn from_settings(settings: &GameSettings, generator: Box<dyn TrialGenerator>) -> Self {
        Self::new(
            RoundConfig::from(settings),
            generator,
            ScoreKeeper::new(settings.total_rounds, settings.xp),
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn score(&self) -> &ScoreKeeper {
        &self.score
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn trial(&self) -> Option<&TrialSpec> {
        self.trial.as_ref().map(|t| &t.spec)
    }

    /// Sampled path of the current tracking trial
    pub fn model(&self) -> Option<&PathModel> {
        self.trial.as_ref().and_then(|t| t.model.as_ref())
    }

    pub fn track_state(&self) -> Option<&TrackState> {
        self.attempt.as_ref().and_then(|a| a.track.as_ref())
    }

    /// When the current attempt was armed
    pub fn armed_at(&self) -> Option<u64> {
        self.attempt.as_ref().map(|a| a.armed_at)
    }

    /// Id of the pending attempt timer
    pub fn timer(&self) -> Option<TimerId> {
        self.attempt.as_ref().and_then(|a| a.timer).map(|(id, _)| id)
    }

    /// Deadline of the pending attempt timer
    pub fn deadline(&self) -> Option<u64> {
        self.attempt.as_ref().and_then(|a| a.timer).map(|(_, at)| at)
    }

    /// Process one input at `now_ms`, returning the resulting notices
    pub fn handle(&mut self, input: RoundInput, now_ms: u64) -> Vec<Notice> {
        let mut out = Vec::new();
        if self.cancelled {
            return out;
        }

        // Anything already due happens before the input itself
        self.service_deadlines(now_ms, &mut out);

        match input {
            RoundInput::Begin => {
                if self.phase == Phase::Idle {
                    log::info!("Session started ({} rounds)", self.config.total_rounds);
                    self.present(now_ms, &mut out);
                }
            }
            RoundInput::PresentationDone => {
                if self.phase == Phase::Presenting {
                    self.arm(now_ms, &mut out);
                }
            }
            RoundInput::DragStart(point) => {
                if self.phase == Phase::Armed && self.model().is_some() {
                    self.set_phase(Phase::Tracking, &mut out);
                    self.track_sample(point, now_ms, &mut out);
                }
            }
            RoundInput::DragMove(point) => {
                if self.phase == Phase::Tracking {
                    self.track_sample(point, now_ms, &mut out);
                }
            }
            RoundInput::DragEnd(point) => {
                if self.phase == Phase::Tracking {
                    self.release(point, now_ms, &mut out);
                }
            }
            RoundInput::Tap => {
                if self.phase == Phase::AwaitingSignal {
                    self.tap(now_ms, &mut out);
                }
            }
            RoundInput::TimerFired(id) => self.timer_fired(id, now_ms, &mut out),
            RoundInput::Tick => {}
            RoundInput::Cancel => self.cancel(&mut out),
        }

        // Zero-length presentation or feedback proceeds immediately
        self.service_deadlines(now_ms, &mut out);
        out
    }

    fn set_phase(&mut self, phase: Phase, out: &mut Vec<Notice>) {
        if self.phase != phase {
            log::debug!("Round {}: {:?} -> {:?}", self.round, self.phase, phase);
            self.phase = phase;
            out.push(Notice::PhaseChanged { phase });
        }
    }

    /// Run every deadline that is due at `now`, in order
    fn service_deadlines(&mut self, now: u64, out: &mut Vec<Notice>) {
        loop {
            let before = self.phase;
            match self.phase {
                Phase::Presenting => {
                    if let Some(at) = self.present_until.filter(|at| *at <= now) {
                        self.arm(at, out);
                    }
                }
                Phase::Armed | Phase::Tracking | Phase::AwaitingSignal => {
                    self.show_signal_if_due(now, out);
                    if let Some((_, deadline)) = self
                        .attempt
                        .as_ref()
                        .and_then(|a| a.timer)
                        .filter(|(_, at)| *at <= now)
                    {
                        self.resolve(Outcome::Timeout, deadline, out);
                    }
                }
                Phase::Feedback => {
                    if let Some(at) = self.feedback_until.filter(|at| *at <= now) {
                        self.after_feedback(at, out);
                    }
                }
                _ => {}
            }
            if self.phase == before {
                break;
            }
        }
    }

    /// Enter `Presenting` for the current round with a fresh trial
    fn present(&mut self, at: u64, out: &mut Vec<Notice>) {
        if self.round >= self.config.total_rounds {
            self.complete(out);
            return;
        }

        let spec = self.generator.next_trial(self.round);
        let (model, accumulator) = match &spec {
            TrialSpec::Tracking(trial) => match PathModel::build(&trial.path, trial.tolerance) {
                Ok(model) => (Some(model), ProgressAccumulator::new(trial.snap_to_end)),
                Err(e) => {
                    // Fatal to this round only
                    log::warn!("Round {} skipped: {}", self.round, e);
                    out.push(Notice::RoundAborted {
                        round: self.round,
                        reason: e.to_string(),
                    });
                    self.advance(at, out);
                    return;
                }
            },
            TrialSpec::Signal(_) => (None, ProgressAccumulator::default()),
        };

        self.trial = Some(ActiveTrial {
            spec: spec.clone(),
            model,
            accumulator,
        });
        self.attempt = None;
        self.present_until = Some(at.saturating_add(self.config.present_ms));
        self.set_phase(Phase::Presenting, out);
        out.push(Notice::Instructions {
            round: self.round,
            trial: spec,
        });
    }

    /// Create a fresh attempt for the current trial and start its timer
    fn arm(&mut self, at: u64, out: &mut Vec<Notice>) {
        let Some(trial) = self.trial.as_ref() else {
            return;
        };
        self.present_until = None;

        let number = self.attempt.as_ref().map_or(1, |a| a.number + 1);
        let timer = self.config.timeout_ms.map(|timeout| {
            let id = TimerId(self.next_timer);
            self.next_timer += 1;
            (id, at.saturating_add(timeout))
        });
        let track = trial.model.as_ref().map(TrackState::armed);
        let start = trial.model.as_ref().map(|m| m.start());
        let signal = trial.spec.is_signal();

        self.attempt = Some(Attempt {
            number,
            armed_at: at,
            timer,
            resolved: false,
            track,
            signal_shown: false,
        });

        self.set_phase(Phase::Armed, out);
        out.push(Notice::Armed {
            round: self.round,
            attempt: number,
            timer: timer.map(|(id, _)| id),
            deadline_ms: timer.map(|(_, deadline)| deadline),
        });

        if signal {
            self.set_phase(Phase::AwaitingSignal, out);
        } else if let Some(start) = start {
            out.push(Notice::OnTrack { on_track: true });
            out.push(Notice::Progress {
                progress: 0.0,
                position: start,
            });
        }
    }

    fn signal_trial(&self) -> Option<SignalTrial> {
        match self.trial.as_ref().map(|t| &t.spec) {
            Some(TrialSpec::Signal(signal)) => Some(*signal),
            _ => None,
        }
    }

    /// Moment the go signal appears for the current attempt
    fn signal_opens_at(&self) -> Option<u64> {
        let signal = self.signal_trial()?;
        let attempt = self.attempt.as_ref()?;
        Some(attempt.armed_at.saturating_add(signal.delay_ms))
    }

    fn show_signal_if_due(&mut self, now: u64, out: &mut Vec<Notice>) {
        if self.phase != Phase::AwaitingSignal {
            return;
        }
        let Some(opens_at) = self.signal_opens_at() else {
            return;
        };
        let round = self.round;
        if let Some(attempt) = self.attempt.as_mut() {
            if !attempt.signal_shown && !attempt.resolved && now >= opens_at {
                attempt.signal_shown = true;
                out.push(Notice::SignalShown { round });
            }
        }
    }

    /// Fold one pointer sample into the attempt's tracking state
    fn track_sample(&mut self, point: Vec2, now: u64, out: &mut Vec<Notice>) {
        let (Some(trial), Some(attempt)) = (self.trial.as_ref(), self.attempt.as_mut()) else {
            return;
        };
        let (Some(model), Some(state)) = (trial.model.as_ref(), attempt.track.as_ref()) else {
            return;
        };

        let eval = evaluate(point, model);
        let step = trial.accumulator.update(state, &eval, model, now);

        if step.on_track_changed {
            out.push(Notice::OnTrack {
                on_track: step.state.on_track,
            });
        }
        if step.warn {
            out.push(Notice::OffTrackWarning {
                distance: eval.distance,
            });
        }
        if step.state.on_track {
            out.push(Notice::Progress {
                progress: step.state.progress,
                position: step.state.last_point,
            });
        }
        attempt.track = Some(step.state);
    }

    fn release(&mut self, point: Vec2, now: u64, out: &mut Vec<Notice>) {
        let outcome = {
            let (Some(trial), Some(state)) = (self.trial.as_ref(), self.track_state()) else {
                return;
            };
            let (TrialSpec::Tracking(spec), Some(model)) = (&trial.spec, trial.model.as_ref()) else {
                return;
            };
            judge_release(state, model, spec, point)
        };
        self.resolve(outcome, now, out);
    }

    fn tap(&mut self, now: u64, out: &mut Vec<Notice>) {
        let Some(opens_at) = self.signal_opens_at() else {
            return;
        };
        // Only a tap strictly after the signal appears counts
        let outcome = if now > opens_at {
            Outcome::Success
        } else {
            log::debug!("Round {}: tap {} ms before the signal", self.round, opens_at - now);
            Outcome::Miss
        };
        self.resolve(outcome, now, out);
    }

    fn timer_fired(&mut self, id: TimerId, now: u64, out: &mut Vec<Notice>) {
        let current = self
            .attempt
            .as_ref()
            .filter(|a| !a.resolved)
            .and_then(|a| a.timer)
            .map(|(timer, _)| timer);
        if current == Some(id) {
            self.resolve(Outcome::Timeout, now, out);
        } else {
            log::debug!("Ignoring stale timer {:?}", id);
        }
    }

    /// Resolve the current attempt exactly once
    fn resolve(&mut self, outcome: Outcome, at: u64, out: &mut Vec<Notice>) {
        let round = self.round;
        let Some(attempt) = self.attempt.as_mut() else {
            return;
        };
        if attempt.resolved {
            log::debug!("Round {}: already resolved, {:?} ignored", round, outcome);
            return;
        }
        attempt.resolved = true;
        attempt.timer = None;

        let progress_at_end = match &attempt.track {
            Some(track) => track.progress,
            None if outcome.is_correct() => 1.0,
            None => 0.0,
        };
        let result = RoundResult {
            round,
            attempt: attempt.number,
            outcome,
            progress_at_end,
            elapsed_ms: at.saturating_sub(attempt.armed_at),
        };

        self.set_phase(Phase::Resolving, out);
        self.score.record_result(&result);
        log::info!(
            "Round {} attempt {}: {:?} (progress {:.2}, {} ms)",
            round,
            result.attempt,
            outcome,
            progress_at_end,
            result.elapsed_ms
        );
        out.push(Notice::RoundResolved { result });

        // A miss is retried with the same trial; a timeout always advances
        self.retry = outcome == Outcome::Miss;
        if self.retry {
            if let Some(start) = self.model().map(|m| m.start()) {
                out.push(Notice::SpringBack { to: start });
            }
        }

        self.feedback_until = Some(at.saturating_add(self.config.feedback_ms));
        self.set_phase(Phase::Feedback, out);
    }

    fn after_feedback(&mut self, at: u64, out: &mut Vec<Notice>) {
        self.feedback_until = None;
        if self.retry {
            self.retry = false;
            self.arm(at, out);
        } else {
            self.advance(at, out);
        }
    }

    fn advance(&mut self, at: u64, out: &mut Vec<Notice>) {
        self.set_phase(Phase::Advancing, out);
        self.round += 1;
        self.trial = None;
        self.attempt = None;
        if self.round >= self.config.total_rounds {
            self.complete(out);
        } else {
            self.present(at, out);
        }
    }

    fn complete(&mut self, out: &mut Vec<Notice>) {
        let summary = self.score.finalize();
        log::info!(
            "Session complete: {}/{} correct, {:.1}% accuracy, {} XP",
            summary.correct,
            summary.total_rounds,
            summary.accuracy_pct,
            summary.xp_awarded
        );
        self.summary = Some(summary);
        self.set_phase(Phase::Complete, out);
        out.push(Notice::SessionComplete { summary });
    }

    /// Leaving the game screen: drop pending timers and stop accepting input
    fn cancel(&mut self, out: &mut Vec<Notice>) {
        if self.phase == Phase::Complete {
            return;
        }
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.timer = None;
        }
        self.present_until = None;
        self.feedback_until = None;
        self.cancelled = true;
        log::info!("Session cancelled in round {}", self.round);
        self.set_phase(Phase::Idle, out);
        out.push(Notice::Cancelled);
    }
}
