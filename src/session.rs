//! Session driver
//!
//! Wraps a `RoundController` and routes its notices to the two outside
//! collaborators: the presentation layer (`Presenter`) and result persistence
//! (`ScoreSink`). The summary is submitted exactly once, when the session
//! completes.

use glam::Vec2;

use crate::persistence::{PersistError, ScoreSink, SessionRecord};
use crate::round::{
    Notice, Phase, RoundController, RoundInput, RoundResult, SeededTrials, TrialGenerator,
    TrialSpec,
};
use crate::score::SessionSummary;
use crate::settings::{GameKind, GameSettings};

/// Presentation-layer callbacks
///
/// The four tracking/result hooks are required; everything else defaults to a
/// no-op so a minimal front end only draws what it needs.
pub trait Presenter {
    fn on_track(&mut self, on_track: bool);
    fn progress(&mut self, progress: f32, position: Vec2);
    fn round_resolved(&mut self, result: &RoundResult);
    fn session_complete(&mut self, summary: &SessionSummary);

    fn phase_changed(&mut self, _phase: Phase) {}
    fn instructions(&mut self, _round: u32, _trial: &TrialSpec) {}
    fn armed(&mut self, _round: u32, _attempt: u32) {}
    fn signal_shown(&mut self, _round: u32) {}
    fn off_track_warning(&mut self, _distance: f32) {}
    fn spring_back(&mut self, _to: Vec2) {}
    fn round_aborted(&mut self, _round: u32, _reason: &str) {}
    fn cancelled(&mut self) {}
    /// Non-blocking warning; the session result was not saved
    fn persistence_failed(&mut self, _error: &PersistError) {}
}

/// Headless presenter
impl Presenter for () {
    fn on_track(&mut self, _on_track: bool) {}
    fn progress(&mut self, _progress: f32, _position: Vec2) {}
    fn round_resolved(&mut self, _result: &RoundResult) {}
    fn session_complete(&mut self, _summary: &SessionSummary) {}
}

/// One session of one game
pub struct Session<P: Presenter, S: ScoreSink> {
    game: GameKind,
    controller: RoundController,
    presenter: P,
    sink: S,
    submitted: bool,
}

impl<P: Presenter, S: ScoreSink> Session<P, S> {
    pub fn new(
        settings: &GameSettings,
        generator: Box<dyn TrialGenerator>,
        presenter: P,
        sink: S,
    ) -> Self {
        Self {
            game: settings.game,
            controller: RoundController::from_settings(settings, generator),
            presenter,
            sink,
            submitted: false,
        }
    }

    /// Session with procedurally generated trials
    pub fn seeded(settings: &GameSettings, presenter: P, sink: S) -> Self {
        Self::new(settings, Box::new(SeededTrials::new(settings)), presenter, sink)
    }

    pub fn game(&self) -> GameKind {
        self.game
    }

    pub fn controller(&self) -> &RoundController {
        &self.controller
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.controller.summary()
    }

    /// Complete or cancelled
    pub fn is_finished(&self) -> bool {
        self.controller.phase() == Phase::Complete || self.controller.is_cancelled()
    }

    pub fn into_parts(self) -> (P, S) {
        (self.presenter, self.sink)
    }

    /// Feed one input and dispatch the resulting notices
    pub fn handle(&mut self, input: RoundInput, now_ms: u64) -> Vec<Notice> {
        if self.controller.is_cancelled() {
            log::debug!("Session cancelled, ignoring {:?}", input);
            return Vec::new();
        }
        let notices = self.controller.handle(input, now_ms);
        for notice in &notices {
            self.dispatch(notice, now_ms);
        }
        notices
    }

    /// Leave the game: pending timers are dropped and later input is ignored
    pub fn cancel(&mut self, now_ms: u64) -> Vec<Notice> {
        self.handle(RoundInput::Cancel, now_ms)
    }

    fn dispatch(&mut self, notice: &Notice, now_ms: u64) {
        match notice {
            Notice::PhaseChanged { phase } => self.presenter.phase_changed(*phase),
            Notice::Instructions { round, trial } => self.presenter.instructions(*round, trial),
            Notice::Armed { round, attempt, .. } => self.presenter.armed(*round, *attempt),
            Notice::SignalShown { round } => self.presenter.signal_shown(*round),
            Notice::OnTrack { on_track } => self.presenter.on_track(*on_track),
            Notice::Progress { progress, position } => {
                self.presenter.progress(*progress, *position)
            }
            Notice::OffTrackWarning { distance } => self.presenter.off_track_warning(*distance),
            Notice::RoundResolved { result } => self.presenter.round_resolved(result),
            Notice::SpringBack { to } => self.presenter.spring_back(*to),
            Notice::RoundAborted { round, reason } => self.presenter.round_aborted(*round, reason),
            Notice::SessionComplete { summary } => {
                self.presenter.session_complete(summary);
                self.submit(*summary, now_ms);
            }
            Notice::Cancelled => self.presenter.cancelled(),
        }
    }

    fn submit(&mut self, summary: SessionSummary, now_ms: u64) {
        if self.submitted {
            return;
        }
        self.submitted = true;

        let record = SessionRecord {
            game: self.game,
            summary,
            completed_at_ms: now_ms,
        };
        // Fire-and-forget: reported, not retried
        if let Err(e) = self.sink.submit(&record) {
            log::warn!("Session result for {} not saved: {}", self.game.as_str(), e);
            self.presenter.persistence_failed(&e);
        }
    }
}
