//! Round lifecycle
//!
//! Presentation, arming, input handling, resolution and advancement for one
//! session of trials. The controller is the only place round state changes;
//! everything it does is reported as `Notice`s.

pub mod autoplay;
pub mod controller;
pub mod generator;
pub mod state;

pub use autoplay::Autoplayer;
pub use controller::{RoundConfig, RoundController, judge_release};
pub use generator::{ScriptedTrials, SeededTrials, TrialGenerator};
pub use state::{
    Notice, Outcome, Phase, RoundInput, RoundResult, SignalTrial, TimerId, TrackingTrial,
    TrialSpec,
};
