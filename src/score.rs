//! Session scoring
//!
//! Tallies resolved attempts and produces the summary handed to persistence.

use serde::{Deserialize, Serialize};

use crate::round::{Outcome, RoundResult};

/// How XP is derived from the number of correct rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum XpRule {
    /// Fixed XP per correct round
    PerCorrect { xp: u32 },
    /// `floor(correct / total_rounds * max)`
    Scaled { max: u32 },
}

impl Default for XpRule {
    fn default() -> Self {
        XpRule::PerCorrect { xp: 10 }
    }
}

impl XpRule {
    pub fn award(&self, correct: u32, total_rounds: u32) -> u32 {
        match *self {
            XpRule::PerCorrect { xp } => correct.saturating_mul(xp),
            XpRule::Scaled { max } => {
                if total_rounds == 0 {
                    0
                } else {
                    (u64::from(correct) * u64::from(max) / u64::from(total_rounds)) as u32
                }
            }
        }
    }
}

/// Final session totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_rounds: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy_pct: f32,
    pub xp_awarded: u32,
}

/// Running tally for one session
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreKeeper {
    total_rounds: u32,
    correct: u32,
    incorrect: u32,
    timeouts: u32,
    xp_rule: XpRule,
}

impl ScoreKeeper {
    pub fn new(total_rounds: u32, xp_rule: XpRule) -> Self {
        Self {
            total_rounds,
            correct: 0,
            incorrect: 0,
            timeouts: 0,
            xp_rule,
        }
    }

    /// Count one resolved attempt
    pub fn record_result(&mut self, result: &RoundResult) {
        if result.outcome.is_correct() {
            self.correct += 1;
        } else {
            self.incorrect += 1;
            if result.outcome == Outcome::Timeout {
                self.timeouts += 1;
            }
        }
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    /// Incorrect attempts that ended by timing out
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Accuracy against the configured round count, in percent
    pub fn accuracy_pct(&self) -> f32 {
        if self.total_rounds == 0 {
            return 0.0;
        }
        self.correct as f32 / self.total_rounds as f32 * 100.0
    }

    pub fn finalize(&self) -> SessionSummary {
        SessionSummary {
            total_rounds: self.total_rounds,
            correct: self.correct,
            incorrect: self.incorrect,
            accuracy_pct: self.accuracy_pct(),
            xp_awarded: self.xp_rule.award(self.correct, self.total_rounds),
        }
    }
}
