//! Per-game settings and presets
//!
//! Supplied at session start, never persisted by the engine itself. Settings
//! files are plain JSON; anything unreadable falls back to the game's preset.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::XpRule;

/// The mini-games driven by this engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    #[default]
    PathFollow,
    DragSlowly,
    SnakeSlide,
    BallRoll,
    PaintTheShape,
    FollowTheLine,
    TrackAndFreeze,
    StopOnSignal,
    TapOnYourTurn,
}

impl GameKind {
    pub const ALL: [GameKind; 9] = [
        GameKind::PathFollow,
        GameKind::DragSlowly,
        GameKind::SnakeSlide,
        GameKind::BallRoll,
        GameKind::PaintTheShape,
        GameKind::FollowTheLine,
        GameKind::TrackAndFreeze,
        GameKind::StopOnSignal,
        GameKind::TapOnYourTurn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::PathFollow => "path-follow",
            GameKind::DragSlowly => "drag-slowly",
            GameKind::SnakeSlide => "snake-slide",
            GameKind::BallRoll => "ball-roll",
            GameKind::PaintTheShape => "paint-the-shape",
            GameKind::FollowTheLine => "follow-the-line",
            GameKind::TrackAndFreeze => "track-and-freeze",
            GameKind::StopOnSignal => "stop-on-signal",
            GameKind::TapOnYourTurn => "tap-only-on-your-turn",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.to_lowercase().replace('_', "-");
        match key.as_str() {
            "path-follow" => Some(GameKind::PathFollow),
            "drag-slowly" => Some(GameKind::DragSlowly),
            "snake-slide" | "snake" => Some(GameKind::SnakeSlide),
            "ball-roll" => Some(GameKind::BallRoll),
            "paint-the-shape" | "paint" => Some(GameKind::PaintTheShape),
            "follow-the-line" => Some(GameKind::FollowTheLine),
            "track-and-freeze" => Some(GameKind::TrackAndFreeze),
            "stop-on-signal" => Some(GameKind::StopOnSignal),
            "tap-only-on-your-turn" | "tap-on-your-turn" => Some(GameKind::TapOnYourTurn),
            _ => None,
        }
    }

    /// Tap-timing game (as opposed to continuous path tracking)
    pub fn is_signal(&self) -> bool {
        matches!(
            self,
            GameKind::TrackAndFreeze | GameKind::StopOnSignal | GameKind::TapOnYourTurn
        )
    }

    /// Default settings for this game
    pub fn preset(&self) -> GameSettings {
        let base = GameSettings {
            game: *self,
            ..GameSettings::default()
        };
        match self {
            GameKind::PathFollow => base,
            GameKind::DragSlowly => GameSettings {
                tolerance: 30.0,
                completion_threshold: 0.85,
                xp: XpRule::PerCorrect { xp: 15 },
                ..base
            },
            GameKind::SnakeSlide => GameSettings {
                tolerance: 20.0,
                ..base
            },
            GameKind::BallRoll => GameSettings {
                total_rounds: 6,
                tolerance: 35.0,
                completion_threshold: 0.75,
                timeout_ms: Some(6000),
                ..base
            },
            GameKind::PaintTheShape => GameSettings {
                total_rounds: 4,
                tolerance: 15.0,
                completion_threshold: 0.95,
                snap_to_end: false,
                xp: XpRule::PerCorrect { xp: 20 },
                feedback_ms: 2500,
                ..base
            },
            GameKind::FollowTheLine => GameSettings {
                tolerance: 20.0,
                completion_threshold: 0.95,
                strict: true,
                xp: XpRule::Scaled { max: 50 },
                ..base
            },
            GameKind::TrackAndFreeze => GameSettings {
                total_rounds: 8,
                timeout_ms: Some(3000),
                signal_delay_min_ms: 800,
                signal_delay_max_ms: 2000,
                feedback_ms: 800,
                xp: XpRule::Scaled { max: 50 },
                ..base
            },
            GameKind::StopOnSignal => GameSettings {
                total_rounds: 10,
                timeout_ms: Some(4000),
                signal_delay_min_ms: 1000,
                signal_delay_max_ms: 2500,
                feedback_ms: 500,
                ..base
            },
            GameKind::TapOnYourTurn => GameSettings {
                total_rounds: 8,
                timeout_ms: Some(5000),
                signal_delay_min_ms: 1500,
                signal_delay_max_ms: 3000,
                feedback_ms: 1000,
                ..base
            },
        }
    }
}

/// Settings validation and IO errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("a session needs at least one round")]
    ZeroRounds,
    #[error("signal delay {delay_ms} ms does not leave a window before the {timeout_ms} ms timeout")]
    SignalWindow { delay_ms: u64, timeout_ms: u64 },
    #[error("{field} of {value_ms} ms exceeds the {max_ms} ms limit")]
    TimingTooLong {
        field: &'static str,
        value_ms: u64,
        max_ms: u64,
    },
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Upper bound for any single timing value (10 minutes)
pub const MAX_TIMING_MS: u64 = 10 * 60 * 1000;

/// Configuration surface for one session of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub game: GameKind,
    pub total_rounds: u32,

    // === Path tracking ===
    /// On-track band radius in play-area units
    pub tolerance: f32,
    /// Progress required at release
    pub completion_threshold: f32,
    /// Snap progress to 1.0 near the end of open paths
    pub snap_to_end: bool,
    /// Any excursion fails the attempt
    pub strict: bool,

    // === Timing ===
    /// Per-attempt timeout (None = untimed)
    pub timeout_ms: Option<u64>,
    /// Instruction display time before arming
    pub present_ms: u64,
    /// Feedback dwell after each resolution
    pub feedback_ms: u64,
    /// Go-signal delay range for signal games
    pub signal_delay_min_ms: u64,
    pub signal_delay_max_ms: u64,

    // === Scoring ===
    pub xp: XpRule,

    /// Seed for trial generation
    pub seed: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            game: GameKind::PathFollow,
            total_rounds: 5,
            tolerance: 25.0,
            completion_threshold: 0.9,
            snap_to_end: true,
            strict: false,
            timeout_ms: Some(8000),
            present_ms: 1500,
            feedback_ms: 1500,
            signal_delay_min_ms: 1000,
            signal_delay_max_ms: 2000,
            xp: XpRule::PerCorrect { xp: 10 },
            seed: 1,
        }
    }
}

impl GameSettings {
    /// Check the numeric ranges the engine relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.total_rounds == 0 {
            return Err(SettingsError::ZeroRounds);
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 || self.tolerance > 100.0 {
            return Err(SettingsError::RangeViolation {
                field: "tolerance",
                min: 0.0,
                max: 100.0,
                value: self.tolerance,
            });
        }
        if !(0.0..=1.0).contains(&self.completion_threshold) {
            return Err(SettingsError::RangeViolation {
                field: "completion_threshold",
                min: 0.0,
                max: 1.0,
                value: self.completion_threshold,
            });
        }
        let timings = [
            ("timeout_ms", self.timeout_ms.unwrap_or(0)),
            ("present_ms", self.present_ms),
            ("feedback_ms", self.feedback_ms),
            ("signal_delay_min_ms", self.signal_delay_min_ms),
            ("signal_delay_max_ms", self.signal_delay_max_ms),
        ];
        if let Some((field, value_ms)) = timings.into_iter().find(|(_, ms)| *ms > MAX_TIMING_MS) {
            return Err(SettingsError::TimingTooLong {
                field,
                value_ms,
                max_ms: MAX_TIMING_MS,
            });
        }
        if self.game.is_signal() {
            if self.signal_delay_min_ms > self.signal_delay_max_ms {
                return Err(SettingsError::RangeViolation {
                    field: "signal_delay_min_ms",
                    min: 0.0,
                    max: self.signal_delay_max_ms as f32,
                    value: self.signal_delay_min_ms as f32,
                });
            }
            if let Some(timeout_ms) = self.timeout_ms {
                if self.signal_delay_max_ms >= timeout_ms {
                    return Err(SettingsError::SignalWindow {
                        delay_ms: self.signal_delay_max_ms,
                        timeout_ms,
                    });
                }
            }
        }
        Ok(())
    }

    /// Read settings from a JSON file
    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings: GameSettings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to the preset for `game` on any error
    pub fn load(path: &Path, game: GameKind) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using {} preset ({})", game.as_str(), e);
                game.preset()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
