//! Trace Trainer - path tracking and round lifecycle for fine-motor therapy games
//!
//! Core modules:
//! - `track`: Deterministic path geometry (sampling, proximity, progress)
//! - `round`: Per-trial state machine, trial generation, autoplay
//! - `score`: Session tallies and XP
//! - `session`: Routes engine notices to presentation and persistence
//! - `persistence`: Session summary hand-off
//! - `settings`: Per-game presets

pub mod persistence;
pub mod round;
pub mod score;
pub mod session;
pub mod settings;
pub mod track;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use score::{ScoreKeeper, SessionSummary, XpRule};
pub use session::{Presenter, Session};
pub use settings::{GameKind, GameSettings};

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Bezier sampling: Δt = 0.01, i.e. 100 segments / 101 points
    pub const BEZIER_SEGMENTS: usize = 100;

    /// Minimum time between two off-track warnings
    pub const WARNING_INTERVAL_MS: u64 = 500;

    /// Closed-path wrap detection: a candidate below `WRAP_LOW` while recorded
    /// progress is above `WRAP_HIGH` counts as crossing the seam
    pub const WRAP_LOW: f32 = 0.1;
    pub const WRAP_HIGH: f32 = 0.9;

    /// Play-area extent in both axes (percent of width/height)
    pub const PLAY_AREA: f32 = 100.0;

    /// Squared segment length below which a segment is treated as a point
    pub const DEGENERATE_LEN_SQ: f32 = 1e-9;
}

/// Convert a pixel position inside a `width` x `height` area to play-area
/// coordinates (0-100 on both axes)
#[inline]
pub fn to_play_area(px: f32, py: f32, width: f32, height: f32) -> Vec2 {
    let w = width.max(1.0);
    let h = height.max(1.0);
    Vec2::new(px / w * consts::PLAY_AREA, py / h * consts::PLAY_AREA)
}

/// Convert play-area coordinates back to pixels
#[inline]
pub fn from_play_area(point: Vec2, width: f32, height: f32) -> (f32, f32) {
    (
        point.x / consts::PLAY_AREA * width,
        point.y / consts::PLAY_AREA * height,
    )
}
