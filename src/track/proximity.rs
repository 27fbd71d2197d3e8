//! Nearest-segment proximity queries
//!
//! A query point is projected onto every segment of the sampled path; the
//! globally closest projection wins. O(segment count) per query, which stays
//! cheap for the ~100-segment paths the games use.

use glam::Vec2;
use serde::Serialize;

use super::path::PathModel;
use crate::consts::DEGENERATE_LEN_SQ;

/// Result of evaluating one pointer sample against a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Proximity {
    /// The query point
    pub point: Vec2,
    /// Closest point on the path
    pub closest: Vec2,
    /// Distance from `point` to `closest`
    pub distance: f32,
    /// Index of the winning segment
    pub segment_index: usize,
    /// Position of `closest` along the winning segment, in [0, 1]
    pub segment_param: f32,
}

impl Proximity {
    /// Normalized arc-length position of the projection along the whole path
    pub fn arc_progress(&self, model: &PathModel) -> f32 {
        let along = model.cumulative_length()[self.segment_index]
            + self.segment_param * model.segment_length(self.segment_index);
        (along / model.total_length()).clamp(0.0, 1.0)
    }

    pub fn within(&self, radius: f32) -> bool {
        self.distance <= radius
    }
}

/// Closest point on segment `a -> b` to `p`, via scalar projection
///
/// Returns `(t, closest)` with `t` clamped to [0, 1]. Zero-length segments fall
/// back to the point `a`.
#[inline]
pub fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (f32, Vec2) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < DEGENERATE_LEN_SQ {
        return (0.0, a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (t, a + ab * t)
}

/// Evaluate a query point against every segment of the model
pub fn evaluate(point: Vec2, model: &PathModel) -> Proximity {
    let (a, b) = model.segment(0);
    let (t, closest) = closest_on_segment(point, a, b);
    let mut best = Proximity {
        point,
        closest,
        distance: point.distance(closest),
        segment_index: 0,
        segment_param: t,
    };

    for i in 1..model.segment_count() {
        let (a, b) = model.segment(i);
        let (t, closest) = closest_on_segment(point, a, b);
        let distance = point.distance(closest);
        // Strict comparison: the earliest segment wins ties at shared vertices
        if distance < best.distance {
            best = Proximity {
                point,
                closest,
                distance,
                segment_index: i,
                segment_param: t,
            };
        }
    }

    best
}
