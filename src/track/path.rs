//! Path specifications and their sampled polyline form
//!
//! Every path is reduced to an ordered list of points plus the cumulative arc
//! length at each point. Distance and progress are always measured against this
//! sampled polyline, never the analytic curve, so sampling must be reproducible.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::BEZIER_SEGMENTS;

/// Geometric definition of the target a drag must follow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSpec {
    /// Straight segment
    Line { from: Vec2, to: Vec2 },
    /// Open multi-segment line
    Polyline { points: Vec<Vec2> },
    /// Cubic bezier, sampled at a fixed parameter step
    CubicBezier { p0: Vec2, c1: Vec2, c2: Vec2, p1: Vec2 },
    /// Closed outline; the last vertex connects back to the first
    Polygon { vertices: Vec<Vec2> },
}

impl PathSpec {
    pub fn is_closed(&self) -> bool {
        matches!(self, PathSpec::Polygon { .. })
    }
}

/// Reasons a path specification cannot become a model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("path needs at least {needed} points (got {got})")]
    TooFewPoints { needed: usize, got: usize },
    #[error("point {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("tolerance radius must be positive and finite (got {0})")]
    InvalidTolerance(f32),
    #[error("path has zero total length")]
    ZeroLength,
}

/// Sampled path geometry for one round
///
/// Immutable once built: `cumulative[0] == 0`, `cumulative` is non-decreasing and
/// has one entry per point, `tolerance > 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathModel {
    points: Vec<Vec2>,
    cumulative: Vec<f32>,
    /// Includes the closing edge for closed paths
    total_length: f32,
    closed: bool,
    tolerance: f32,
}

impl PathModel {
    /// Sample a path specification with the given tolerance radius
    pub fn build(spec: &PathSpec, tolerance: f32) -> Result<Self, PathError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(PathError::InvalidTolerance(tolerance));
        }

        let (points, needed) = match spec {
            PathSpec::Line { from, to } => (vec![*from, *to], 2),
            PathSpec::Polyline { points } => (points.clone(), 2),
            PathSpec::CubicBezier { p0, c1, c2, p1 } => (sample_cubic(*p0, *c1, *c2, *p1), 2),
            PathSpec::Polygon { vertices } => (vertices.clone(), 3),
        };

        if points.len() < needed {
            return Err(PathError::TooFewPoints {
                needed,
                got: points.len(),
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(PathError::NonFinite { index });
        }

        let closed = spec.is_closed();
        let mut cumulative = Vec::with_capacity(points.len());
        let mut running = 0.0;
        cumulative.push(running);
        for pair in points.windows(2) {
            running += pair[0].distance(pair[1]);
            cumulative.push(running);
        }

        let total_length = if closed {
            running + points[points.len() - 1].distance(points[0])
        } else {
            running
        };
        if !total_length.is_finite() || total_length <= 0.0 {
            return Err(PathError::ZeroLength);
        }

        Ok(Self {
            points,
            cumulative,
            total_length,
            closed,
            tolerance,
        })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Arc length from the first point to each point
    pub fn cumulative_length(&self) -> &[f32] {
        &self.cumulative
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    /// Final point of the traversal (the start again for closed paths)
    pub fn end(&self) -> Vec2 {
        if self.closed {
            self.points[0]
        } else {
            self.points[self.points.len() - 1]
        }
    }

    /// Number of segments, counting the closing edge of closed paths
    pub fn segment_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    /// Endpoints of segment `i` (wraps to the first point on the closing edge)
    #[inline]
    pub fn segment(&self, i: usize) -> (Vec2, Vec2) {
        let a = self.points[i];
        let b = self.points[(i + 1) % self.points.len()];
        (a, b)
    }

    #[inline]
    pub fn segment_length(&self, i: usize) -> f32 {
        let (a, b) = self.segment(i);
        a.distance(b)
    }

    /// Point at a normalized arc-length position along the path
    pub fn point_at(&self, progress: f32) -> Vec2 {
        let target = progress.clamp(0.0, 1.0) * self.total_length;
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let start = self.cumulative[i];
            let len = self.segment_length(i);
            if target <= start + len {
                if len <= 0.0 {
                    return a;
                }
                return a.lerp(b, ((target - start) / len).clamp(0.0, 1.0));
            }
        }
        self.end()
    }
}

/// Sample a cubic bezier at t = 0, 0.01, ..., 1.0
fn sample_cubic(p0: Vec2, c1: Vec2, c2: Vec2, p1: Vec2) -> Vec<Vec2> {
    (0..=BEZIER_SEGMENTS)
        .map(|i| {
            let t = i as f32 / BEZIER_SEGMENTS as f32;
            let u = 1.0 - t;
            p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn test_line_model() {
        let model = PathModel::build(
            &PathSpec::Line {
                from: v(0.0, 0.0),
                to: v(30.0, 40.0),
            },
            20.0,
        )
        .unwrap();
        assert_eq!(model.points().len(), 2);
        assert_eq!(model.cumulative_length(), &[0.0_f32, 50.0]);
        assert_eq!(model.total_length(), 50.0);
        assert!(!model.is_closed());
        assert_eq!(model.segment_count(), 1);
        assert_eq!(model.end(), v(30.0, 40.0));
    }

    #[test]
    fn test_bezier_sampling_density() {
        let spec = PathSpec::CubicBezier {
            p0: v(10.0, 50.0),
            c1: v(30.0, 10.0),
            c2: v(70.0, 90.0),
            p1: v(90.0, 50.0),
        };
        let model = PathModel::build(&spec, 25.0).unwrap();
        assert_eq!(model.points().len(), 101);
        assert_eq!(model.start(), v(10.0, 50.0));
        assert!(model.end().distance(v(90.0, 50.0)) < 1e-4);

        // B(0.5) = (p0 + 3c1 + 3c2 + p1) / 8
        let mid = model.points()[50];
        let expected = (v(10.0, 50.0) + 3.0 * v(30.0, 10.0) + 3.0 * v(70.0, 90.0) + v(90.0, 50.0)) / 8.0;
        assert!(mid.distance(expected) < 1e-4);

        let cum = model.cumulative_length();
        assert!(cum.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_polygon_includes_closing_edge() {
        let spec = PathSpec::Polygon {
            vertices: vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0), v(0.0, 10.0)],
        };
        let model = PathModel::build(&spec, 15.0).unwrap();
        assert!(model.is_closed());
        assert_eq!(model.cumulative_length(), &[0.0_f32, 10.0, 20.0, 30.0]);
        assert_eq!(model.total_length(), 40.0);
        assert_eq!(model.segment_count(), 4);
        assert_eq!(model.segment(3), (v(0.0, 10.0), v(0.0, 0.0)));
        assert_eq!(model.end(), model.start());
    }

    #[test]
    fn test_rejects_bad_specs() {
        assert_eq!(
            PathModel::build(&PathSpec::Polyline { points: vec![] }, 10.0),
            Err(PathError::TooFewPoints { needed: 2, got: 0 })
        );
        assert_eq!(
            PathModel::build(
                &PathSpec::Polygon {
                    vertices: vec![v(0.0, 0.0), v(1.0, 1.0)]
                },
                10.0
            ),
            Err(PathError::TooFewPoints { needed: 3, got: 2 })
        );
        assert_eq!(
            PathModel::build(
                &PathSpec::Line {
                    from: v(5.0, 5.0),
                    to: v(5.0, 5.0)
                },
                10.0
            ),
            Err(PathError::ZeroLength)
        );
        assert_eq!(
            PathModel::build(
                &PathSpec::Line {
                    from: v(0.0, 0.0),
                    to: v(f32::NAN, 5.0)
                },
                10.0
            ),
            Err(PathError::NonFinite { index: 1 })
        );
        assert!(matches!(
            PathModel::build(
                &PathSpec::Line {
                    from: v(0.0, 0.0),
                    to: v(1.0, 0.0)
                },
                0.0
            ),
            Err(PathError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn test_point_at() {
        let spec = PathSpec::Polyline {
            points: vec![v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0)],
        };
        let model = PathModel::build(&spec, 10.0).unwrap();
        assert_eq!(model.point_at(0.0), v(0.0, 0.0));
        assert!(model.point_at(0.25).distance(v(5.0, 0.0)) < 1e-5);
        assert!(model.point_at(0.75).distance(v(10.0, 5.0)) < 1e-5);
        assert_eq!(model.point_at(2.0), v(10.0, 10.0));
    }

    #[test]
    fn test_spec_json_shape() {
        let spec = PathSpec::Line {
            from: v(0.0, 0.0),
            to: v(1.0, 2.0),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"line\""));
        let back: PathSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
