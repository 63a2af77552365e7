//! Trim curves in a face's 2D parameter domain.

use brep_math::Point2;
use serde::{Deserialize, Serialize};

use crate::CurveKind;

/// A line segment in parameter space from `start` to `end`, over `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line2 {
    pub start: Point2,
    pub end: Point2,
}

impl Line2 {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn point_at(&self, t: f64) -> Point2 {
        self.start + t * (self.end - self.start)
    }
}

/// A circular arc in parameter space, angle-parameterized over `[0, sweep]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc2 {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

impl Arc2 {
    pub fn new(center: Point2, radius: f64, start_angle: f64, sweep: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            sweep,
        }
    }

    pub fn point_at(&self, t: f64) -> Point2 {
        let a = self.start_angle + t;
        self.center + self.radius * Point2::new(a.cos(), a.sin())
    }
}

/// A trim curve mapping its parameter to `(u, v)` on the owning surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve2 {
    Line(Line2),
    Arc(Arc2),
}

impl Curve2 {
    pub fn point_at(&self, t: f64) -> Point2 {
        match self {
            Curve2::Line(c) => c.point_at(t),
            Curve2::Arc(c) => c.point_at(t),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        match self {
            Curve2::Line(_) => (0.0, 1.0),
            Curve2::Arc(c) => (0.0, c.sweep),
        }
    }

    pub fn kind(&self) -> CurveKind {
        match self {
            Curve2::Line(_) => CurveKind::Linear,
            Curve2::Arc(_) => CurveKind::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_math::DVec2;
    use std::f64::consts::PI;

    #[test]
    fn test_line2_endpoints() {
        let c = Curve2::Line(Line2::new(DVec2::new(0.0, 0.0), DVec2::new(2.0, 4.0)));
        let (t0, t1) = c.domain();
        assert!((c.point_at(t0) - DVec2::new(0.0, 0.0)).length() < 1e-12);
        assert!((c.point_at(t1) - DVec2::new(2.0, 4.0)).length() < 1e-12);
        assert_eq!(c.kind(), CurveKind::Linear);
    }

    #[test]
    fn test_arc2_quarter_turn() {
        let c = Curve2::Arc(Arc2::new(DVec2::ZERO, 1.0, 0.0, PI / 2.0));
        let (t0, t1) = c.domain();
        assert!((c.point_at(t0) - DVec2::new(1.0, 0.0)).length() < 1e-12);
        assert!((c.point_at(t1) - DVec2::new(0.0, 1.0)).length() < 1e-12);
        assert_eq!(c.kind(), CurveKind::General);
    }
}
