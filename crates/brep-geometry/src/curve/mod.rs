//! 3D model-edge curves.
//!
//! The curve kind set is fixed and known at design time, so curves are a closed
//! tagged variant dispatched by pattern matching rather than a trait object.

mod circle;
mod line;

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub use circle::CircularArc;
pub use line::Line;

/// Coarse classification of a curve's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveKind {
    Linear,
    General,
}

/// A parametric curve in 3D space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve3 {
    Line(Line),
    Arc(CircularArc),
}

impl Curve3 {
    /// Evaluate the curve at parameter `t`.
    pub fn point_at(&self, t: f64) -> Point3 {
        match self {
            Curve3::Line(c) => c.point_at(t),
            Curve3::Arc(c) => c.point_at(t),
        }
    }

    /// Evaluate the (non-normalized) tangent vector at parameter `t`.
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        match self {
            Curve3::Line(c) => c.tangent_at(t),
            Curve3::Arc(c) => c.tangent_at(t),
        }
    }

    /// Return the parameter domain `(t_min, t_max)`.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Curve3::Line(c) => c.domain(),
            Curve3::Arc(c) => c.domain(),
        }
    }

    /// Whether the curve's start and end coincide.
    pub fn is_closed(&self) -> bool {
        match self {
            Curve3::Line(_) => false,
            Curve3::Arc(c) => c.is_closed(),
        }
    }

    pub fn kind(&self) -> CurveKind {
        match self {
            Curve3::Line(_) => CurveKind::Linear,
            Curve3::Arc(_) => CurveKind::General,
        }
    }
}

impl From<Line> for Curve3 {
    fn from(line: Line) -> Self {
        Curve3::Line(line)
    }
}

impl From<CircularArc> for Curve3 {
    fn from(arc: CircularArc) -> Self {
        Curve3::Arc(arc)
    }
}
