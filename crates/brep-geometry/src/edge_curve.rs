//! Normalized model-edge curves.

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Curve3, CurveKind};

/// Chord count used to estimate the control-polygon length.
const LENGTH_SAMPLES: usize = 16;

/// A model-edge curve reparameterized onto `[0, control-polygon length]`.
///
/// Normalizing the parameter to an arc-length-like scale makes tolerance
/// comparisons on parameter intervals scale-consistent across edges of very
/// different sizes. Read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCurve {
    curve: Curve3,
    t_min: f64,
    t_max: f64,
    length: f64,
}

impl EdgeCurve {
    pub fn new(curve: Curve3) -> Self {
        let (t_min, t_max) = curve.domain();
        let mut length = 0.0;
        let mut prev = curve.point_at(t_min);
        for i in 1..=LENGTH_SAMPLES {
            let t = t_min + (t_max - t_min) * i as f64 / LENGTH_SAMPLES as f64;
            let p = curve.point_at(t);
            length += (p - prev).length();
            prev = p;
        }
        // Zero-length edges keep a unit parameterization so the domain stays valid
        if length < 1e-15 {
            length = 1.0;
        }
        Self {
            curve,
            t_min,
            t_max,
            length,
        }
    }

    /// The normalized domain `(0, control-polygon length)`.
    pub fn domain(&self) -> (f64, f64) {
        (0.0, self.length)
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    fn to_native(&self, s: f64) -> f64 {
        self.t_min + (self.t_max - self.t_min) * (s / self.length)
    }

    /// Evaluate at normalized parameter `s` in `[0, length]`.
    pub fn point_at(&self, s: f64) -> Point3 {
        self.curve.point_at(self.to_native(s))
    }

    /// Unit tangent at normalized parameter `s`.
    pub fn tangent_at(&self, s: f64) -> Vector3 {
        let t = self.curve.tangent_at(self.to_native(s));
        let len = t.length();
        if len < 1e-15 {
            Vector3::ZERO
        } else {
            t / len
        }
    }

    pub fn kind(&self) -> CurveKind {
        self.curve.kind()
    }

    pub fn is_closed(&self) -> bool {
        self.curve.is_closed()
    }
}
