//! Planar surface.

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An infinite planar surface parameterized by `origin + u * u_axis + v * v_axis`.
///
/// The domain is `[-1e6, 1e6]` in both directions (effectively infinite); trims
/// bound the actual face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneSurface {
    pub origin: Point3,
    pub u_axis: Vector3,
    pub v_axis: Vector3,
}

impl PlaneSurface {
    pub fn new(origin: Point3, u_axis: Vector3, v_axis: Vector3) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
        }
    }

    /// XY plane centered at the origin.
    pub fn xy() -> Self {
        Self::new(Point3::ZERO, Vector3::X, Vector3::Y)
    }

    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.origin + u * self.u_axis + v * self.v_axis
    }

    pub fn normal_at(&self, _u: f64, _v: f64) -> Vector3 {
        let n = self.u_axis.cross(self.v_axis);
        let len = n.length();
        if len < 1e-15 {
            Vector3::Z
        } else {
            n / len
        }
    }

    pub fn domain_u(&self) -> (f64, f64) {
        (-1e6, 1e6)
    }

    pub fn domain_v(&self) -> (f64, f64) {
        (-1e6, 1e6)
    }
}
