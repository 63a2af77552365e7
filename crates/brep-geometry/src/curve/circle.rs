//! Circular arc curve.

use std::f64::consts::TAU;

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A circular arc in 3D space, parameterized by angle over `[0, sweep]`.
///
/// The arc lies in the plane through `center` perpendicular to `normal`, with
/// `x_axis` the explicit reference direction for angle zero. The reference
/// direction is stored (not derived from the normal) so that seam and trim
/// locations on adjoining surfaces stay aligned with the arc parameterization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircularArc {
    pub center: Point3,
    pub normal: Vector3,
    pub x_axis: Vector3,
    pub radius: f64,
    pub sweep: f64,
}

impl CircularArc {
    pub fn new(center: Point3, normal: Vector3, x_axis: Vector3, radius: f64, sweep: f64) -> Self {
        Self {
            center,
            normal: normal.normalize(),
            x_axis: x_axis.normalize(),
            radius,
            sweep,
        }
    }

    /// A full circle (sweep of one turn).
    pub fn full_circle(center: Point3, normal: Vector3, x_axis: Vector3, radius: f64) -> Self {
        Self::new(center, normal, x_axis, radius, TAU)
    }

    fn y_axis(&self) -> Vector3 {
        self.normal.cross(self.x_axis).normalize()
    }

    pub fn point_at(&self, t: f64) -> Point3 {
        let y = self.y_axis();
        self.center + self.radius * (t.cos() * self.x_axis + t.sin() * y)
    }

    pub fn tangent_at(&self, t: f64) -> Vector3 {
        let y = self.y_axis();
        self.radius * (-t.sin() * self.x_axis + t.cos() * y)
    }

    pub fn domain(&self) -> (f64, f64) {
        (0.0, self.sweep)
    }

    pub fn is_closed(&self) -> bool {
        (self.sweep.abs() - TAU).abs() < 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_math::DVec3;
    use std::f64::consts::PI;

    #[test]
    fn test_arc_points_on_circle() {
        let arc = CircularArc::full_circle(DVec3::ZERO, DVec3::Z, DVec3::X, 1.0);
        for i in 0..8 {
            let t = i as f64 * PI / 4.0;
            let p = arc.point_at(t);
            assert!((p.length() - 1.0).abs() < 1e-10, "not on circle at t={t}");
            assert!(p.z.abs() < 1e-10, "not in plane at t={t}");
        }
    }

    #[test]
    fn test_arc_reference_direction() {
        let arc = CircularArc::full_circle(DVec3::ZERO, DVec3::Z, DVec3::X, 2.0);
        assert!((arc.point_at(0.0) - DVec3::new(2.0, 0.0, 0.0)).length() < 1e-10);
        assert!((arc.point_at(PI / 2.0) - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_arc_tangent_perpendicular_to_radius() {
        let arc = CircularArc::full_circle(DVec3::ZERO, DVec3::Z, DVec3::X, 1.0);
        for i in 0..8 {
            let t = i as f64 * PI / 4.0;
            let p = arc.point_at(t);
            let tang = arc.tangent_at(t);
            assert!(p.dot(tang).abs() < 1e-10, "tangent not perpendicular at t={t}");
        }
    }

    #[test]
    fn test_half_arc_is_open() {
        let arc = CircularArc::new(DVec3::ZERO, DVec3::Z, DVec3::X, 1.0, PI);
        assert!(!arc.is_closed());
        assert_eq!(arc.domain(), (0.0, PI));
        let full = CircularArc::full_circle(DVec3::ZERO, DVec3::Z, DVec3::X, 1.0);
        assert!(full.is_closed());
    }
}
