//! Cylindrical surface.

use std::f64::consts::TAU;

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A cylindrical surface parameterized by angle `u` in `[0, 2*PI]` and height `v`.
///
/// `P(u, v) = origin + radius * (cos(u) * x_axis + sin(u) * y_axis) + v * axis`
///
/// The reference direction `x_axis` is stored explicitly so the parametric seam
/// (`u = 0` meeting `u = 2*PI`) lands at a known 3D location that adjoining
/// edge curves can share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CylinderSurface {
    pub origin: Point3,
    pub axis: Vector3,
    pub x_axis: Vector3,
    pub radius: f64,
}

impl CylinderSurface {
    pub fn new(origin: Point3, axis: Vector3, x_axis: Vector3, radius: f64) -> Self {
        Self {
            origin,
            axis: axis.normalize(),
            x_axis: x_axis.normalize(),
            radius,
        }
    }

    fn y_axis(&self) -> Vector3 {
        self.axis.cross(self.x_axis).normalize()
    }

    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        let y = self.y_axis();
        self.origin + self.radius * (u.cos() * self.x_axis + u.sin() * y) + v * self.axis
    }

    pub fn normal_at(&self, u: f64, _v: f64) -> Vector3 {
        let y = self.y_axis();
        (u.cos() * self.x_axis + u.sin() * y).normalize()
    }

    pub fn domain_u(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    pub fn domain_v(&self) -> (f64, f64) {
        (-1e6, 1e6)
    }

    pub fn period_u(&self) -> f64 {
        TAU
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_cylinder_points_on_cylinder() {
        let cyl = CylinderSurface::new(Point3::ZERO, Vector3::Z, Vector3::X, 2.0);
        for i in 0..8 {
            let u = i as f64 * PI / 4.0;
            let p = cyl.point_at(u, 0.0);
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 2.0).abs() < 1e-10, "not on cylinder at u={u}: r={r}");
            assert!(p.z.abs() < 1e-10);
        }
    }

    #[test]
    fn test_cylinder_seam_location() {
        let cyl = CylinderSurface::new(Point3::ZERO, Vector3::Z, Vector3::X, 1.0);
        let seam_start = cyl.point_at(0.0, 0.0);
        let seam_end = cyl.point_at(TAU, 0.0);
        assert!((seam_start - Point3::new(1.0, 0.0, 0.0)).length() < 1e-10);
        assert!((seam_start - seam_end).length() < 1e-10);
    }

    #[test]
    fn test_cylinder_normal_outward() {
        let cyl = CylinderSurface::new(Point3::ZERO, Vector3::Z, Vector3::X, 1.0);
        for i in 0..8 {
            let u = i as f64 * PI / 4.0;
            let n = cyl.normal_at(u, 0.0);
            let p = cyl.point_at(u, 0.0);
            let radial = Point3::new(p.x, p.y, 0.0).normalize();
            assert!((n - radial).length() < 1e-10, "normal not outward at u={u}");
        }
    }
}
