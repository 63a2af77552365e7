//! Spherical surface.

use std::f64::consts::{FRAC_PI_2, TAU};

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::SurfacePole;

/// A spherical surface parameterized by longitude `u` in `[0, 2*PI]` and
/// latitude `v` in `[-PI/2, PI/2]`.
///
/// `P(u, v) = center + radius * (cos(v)*cos(u), cos(v)*sin(u), sin(v))`
///
/// Both latitude extremes are parametric poles: every `u` maps to the same 3D
/// point there, and the derivative-based normal degenerates even though the
/// geometric (radial) normal stays well defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereSurface {
    pub center: Point3,
    pub radius: f64,
}

impl SphereSurface {
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        let x = self.radius * v.cos() * u.cos();
        let y = self.radius * v.cos() * u.sin();
        let z = self.radius * v.sin();
        self.center + Point3::new(x, y, z)
    }

    pub fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        Vector3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin()).normalize()
    }

    pub fn domain_u(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    pub fn domain_v(&self) -> (f64, f64) {
        (-FRAC_PI_2, FRAC_PI_2)
    }

    pub fn period_u(&self) -> f64 {
        TAU
    }

    pub fn poles(&self) -> Vec<SurfacePole> {
        vec![
            SurfacePole {
                v: -FRAC_PI_2,
                point: self.center - self.radius * Vector3::Z,
                normal: -Vector3::Z,
            },
            SurfacePole {
                v: FRAC_PI_2,
                point: self.center + self.radius * Vector3::Z,
                normal: Vector3::Z,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_sphere_points_on_sphere() {
        let sphere = SphereSurface::new(Point3::ZERO, 3.0);
        for i in 0..8 {
            for j in 0..4 {
                let u = i as f64 * PI / 4.0;
                let v = -FRAC_PI_2 + j as f64 * PI / 3.0;
                let p = sphere.point_at(u, v);
                assert!((p.length() - 3.0).abs() < 1e-10, "not on sphere at u={u} v={v}");
            }
        }
    }

    #[test]
    fn test_sphere_poles_collapse() {
        let sphere = SphereSurface::new(Point3::ZERO, 1.0);
        let north_a = sphere.point_at(0.0, FRAC_PI_2);
        let north_b = sphere.point_at(PI, FRAC_PI_2);
        assert!((north_a - north_b).length() < 1e-10);
        assert!((north_a - Point3::Z).length() < 1e-10);
    }

    #[test]
    fn test_sphere_pole_normals() {
        let sphere = SphereSurface::new(Point3::new(1.0, 2.0, 3.0), 2.0);
        let poles = sphere.poles();
        assert_eq!(poles.len(), 2);
        assert!((poles[0].point - Point3::new(1.0, 2.0, 1.0)).length() < 1e-10);
        assert!((poles[1].point - Point3::new(1.0, 2.0, 5.0)).length() < 1e-10);
        assert!((poles[0].normal + Vector3::Z).length() < 1e-10);
        assert!((poles[1].normal - Vector3::Z).length() < 1e-10);
    }

    #[test]
    fn test_sphere_normal_outward() {
        let sphere = SphereSurface::new(Point3::ZERO, 2.0);
        for i in 0..8 {
            let u = i as f64 * PI / 4.0;
            let p = sphere.point_at(u, 0.3);
            let n = sphere.normal_at(u, 0.3);
            assert!((n - p.normalize()).length() < 1e-10, "normal not radial at u={u}");
        }
    }
}
