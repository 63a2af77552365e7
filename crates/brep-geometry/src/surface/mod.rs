//! Parametric surfaces.
//!
//! Like curves, the surface kind set is fixed, so surfaces form a closed tagged
//! variant dispatched by pattern matching.

mod cylinder;
mod plane;
mod sphere;

use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub use cylinder::CylinderSurface;
pub use plane::PlaneSurface;
pub use sphere::SphereSurface;

/// Coarse classification of a surface's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    Planar,
    General,
}

/// A parametric degeneracy: an entire iso-parameter line collapsing to one 3D
/// point (e.g. a sphere pole).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurfacePole {
    /// The degenerate `v` iso-line (all `u` map to `point` at this `v`)
    pub v: f64,
    pub point: Point3,
    /// The well-defined geometric normal at the pole
    pub normal: Vector3,
}

/// A parametric surface in 3D space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SurfaceGeometry {
    Plane(PlaneSurface),
    Cylinder(CylinderSurface),
    Sphere(SphereSurface),
}

impl SurfaceGeometry {
    /// Evaluate the surface at parameters `(u, v)`.
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        match self {
            SurfaceGeometry::Plane(s) => s.point_at(u, v),
            SurfaceGeometry::Cylinder(s) => s.point_at(u, v),
            SurfaceGeometry::Sphere(s) => s.point_at(u, v),
        }
    }

    /// Evaluate the unit surface normal at parameters `(u, v)`.
    pub fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        match self {
            SurfaceGeometry::Plane(s) => s.normal_at(u, v),
            SurfaceGeometry::Cylinder(s) => s.normal_at(u, v),
            SurfaceGeometry::Sphere(s) => s.normal_at(u, v),
        }
    }

    /// Return the u-parameter domain `(u_min, u_max)`.
    pub fn domain_u(&self) -> (f64, f64) {
        match self {
            SurfaceGeometry::Plane(s) => s.domain_u(),
            SurfaceGeometry::Cylinder(s) => s.domain_u(),
            SurfaceGeometry::Sphere(s) => s.domain_u(),
        }
    }

    /// Return the v-parameter domain `(v_min, v_max)`.
    pub fn domain_v(&self) -> (f64, f64) {
        match self {
            SurfaceGeometry::Plane(s) => s.domain_v(),
            SurfaceGeometry::Cylinder(s) => s.domain_v(),
            SurfaceGeometry::Sphere(s) => s.domain_v(),
        }
    }

    /// Period of the closed `u` direction, if the surface is periodic in `u`.
    pub fn period_u(&self) -> Option<f64> {
        match self {
            SurfaceGeometry::Plane(_) => None,
            SurfaceGeometry::Cylinder(s) => Some(s.period_u()),
            SurfaceGeometry::Sphere(s) => Some(s.period_u()),
        }
    }

    /// Period of the closed `v` direction, if the surface is periodic in `v`.
    pub fn period_v(&self) -> Option<f64> {
        None
    }

    /// Parametric poles (degenerate iso-lines) of the surface.
    pub fn poles(&self) -> Vec<SurfacePole> {
        match self {
            SurfaceGeometry::Sphere(s) => s.poles(),
            _ => Vec::new(),
        }
    }

    pub fn kind(&self) -> SurfaceKind {
        match self {
            SurfaceGeometry::Plane(_) => SurfaceKind::Planar,
            SurfaceGeometry::Cylinder(_) | SurfaceGeometry::Sphere(_) => SurfaceKind::General,
        }
    }

    /// Whether the surface is periodic in either parameter direction.
    pub fn is_periodic(&self) -> bool {
        self.period_u().is_some() || self.period_v().is_some()
    }
}

impl From<PlaneSurface> for SurfaceGeometry {
    fn from(s: PlaneSurface) -> Self {
        SurfaceGeometry::Plane(s)
    }
}

impl From<CylinderSurface> for SurfaceGeometry {
    fn from(s: CylinderSurface) -> Self {
        SurfaceGeometry::Cylinder(s)
    }
}

impl From<SphereSurface> for SurfaceGeometry {
    fn from(s: SphereSurface) -> Self {
        SurfaceGeometry::Sphere(s)
    }
}
