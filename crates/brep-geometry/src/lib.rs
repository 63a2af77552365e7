pub mod curve;
pub mod curve2;
pub mod edge_curve;
pub mod surface;

pub use curve::{CircularArc, Curve3, CurveKind, Line};
pub use curve2::{Arc2, Curve2, Line2};
pub use edge_curve::EdgeCurve;
pub use surface::{
    CylinderSurface, PlaneSurface, SphereSurface, SurfaceGeometry, SurfaceKind, SurfacePole,
};
