use brep_geometry::{Curve2, EdgeCurve, SurfaceGeometry};
use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// --- SlotMap key types ---

new_key_type! {
    pub struct VertexId;
    pub struct EdgeId;
    pub struct TrimId;
    pub struct LoopId;
    pub struct FaceId;
}

// --- Entity structs ---

/// A 3D point shared by the model edges that terminate there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3,
    /// Precomputed average normal, used at singular and seam vertices where the
    /// surface normal is ambiguous or degenerate.
    pub normal: Option<Vector3>,
}

/// A 3D curve shared by exactly two trims on two (possibly identical) faces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub curve: EdgeCurve,
    pub start: VertexId,
    pub end: VertexId,
    /// The two trims that reference this edge, one per adjoining face side.
    pub trims: Option<(TrimId, TrimId)>,
}

/// A curve segment in a face's 2D parameter domain, bounding a loop.
///
/// A trim with `edge: None` is singular: its entire parameter extent maps to a
/// single 3D point (a surface pole).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trim {
    pub face: FaceId,
    pub loop_id: Option<LoopId>,
    /// Maps the trim parameter to `(u, v)` on the owning face's surface, running
    /// in loop direction.
    pub curve: Curve2,
    pub edge: Option<EdgeId>,
    /// Whether the trim runs opposite to its edge curve's direction.
    pub reversed: bool,
    pub start: VertexId,
    pub end: VertexId,
}

impl Trim {
    pub fn is_singular(&self) -> bool {
        self.edge.is_none()
    }
}

/// An ordered, closed cycle of trims bounding a face (outer) or a hole (inner).
///
/// Outer loops run counter-clockwise in the face's parameter domain, inner
/// loops clockwise; the face `reversed` flag only flips output orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub face: FaceId,
    pub trims: Vec<TrimId>,
}

/// A bounded region of one parametric surface, trimmed by loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub surface: SurfaceGeometry,
    pub outer_loop: Option<LoopId>,
    pub inner_loops: Vec<LoopId>,
    /// Whether the face's outward normal opposes the surface normal.
    pub reversed: bool,
}
