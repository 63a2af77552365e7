use brep_core::error::{BrepError, Result};
use brep_geometry::{Curve2, EdgeCurve, SurfaceGeometry};
use brep_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::types::*;

/// A boundary-representation solid: faces trimmed by loops of edges and
/// singular trims, with shared vertices.
///
/// The solid is the read-only input of tessellation; builders fill it once and
/// the mesh engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solid {
    pub vertices: SlotMap<VertexId, Vertex>,
    pub edges: SlotMap<EdgeId, Edge>,
    pub trims: SlotMap<TrimId, Trim>,
    pub loops: SlotMap<LoopId, Loop>,
    pub faces: SlotMap<FaceId, Face>,
}

impl Solid {
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            trims: SlotMap::with_key(),
            loops: SlotMap::with_key(),
            faces: SlotMap::with_key(),
        }
    }

    pub fn add_vertex(&mut self, position: Point3) -> VertexId {
        self.vertices.insert(Vertex {
            position,
            normal: None,
        })
    }

    pub fn add_vertex_with_normal(&mut self, position: Point3, normal: Vector3) -> VertexId {
        self.vertices.insert(Vertex {
            position,
            normal: Some(normal),
        })
    }

    pub fn add_face(&mut self, surface: SurfaceGeometry, reversed: bool) -> FaceId {
        self.faces.insert(Face {
            surface,
            outer_loop: None,
            inner_loops: Vec::new(),
            reversed,
        })
    }

    /// Create a trim on `face`; its edge is attached later via [`Self::make_edge`].
    pub fn add_trim(
        &mut self,
        face: FaceId,
        curve: Curve2,
        start: VertexId,
        end: VertexId,
    ) -> TrimId {
        self.trims.insert(Trim {
            face,
            loop_id: None,
            curve,
            edge: None,
            reversed: false,
            start,
            end,
        })
    }

    /// Create a singular trim: a degenerate trim whose entire extent maps to
    /// one 3D vertex (a surface pole). It never receives an edge.
    pub fn add_singular_trim(&mut self, face: FaceId, curve: Curve2, vertex: VertexId) -> TrimId {
        self.trims.insert(Trim {
            face,
            loop_id: None,
            curve,
            edge: None,
            reversed: false,
            start: vertex,
            end: vertex,
        })
    }

    /// Assemble ordered trims into the outer loop of `face`.
    pub fn make_outer_loop(&mut self, face: FaceId, trims: Vec<TrimId>) -> Result<LoopId> {
        let loop_id = self.make_loop(face, trims)?;
        let f = self
            .faces
            .get_mut(face)
            .ok_or_else(|| BrepError::NotFound("face".into()))?;
        if f.outer_loop.is_some() {
            return Err(BrepError::InvalidOperation(
                "face already has an outer loop".into(),
            ));
        }
        f.outer_loop = Some(loop_id);
        Ok(loop_id)
    }

    /// Assemble ordered trims into a hole loop of `face`.
    pub fn make_inner_loop(&mut self, face: FaceId, trims: Vec<TrimId>) -> Result<LoopId> {
        let loop_id = self.make_loop(face, trims)?;
        let f = self
            .faces
            .get_mut(face)
            .ok_or_else(|| BrepError::NotFound("face".into()))?;
        f.inner_loops.push(loop_id);
        Ok(loop_id)
    }

    fn make_loop(&mut self, face: FaceId, trims: Vec<TrimId>) -> Result<LoopId> {
        if trims.is_empty() {
            return Err(BrepError::InvalidOperation("empty loop".into()));
        }
        for window in trims.windows(2) {
            let a = &self.trims[window[0]];
            let b = &self.trims[window[1]];
            if a.end != b.start {
                return Err(BrepError::Topology("loop trims do not chain".into()));
            }
        }
        let first = &self.trims[trims[0]];
        let last = &self.trims[trims[trims.len() - 1]];
        if last.end != first.start {
            return Err(BrepError::Topology("loop is not closed".into()));
        }

        let loop_id = self.loops.insert(Loop {
            face,
            trims: trims.clone(),
        });
        for t in trims {
            self.trims[t].loop_id = Some(loop_id);
        }
        Ok(loop_id)
    }

    /// Create a model edge joining two trims on their (possibly identical) faces.
    ///
    /// `reversed_a` / `reversed_b` say whether each trim runs opposite to the
    /// edge curve's direction.
    #[allow(clippy::too_many_arguments)]
    pub fn make_edge(
        &mut self,
        curve: EdgeCurve,
        start: VertexId,
        end: VertexId,
        trim_a: TrimId,
        reversed_a: bool,
        trim_b: TrimId,
        reversed_b: bool,
    ) -> Result<EdgeId> {
        for &(t, _) in &[(trim_a, reversed_a), (trim_b, reversed_b)] {
            let trim = self
                .trims
                .get(t)
                .ok_or_else(|| BrepError::NotFound("trim".into()))?;
            if trim.edge.is_some() {
                return Err(BrepError::Topology("trim already has an edge".into()));
            }
        }

        let edge_id = self.edges.insert(Edge {
            curve,
            start,
            end,
            trims: Some((trim_a, trim_b)),
        });
        self.trims[trim_a].edge = Some(edge_id);
        self.trims[trim_a].reversed = reversed_a;
        self.trims[trim_b].edge = Some(edge_id);
        self.trims[trim_b].reversed = reversed_b;
        Ok(edge_id)
    }

    /// All loops of a face, outer first.
    pub fn face_loops(&self, face: FaceId) -> Vec<LoopId> {
        let f = &self.faces[face];
        let mut out = Vec::with_capacity(1 + f.inner_loops.len());
        if let Some(outer) = f.outer_loop {
            out.push(outer);
        }
        out.extend(f.inner_loops.iter().copied());
        out
    }

    /// The trim of `edge` that lies on the opposite side from `trim`.
    pub fn mate_trim(&self, edge: EdgeId, trim: TrimId) -> Option<TrimId> {
        let (a, b) = self.edges.get(edge)?.trims?;
        if a == trim {
            Some(b)
        } else if b == trim {
            Some(a)
        } else {
            None
        }
    }
}

impl Default for Solid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brep_geometry::{Line, Line2, PlaneSurface};
    use brep_math::{DVec2, DVec3};

    fn square_trims(solid: &mut Solid, face: FaceId) -> (Vec<TrimId>, Vec<VertexId>) {
        let corners = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let verts: Vec<VertexId> = corners.iter().map(|&p| solid.add_vertex(p)).collect();
        let mut trims = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let curve = Curve2::Line(Line2::new(DVec2::new(a.x, a.y), DVec2::new(b.x, b.y)));
            trims.push(solid.add_trim(face, curve, verts[i], verts[(i + 1) % 4]));
        }
        (trims, verts)
    }

    #[test]
    fn test_make_outer_loop() {
        let mut solid = Solid::new();
        let face = solid.add_face(PlaneSurface::xy().into(), false);
        let (trims, _) = square_trims(&mut solid, face);
        let loop_id = solid.make_outer_loop(face, trims).unwrap();
        assert_eq!(solid.faces[face].outer_loop, Some(loop_id));
        assert_eq!(solid.loops[loop_id].trims.len(), 4);
    }

    #[test]
    fn test_unclosed_loop_rejected() {
        let mut solid = Solid::new();
        let face = solid.add_face(PlaneSurface::xy().into(), false);
        let (mut trims, _) = square_trims(&mut solid, face);
        trims.pop();
        assert!(solid.make_outer_loop(face, trims).is_err());
    }

    #[test]
    fn test_make_edge_links_both_trims() {
        let mut solid = Solid::new();
        let fa = solid.add_face(PlaneSurface::xy().into(), false);
        let fb = solid.add_face(PlaneSurface::xy().into(), false);
        let v0 = solid.add_vertex(DVec3::ZERO);
        let v1 = solid.add_vertex(DVec3::X);
        let c = Curve2::Line(Line2::new(DVec2::ZERO, DVec2::X));
        let ta = solid.add_trim(fa, c.clone(), v0, v1);
        let tb = solid.add_trim(fb, c, v1, v0);
        let curve = EdgeCurve::new(Line::new(DVec3::ZERO, DVec3::X).into());
        let e = solid.make_edge(curve, v0, v1, ta, false, tb, true).unwrap();

        assert_eq!(solid.trims[ta].edge, Some(e));
        assert_eq!(solid.trims[tb].edge, Some(e));
        assert!(solid.trims[tb].reversed);
        assert_eq!(solid.mate_trim(e, ta), Some(tb));
        assert_eq!(solid.mate_trim(e, tb), Some(ta));
    }

    #[test]
    fn test_edge_rejects_claimed_trim() {
        let mut solid = Solid::new();
        let fa = solid.add_face(PlaneSurface::xy().into(), false);
        let v0 = solid.add_vertex(DVec3::ZERO);
        let v1 = solid.add_vertex(DVec3::X);
        let c = Curve2::Line(Line2::new(DVec2::ZERO, DVec2::X));
        let ta = solid.add_trim(fa, c.clone(), v0, v1);
        let tb = solid.add_trim(fa, c.clone(), v1, v0);
        let tc = solid.add_trim(fa, c, v1, v0);
        let curve = EdgeCurve::new(Line::new(DVec3::ZERO, DVec3::X).into());
        solid
            .make_edge(curve.clone(), v0, v1, ta, false, tb, true)
            .unwrap();
        assert!(solid.make_edge(curve, v0, v1, ta, false, tc, true).is_err());
    }
}
