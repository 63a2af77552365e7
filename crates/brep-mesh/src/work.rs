//! Per-run mutable tessellation state.
//!
//! All maps are indexed by slotmap keys or plain indices and live only for the
//! duration of one tessellation run: built at run start, mutated during
//! refinement, consumed by triangulation, discarded at run end. Slotmap
//! generations make a stale segment key (held across a split) detectable.

use brep_core::error::{BrepError, Result};
use brep_core::{Diagnostics, MeshTolerance};
use brep_geometry::CurveKind;
use brep_math::{Aabb2, Point2, Point3, Vector3};
use brep_topology::{EdgeId, FaceId, Solid, TrimId};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    pub struct SegKey;
    pub struct TrimSegKey;
}

/// Classification of an edge for split decisions.
///
/// Singular trims never get an edge segment; they are polygon-level only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    /// Curved edge curve
    Curved,
    /// Linear curve lying on at least one non-planar surface
    LinearOnCurved,
    /// Linear curve on planar surfaces, touching a curved edge at a vertex
    LinearNearCurved,
    /// Linear curve, planar surfaces, no curved neighbors
    Linear,
}

/// A subdivision unit of one model edge, shared by both adjoining faces.
///
/// The edge (not either face) owns all split decisions; the two trim-segment
/// back-references keep the faces' polygons synchronized.
#[derive(Debug, Clone)]
pub struct EdgeSeg {
    pub edge: EdgeId,
    /// Normalized edge-curve parameter interval
    pub t0: f64,
    pub t1: f64,
    pub p0: Point3,
    pub p1: Point3,
    pub tan0: Vector3,
    pub tan1: Vector3,
    pub class: EdgeClass,
    pub trims: (TrimSegKey, TrimSegKey),
    /// Marked for splitting by the proximity refiner
    pub split_mark: bool,
}

impl EdgeSeg {
    pub fn chord_len(&self) -> f64 {
        (self.p1 - self.p0).length()
    }
}

/// One edge of a face's loop polygon.
#[derive(Debug, Clone)]
pub struct TrimSeg {
    /// Index into `MeshWorkspace::faces`
    pub fw: usize,
    pub loop_idx: usize,
    pub trim: TrimId,
    /// Point indices into the owning face work's point set
    pub a: usize,
    pub b: usize,
    /// Trim-curve parameter interval
    pub t0: f64,
    pub t1: f64,
    /// `None` for singular trims
    pub seg: Option<SegKey>,
    pub bbox: Aabb2,
}

impl TrimSeg {
    pub fn is_singular(&self) -> bool {
        self.seg.is_none()
    }
}

/// An ordered cyclic point sequence in a face's parameter domain.
#[derive(Debug, Clone)]
pub struct LoopPoly {
    pub trim_segs: Vec<TrimSegKey>,
    pub outer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

/// Per-face container: 2D point set with parallel 3D and normal arrays, loop
/// polygons, interior samples, and the resulting triangles.
#[derive(Debug, Clone)]
pub struct FaceWork {
    pub face: FaceId,
    pub reversed: bool,
    pub points: Vec<Point2>,
    pub space: Vec<Point3>,
    pub normals: Vec<Vector3>,
    pub loops: Vec<LoopPoly>,
    pub interior: Vec<usize>,
    pub triangles: Vec<Triangle>,
}

impl FaceWork {
    fn new(face: FaceId, reversed: bool) -> Self {
        Self {
            face,
            reversed,
            points: Vec::new(),
            space: Vec::new(),
            normals: Vec::new(),
            loops: Vec::new(),
            interior: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Insert a point, deduplicating by parameter-space coincidence. Seam
    /// twins (same 3D position, different UV) stay distinct on purpose.
    pub fn add_point(&mut self, uv: Point2, position: Point3, normal: Vector3) -> usize {
        for (i, &p) in self.points.iter().enumerate() {
            if (p - uv).length_squared() < 1e-20 {
                return i;
            }
        }
        self.points.push(uv);
        self.space.push(position);
        self.normals.push(normal);
        self.points.len() - 1
    }

    /// The ordered point-index cycle of a loop.
    pub fn loop_cycle(&self, loop_idx: usize, trim_segs: &SlotMap<TrimSegKey, TrimSeg>) -> Vec<usize> {
        let mut cycle = Vec::new();
        for &key in &self.loops[loop_idx].trim_segs {
            let ts = &trim_segs[key];
            // Singular trims may collapse to a repeated point; skip duplicates
            if cycle.last() != Some(&ts.a) {
                cycle.push(ts.a);
            }
        }
        if cycle.len() > 1 && cycle.first() == cycle.last() {
            cycle.pop();
        }
        cycle
    }

    /// The loop's 2D polygon as point coordinates.
    pub fn loop_polygon(&self, loop_idx: usize, trim_segs: &SlotMap<TrimSegKey, TrimSeg>) -> Vec<Point2> {
        self.loop_cycle(loop_idx, trim_segs)
            .into_iter()
            .map(|i| self.points[i])
            .collect()
    }
}

/// The whole per-run state: one face work per face plus the shared edge and
/// trim segment arenas.
pub struct MeshWorkspace<'a> {
    pub solid: &'a Solid,
    pub tol: MeshTolerance,
    pub faces: Vec<FaceWork>,
    pub face_index: SecondaryMap<FaceId, usize>,
    pub segs: SlotMap<SegKey, EdgeSeg>,
    pub trim_segs: SlotMap<TrimSegKey, TrimSeg>,
    /// Ordered segment list per model edge
    pub edge_segs: SecondaryMap<EdgeId, Vec<SegKey>>,
    pub diagnostics: Diagnostics,
}

impl<'a> MeshWorkspace<'a> {
    /// Build loop polygons and the initial one-segment-per-edge state.
    pub fn build(solid: &'a Solid, tol: MeshTolerance) -> Result<Self> {
        let mut ws = Self {
            solid,
            tol,
            faces: Vec::new(),
            face_index: SecondaryMap::new(),
            segs: SlotMap::with_key(),
            trim_segs: SlotMap::with_key(),
            edge_segs: SecondaryMap::new(),
            diagnostics: Diagnostics::new(),
        };

        let mut trim_to_seg: SecondaryMap<TrimId, TrimSegKey> = SecondaryMap::new();

        for (face_id, face) in &solid.faces {
            let fw_idx = ws.faces.len();
            ws.face_index.insert(face_id, fw_idx);
            let mut fw = FaceWork::new(face_id, face.reversed);

            for (loop_idx, loop_id) in solid.face_loops(face_id).into_iter().enumerate() {
                let outer = loop_idx == 0;
                let mut poly = LoopPoly {
                    trim_segs: Vec::new(),
                    outer,
                };

                for &trim_id in &solid.loops[loop_id].trims {
                    let trim = &solid.trims[trim_id];
                    let (t0, t1) = trim.curve.domain();
                    let uv0 = trim.curve.point_at(t0);
                    let uv1 = trim.curve.point_at(t1);

                    let start = &solid.vertices[trim.start];
                    let end = &solid.vertices[trim.end];
                    let n0 = if trim.is_singular() {
                        start.normal.unwrap_or_else(|| face.surface.normal_at(uv0.x, uv0.y))
                    } else {
                        face.surface.normal_at(uv0.x, uv0.y)
                    };
                    let n1 = if trim.is_singular() {
                        end.normal.unwrap_or_else(|| face.surface.normal_at(uv1.x, uv1.y))
                    } else {
                        face.surface.normal_at(uv1.x, uv1.y)
                    };

                    let a = fw.add_point(uv0, start.position, n0);
                    let b = fw.add_point(uv1, end.position, n1);

                    let key = ws.trim_segs.insert(TrimSeg {
                        fw: fw_idx,
                        loop_idx,
                        trim: trim_id,
                        a,
                        b,
                        t0,
                        t1,
                        seg: None,
                        bbox: Aabb2::from_segment(uv0, uv1),
                    });
                    trim_to_seg.insert(trim_id, key);
                    poly.trim_segs.push(key);
                }
                fw.loops.push(poly);
            }
            ws.faces.push(fw);
        }

        for (edge_id, edge) in &solid.edges {
            let (trim_a, trim_b) = edge
                .trims
                .ok_or_else(|| BrepError::Topology(format!("edge {edge_id:?} has no trims")))?;
            let key_a = trim_to_seg[trim_a];
            let key_b = trim_to_seg[trim_b];

            let (s0, s1) = edge.curve.domain();
            let class = if edge.curve.kind() == CurveKind::General {
                EdgeClass::Curved
            } else {
                EdgeClass::Linear
            };
            let seg = ws.segs.insert(EdgeSeg {
                edge: edge_id,
                t0: s0,
                t1: s1,
                p0: solid.vertices[edge.start].position,
                p1: solid.vertices[edge.end].position,
                tan0: edge.curve.tangent_at(s0),
                tan1: edge.curve.tangent_at(s1),
                class,
                trims: (key_a, key_b),
                split_mark: false,
            });
            ws.trim_segs[key_a].seg = Some(seg);
            ws.trim_segs[key_b].seg = Some(seg);
            ws.edge_segs.insert(edge_id, vec![seg]);
        }

        ws.classify_linear_edges();
        Ok(ws)
    }

    /// Second classification pass: linear edges on curved surfaces, and linear
    /// edges meeting a curved edge at a shared vertex.
    fn classify_linear_edges(&mut self) {
        use brep_geometry::SurfaceKind;

        let mut curved_vertices = Vec::new();
        for (_, edge) in &self.solid.edges {
            if edge.curve.kind() == CurveKind::General {
                curved_vertices.push(edge.start);
                curved_vertices.push(edge.end);
            }
        }

        let seg_keys: Vec<SegKey> = self.segs.keys().collect();
        for key in seg_keys {
            let seg = &self.segs[key];
            if seg.class != EdgeClass::Linear {
                continue;
            }
            let edge = &self.solid.edges[seg.edge];
            let Some((trim_a, trim_b)) = edge.trims else {
                continue;
            };
            let on_curved = [trim_a, trim_b].iter().any(|&t| {
                let face = self.solid.trims[t].face;
                self.solid.faces[face].surface.kind() == SurfaceKind::General
            });
            let class = if on_curved {
                EdgeClass::LinearOnCurved
            } else if curved_vertices.contains(&edge.start) || curved_vertices.contains(&edge.end) {
                EdgeClass::LinearNearCurved
            } else {
                EdgeClass::Linear
            };
            self.segs[key].class = class;
        }
    }

    /// Median 3D chord length of a loop's current segments.
    pub fn loop_median_len(&self, fw_idx: usize, loop_idx: usize) -> f64 {
        let fw = &self.faces[fw_idx];
        let mut lens: Vec<f64> = fw.loops[loop_idx]
            .trim_segs
            .iter()
            .map(|&k| {
                let ts = &self.trim_segs[k];
                (fw.space[ts.b] - fw.space[ts.a]).length()
            })
            .filter(|l| *l > 0.0)
            .collect();
        if lens.is_empty() {
            return 0.0;
        }
        lens.sort_by(f64::total_cmp);
        lens[lens.len() / 2]
    }

    /// Median 3D chord length of an edge's current segments.
    pub fn edge_median_len(&self, edge: EdgeId) -> f64 {
        let Some(keys) = self.edge_segs.get(edge) else {
            return 0.0;
        };
        let mut lens: Vec<f64> = keys.iter().map(|&k| self.segs[k].chord_len()).collect();
        if lens.is_empty() {
            return 0.0;
        }
        lens.sort_by(f64::total_cmp);
        lens[lens.len() / 2]
    }

    /// Bounding-box diagonal of the whole model, the global feature size.
    pub fn model_feature_size(&self) -> f64 {
        let points: Vec<Point3> = self
            .solid
            .vertices
            .iter()
            .map(|(_, v)| v.position)
            .collect();
        brep_math::Aabb3::from_points(&points)
            .map(|b| b.diagonal())
            .unwrap_or(1.0)
    }
}
