//! Per-face constrained Delaunay triangulation.
//!
//! All of a face's points (boundary and interior) go into one triangulation,
//! with every loop segment inserted as a constraint edge, so the boundary
//! polylines appear verbatim in the output. Triangles are then filtered by
//! centroid containment against the loop polygons: the triangulation covers
//! the convex hull, and everything outside the outer loop or inside a hole is
//! discarded.

use std::collections::HashMap;

use brep_core::error::{BrepError, Result};
use brep_geometry::SurfaceGeometry;
use brep_math::{point_in_polygon, signed_area2, Point2};
use slotmap::SlotMap;
use spade::{ConstrainedDelaunayTriangulation, Triangulation};

use crate::work::{FaceWork, Triangle, TrimSeg, TrimSegKey};

/// Exact-degeneracy guard for dropped triangles.
const DEGENERATE_AREA: f64 = 1e-18;

/// Triangulate one face in place. Returns the number of degenerate triangles
/// dropped from the output.
pub fn triangulate_face(
    fw: &mut FaceWork,
    trim_segs: &SlotMap<TrimSegKey, TrimSeg>,
    surface: &SurfaceGeometry,
) -> Result<usize> {
    fw.triangles.clear();
    if fw.points.len() < 3 {
        return Err(BrepError::Triangulation(
            "face has fewer than three points".into(),
        ));
    }

    let outer = fw.loop_polygon(0, trim_segs);
    if outer.len() < 3 {
        return Err(BrepError::Triangulation(
            "outer loop polygon is degenerate".into(),
        ));
    }
    let holes: Vec<Vec<Point2>> = (1..fw.loops.len())
        .map(|i| fw.loop_polygon(i, trim_segs))
        .collect();

    let mut cdt: ConstrainedDelaunayTriangulation<spade::Point2<f64>> =
        ConstrainedDelaunayTriangulation::new();
    let mut handles = Vec::with_capacity(fw.points.len());
    let mut to_ours: HashMap<usize, usize> = HashMap::with_capacity(fw.points.len());
    for (i, p) in fw.points.iter().enumerate() {
        let handle = cdt
            .insert(spade::Point2::new(p.x, p.y))
            .map_err(|e| BrepError::Triangulation(format!("point insertion failed: {e}")))?;
        to_ours.insert(handle.index(), i);
        handles.push(handle);
    }

    for poly in &fw.loops {
        for &key in &poly.trim_segs {
            let ts = &trim_segs[key];
            if ts.a == ts.b {
                continue;
            }
            let (ha, hb) = (handles[ts.a], handles[ts.b]);
            // Loops are simple after seam and proximity handling; a constraint
            // that would cross another means the polygon degraded upstream
            if cdt.can_add_constraint(ha, hb) {
                cdt.add_constraint(ha, hb);
            }
        }
    }

    let mut degenerate = 0_usize;
    for face in cdt.inner_faces() {
        let vs = face.vertices();
        let mut idx = [0_usize; 3];
        for (slot, v) in idx.iter_mut().zip(vs.iter()) {
            *slot = match to_ours.get(&v.fix().index()) {
                Some(&i) => i,
                None => {
                    // A vertex spade introduced on its own: back it with a
                    // fresh surface evaluation
                    let p = v.position();
                    let uv = Point2::new(p.x, p.y);
                    let i = fw.add_point(
                        uv,
                        surface.point_at(uv.x, uv.y),
                        surface.normal_at(uv.x, uv.y),
                    );
                    to_ours.insert(v.fix().index(), i);
                    i
                }
            };
        }
        let [a, b, c] = idx;

        let (ua, ub, uc) = (fw.points[a], fw.points[b], fw.points[c]);
        let centroid = (ua + ub + uc) / 3.0;
        if !point_in_polygon(centroid, &outer) {
            continue;
        }
        if holes.iter().any(|h| point_in_polygon(centroid, h)) {
            continue;
        }

        let area2d = 0.5 * signed_area2(ua, ub, uc).abs();
        let area3d = 0.5
            * (fw.space[b] - fw.space[a])
                .cross(fw.space[c] - fw.space[a])
                .length();
        if area2d < DEGENERATE_AREA || area3d < DEGENERATE_AREA {
            degenerate += 1;
            continue;
        }

        // Spade emits counter-clockwise triangles in the parameter plane,
        // matching the surface normal; a reversed face flips the winding
        if fw.reversed {
            fw.triangles.push(Triangle { a, b: c, c: b });
        } else {
            fw.triangles.push(Triangle { a, b, c });
        }
    }

    Ok(degenerate)
}
