//! Loop normalization on periodic surfaces.
//!
//! On a periodic surface the same 3D point has many parameter images, one per
//! period branch. Input trims are allowed to disagree about which branch a
//! loop point lives on, and a loop may wind the seam outright (a tube bounded
//! by two rims and no seam edge). This pass rewrites each face's point set so
//! every loop is branch-consistent, pairs of seam-winding loops are spliced
//! into one simple polygon with bridge segments along the seam, loops lie in
//! the surface's principal domain, and holes stay inside their outer polygon.
//! All steps are idempotent: a normalized face passes through unchanged.

use std::collections::HashSet;

use brep_math::{point_in_polygon, Aabb2, Point2};
use slotmap::Key;

use brep_core::Diagnostic;

use crate::work::{MeshWorkspace, TrimSeg};

/// Normalize every face on a periodic surface.
pub fn normalize_seams(ws: &mut MeshWorkspace<'_>) {
    for fw_idx in 0..ws.faces.len() {
        let face_id = ws.faces[fw_idx].face;
        let surface = &ws.solid.faces[face_id].surface;
        let Some(period) = surface.period_u() else {
            continue;
        };
        let (u_min, _) = surface.domain_u();

        snap_to_seam(ws, fw_idx, u_min, period);

        let n_loops = ws.faces[fw_idx].loops.len();
        let mut windings = Vec::with_capacity(n_loops);
        for loop_idx in 0..n_loops {
            windings.push(unwrap_one(ws, fw_idx, loop_idx, u_min, period));
        }
        bridge_straddling_loops(ws, fw_idx, period, &mut windings);

        for loop_idx in 0..ws.faces[fw_idx].loops.len() {
            shift_loop_into_domain(ws, fw_idx, loop_idx, u_min, period);
        }
        shift_inner_loops(ws, fw_idx, period);
        refresh_bboxes(ws, fw_idx);
    }
}

/// Step 1: snap points lying within rounding distance of a seam branch exactly
/// onto it, so later equality checks are exact.
fn snap_to_seam(ws: &mut MeshWorkspace<'_>, fw_idx: usize, u_min: f64, period: f64) {
    let eps = 1e-9 * period;
    for p in &mut ws.faces[fw_idx].points {
        for branch in [u_min, u_min + period] {
            if (p.x - branch).abs() < eps && p.x != branch {
                p.x = branch;
            }
        }
    }
}

/// Steps 2 and 3 for one loop: measure its seam winding, rotate a
/// once-winding loop to start on the seam, and re-branch its points.
/// Returns the winding actually carried into the bridging step.
fn unwrap_one(ws: &mut MeshWorkspace<'_>, fw_idx: usize, loop_idx: usize, u_min: f64, period: f64) -> i64 {
    let w = loop_winding(ws, fw_idx, loop_idx, period);
    match w {
        0 => {
            unwrap_loop(ws, fw_idx, loop_idx, period, 0);
            0
        }
        1 | -1 => {
            if rotate_to_seam(ws, fw_idx, loop_idx, u_min, period) {
                unwrap_loop(ws, fw_idx, loop_idx, period, w);
                w
            } else {
                // No loop point sits on a seam branch to anchor a bridge
                degrade(ws, fw_idx);
                0
            }
        }
        _ => {
            degrade(ws, fw_idx);
            0
        }
    }
}

fn degrade(ws: &mut MeshWorkspace<'_>, fw_idx: usize) {
    let face = ws.faces[fw_idx].face;
    ws.diagnostics.push(Diagnostic::SeamBridgeUnresolved {
        face: face.data().as_ffi(),
    });
}

/// Net number of periods a loop's trim curves advance over one traversal.
fn loop_winding(ws: &MeshWorkspace<'_>, fw_idx: usize, loop_idx: usize, period: f64) -> i64 {
    let fw = &ws.faces[fw_idx];
    let mut du_sum = 0.0;
    for &key in &fw.loops[loop_idx].trim_segs {
        let ts = &ws.trim_segs[key];
        du_sum += match ws.solid.trims.get(ts.trim) {
            Some(trim) => trim.curve.point_at(ts.t1).x - trim.curve.point_at(ts.t0).x,
            // Bridge segments carry no trim; their stored span is authoritative
            None => fw.points[ts.b].x - fw.points[ts.a].x,
        };
    }
    (du_sum / period).round() as i64
}

/// Step 3: rotate the loop so it starts at a point on a seam branch, snapping
/// that point's coordinate exactly onto the branch. Returns false when no
/// loop point lies on the seam.
fn rotate_to_seam(
    ws: &mut MeshWorkspace<'_>,
    fw_idx: usize,
    loop_idx: usize,
    u_min: f64,
    period: f64,
) -> bool {
    let keys = ws.faces[fw_idx].loops[loop_idx].trim_segs.clone();
    let eps = 1e-9 * period;
    for (k_idx, &key) in keys.iter().enumerate() {
        let a = ws.trim_segs[key].a;
        let x = ws.faces[fw_idx].points[a].x;
        let branches = ((x - u_min) / period).round();
        if (x - u_min - branches * period).abs() < eps {
            ws.faces[fw_idx].points[a].x = u_min + branches * period;
            if k_idx > 0 {
                ws.faces[fw_idx].loops[loop_idx].trim_segs.rotate_left(k_idx);
            }
            return true;
        }
    }
    false
}

/// Step 2: walk the loop once, re-branching each point so consecutive `u`
/// values follow the trim curves' own spans. A loop with nonzero `winding`
/// ends one period away from its start; the closing point then gets a twin
/// (same 3D position, shifted parameter image) instead of a rewrite, leaving
/// the chain open for bridging.
fn unwrap_loop(ws: &mut MeshWorkspace<'_>, fw_idx: usize, loop_idx: usize, period: f64, winding: i64) {
    let seg_keys = ws.faces[fw_idx].loops[loop_idx].trim_segs.clone();
    if seg_keys.is_empty() {
        return;
    }

    let first_idx = ws.trim_segs[seg_keys[0]].a;
    let start_u = ws.faces[fw_idx].points[first_idx].x;
    let mut prev_idx = first_idx;
    let mut prev_u = start_u;
    let last = seg_keys.len() - 1;

    for (i, &key) in seg_keys.iter().enumerate() {
        let ts = ws.trim_segs[key].clone();
        if ts.a != prev_idx {
            // Singular trims may collapse a == b; realign on the actual chain
            prev_u = ws.faces[fw_idx].points[ts.a].x;
        }
        // The trim curve's own u-span is authoritative for the branch choice
        let du = match ws.solid.trims.get(ts.trim) {
            Some(trim) => trim.curve.point_at(ts.t1).x - trim.curve.point_at(ts.t0).x,
            None => ws.faces[fw_idx].points[ts.b].x - prev_u,
        };
        let expected = prev_u + du;

        let closing = i == last && ts.b == first_idx;
        if closing && winding != 0 {
            let target = start_u + winding as f64 * period;
            let fw = &ws.faces[fw_idx];
            let y = fw.points[first_idx].y;
            let pos = fw.space[first_idx];
            let nrm = fw.normals[first_idx];
            let twin = ws.faces[fw_idx].add_point(Point2::new(target, y), pos, nrm);
            ws.trim_segs[key].b = twin;
            prev_idx = twin;
            prev_u = target;
        } else {
            let stored = ws.faces[fw_idx].points[ts.b].x;
            let k = ((expected - stored) / period).round();
            let adjusted = stored + k * period;
            ws.faces[fw_idx].points[ts.b].x = adjusted;
            prev_idx = ts.b;
            prev_u = adjusted;
        }
    }

    // Closed chain: the final branch choice must land exactly `winding`
    // periods from the start
    if (prev_u - start_u - winding as f64 * period).abs() > 0.5 * period {
        degrade(ws, fw_idx);
    }
}

/// Step 4: splice each pair of opposite-winding loops into one simple polygon
/// with two bridge segments running along the seam branches; any loop left
/// unpaired takes the degraded path.
fn bridge_straddling_loops(
    ws: &mut MeshWorkspace<'_>,
    fw_idx: usize,
    period: f64,
    windings: &mut [i64],
) {
    if windings.iter().all(|&w| w == 0) {
        return;
    }
    loop {
        let Some(i) = windings.iter().position(|&w| w == 1) else {
            break;
        };
        let Some(j) = windings.iter().position(|&w| w == -1) else {
            break;
        };
        splice_loops(ws, fw_idx, i, j, period);
        windings[i] = 0;
        windings[j] = 0;
    }
    for w in windings.iter_mut() {
        if *w != 0 {
            *w = 0;
            degrade(ws, fw_idx);
        }
    }
    compact_loops(ws, fw_idx);
}

/// Merge loop `j` into loop `i` with two seam-aligned bridge segments:
/// the end of chain `i` meets the start of chain `j` on one branch, and the
/// end of chain `j` closes back to the start of chain `i` on the other.
fn splice_loops(ws: &mut MeshWorkspace<'_>, fw_idx: usize, i: usize, j: usize, period: f64) {
    let chain_i = ws.faces[fw_idx].loops[i].trim_segs.clone();
    let chain_j = ws.faces[fw_idx].loops[j].trim_segs.clone();
    let si = ws.trim_segs[chain_i[0]].a;
    let ei = ws.trim_segs[chain_i[chain_i.len() - 1]].b;
    let sj = ws.trim_segs[chain_j[0]].a;
    let ej = ws.trim_segs[chain_j[chain_j.len() - 1]].b;

    // Shift the partner chain wholesale so its seam branch meets this chain's
    // open end exactly
    let target = ws.faces[fw_idx].points[ei].x;
    let k = ((target - ws.faces[fw_idx].points[sj].x) / period).round();
    if k != 0.0 {
        let mut indices: HashSet<usize> = HashSet::new();
        for &key in &chain_j {
            let ts = &ws.trim_segs[key];
            indices.insert(ts.a);
            indices.insert(ts.b);
        }
        let fw = &mut ws.faces[fw_idx];
        for idx in indices {
            fw.points[idx].x += k * period;
        }
    }

    let bridge = |ws: &mut MeshWorkspace<'_>, a: usize, b: usize| {
        let fw = &ws.faces[fw_idx];
        let bbox = Aabb2::from_segment(fw.points[a], fw.points[b]);
        ws.trim_segs.insert(TrimSeg {
            fw: fw_idx,
            loop_idx: i,
            trim: Default::default(),
            a,
            b,
            t0: 0.0,
            t1: 1.0,
            seg: None,
            bbox,
        })
    };
    let b1 = bridge(ws, ei, sj);
    let b2 = bridge(ws, ej, si);

    for &key in &chain_j {
        ws.trim_segs[key].loop_idx = i;
    }
    let merged: Vec<_> = chain_i
        .iter()
        .copied()
        .chain([b1])
        .chain(chain_j.iter().copied())
        .chain([b2])
        .collect();
    let fw = &mut ws.faces[fw_idx];
    fw.loops[i].trim_segs = merged;
    let was_outer = fw.loops[j].outer;
    fw.loops[j].trim_segs.clear();
    fw.loops[j].outer = false;
    fw.loops[i].outer |= was_outer;
}

/// Drop emptied loops and renumber the survivors' segments.
fn compact_loops(ws: &mut MeshWorkspace<'_>, fw_idx: usize) {
    ws.faces[fw_idx].loops.retain(|l| !l.trim_segs.is_empty());
    for loop_idx in 0..ws.faces[fw_idx].loops.len() {
        let keys = ws.faces[fw_idx].loops[loop_idx].trim_segs.clone();
        for key in keys {
            ws.trim_segs[key].loop_idx = loop_idx;
        }
    }
}

/// Translate the whole loop by a period multiple so its u-center lies in the
/// principal domain.
fn shift_loop_into_domain(
    ws: &mut MeshWorkspace<'_>,
    fw_idx: usize,
    loop_idx: usize,
    u_min: f64,
    period: f64,
) {
    let cycle = {
        let fw = &ws.faces[fw_idx];
        fw.loop_cycle(loop_idx, &ws.trim_segs)
    };
    if cycle.is_empty() {
        return;
    }
    let fw = &mut ws.faces[fw_idx];
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &i in &cycle {
        lo = lo.min(fw.points[i].x);
        hi = hi.max(fw.points[i].x);
    }
    let center = 0.5 * (lo + hi);
    let shift = -period * ((center - u_min) / period).floor();
    if shift != 0.0 {
        for &i in &cycle {
            fw.points[i].x += shift;
        }
    }
}

/// Step 5: an inner loop that landed on the wrong branch relative to its outer
/// loop is translated by a period until it falls inside the outer polygon.
fn shift_inner_loops(ws: &mut MeshWorkspace<'_>, fw_idx: usize, period: f64) {
    if ws.faces[fw_idx].loops.len() < 2 {
        return;
    }
    let outer = ws.faces[fw_idx].loop_polygon(0, &ws.trim_segs);
    if outer.len() < 3 {
        return;
    }

    for loop_idx in 1..ws.faces[fw_idx].loops.len() {
        let cycle = ws.faces[fw_idx].loop_cycle(loop_idx, &ws.trim_segs);
        let Some(&probe) = cycle.first() else {
            continue;
        };
        let p = ws.faces[fw_idx].points[probe];
        if point_in_polygon(p, &outer) {
            continue;
        }
        for k in [-1.0, 1.0, -2.0, 2.0] {
            let mut shifted = p;
            shifted.x += k * period;
            if point_in_polygon(shifted, &outer) {
                let fw = &mut ws.faces[fw_idx];
                for &i in &cycle {
                    fw.points[i].x += k * period;
                }
                break;
            }
        }
    }
}

/// Point coordinates moved; rebuild the cached trim-segment boxes.
fn refresh_bboxes(ws: &mut MeshWorkspace<'_>, fw_idx: usize) {
    let keys: Vec<_> = ws.faces[fw_idx]
        .loops
        .iter()
        .flat_map(|l| l.trim_segs.iter().copied())
        .collect();
    for key in keys {
        let ts = &ws.trim_segs[key];
        let fw = &ws.faces[fw_idx];
        let bbox = Aabb2::from_segment(fw.points[ts.a], fw.points[ts.b]);
        ws.trim_segs[key].bbox = bbox;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine;
    use crate::work::MeshWorkspace;
    use brep_core::MeshTolerance;
    use brep_geometry::{Arc2, CircularArc, Curve2, CylinderSurface, EdgeCurve, Line2, PlaneSurface};
    use brep_math::{polygon_is_simple, DVec2, DVec3, Point3, Vector3};
    use brep_topology::{primitives, Solid};
    use std::f64::consts::TAU;

    /// Capped cylinder whose tube face has no seam edge: both rims wind the
    /// seam once, in opposite directions.
    fn open_tube(radius: f64, height: f64) -> Solid {
        let mut solid = Solid::new();
        let base = Point3::ZERO;
        let top_center = DVec3::new(0.0, 0.0, height);
        let seam_bottom = solid.add_vertex(DVec3::new(radius, 0.0, 0.0));
        let seam_top = solid.add_vertex(DVec3::new(radius, 0.0, height));

        let tube = solid.add_face(
            CylinderSurface::new(base, Vector3::Z, Vector3::X, radius).into(),
            false,
        );
        let bottom = solid.add_face(PlaneSurface::new(base, Vector3::X, Vector3::Y).into(), true);
        let top = solid.add_face(
            PlaneSurface::new(top_center, Vector3::X, Vector3::Y).into(),
            false,
        );

        let t_bottom = solid.add_trim(
            tube,
            Curve2::Line(Line2::new(DVec2::new(0.0, 0.0), DVec2::new(TAU, 0.0))),
            seam_bottom,
            seam_bottom,
        );
        solid.make_outer_loop(tube, vec![t_bottom]).unwrap();
        let t_top = solid.add_trim(
            tube,
            Curve2::Line(Line2::new(DVec2::new(TAU, height), DVec2::new(0.0, height))),
            seam_top,
            seam_top,
        );
        solid.make_inner_loop(tube, vec![t_top]).unwrap();

        let t_cap_bottom = solid.add_trim(
            bottom,
            Curve2::Arc(Arc2::new(DVec2::ZERO, radius, 0.0, TAU)),
            seam_bottom,
            seam_bottom,
        );
        solid.make_outer_loop(bottom, vec![t_cap_bottom]).unwrap();
        let t_cap_top = solid.add_trim(
            top,
            Curve2::Arc(Arc2::new(DVec2::ZERO, radius, 0.0, TAU)),
            seam_top,
            seam_top,
        );
        solid.make_outer_loop(top, vec![t_cap_top]).unwrap();

        let bottom_circle = EdgeCurve::new(
            CircularArc::full_circle(base, Vector3::Z, Vector3::X, radius).into(),
        );
        solid
            .make_edge(
                bottom_circle,
                seam_bottom,
                seam_bottom,
                t_bottom,
                false,
                t_cap_bottom,
                false,
            )
            .unwrap();
        let top_circle = EdgeCurve::new(
            CircularArc::full_circle(top_center, Vector3::Z, Vector3::X, radius).into(),
        );
        solid
            .make_edge(
                top_circle,
                seam_top,
                seam_top,
                t_top,
                true,
                t_cap_top,
                false,
            )
            .unwrap();
        solid
    }

    #[test]
    fn test_cylinder_already_normalized() {
        let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();
        let before: Vec<Vec<_>> = ws.faces.iter().map(|f| f.points.clone()).collect();
        normalize_seams(&mut ws);
        let after: Vec<Vec<_>> = ws.faces.iter().map(|f| f.points.clone()).collect();
        for (b, a) in before.iter().zip(&after) {
            for (pb, pa) in b.iter().zip(a) {
                assert!((*pb - *pa).length() < 1e-12);
            }
        }
        assert!(ws.diagnostics.is_clean());
    }

    #[test]
    fn test_sphere_rectangle_survives() {
        let solid = primitives::make_sphere(1.0).unwrap();
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();
        normalize_seams(&mut ws);
        // The UV loop stays the full [0, TAU] x [-pi/2, pi/2] rectangle
        let fw = &ws.faces[0];
        let poly = fw.loop_polygon(0, &ws.trim_segs);
        let us: Vec<f64> = poly.iter().map(|p| p.x).collect();
        assert!(us.iter().any(|&u| u.abs() < 1e-9));
        assert!(us.iter().any(|&u| (u - TAU).abs() < 1e-9));
        assert!(ws.diagnostics.is_clean());
    }

    #[test]
    fn test_wrong_branch_point_rebranched() {
        let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();

        // Knock one tube-face point onto the wrong period branch
        let tube = ws
            .faces
            .iter()
            .position(|f| f.points.iter().any(|p| (p.x - TAU).abs() < 1e-9))
            .unwrap();
        let before = ws.faces[tube].points.clone();
        let victim = ws.faces[tube]
            .points
            .iter()
            .position(|p| p.x.abs() < 1e-9)
            .unwrap();
        ws.faces[tube].points[victim].x += TAU;

        normalize_seams(&mut ws);
        for (pb, pa) in before.iter().zip(&ws.faces[tube].points) {
            assert!(
                (*pb - *pa).length() < 1e-9,
                "expected {pb:?}, got {pa:?}"
            );
        }
    }

    #[test]
    fn test_straddling_rims_bridged_into_one_loop() {
        let solid = open_tube(1.0, 2.0);
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();
        refine::mandatory_presplits(&mut ws).unwrap();
        normalize_seams(&mut ws);
        assert!(
            ws.diagnostics.is_clean(),
            "bridging degraded: {:?}",
            ws.diagnostics.entries()
        );

        let tube = ws
            .faces
            .iter()
            .position(|f| ws.solid.faces[f.face].surface.period_u().is_some())
            .unwrap();
        let fw = &ws.faces[tube];
        assert_eq!(fw.loops.len(), 1, "rim loops were not spliced");

        let poly = fw.loop_polygon(0, &ws.trim_segs);
        assert!(polygon_is_simple(&poly));
        let (lo, hi) = poly
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(l, h), p| {
                (l.min(p.x), h.max(p.x))
            });
        assert!(lo.abs() < 1e-9);
        assert!((hi - TAU).abs() < 1e-9);
    }

    #[test]
    fn test_bridge_columns_share_space_positions() {
        let solid = open_tube(1.0, 2.0);
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();
        refine::mandatory_presplits(&mut ws).unwrap();
        normalize_seams(&mut ws);

        // Each bridge endpoint is a parameter twin of a rim seam point: same
        // 3D position, one period apart in u
        let tube = ws
            .faces
            .iter()
            .position(|f| ws.solid.faces[f.face].surface.period_u().is_some())
            .unwrap();
        let fw = &ws.faces[tube];
        for (i, &p) in fw.points.iter().enumerate() {
            if p.x.abs() < 1e-9 {
                let twin = fw
                    .points
                    .iter()
                    .position(|&q| (q.x - TAU).abs() < 1e-9 && (q.y - p.y).abs() < 1e-9);
                let twin = twin.expect("seam point has no twin across the period");
                assert!((fw.space[i] - fw.space[twin]).length() < 1e-12);
            }
        }
    }

    #[test]
    fn test_bridged_tube_normalize_idempotent() {
        let solid = open_tube(1.0, 2.0);
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();
        refine::mandatory_presplits(&mut ws).unwrap();
        normalize_seams(&mut ws);
        let once: Vec<Vec<_>> = ws.faces.iter().map(|f| f.points.clone()).collect();
        let loops_once: Vec<usize> = ws.faces.iter().map(|f| f.loops.len()).collect();
        normalize_seams(&mut ws);
        assert!(ws.diagnostics.is_clean());
        let loops_twice: Vec<usize> = ws.faces.iter().map(|f| f.loops.len()).collect();
        assert_eq!(loops_once, loops_twice);
        for (a, b) in once.iter().zip(&ws.faces) {
            assert_eq!(a.len(), b.points.len());
            for (pa, pb) in a.iter().zip(&b.points) {
                assert!((*pa - *pb).length() < 1e-12);
            }
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        let solid = primitives::make_sphere(2.0).unwrap();
        let mut ws = MeshWorkspace::build(&solid, MeshTolerance::from_absolute(0.1)).unwrap();
        normalize_seams(&mut ws);
        let once: Vec<Vec<_>> = ws.faces.iter().map(|f| f.points.clone()).collect();
        normalize_seams(&mut ws);
        let twice: Vec<Vec<_>> = ws.faces.iter().map(|f| f.points.clone()).collect();
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            for (pa, pb) in a.iter().zip(b) {
                assert!((*pa - *pb).length() < 1e-12);
            }
        }
    }
}
