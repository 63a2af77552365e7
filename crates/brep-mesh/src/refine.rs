//! Edge-segment refinement.
//!
//! Splitting is always edge-driven: one split produces one shared 3D midpoint,
//! two edge-segment children, and two trim-segment children on each adjoining
//! face, so the faces' loop polygons can never drift apart along a shared edge.

use brep_core::error::{BrepError, Result};
use brep_core::tolerance::ON_ZERO_TOLERANCE;
use brep_core::{Diagnostic, ResolvedTolerance};
use brep_geometry::{Curve2, CurveKind, SurfaceGeometry};
use brep_math::{Aabb2, Point2, Point3};
use brep_topology::EdgeId;
use slotmap::Key;

use crate::work::{EdgeClass, EdgeSeg, MeshWorkspace, SegKey, TrimSeg, TrimSegKey};

const MAX_BISECTION_STEPS: usize = 48;
const HARMONIZE_ROUNDS: usize = 10;

/// Result of the trim-parameter search for a 3D target point.
struct TrimHit {
    t: f64,
    uv: Point2,
    converged: bool,
}

/// Locate the trim parameter in `[lo, hi]` whose surface image is closest to
/// `target`, by interval halving on an explicit interval.
fn locate_on_trim(
    surface: &SurfaceGeometry,
    curve: &Curve2,
    mut lo: f64,
    mut hi: f64,
    target: Point3,
) -> TrimHit {
    let eval = |t: f64| {
        let uv = curve.point_at(t);
        surface.point_at(uv.x, uv.y)
    };
    let mut t = 0.5 * (lo + hi);
    for _ in 0..MAX_BISECTION_STEPS {
        t = 0.5 * (lo + hi);
        if (eval(t) - target).length() <= ON_ZERO_TOLERANCE {
            break;
        }
        // Keep the half whose own midpoint lies closer to the target
        let low_mid = 0.5 * (lo + t);
        let high_mid = 0.5 * (t + hi);
        if (eval(low_mid) - target).length_squared() <= (eval(high_mid) - target).length_squared() {
            hi = t;
        } else {
            lo = t;
        }
    }
    let uv = curve.point_at(t);
    let converged = (surface.point_at(uv.x, uv.y) - target).length() <= ON_ZERO_TOLERANCE;
    TrimHit { t, uv, converged }
}

/// Split an edge segment at its parametric midpoint.
///
/// Returns the two children in edge-parameter order, or `None` when the
/// segment is already at the minimum length and the split is not forced.
pub fn split(
    ws: &mut MeshWorkspace<'_>,
    key: SegKey,
    force: bool,
) -> Result<Option<(SegKey, SegKey)>> {
    let seg = ws.segs[key].clone();
    if !force {
        let min_dist = ws.tol.resolve(seg.chord_len()).min_dist;
        if seg.chord_len() < 2.0 * min_dist {
            return Ok(None);
        }
    }

    let edge = &ws.solid.edges[seg.edge];
    let tm = 0.5 * (seg.t0 + seg.t1);
    let mut pm = edge.curve.point_at(tm);
    if !pm.is_finite() {
        pm = 0.5 * (seg.p0 + seg.p1);
    }
    let tanm = edge.curve.tangent_at(tm);

    // Per side: find the midpoint on the trim, insert it into the face's point
    // set, and build the two trim-segment children in trim-parameter order.
    let sides = [seg.trims.0, seg.trims.1];
    let mut children = [(TrimSegKey::null(), TrimSegKey::null(), false); 2];
    for (side, &ts_key) in sides.iter().enumerate() {
        let ts = ws.trim_segs[ts_key].clone();
        let trim = &ws.solid.trims[ts.trim];
        let face = &ws.solid.faces[trim.face];

        let hit = locate_on_trim(&face.surface, &trim.curve, ts.t0, ts.t1, pm);
        if !hit.converged {
            ws.diagnostics.push(Diagnostic::BisectionNotConverged {
                face: trim.face.data().as_ffi(),
                parameter: hit.t,
            });
        }
        let span = ts.t1 - ts.t0;
        if (hit.t - ts.t0).abs() < 1e-12 * span.abs() || (ts.t1 - hit.t).abs() < 1e-12 * span.abs()
        {
            // Degenerate parameterization: the midpoint collapses onto an endpoint
            if force {
                return Err(BrepError::MandatorySplit(format!(
                    "midpoint of edge {:?} collapses onto a segment endpoint",
                    seg.edge
                )));
            }
            return Ok(None);
        }

        let normal = face.surface.normal_at(hit.uv.x, hit.uv.y);
        let reversed = trim.reversed;

        let fw = &mut ws.faces[ts.fw];
        let mid = fw.add_point(hit.uv, pm, normal);
        let uv_a = fw.points[ts.a];
        let uv_b = fw.points[ts.b];

        let k1 = ws.trim_segs.insert(TrimSeg {
            fw: ts.fw,
            loop_idx: ts.loop_idx,
            trim: ts.trim,
            a: ts.a,
            b: mid,
            t0: ts.t0,
            t1: hit.t,
            seg: None,
            bbox: Aabb2::from_segment(uv_a, hit.uv),
        });
        let k2 = ws.trim_segs.insert(TrimSeg {
            fw: ts.fw,
            loop_idx: ts.loop_idx,
            trim: ts.trim,
            a: mid,
            b: ts.b,
            t0: hit.t,
            t1: ts.t1,
            seg: None,
            bbox: Aabb2::from_segment(hit.uv, uv_b),
        });

        let poly = &mut ws.faces[ts.fw].loops[ts.loop_idx];
        let pos = poly
            .trim_segs
            .iter()
            .position(|&k| k == ts_key)
            .ok_or_else(|| BrepError::Topology("trim segment missing from its loop".into()))?;
        poly.trim_segs.splice(pos..=pos, [k1, k2]);
        ws.trim_segs.remove(ts_key);
        children[side] = (k1, k2, reversed);
    }

    // A reversed trim runs against the edge direction, so its first child (in
    // trim order) pairs with the second edge child.
    let pick = |side: usize, first: bool| {
        let (k1, k2, reversed) = children[side];
        if first != reversed {
            k1
        } else {
            k2
        }
    };
    let kc1 = ws.segs.insert(EdgeSeg {
        edge: seg.edge,
        t0: seg.t0,
        t1: tm,
        p0: seg.p0,
        p1: pm,
        tan0: seg.tan0,
        tan1: tanm,
        class: seg.class,
        trims: (pick(0, true), pick(1, true)),
        split_mark: false,
    });
    let kc2 = ws.segs.insert(EdgeSeg {
        edge: seg.edge,
        t0: tm,
        t1: seg.t1,
        p0: pm,
        p1: seg.p1,
        tan0: tanm,
        tan1: seg.tan1,
        class: seg.class,
        trims: (pick(0, false), pick(1, false)),
        split_mark: false,
    });
    for child in [kc1, kc2] {
        let (a, b) = ws.segs[child].trims;
        ws.trim_segs[a].seg = Some(child);
        ws.trim_segs[b].seg = Some(child);
    }
    ws.segs.remove(key);

    let order = &mut ws.edge_segs[seg.edge];
    let pos = order
        .iter()
        .position(|&k| k == key)
        .ok_or_else(|| BrepError::Topology("edge segment missing from its edge".into()))?;
    order.splice(pos..=pos, [kc1, kc2]);

    Ok(Some((kc1, kc2)))
}

/// Mandatory pre-splits: every closed edge is split once so its loop polygon
/// gains extent, then every curved edge is force-split for two rounds so arcs
/// start from at least four segments. Failure here is fatal.
pub fn mandatory_presplits(ws: &mut MeshWorkspace<'_>) -> Result<()> {
    let closed: Vec<SegKey> = ws
        .segs
        .iter()
        .filter(|(_, s)| {
            let e = &ws.solid.edges[s.edge];
            e.curve.is_closed() || e.start == e.end
        })
        .map(|(k, _)| k)
        .collect();
    for key in closed {
        split(ws, key, true)?
            .ok_or_else(|| BrepError::MandatorySplit("closed edge could not be split".into()))?;
    }

    for _ in 0..2 {
        let curved: Vec<SegKey> = ws
            .segs
            .iter()
            .filter(|(_, s)| s.class == EdgeClass::Curved)
            .map(|(k, _)| k)
            .collect();
        for key in curved {
            split(ws, key, true)?
                .ok_or_else(|| BrepError::MandatorySplit("curved edge could not be split".into()))?;
        }
    }
    Ok(())
}

/// Smallest loop median among the segment's two sides.
fn side_loops_median(ws: &MeshWorkspace<'_>, seg: &EdgeSeg) -> f64 {
    let a = &ws.trim_segs[seg.trims.0];
    let b = &ws.trim_segs[seg.trims.1];
    let ma = ws.loop_median_len(a.fw, a.loop_idx);
    let mb = ws.loop_median_len(b.fw, b.loop_idx);
    match (ma > 0.0, mb > 0.0) {
        (true, true) => ma.min(mb),
        (true, false) => ma,
        (false, true) => mb,
        (false, false) => 0.0,
    }
}

/// Finest median among curved edges meeting this segment's edge at a vertex.
fn adjoining_curved_median(ws: &MeshWorkspace<'_>, seg: &EdgeSeg) -> f64 {
    let edge = &ws.solid.edges[seg.edge];
    let mut best = 0.0_f64;
    for (other_id, other) in &ws.solid.edges {
        if other_id == seg.edge || other.curve.kind() != CurveKind::General {
            continue;
        }
        let shares = other.start == edge.start
            || other.start == edge.end
            || other.end == edge.start
            || other.end == edge.end;
        if !shares {
            continue;
        }
        let m = ws.edge_median_len(other_id);
        if m > 0.0 && (best == 0.0 || m < best) {
            best = m;
        }
    }
    best
}

fn needs_split(ws: &MeshWorkspace<'_>, key: SegKey, res: &ResolvedTolerance) -> bool {
    let seg = &ws.segs[key];
    let chord = seg.chord_len();
    if chord < 2.0 * res.min_dist {
        return false;
    }
    match seg.class {
        EdgeClass::Curved => {
            if chord > res.max_dist {
                return true;
            }
            let edge = &ws.solid.edges[seg.edge];
            let pm = edge.curve.point_at(0.5 * (seg.t0 + seg.t1));
            if (pm - 0.5 * (seg.p0 + seg.p1)).length() > res.within_dist {
                return true;
            }
            seg.tan0.dot(seg.tan1) < res.cos_within_angle
        }
        EdgeClass::LinearOnCurved => {
            let m = side_loops_median(ws, seg);
            m > 0.0 && chord > 5.0 * m
        }
        EdgeClass::LinearNearCurved => {
            let m = adjoining_curved_median(ws, seg);
            m > 0.0 && chord > 2.0 * m
        }
        EdgeClass::Linear => false,
    }
}

/// Tolerance-driven refinement followed by cross-edge harmonization.
///
/// Curved edges settle first; linear edges on or near curved geometry then
/// chase the resulting segment lengths, so their bands compare against final
/// medians rather than the unsplit initial state.
pub fn refine(ws: &mut MeshWorkspace<'_>) -> Result<()> {
    for pass_classes in [
        &[EdgeClass::Curved][..],
        &[EdgeClass::LinearOnCurved, EdgeClass::LinearNearCurved][..],
    ] {
        let mut work: Vec<SegKey> = ws
            .segs
            .iter()
            .filter(|(_, s)| pass_classes.contains(&s.class))
            .map(|(k, _)| k)
            .collect();
        while let Some(key) = work.pop() {
            if !ws.segs.contains_key(key) {
                continue;
            }
            let edge_len = ws.solid.edges[ws.segs[key].edge].curve.length();
            let res = ws.tol.resolve(edge_len);
            if needs_split(ws, key, &res) {
                if let Some((a, b)) = split(ws, key, false)? {
                    work.push(a);
                    work.push(b);
                }
            }
        }
    }
    harmonize(ws)
}

/// Bounded equalization of curved edges meeting at shared vertices: an edge
/// whose median chord is more than twice a curved neighbor's gets its longest
/// segment split, for at most [`HARMONIZE_ROUNDS`] rounds.
fn harmonize(ws: &mut MeshWorkspace<'_>) -> Result<()> {
    for _ in 0..HARMONIZE_ROUNDS {
        let mut to_split: Vec<SegKey> = Vec::new();
        let curved: Vec<EdgeId> = ws
            .solid
            .edges
            .iter()
            .filter(|(_, e)| e.curve.kind() == CurveKind::General)
            .map(|(id, _)| id)
            .collect();
        for &edge_id in &curved {
            let edge = &ws.solid.edges[edge_id];
            let m_self = ws.edge_median_len(edge_id);
            if m_self <= 0.0 {
                continue;
            }
            let mut finest = 0.0_f64;
            for &other_id in &curved {
                if other_id == edge_id {
                    continue;
                }
                let other = &ws.solid.edges[other_id];
                let shares = other.start == edge.start
                    || other.start == edge.end
                    || other.end == edge.start
                    || other.end == edge.end;
                if !shares {
                    continue;
                }
                let m = ws.edge_median_len(other_id);
                if m > 0.0 && (finest == 0.0 || m < finest) {
                    finest = m;
                }
            }
            if finest > 0.0 && m_self > 2.0 * finest {
                let longest = ws.edge_segs[edge_id]
                    .iter()
                    .copied()
                    .max_by(|&a, &b| {
                        ws.segs[a].chord_len().total_cmp(&ws.segs[b].chord_len())
                    });
                if let Some(key) = longest {
                    to_split.push(key);
                }
            }
        }
        if to_split.is_empty() {
            break;
        }
        let mut progressed = false;
        for key in to_split {
            if ws.segs.contains_key(key) && split(ws, key, false)?.is_some() {
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    Ok(())
}
