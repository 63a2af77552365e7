//! Post-triangulation correction around surface poles.
//!
//! Around a pole the parameter metric collapses: the CDT sees a whole row of
//! parameter points that are one 3D point, and the resulting fan is badly
//! shaped in 3D. The corrector cuts out the pole's triangle neighborhood,
//! projects its boundary ring onto a best-fit tangent plane, re-triangulates
//! ring plus pole there, and splices the result back. If the projection
//! would fold or invert the neighborhood, it is left untouched and reported.

use std::collections::{HashMap, HashSet};

use brep_core::{Diagnostic, Diagnostics};
use brep_geometry::{SurfaceGeometry, SurfacePole};
use brep_math::plane::Plane;
use brep_math::{
    point_in_polygon, polygon_is_simple, polygon_signed_area, signed_area2, Point2, Point3,
};
use slotmap::Key;
use spade::{ConstrainedDelaunayTriangulation, Triangulation};

use crate::work::{FaceWork, Triangle};

/// Correct every pole neighborhood on one face.
pub fn correct_singularities(
    fw: &mut FaceWork,
    surface: &SurfaceGeometry,
    diagnostics: &mut Diagnostics,
) {
    for pole in surface.poles() {
        correct_pole(fw, &pole, diagnostics);
    }
}

fn quantize(p: Point3, cell: f64) -> (i64, i64, i64) {
    (
        (p.x / cell).round() as i64,
        (p.y / cell).round() as i64,
        (p.z / cell).round() as i64,
    )
}

fn correct_pole(fw: &mut FaceWork, pole: &SurfacePole, diagnostics: &mut Diagnostics) {
    let face_tag = fw.face.data().as_ffi();
    let eps = 1e-9 * (1.0 + pole.point.length());

    let is_pole: Vec<bool> = fw
        .space
        .iter()
        .map(|&p| (p - pole.point).length() < eps)
        .collect();
    if !is_pole.iter().any(|&b| b) {
        return;
    }

    let affected: Vec<usize> = fw
        .triangles
        .iter()
        .enumerate()
        .filter(|(_, t)| is_pole[t.a] || is_pole[t.b] || is_pole[t.c])
        .map(|(i, _)| i)
        .collect();
    if affected.is_empty() {
        return;
    }

    // Canonicalize ring vertices by 3D position, so parameter-space twins of
    // the same point (seam copies) chain into one closed ring
    let cell = eps.max(1e-12);
    let mut canon: HashMap<(i64, i64, i64), usize> = HashMap::new();
    let mut rep: Vec<usize> = Vec::new();
    let mut cid_of = |idx: usize, space: &[Point3]| -> usize {
        let key = quantize(space[idx], cell);
        *canon.entry(key).or_insert_with(|| {
            rep.push(idx);
            rep.len() - 1
        })
    };

    let mut next: HashMap<usize, usize> = HashMap::new();
    for &ti in &affected {
        let t = fw.triangles[ti];
        for (x, y) in [(t.a, t.b), (t.b, t.c), (t.c, t.a)] {
            if is_pole[x] || is_pole[y] {
                continue;
            }
            let cx = cid_of(x, &fw.space);
            let cy = cid_of(y, &fw.space);
            if let Some(old) = next.insert(cx, cy) {
                if old != cy {
                    // Two outgoing ring edges from one vertex: not a fan
                    diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
                    return;
                }
            }
        }
    }
    if next.len() < 3 {
        return;
    }

    // Chain the directed ring edges into one closed cycle, seeded at the
    // smallest canonical id so the cycle order never depends on map order
    let start = match next.keys().copied().min() {
        Some(s) => s,
        None => return,
    };
    let mut ring: Vec<usize> = Vec::with_capacity(next.len());
    let mut cursor = start;
    loop {
        ring.push(cursor);
        let Some(&successor) = next.get(&cursor) else {
            diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
            return;
        };
        cursor = successor;
        if cursor == start {
            break;
        }
        if ring.len() > next.len() {
            diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
            return;
        }
    }
    if ring.len() != next.len() {
        diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
        return;
    }

    let mut fit_points: Vec<Point3> = ring.iter().map(|&c| fw.space[rep[c]]).collect();
    fit_points.push(pole.point);
    let Some(plane) = Plane::best_fit(&fit_points) else {
        diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
        return;
    };
    let (bu, bv) = plane.basis();
    let project = |p: Point3| Point2::new((p - plane.origin).dot(bu), (p - plane.origin).dot(bv));

    let mut ring2: Vec<Point2> = ring.iter().map(|&c| project(fw.space[rep[c]])).collect();
    let mut pole2 = project(pole.point);
    if polygon_signed_area(&ring2) < 0.0 {
        // Mirror the projection so the ring keeps the mesh winding
        for p in &mut ring2 {
            p.y = -p.y;
        }
        pole2.y = -pole2.y;
    }

    if !polygon_is_simple(&ring2) || !point_in_polygon(pole2, &ring2) {
        diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
        return;
    }

    // The existing neighborhood must stay positively oriented under the
    // projection, otherwise it folds and the rebuild is unsafe
    let ring_pos: HashMap<usize, Point2> =
        ring.iter().copied().zip(ring2.iter().copied()).collect();
    for &ti in &affected {
        let t = fw.triangles[ti];
        // Triangles with two pole copies collapse under projection by
        // construction; they carry no orientation to preserve
        if [t.a, t.b, t.c].iter().filter(|&&i| is_pole[i]).count() > 1 {
            continue;
        }
        let mut tri2 = [Point2::ZERO; 3];
        let mut ok = true;
        for (slot, idx) in tri2.iter_mut().zip([t.a, t.b, t.c]) {
            if is_pole[idx] {
                *slot = pole2;
            } else {
                let key = quantize(fw.space[idx], cell);
                match canon.get(&key).and_then(|c| ring_pos.get(c)) {
                    Some(&p) => *slot = p,
                    None => {
                        ok = false;
                        break;
                    }
                }
            }
        }
        if !ok || signed_area2(tri2[0], tri2[1], tri2[2]) <= 0.0 {
            diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
            return;
        }
    }

    // Rebuild: CDT over the projected ring with the pole as interior point
    let pole_rep = match is_pole.iter().position(|&b| b) {
        Some(i) => i,
        None => return,
    };
    let mut cdt: ConstrainedDelaunayTriangulation<spade::Point2<f64>> =
        ConstrainedDelaunayTriangulation::new();
    let mut to_original: HashMap<usize, usize> = HashMap::new();
    let mut handles = Vec::with_capacity(ring2.len());
    for (p, &c) in ring2.iter().zip(&ring) {
        let Ok(h) = cdt.insert(spade::Point2::new(p.x, p.y)) else {
            diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
            return;
        };
        to_original.insert(h.index(), rep[c]);
        handles.push(h);
    }
    let Ok(hp) = cdt.insert(spade::Point2::new(pole2.x, pole2.y)) else {
        diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
        return;
    };
    to_original.insert(hp.index(), pole_rep);
    for i in 0..handles.len() {
        let j = (i + 1) % handles.len();
        if cdt.can_add_constraint(handles[i], handles[j]) {
            cdt.add_constraint(handles[i], handles[j]);
        }
    }

    let mut rebuilt: Vec<Triangle> = Vec::new();
    for face in cdt.inner_faces() {
        let vs = face.vertices();
        let mut idx = [0_usize; 3];
        let mut uv = [Point2::ZERO; 3];
        let mut known = true;
        for ((slot, pt), v) in idx.iter_mut().zip(uv.iter_mut()).zip(vs.iter()) {
            let p = v.position();
            *pt = Point2::new(p.x, p.y);
            match to_original.get(&v.fix().index()) {
                Some(&i) => *slot = i,
                None => {
                    known = false;
                    break;
                }
            }
        }
        if !known {
            continue;
        }
        let centroid = (uv[0] + uv[1] + uv[2]) / 3.0;
        if !point_in_polygon(centroid, &ring2) {
            continue;
        }
        rebuilt.push(Triangle {
            a: idx[0],
            b: idx[1],
            c: idx[2],
        });
    }
    if rebuilt.is_empty() {
        diagnostics.push(Diagnostic::SingularProjectionUnsafe { face: face_tag });
        return;
    }

    let removal: HashSet<usize> = affected.iter().copied().collect();
    let mut kept: Vec<Triangle> = fw
        .triangles
        .iter()
        .enumerate()
        .filter(|(i, _)| !removal.contains(i))
        .map(|(_, t)| *t)
        .collect();
    kept.extend(rebuilt);
    fw.triangles = kept;
}
