//! Near-overlap refinement and the edge-segment spatial index.
//!
//! Boundary segments that pass close to each other in a face's parameter
//! domain (a hole near an outer boundary, a narrow neck) force sliver
//! triangles unless the longer segment is subdivided until segment lengths are
//! comparable to the gap. Marking and splitting alternate in bounded rounds;
//! children are strictly shorter than their parent, so the process cannot
//! cycle, and segments at the minimum length are never marked.

use std::collections::HashMap;

use brep_core::error::Result;
use brep_core::Diagnostic;
use brep_math::{
    point_segment_distance, segments_properly_intersect, Aabb3, Point2,
};
use brep_topology::FaceId;
use slotmap::Key;

use crate::refine::split;
use crate::work::{MeshWorkspace, SegKey};

const MAX_ROUNDS: usize = 10;

fn segment_distance_2d(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> f64 {
    if segments_properly_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

/// One marking sweep over every face. Returns the marked edge segments and the
/// face each mark was detected on.
fn mark_round(ws: &mut MeshWorkspace<'_>, min_dist: f64) -> Vec<(SegKey, FaceId)> {
    let mut marked: Vec<(SegKey, FaceId)> = Vec::new();

    for fw in &ws.faces {
        let keys: Vec<_> = fw
            .loops
            .iter()
            .flat_map(|l| l.trim_segs.iter().copied())
            .collect();

        for i in 0..keys.len() {
            let si = &ws.trim_segs[keys[i]];
            let Some(seg_i) = si.seg else { continue };
            let (ia1, ia2) = (fw.points[si.a], fw.points[si.b]);
            let len_i = (ia2 - ia1).length();

            for &kj in keys.iter().skip(i + 1) {
                let sj = &ws.trim_segs[kj];
                let Some(seg_j) = sj.seg else { continue };
                // Segments sharing a loop point are adjacent, not near
                if si.a == sj.a || si.a == sj.b || si.b == sj.a || si.b == sj.b {
                    continue;
                }
                let pad_i = si.bbox.expand(0.5 * len_i);
                if !pad_i.intersects(&sj.bbox) {
                    continue;
                }
                let (ja1, ja2) = (fw.points[sj.a], fw.points[sj.b]);
                let len_j = (ja2 - ja1).length();

                let d = segment_distance_2d(ia1, ia2, ja1, ja2);
                let longer = len_i.max(len_j);
                if d >= 0.5 * longer {
                    continue;
                }

                let chord_i = ws.segs[seg_i].chord_len();
                let chord_j = ws.segs[seg_j].chord_len();
                let splittable_i = chord_i >= 2.0 * min_dist;
                let splittable_j = chord_j >= 2.0 * min_dist;
                if (len_i - len_j).abs() < 1e-12 {
                    // Equal lengths: mark both sides
                    if splittable_i {
                        marked.push((seg_i, fw.face));
                    }
                    if splittable_j {
                        marked.push((seg_j, fw.face));
                    }
                } else if len_i > len_j {
                    if splittable_i {
                        marked.push((seg_i, fw.face));
                    }
                } else if splittable_j {
                    marked.push((seg_j, fw.face));
                }
            }
        }
    }

    // Dedup through the split marks so one segment splits once per round
    let mut unique = Vec::new();
    for (key, face) in marked {
        if !ws.segs[key].split_mark {
            ws.segs[key].split_mark = true;
            unique.push((key, face));
        }
    }
    unique
}

/// Split near-overlapping boundary segments until every gap is at least half
/// the local segment length, for at most [`MAX_ROUNDS`] rounds.
pub fn refine_proximity(ws: &mut MeshWorkspace<'_>) -> Result<()> {
    let min_dist = ws.tol.resolve(ws.model_feature_size()).min_dist;

    for _ in 0..MAX_ROUNDS {
        let marked = mark_round(ws, min_dist);
        if marked.is_empty() {
            return Ok(());
        }
        for (key, _) in marked {
            if ws.segs.contains_key(key) {
                ws.segs[key].split_mark = false;
                split(ws, key, false)?;
            }
        }
    }

    // Round cap hit: report whatever is still marked, then clear the marks
    let leftover = mark_round(ws, min_dist);
    if !leftover.is_empty() {
        let mut per_face: HashMap<FaceId, usize> = HashMap::new();
        for &(key, face) in &leftover {
            *per_face.entry(face).or_insert(0) += 1;
            ws.segs[key].split_mark = false;
        }
        for (face, remaining) in per_face {
            ws.diagnostics.push(Diagnostic::ProximityRoundsExhausted {
                face: face.data().as_ffi(),
                remaining,
            });
        }
    }
    Ok(())
}

/// Flat 3D index over the final edge segments, queried by the interior sampler
/// to bound sample density near boundaries.
pub struct EdgeSegIndex {
    entries: Vec<(Aabb3, f64)>,
}

impl EdgeSegIndex {
    pub fn build(ws: &MeshWorkspace<'_>) -> Self {
        let entries = ws
            .segs
            .values()
            .map(|seg| {
                let chord = seg.chord_len();
                (Aabb3::from_segment(seg.p0, seg.p1).expand(chord), chord)
            })
            .collect();
        Self { entries }
    }

    /// Shortest chord among edge segments whose padded box reaches `query`.
    pub fn min_nearby_chord(&self, query: &Aabb3) -> Option<f64> {
        let mut best: Option<f64> = None;
        for (bbox, chord) in &self.entries {
            if bbox.intersects(query) && best.map_or(true, |b| *chord < b) {
                best = Some(*chord);
            }
        }
        best
    }
}
