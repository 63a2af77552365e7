//! Adaptive interior sampling of a face's parameter domain.
//!
//! The sampler quadtree-descends over the bounding box of the face's loop
//! points using an explicit patch stack. A patch stops subdividing when it is
//! physically small, or flat and aligned with its neighbors' boundary density;
//! every non-root leaf emits one jittered candidate point. Candidates are then
//! filtered against the loop polygons so triangulation only ever sees interior
//! points. The jitter is a pure function of the patch center, so resampling
//! the same face yields the same points.

use brep_core::{MeshTolerance, ResolvedTolerance};
use brep_geometry::{SurfaceGeometry, SurfaceKind};
use brep_math::{point_in_polygon, point_segment_distance, Aabb2, Aabb3, Point2, Vector3};
use slotmap::SlotMap;

use crate::proximity::EdgeSegIndex;
use crate::work::{FaceWork, TrimSeg, TrimSegKey};

pub const MAX_DEPTH: u32 = 10;

/// Chord count per iso-line length estimate.
const PROFILE_SAMPLES: usize = 8;

/// Physical arc lengths of three u- and three v-iso-lines across the sampled
/// domain, used to convert parameter extents into physical extents without
/// evaluating the surface per patch.
struct FaceProfiles {
    len_u: [f64; 3],
    len_v: [f64; 3],
    domain: Aabb2,
}

impl FaceProfiles {
    fn measure(surface: &SurfaceGeometry, domain: Aabb2) -> Self {
        let (u0, u1) = (domain.min.x, domain.max.x);
        let (v0, v1) = (domain.min.y, domain.max.y);
        let vc = 0.5 * (v0 + v1);
        let uc = 0.5 * (u0 + u1);

        let iso_u = |v: f64| {
            let mut len = 0.0;
            let mut prev = surface.point_at(u0, v);
            for i in 1..=PROFILE_SAMPLES {
                let u = u0 + (u1 - u0) * i as f64 / PROFILE_SAMPLES as f64;
                let p = surface.point_at(u, v);
                len += (p - prev).length();
                prev = p;
            }
            len
        };
        let iso_v = |u: f64| {
            let mut len = 0.0;
            let mut prev = surface.point_at(u, v0);
            for i in 1..=PROFILE_SAMPLES {
                let v = v0 + (v1 - v0) * i as f64 / PROFILE_SAMPLES as f64;
                let p = surface.point_at(u, v);
                len += (p - prev).length();
                prev = p;
            }
            len
        };

        Self {
            len_u: [iso_u(v0), iso_u(vc), iso_u(v1)],
            len_v: [iso_v(u0), iso_v(uc), iso_v(u1)],
            domain,
        }
    }

    fn lerp3(values: &[f64; 3], t: f64) -> f64 {
        if t < 0.5 {
            values[0] + (values[1] - values[0]) * (t * 2.0)
        } else {
            values[1] + (values[2] - values[1]) * ((t - 0.5) * 2.0)
        }
    }

    /// Estimated physical extents of a patch along u and v.
    fn patch_extents(&self, u0: f64, u1: f64, v0: f64, v1: f64) -> (f64, f64) {
        let w = (self.domain.max.x - self.domain.min.x).max(1e-300);
        let h = (self.domain.max.y - self.domain.min.y).max(1e-300);
        let tv = ((0.5 * (v0 + v1) - self.domain.min.y) / h).clamp(0.0, 1.0);
        let tu = ((0.5 * (u0 + u1) - self.domain.min.x) / w).clamp(0.0, 1.0);
        let eu = Self::lerp3(&self.len_u, tv) * (u1 - u0) / w;
        let ev = Self::lerp3(&self.len_v, tu) * (v1 - v0) / h;
        (eu, ev)
    }
}

fn jitter_hash(a: f64, b: f64) -> u64 {
    // FNV-1a over both coordinate bit patterns
    let mut h = 0xcbf2_9ce4_8422_2325_u64;
    for byte in a
        .to_bits()
        .to_le_bytes()
        .into_iter()
        .chain(b.to_bits().to_le_bytes())
    {
        h ^= u64::from(byte);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

/// Surface normal at `(u, v)`, substituting the pole normal on degenerate
/// iso-lines where the parametric normal vanishes.
fn normal_with_poles(surface: &SurfaceGeometry, u: f64, v: f64) -> Vector3 {
    for pole in surface.poles() {
        if (v - pole.v).abs() < 1e-9 {
            return pole.normal;
        }
    }
    surface.normal_at(u, v)
}

fn patch_is_flat(surface: &SurfaceGeometry, res: &ResolvedTolerance, u0: f64, u1: f64, v0: f64, v1: f64) -> bool {
    let p00 = surface.point_at(u0, v0);
    let p10 = surface.point_at(u1, v0);
    let p01 = surface.point_at(u0, v1);
    let p11 = surface.point_at(u1, v1);
    let pc = surface.point_at(0.5 * (u0 + u1), 0.5 * (v0 + v1));
    let bilinear = 0.25 * (p00 + p10 + p01 + p11);
    if (pc - bilinear).length() > res.within_dist {
        return false;
    }

    let normals = [
        normal_with_poles(surface, u0, v0),
        normal_with_poles(surface, u1, v0),
        normal_with_poles(surface, u0, v1),
        normal_with_poles(surface, u1, v1),
    ];
    for i in 0..normals.len() {
        for j in i + 1..normals.len() {
            if !res.within_angle(normals[i].dot(normals[j])) {
                return false;
            }
        }
    }
    true
}

fn patch_bbox_3d(surface: &SurfaceGeometry, u0: f64, u1: f64, v0: f64, v1: f64) -> Aabb3 {
    let corners = [
        surface.point_at(u0, v0),
        surface.point_at(u1, v0),
        surface.point_at(u0, v1),
        surface.point_at(u1, v1),
        surface.point_at(0.5 * (u0 + u1), 0.5 * (v0 + v1)),
    ];
    Aabb3::from_points(&corners).unwrap_or(Aabb3::new(corners[0], corners[0]))
}

/// Generate interior Steiner points for one face.
pub fn sample_interior(
    fw: &mut FaceWork,
    trim_segs: &SlotMap<TrimSegKey, TrimSeg>,
    surface: &SurfaceGeometry,
    tol: MeshTolerance,
    index: &EdgeSegIndex,
) {
    let outer = fw.loop_polygon(0, trim_segs);
    if outer.len() < 3 {
        return;
    }
    let holes: Vec<Vec<Point2>> = (1..fw.loops.len())
        .map(|i| fw.loop_polygon(i, trim_segs))
        .collect();

    let all_points: Vec<Point2> = fw.points.clone();
    let Some(domain) = Aabb2::from_points(&all_points) else {
        return;
    };
    let feature = Aabb3::from_points(&fw.space)
        .map(|b| b.diagonal())
        .unwrap_or(1.0);
    let res = tol.resolve(feature);
    let profiles = FaceProfiles::measure(surface, domain);

    let mut candidates: Vec<(Point2, f64, f64)> = Vec::new();
    let mut stack: Vec<(f64, f64, f64, f64, u32)> = vec![(
        domain.min.x,
        domain.max.x,
        domain.min.y,
        domain.max.y,
        0,
    )];

    while let Some((u0, u1, v0, v1, depth)) = stack.pop() {
        let (eu, ev) = profiles.patch_extents(u0, u1, v0, v1);
        let emit = |candidates: &mut Vec<(Point2, f64, f64)>| {
            // The root patch never emits: a terminal root means the boundary
            // alone describes the face
            if depth > 0 {
                let uc = 0.5 * (u0 + u1);
                let vc = 0.5 * (v0 + v1);
                candidates.push((Point2::new(uc, vc), u1 - u0, v1 - v0));
            }
        };

        if eu < 2.0 * res.min_dist && ev < 2.0 * res.min_dist {
            emit(&mut candidates);
            continue;
        }
        if depth >= MAX_DEPTH {
            emit(&mut candidates);
            continue;
        }

        let mut must_split =
            surface.kind() == SurfaceKind::General && (eu > res.max_dist || ev > res.max_dist);
        if !must_split {
            if patch_is_flat(surface, &res, u0, u1, v0, v1) {
                // Match the boundary's segment density before settling
                let nearby = index.min_nearby_chord(&patch_bbox_3d(surface, u0, u1, v0, v1));
                match nearby {
                    Some(chord) if eu.max(ev) > 2.0 * chord => must_split = true,
                    _ => {
                        emit(&mut candidates);
                        continue;
                    }
                }
            } else {
                must_split = true;
            }
        }
        debug_assert!(must_split);

        let uc = 0.5 * (u0 + u1);
        let vc = 0.5 * (v0 + v1);
        let ratio = eu / ev.max(1e-300);
        if ratio > 2.0 {
            stack.push((u0, uc, v0, v1, depth + 1));
            stack.push((uc, u1, v0, v1, depth + 1));
        } else if ratio < 0.5 {
            stack.push((u0, u1, v0, vc, depth + 1));
            stack.push((u0, u1, vc, v1, depth + 1));
        } else {
            stack.push((u0, uc, v0, vc, depth + 1));
            stack.push((uc, u1, v0, vc, depth + 1));
            stack.push((u0, uc, vc, v1, depth + 1));
            stack.push((uc, u1, vc, v1, depth + 1));
        }
    }

    // Jitter, then keep only points strictly interior to the trimmed region
    let boundary: Vec<(Point2, Point2)> = fw
        .loops
        .iter()
        .flat_map(|l| l.trim_segs.iter())
        .map(|&k| {
            let ts = &trim_segs[k];
            (fw.points[ts.a], fw.points[ts.b])
        })
        .collect();

    for (center, du, dv) in candidates {
        let h = jitter_hash(center.x, center.y);
        let jx = ((h & 0xffff) as f64 / 65535.0 - 0.5) * 0.2 * du;
        let jy = (((h >> 16) & 0xffff) as f64 / 65535.0 - 0.5) * 0.2 * dv;
        let uv = Point2::new(center.x + jx, center.y + jy);

        if !point_in_polygon(uv, &outer) {
            continue;
        }
        if holes.iter().any(|hole| point_in_polygon(uv, hole)) {
            continue;
        }
        // Clearance scales with the candidate's own patch, not the boundary
        // segment: a full-width singular segment must not veto the whole face
        let clearance = 0.25 * du.min(dv);
        let too_close = boundary
            .iter()
            .any(|&(a, b)| point_segment_distance(uv, a, b) < clearance);
        if too_close {
            continue;
        }

        let position = surface.point_at(uv.x, uv.y);
        let normal = normal_with_poles(surface, uv.x, uv.y);
        let idx = fw.add_point(uv, position, normal);
        if !fw.interior.contains(&idx) {
            fw.interior.push(idx);
        }
    }
}
