//! Primitive solid builders.
//!
//! These produce fully linked solids (every edge with exactly two trims) and
//! double as the reference inputs for the tessellation tests: the box exercises
//! the all-planar path, the cylinder exercises seams and closed trims, and the
//! sphere exercises poles.

use std::collections::HashMap;

use brep_core::error::Result;
use brep_geometry::{
    Arc2, CircularArc, Curve2, CylinderSurface, EdgeCurve, Line, Line2, PlaneSurface,
    SphereSurface,
};
use brep_math::{DVec2, DVec3, Point3, Vector3};

use crate::solid::Solid;
use crate::types::{TrimId, VertexId};

/// Axis-aligned box between `min` and `max`.
pub fn make_box(min: Point3, max: Point3) -> Result<Solid> {
    let mut solid = Solid::new();

    // Corner vertices indexed by (i, j, k) octant bits
    let mut corner = [[[VertexId::default(); 2]; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..2 {
                let p = DVec3::new(
                    if i == 0 { min.x } else { max.x },
                    if j == 0 { min.y } else { max.y },
                    if k == 0 { min.z } else { max.z },
                );
                corner[i][j][k] = solid.add_vertex(p);
            }
        }
    }
    let c = |i: usize, j: usize, k: usize| corner[i][j][k];

    // Per face: (origin corner, u_axis, v_axis, CCW corner cycle). u x v points
    // outward, and the cycle runs counter-clockwise in the face's UV frame.
    let faces: [(Point3, Vector3, Vector3, [VertexId; 4]); 6] = [
        // bottom (-Z)
        (
            min,
            Vector3::Y,
            Vector3::X,
            [c(0, 0, 0), c(0, 1, 0), c(1, 1, 0), c(1, 0, 0)],
        ),
        // top (+Z)
        (
            DVec3::new(min.x, min.y, max.z),
            Vector3::X,
            Vector3::Y,
            [c(0, 0, 1), c(1, 0, 1), c(1, 1, 1), c(0, 1, 1)],
        ),
        // front (-Y)
        (
            min,
            Vector3::X,
            Vector3::Z,
            [c(0, 0, 0), c(1, 0, 0), c(1, 0, 1), c(0, 0, 1)],
        ),
        // back (+Y)
        (
            DVec3::new(min.x, max.y, min.z),
            Vector3::Z,
            Vector3::X,
            [c(0, 1, 0), c(0, 1, 1), c(1, 1, 1), c(1, 1, 0)],
        ),
        // left (-X)
        (
            min,
            Vector3::Z,
            Vector3::Y,
            [c(0, 0, 0), c(0, 0, 1), c(0, 1, 1), c(0, 1, 0)],
        ),
        // right (+X)
        (
            DVec3::new(max.x, min.y, min.z),
            Vector3::Y,
            Vector3::Z,
            [c(1, 0, 0), c(1, 1, 0), c(1, 1, 1), c(1, 0, 1)],
        ),
    ];

    // Edge pairing: each undirected vertex pair collects its two trims
    let mut pending: HashMap<(VertexId, VertexId), Vec<(TrimId, VertexId, VertexId)>> =
        HashMap::new();

    for (origin, u_axis, v_axis, cycle) in faces {
        let face = solid.add_face(PlaneSurface::new(origin, u_axis, v_axis).into(), false);
        let uv = |v: VertexId, solid: &Solid| {
            let p = solid.vertices[v].position - origin;
            DVec2::new(p.dot(u_axis), p.dot(v_axis))
        };

        let mut trims = Vec::with_capacity(4);
        for s in 0..4 {
            let a = cycle[s];
            let b = cycle[(s + 1) % 4];
            let curve = Curve2::Line(Line2::new(uv(a, &solid), uv(b, &solid)));
            let trim = solid.add_trim(face, curve, a, b);
            trims.push(trim);

            let key = if a < b { (a, b) } else { (b, a) };
            pending.entry(key).or_default().push((trim, a, b));
        }
        solid.make_outer_loop(face, trims)?;
    }

    for ((va, vb), sides) in pending {
        debug_assert_eq!(sides.len(), 2);
        let pa = solid.vertices[va].position;
        let pb = solid.vertices[vb].position;
        let curve = EdgeCurve::new(Line::new(pa, pb).into());
        let (trim_a, a_start, _) = sides[0];
        let (trim_b, b_start, _) = sides[1];
        solid.make_edge(
            curve,
            va,
            vb,
            trim_a,
            a_start != va,
            trim_b,
            b_start != va,
        )?;
    }

    Ok(solid)
}

/// Closed cylinder of the given radius and height, base at the origin, axis +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Solid> {
    use std::f64::consts::TAU;

    let mut solid = Solid::new();

    let base = Point3::ZERO;
    let top_center = DVec3::new(0.0, 0.0, height);
    let seam_bottom = solid.add_vertex(DVec3::new(radius, 0.0, 0.0));
    let seam_top = solid.add_vertex(DVec3::new(radius, 0.0, height));

    let tube = solid.add_face(
        CylinderSurface::new(base, Vector3::Z, Vector3::X, radius).into(),
        false,
    );
    // Caps share the same UV frame; the bottom's outward normal opposes it
    let bottom = solid.add_face(PlaneSurface::new(base, Vector3::X, Vector3::Y).into(), true);
    let top = solid.add_face(
        PlaneSurface::new(top_center, Vector3::X, Vector3::Y).into(),
        false,
    );

    // Tube outer loop, counter-clockwise over [0, TAU] x [0, height]
    let t_bottom = solid.add_trim(
        tube,
        Curve2::Line(Line2::new(DVec2::new(0.0, 0.0), DVec2::new(TAU, 0.0))),
        seam_bottom,
        seam_bottom,
    );
    let t_seam_up = solid.add_trim(
        tube,
        Curve2::Line(Line2::new(DVec2::new(TAU, 0.0), DVec2::new(TAU, height))),
        seam_bottom,
        seam_top,
    );
    let t_top = solid.add_trim(
        tube,
        Curve2::Line(Line2::new(DVec2::new(TAU, height), DVec2::new(0.0, height))),
        seam_top,
        seam_top,
    );
    let t_seam_down = solid.add_trim(
        tube,
        Curve2::Line(Line2::new(DVec2::new(0.0, height), DVec2::new(0.0, 0.0))),
        seam_top,
        seam_bottom,
    );
    solid.make_outer_loop(tube, vec![t_bottom, t_seam_up, t_top, t_seam_down])?;

    // Cap loops are single closed trims
    let t_cap_bottom = solid.add_trim(
        bottom,
        Curve2::Arc(Arc2::new(DVec2::ZERO, radius, 0.0, TAU)),
        seam_bottom,
        seam_bottom,
    );
    solid.make_outer_loop(bottom, vec![t_cap_bottom])?;

    let t_cap_top = solid.add_trim(
        top,
        Curve2::Arc(Arc2::new(DVec2::ZERO, radius, 0.0, TAU)),
        seam_top,
        seam_top,
    );
    solid.make_outer_loop(top, vec![t_cap_top])?;

    // Model edges: the two rim circles and the parametric seam line
    let bottom_circle = EdgeCurve::new(
        CircularArc::full_circle(base, Vector3::Z, Vector3::X, radius).into(),
    );
    solid.make_edge(
        bottom_circle,
        seam_bottom,
        seam_bottom,
        t_bottom,
        false,
        t_cap_bottom,
        false,
    )?;

    let top_circle = EdgeCurve::new(
        CircularArc::full_circle(top_center, Vector3::Z, Vector3::X, radius).into(),
    );
    solid.make_edge(
        top_circle,
        seam_top,
        seam_top,
        t_top,
        true,
        t_cap_top,
        false,
    )?;

    let seam = EdgeCurve::new(
        Line::new(
            DVec3::new(radius, 0.0, 0.0),
            DVec3::new(radius, 0.0, height),
        )
        .into(),
    );
    solid.make_edge(
        seam,
        seam_bottom,
        seam_top,
        t_seam_up,
        false,
        t_seam_down,
        true,
    )?;

    Ok(solid)
}

/// Sphere of the given radius centered at the origin: a single face with two
/// pole (singular) trims and a seam meridian edge used twice.
pub fn make_sphere(radius: f64) -> Result<Solid> {
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    let mut solid = Solid::new();

    let south = solid.add_vertex_with_normal(DVec3::new(0.0, 0.0, -radius), -Vector3::Z);
    let north = solid.add_vertex_with_normal(DVec3::new(0.0, 0.0, radius), Vector3::Z);

    let face = solid.add_face(SphereSurface::new(Point3::ZERO, radius).into(), false);

    // Counter-clockwise over [0, TAU] x [-PI/2, PI/2]
    let t_south = solid.add_singular_trim(
        face,
        Curve2::Line(Line2::new(
            DVec2::new(0.0, -FRAC_PI_2),
            DVec2::new(TAU, -FRAC_PI_2),
        )),
        south,
    );
    let t_seam_up = solid.add_trim(
        face,
        Curve2::Line(Line2::new(
            DVec2::new(TAU, -FRAC_PI_2),
            DVec2::new(TAU, FRAC_PI_2),
        )),
        south,
        north,
    );
    let t_north = solid.add_singular_trim(
        face,
        Curve2::Line(Line2::new(
            DVec2::new(TAU, FRAC_PI_2),
            DVec2::new(0.0, FRAC_PI_2),
        )),
        north,
    );
    let t_seam_down = solid.add_trim(
        face,
        Curve2::Line(Line2::new(
            DVec2::new(0.0, FRAC_PI_2),
            DVec2::new(0.0, -FRAC_PI_2),
        )),
        north,
        south,
    );
    solid.make_outer_loop(face, vec![t_south, t_seam_up, t_north, t_seam_down])?;

    // Seam meridian from the south pole over the equator at u = 0 to the north
    let seam = EdgeCurve::new(
        CircularArc::new(Point3::ZERO, -Vector3::Y, -Vector3::Z, radius, PI).into(),
    );
    solid.make_edge(seam, south, north, t_seam_up, false, t_seam_down, true)?;

    Ok(solid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_entity_counts() {
        let solid = make_box(DVec3::ZERO, DVec3::ONE).unwrap();
        assert_eq!(solid.vertices.len(), 8);
        assert_eq!(solid.edges.len(), 12);
        assert_eq!(solid.faces.len(), 6);
        assert_eq!(solid.trims.len(), 24);
    }

    #[test]
    fn test_box_every_edge_has_two_trims() {
        let solid = make_box(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0)).unwrap();
        for (_, edge) in &solid.edges {
            let (ta, tb) = edge.trims.unwrap();
            assert_ne!(ta, tb);
        }
    }

    #[test]
    fn test_cylinder_entity_counts() {
        let solid = make_cylinder(1.0, 2.0).unwrap();
        assert_eq!(solid.faces.len(), 3);
        assert_eq!(solid.edges.len(), 3);
        assert_eq!(solid.vertices.len(), 2);
        // 4 tube trims + 2 cap trims
        assert_eq!(solid.trims.len(), 6);
    }

    #[test]
    fn test_cylinder_seam_edge_on_one_face() {
        let solid = make_cylinder(1.0, 2.0).unwrap();
        let seam = solid
            .edges
            .iter()
            .find(|(_, e)| e.start != e.end)
            .map(|(id, _)| id)
            .unwrap();
        let (ta, tb) = solid.edges[seam].trims.unwrap();
        assert_eq!(solid.trims[ta].face, solid.trims[tb].face);
    }

    #[test]
    fn test_sphere_has_two_singular_trims() {
        let solid = make_sphere(2.0).unwrap();
        assert_eq!(solid.faces.len(), 1);
        let singular = solid.trims.iter().filter(|(_, t)| t.is_singular()).count();
        assert_eq!(singular, 2);
        assert_eq!(solid.edges.len(), 1);
    }

    #[test]
    fn test_sphere_seam_matches_surface() {
        let solid = make_sphere(1.0).unwrap();
        let (_, edge) = solid.edges.iter().next().unwrap();
        let (face_id, _) = solid.faces.iter().next().unwrap();
        let surface = &solid.faces[face_id].surface;
        // The seam curve at mid-parameter must lie on the u=0 meridian
        let mid = edge.curve.point_at(edge.curve.length() * 0.5);
        let on_surface = surface.point_at(0.0, 0.0);
        assert!((mid - on_surface).length() < 1e-2);
    }
}
