use std::collections::HashMap;
use std::f64::consts::TAU;

use brep_core::MeshTolerance;
use brep_geometry::{Arc2, CircularArc, Curve2, CylinderSurface, EdgeCurve, Line2, PlaneSurface};
use brep_math::{DVec2, DVec3, Point3, Vector3};
use brep_mesh::{tessellate_solid, TessellationStatus, TriangleMesh};
use brep_topology::{primitives, Solid};

fn quantize(p: Point3) -> (i64, i64, i64) {
    const CELL: f64 = 1e-7;
    (
        (p.x / CELL).round() as i64,
        (p.y / CELL).round() as i64,
        (p.z / CELL).round() as i64,
    )
}

/// A closed mesh is watertight when every directed edge (by position) is
/// matched by exactly one opposite directed edge.
fn assert_watertight(mesh: &TriangleMesh) {
    let mut directed: HashMap<((i64, i64, i64), (i64, i64, i64)), i64> = HashMap::new();
    for tri in mesh.indices.chunks_exact(3) {
        let ps = [
            quantize(mesh.positions[tri[0] as usize]),
            quantize(mesh.positions[tri[1] as usize]),
            quantize(mesh.positions[tri[2] as usize]),
        ];
        for i in 0..3 {
            let (a, b) = (ps[i], ps[(i + 1) % 3]);
            *directed.entry((a, b)).or_insert(0) += 1;
            *directed.entry((b, a)).or_insert(0) -= 1;
        }
    }
    for (edge, balance) in directed {
        assert_eq!(
            balance, 0,
            "unbalanced directed edge {edge:?}: boundary or T-junction"
        );
    }
}

#[test]
fn test_box_mesh_is_watertight() {
    let solid = primitives::make_box(Point3::ZERO, Point3::new(2.0, 1.0, 3.0)).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.1));
    assert_eq!(result.status, TessellationStatus::Success);
    assert_watertight(&result.mesh);
}

#[test]
fn test_box_corners_shared_exactly() {
    let solid = primitives::make_box(Point3::ZERO, Point3::ONE).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.1));

    // Each of the 8 corners appears on 3 faces with bit-identical positions
    let mut unique: Vec<(i64, i64, i64)> = result.mesh.positions.iter().map(|&p| quantize(p)).collect();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 8);
}

#[test]
fn test_cylinder_mesh_is_watertight() {
    let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));
    assert_eq!(result.status, TessellationStatus::Success, "{:?}", result.error);
    assert_watertight(&result.mesh);
}

#[test]
fn test_sphere_mesh_is_watertight() {
    let solid = primitives::make_sphere(1.0).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));
    assert_eq!(result.status, TessellationStatus::Success, "{:?}", result.error);
    assert!(
        result.diagnostics.is_clean(),
        "degraded: {:?}",
        result.diagnostics.entries()
    );
    assert_watertight(&result.mesh);
}

#[test]
fn test_sphere_poles_present() {
    let solid = primitives::make_sphere(2.0).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));
    for pole in [Point3::new(0.0, 0.0, -2.0), Point3::new(0.0, 0.0, 2.0)] {
        let hits = result
            .mesh
            .positions
            .iter()
            .filter(|p| (**p - pole).length() < 1e-9)
            .count();
        assert!(hits >= 1, "pole {pole:?} missing from the mesh");
    }
}

#[test]
fn test_cylinder_seam_stays_in_period() {
    let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));

    // The tube face's parameter coordinates never leave one period
    let tube = result
        .faces
        .iter()
        .find(|f| f.mesh.uvs.iter().any(|uv| uv.x > 1.0))
        .expect("tube face");
    for uv in &tube.mesh.uvs {
        assert!(
            uv.x >= -1e-9 && uv.x <= TAU + 1e-9,
            "u={} escaped the period",
            uv.x
        );
    }
}

#[test]
fn test_shared_edge_points_identical_across_faces() {
    let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));

    // Collect per-face position sets on the bottom rim circle (z == 0, r == 1)
    let mut rim_sets: Vec<Vec<(i64, i64, i64)>> = Vec::new();
    for face in &result.faces {
        let mut on_rim: Vec<(i64, i64, i64)> = face
            .mesh
            .positions
            .iter()
            .filter(|p| p.z.abs() < 1e-9 && ((p.x * p.x + p.y * p.y).sqrt() - 1.0).abs() < 1e-9)
            .map(|&p| quantize(p))
            .collect();
        on_rim.sort_unstable();
        on_rim.dedup();
        if !on_rim.is_empty() {
            rim_sets.push(on_rim);
        }
    }
    // The bottom cap and the tube both border the rim and must agree exactly
    assert!(rim_sets.len() >= 2);
    for set in &rim_sets[1..] {
        assert_eq!(set, &rim_sets[0], "faces disagree about shared edge points");
    }
}

#[test]
fn test_tighter_tolerance_gives_finer_mesh() {
    let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
    let coarse = tessellate_solid(&solid, MeshTolerance::from_absolute(0.2));
    let fine = tessellate_solid(&solid, MeshTolerance::from_absolute(0.01));
    assert!(fine.mesh.triangle_count() > coarse.mesh.triangle_count());
}

#[test]
fn test_tessellation_is_deterministic() {
    let solid = primitives::make_sphere(1.5).unwrap();
    let tol = MeshTolerance::from_absolute(0.05);
    let a = tessellate_solid(&solid, tol);
    let b = tessellate_solid(&solid, tol);

    assert_eq!(a.mesh.vertex_count(), b.mesh.vertex_count());
    assert_eq!(a.mesh.indices, b.mesh.indices);
    for (pa, pb) in a.mesh.positions.iter().zip(&b.mesh.positions) {
        assert_eq!(pa, pb);
    }
}

#[test]
fn test_no_orphan_interior_points() {
    let solid = primitives::make_cylinder(1.0, 2.0).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.02));

    for face in &result.faces {
        let mut used = vec![false; face.mesh.positions.len()];
        for &i in &face.mesh.indices {
            used[i as usize] = true;
        }
        // Boundary twins may go unused after pole or seam canonicalization,
        // but they always coincide with a used position
        for (i, &u) in used.iter().enumerate() {
            if !u {
                let p = face.mesh.positions[i];
                assert!(
                    face.mesh
                        .positions
                        .iter()
                        .enumerate()
                        .any(|(j, q)| used[j] && (*q - p).length() < 1e-7),
                    "orphan point {p:?} matches no used vertex"
                );
            }
        }
    }
}

/// Capped cylinder whose tube face has no seam edge: the tube is bounded only
/// by its two rim circles, each winding the parameter period once.
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

    let bottom_circle =
        EdgeCurve::new(CircularArc::full_circle(base, Vector3::Z, Vector3::X, radius).into());
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
    let top_circle =
        EdgeCurve::new(CircularArc::full_circle(top_center, Vector3::Z, Vector3::X, radius).into());
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
fn test_seamless_tube_mesh_is_watertight() {
    let solid = open_tube(1.0, 2.0);
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));
    assert_eq!(result.status, TessellationStatus::Success, "{:?}", result.error);
    assert!(
        result.diagnostics.is_clean(),
        "degraded: {:?}",
        result.diagnostics.entries()
    );
    assert!(result.mesh.triangle_count() > 12);
    assert_watertight(&result.mesh);
}

#[test]
fn test_mesh_bounding_box_spans_solid() {
    let solid = open_tube(1.0, 2.0);
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.05));
    let bbox = result.mesh.bounding_box();
    assert!((bbox.min - DVec3::new(-1.0, -1.0, 0.0)).length() < 1e-2);
    assert!((bbox.max - DVec3::new(1.0, 1.0, 2.0)).length() < 1e-2);
}

#[test]
fn test_box_triangle_normals_face_outward() {
    let solid = primitives::make_box(Point3::ZERO, Point3::ONE).unwrap();
    let result = tessellate_solid(&solid, MeshTolerance::from_absolute(0.1));
    let center = Point3::new(0.5, 0.5, 0.5);

    for tri in result.mesh.indices.chunks_exact(3) {
        let a = result.mesh.positions[tri[0] as usize];
        let b = result.mesh.positions[tri[1] as usize];
        let c = result.mesh.positions[tri[2] as usize];
        let n = (b - a).cross(c - a);
        let outward = (a + b + c) / 3.0 - center;
        assert!(n.dot(outward) > 0.0, "triangle winding points inward");
    }
}
