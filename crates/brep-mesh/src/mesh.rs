//! The tessellation output container.
//!
//! Vertices carry the exact surface normal evaluated during sampling (flipped
//! for reversed faces), so no normal reconstruction happens here; merging face
//! meshes is pure index offsetting. Seam and pole twins keep their duplicated
//! vertices with bit-identical positions, which is what makes the merged mesh
//! close watertight.

use brep_math::aabb::Aabb3;
use brep_math::{Point2, Point3, Vector3};

/// Indexed triangle mesh, one vertex entry per parameter-space point.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub positions: Vec<Point3>,
    /// Exact surface normals, parallel to `positions`
    pub normals: Vec<Vector3>,
    pub indices: Vec<u32>,
    /// Source parameter-space coordinates, parallel to `positions`
    pub uvs: Vec<Point2>,
}

impl TriangleMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append another face's mesh, rebasing its indices onto this vertex set.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }

    /// Axis-aligned bounds of every vertex position; degenerate at the origin
    /// for an empty mesh.
    pub fn bounding_box(&self) -> Aabb3 {
        Aabb3::from_points(&self.positions).unwrap_or(Aabb3::new(Point3::ZERO, Point3::ZERO))
    }
}
