use crate::{Point3, Vector3};
use nalgebra::{Matrix3, SymmetricEigen};
use serde::{Deserialize, Serialize};

/// A plane in 3D space defined by a point and unit normal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vector3,
}

impl Plane {
    pub fn new(origin: Point3, normal: Vector3) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
        }
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, point: Point3) -> f64 {
        (point - self.origin).dot(self.normal)
    }

    /// Project a point onto this plane.
    pub fn project_point(&self, point: Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// An orthonormal basis `(x, y)` spanning the plane.
    pub fn basis(&self) -> (Vector3, Vector3) {
        let n = self.normal;
        let ref_vec = if n.x.abs() < 0.9 { Vector3::X } else { Vector3::Y };
        let x = n.cross(ref_vec).normalize();
        let y = n.cross(x).normalize();
        (x, y)
    }

    /// Least-squares best-fit plane through a point set.
    ///
    /// The normal is the eigenvector of the smallest eigenvalue of the covariance
    /// matrix. Returns `None` for fewer than 3 points or a (near-)collinear set.
    pub fn best_fit(points: &[Point3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let n = points.len() as f64;
        let centroid = points.iter().copied().sum::<Point3>() / n;

        let mut cov = Matrix3::zeros();
        for &p in points {
            let d = p - centroid;
            let d = nalgebra::Vector3::new(d.x, d.y, d.z);
            cov += d * d.transpose();
        }

        let eigen = SymmetricEigen::new(cov);
        let mut min_idx = 0;
        for i in 1..3 {
            if eigen.eigenvalues[i] < eigen.eigenvalues[min_idx] {
                min_idx = i;
            }
        }
        // The two in-plane eigenvalues must dominate, otherwise the set is collinear
        let mut sorted = [eigen.eigenvalues[0], eigen.eigenvalues[1], eigen.eigenvalues[2]];
        sorted.sort_by(f64::total_cmp);
        if sorted[1] < 1e-18 {
            return None;
        }

        let col = eigen.eigenvectors.column(min_idx);
        let normal = Vector3::new(col[0], col[1], col[2]);
        if normal.length_squared() < 1e-18 {
            return None;
        }
        Some(Self::new(centroid, normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    #[test]
    fn test_signed_distance() {
        let plane = Plane::new(Point3::ZERO, Vector3::Z);
        assert!((plane.signed_distance(dvec3(0.0, 0.0, 5.0)) - 5.0).abs() < 1e-10);
        assert!((plane.signed_distance(dvec3(0.0, 0.0, -3.0)) + 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_project_point() {
        let plane = Plane::new(Point3::ZERO, Vector3::Z);
        let projected = plane.project_point(dvec3(1.0, 2.0, 5.0));
        assert!((projected - dvec3(1.0, 2.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_basis_orthonormal() {
        let plane = Plane::new(Point3::ZERO, dvec3(1.0, 2.0, 3.0));
        let (x, y) = plane.basis();
        assert!((x.length() - 1.0).abs() < 1e-10);
        assert!((y.length() - 1.0).abs() < 1e-10);
        assert!(x.dot(y).abs() < 1e-10);
        assert!(x.dot(plane.normal).abs() < 1e-10);
    }

    #[test]
    fn test_best_fit_exact_plane() {
        let pts = vec![
            dvec3(0.0, 0.0, 1.0),
            dvec3(1.0, 0.0, 1.0),
            dvec3(0.0, 1.0, 1.0),
            dvec3(1.0, 1.0, 1.0),
        ];
        let plane = Plane::best_fit(&pts).unwrap();
        assert!(plane.normal.z.abs() > 0.999);
        for &p in &pts {
            assert!(plane.signed_distance(p).abs() < 1e-10);
        }
    }

    #[test]
    fn test_best_fit_noisy_plane() {
        let mut pts = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                let z = if (i + j) % 2 == 0 { 0.01 } else { -0.01 };
                pts.push(dvec3(i as f64, j as f64, z));
            }
        }
        let plane = Plane::best_fit(&pts).unwrap();
        assert!(plane.normal.z.abs() > 0.99);
    }

    #[test]
    fn test_best_fit_collinear_rejected() {
        let pts = vec![dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0), dvec3(2.0, 0.0, 0.0)];
        assert!(Plane::best_fit(&pts).is_none());
    }
}
