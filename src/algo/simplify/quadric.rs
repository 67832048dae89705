//! Quadric error metric (Garland & Heckbert, 1997).

use nalgebra::{Matrix4, Point3, Vector4};

use crate::mesh::{FaceId, HalfEdgeId, HalfEdgeMesh, MeshIndex};

/// A quadric error matrix (4x4 symmetric matrix).
///
/// Represents the sum of squared distances to a set of planes.
/// Stored as 10 unique elements since the matrix is symmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Quadric {
    /// Upper triangular elements: [a, b, c, d, e, f, g, h, i, j]
    /// Matrix form:
    /// | a b c d |
    /// | b e f g |
    /// | c f h i |
    /// | d g i j |
    data: [f64; 10],
}

impl Quadric {
    pub(crate) fn zero() -> Self {
        Self { data: [0.0; 10] }
    }

    /// Quadric of the plane `ax + by + cz + d = 0` with `(a, b, c)` normalized.
    pub(crate) fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            data: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Quadric of the plane through a triangle, or `None` if it is degenerate.
    pub(crate) fn from_triangle(p: [Point3<f64>; 3]) -> Option<Self> {
        let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
        let len = normal.norm();
        if len < 1e-12 {
            return None;
        }
        let n = normal / len;
        Some(Self::from_plane(n.x, n.y, n.z, -n.dot(&p[0].coords)))
    }

    pub(crate) fn add_assign(&mut self, other: &Quadric) {
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += *b;
        }
    }

    /// `v^T Q v` with `v = [x, y, z, 1]`.
    pub(crate) fn evaluate(&self, p: &Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        let d = &self.data;
        d[0] * x * x
            + 2.0 * d[1] * x * y
            + 2.0 * d[2] * x * z
            + 2.0 * d[3] * x
            + d[4] * y * y
            + 2.0 * d[5] * y * z
            + 2.0 * d[6] * y
            + d[7] * z * z
            + 2.0 * d[8] * z
            + d[9]
    }

    fn to_matrix(self) -> Matrix4<f64> {
        let d = self.data;
        Matrix4::new(
            d[0], d[1], d[2], d[3],
            d[1], d[4], d[5], d[6],
            d[2], d[5], d[7], d[8],
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Point minimizing the error, or `None` if the system is singular.
    pub(crate) fn optimal_point(&self) -> Option<Point3<f64>> {
        let inv = self.to_matrix().try_inverse()?;
        let v = inv * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let p = Point3::new(v.x, v.y, v.z);
        p.coords.iter().all(|c| c.is_finite()).then_some(p)
    }

    /// Sum of the planes of every live face touching either endpoint of `he`.
    ///
    /// Faces shared by both endpoints are counted once.
    pub(crate) fn around_edge<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Self {
        let v0 = mesh.origin(he);
        let v1 = mesh.dest(he);
        let shared = [mesh.face_of(he), mesh.face_of(mesh.twin(he))];

        let mut q = Quadric::zero();
        let mut add = |f: FaceId<I>| {
            if let Some(face_q) = Quadric::from_triangle(mesh.face_positions(f)) {
                q.add_assign(&face_q);
            }
        };
        mesh.vertex_faces(v0).for_each(&mut add);
        mesh.vertex_faces(v1)
            .filter(|f| !shared.contains(f))
            .for_each(&mut add);
        q
    }

    /// Best collapse target for `he` under this quadric.
    ///
    /// Uses the optimum when it exists and lies within twice the edge length
    /// of the midpoint; otherwise the cheapest of the endpoints and midpoint.
    pub(crate) fn best_point<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> Point3<f64> {
        let p0 = *mesh.position(mesh.origin(he));
        let p1 = *mesh.position(mesh.dest(he));
        let mid = Point3::from((p0.coords + p1.coords) * 0.5);

        if let Some(p) = self.optimal_point() {
            if (p - mid).norm() < (p1 - p0).norm() * 2.0 {
                return p;
            }
        }

        [p0, p1, mid]
            .into_iter()
            .map(|p| (self.evaluate(&p), p))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or(mid, |(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_plane_distance() {
        // z = 1 plane
        let q = Quadric::from_plane(0.0, 0.0, 1.0, -1.0);
        assert!(q.evaluate(&Point3::new(5.0, -3.0, 1.0)).abs() < 1e-12);
        assert!((q.evaluate(&Point3::new(0.0, 0.0, 3.0)) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_corner_optimum() {
        // Three orthogonal planes meet in a single point.
        let mut q = Quadric::from_plane(1.0, 0.0, 0.0, -1.0);
        q.add_assign(&Quadric::from_plane(0.0, 1.0, 0.0, -2.0));
        q.add_assign(&Quadric::from_plane(0.0, 0.0, 1.0, -3.0));
        let p = q.optimal_point().unwrap();
        assert!((p - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-9);
    }

    #[test]
    fn test_flat_region_is_singular() {
        let grid: HalfEdgeMesh = primitives::triangle_grid(3, 3, 1.0).unwrap();
        let he = grid.edge_ids().next().unwrap().halfedge();
        let q = Quadric::around_edge(&grid, he);
        assert!(q.optimal_point().is_none());
        // Every candidate point lies in the plane, so the fallback costs nothing.
        let p = q.best_point(&grid, he);
        assert!(q.evaluate(&p).abs() < 1e-12);
    }
}
