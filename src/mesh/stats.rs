//! Summary statistics of a mesh.

use std::fmt;

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::MeshIndex;

/// Element counts and sanity checks for a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStats {
    /// Live vertices.
    pub vertex_count: usize,
    /// Live faces.
    pub face_count: usize,
    /// Live edges.
    pub edge_count: usize,
    /// Edges with a face on one side only.
    pub boundary_edge_count: usize,
    /// `V - E + F`.
    pub euler_characteristic: i64,
    /// Whether `V + F - E == 2`, i.e. a closed genus-0 surface.
    pub euler_characteristic_ok: bool,
    /// Whether the half-edge connectivity is consistent.
    pub is_valid: bool,
    /// Whether every face is a triangle.
    pub is_triangle_mesh: bool,
    /// Axis-aligned bounding box, `None` for a mesh without vertices.
    pub bounding_box: Option<(Point3<f64>, Point3<f64>)>,
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Compute summary statistics.
    ///
    /// # Example
    /// ```
    /// use edgefold::mesh::{primitives, HalfEdgeMesh};
    ///
    /// let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
    /// let stats = cube.stats();
    /// assert_eq!((stats.vertex_count, stats.face_count, stats.edge_count), (8, 12, 18));
    /// assert!(stats.euler_characteristic_ok);
    /// ```
    pub fn stats(&self) -> MeshStats {
        let vertex_count = self.num_vertices();
        let face_count = self.num_faces();
        let edge_count = self.num_edges();
        let euler_characteristic = vertex_count as i64 - edge_count as i64 + face_count as i64;

        MeshStats {
            vertex_count,
            face_count,
            edge_count,
            boundary_edge_count: self
                .edge_ids()
                .filter(|e| self.is_boundary_edge(e.halfedge()))
                .count(),
            euler_characteristic,
            euler_characteristic_ok: euler_characteristic == 2,
            is_valid: self.is_valid(),
            is_triangle_mesh: self.is_triangle_mesh(),
            bounding_box: self.bounding_box(),
        }
    }
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        writeln!(f, "vertices:       {}", self.vertex_count)?;
        writeln!(f, "faces:          {}", self.face_count)?;
        writeln!(f, "edges:          {}", self.edge_count)?;
        writeln!(f, "boundary edges: {}", self.boundary_edge_count)?;
        writeln!(
            f,
            "V - E + F:      {} ({})",
            self.euler_characteristic,
            if self.euler_characteristic_ok { "ok" } else { "not 2" }
        )?;
        writeln!(f, "valid:          {}", yes_no(self.is_valid))?;
        write!(f, "triangles only: {}", yes_no(self.is_triangle_mesh))?;
        if let Some((min, max)) = &self.bounding_box {
            write!(
                f,
                "\nbounding box:   [{}, {}, {}] - [{}, {}, {}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::mesh::{primitives, HalfEdgeMesh};

    #[test]
    fn test_open_grid_stats() {
        let grid: HalfEdgeMesh = primitives::triangle_grid(2, 2, 1.0).unwrap();
        let stats = grid.stats();
        assert_eq!(stats.vertex_count, 9);
        assert_eq!(stats.face_count, 8);
        assert_eq!(stats.edge_count, 16);
        assert_eq!(stats.boundary_edge_count, 8);
        assert_eq!(stats.euler_characteristic, 1);
        assert!(!stats.euler_characteristic_ok);
        assert!(stats.is_valid);
        assert!(stats.is_triangle_mesh);
    }

    #[test]
    fn test_sphere_stats() {
        let sphere: HalfEdgeMesh = primitives::uv_sphere(6, 8, 2.0).unwrap();
        let stats = sphere.stats();
        assert!(stats.euler_characteristic_ok);
        assert_eq!(stats.boundary_edge_count, 0);
        let (min, max) = stats.bounding_box.unwrap();
        assert!((max.z - 2.0).abs() < 1e-12);
        assert!((min.z + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
        let text = cube.stats().to_string();
        assert!(text.contains("edges:          18"));
        assert!(text.contains("V - E + F:      2 (ok)"));
        assert!(text.ends_with("[0, 0, 0] - [1, 1, 1]"));
    }
}
