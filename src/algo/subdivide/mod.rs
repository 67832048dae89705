//! Mesh subdivision algorithms.
//!
//! This module provides algorithms for subdividing meshes to create
//! smoother surfaces.
//!
//! # Loop Subdivision (Triangle Meshes)
//!
//! Loop subdivision (Loop, 1987) is an approximating subdivision scheme for
//! triangle meshes. Each iteration:
//!
//! 1. Inserts new vertices at edge midpoints (weighted positions)
//! 2. Updates original vertex positions based on neighbors
//! 3. Splits each triangle into 4 smaller triangles
//!
//! The result converges to a C² continuous surface (C¹ at extraordinary vertices).
//!
//! # Catmull-Clark Subdivision (Polygon Meshes)
//!
//! Catmull-Clark subdivision (Catmull & Clark, 1978) accepts faces of any
//! degree and produces an all-quad mesh. Each iteration:
//!
//! 1. Creates a face point at each face centroid
//! 2. Creates edge points from the edge endpoints and adjacent face points
//! 3. Updates original vertices using weighted average of neighbors
//! 4. Splits every n-gon into n quads
//!
//! # Boundaries
//!
//! With `preserve_boundary` (the default) boundary vertices follow the cubic
//! B-spline curve rule `1/8 * (left + right) + 3/4 * v` and boundary edge
//! points sit at the midpoint, so an open mesh keeps a well-defined rim.
//!
//! # Example
//!
//! ```
//! use edgefold::algo::subdivide::{loop_subdivide, SubdivideOptions};
//! use edgefold::mesh::{primitives, HalfEdgeMesh};
//!
//! let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
//! loop_subdivide(&mut mesh, &SubdivideOptions::new(2)).unwrap();
//! assert_eq!(mesh.num_faces(), 8 * 16);
//! ```
//!
//! # References
//!
//! - Loop, C. (1987). "Smooth Subdivision Surfaces Based on Triangles."
//!   Master's thesis, University of Utah.
//! - Catmull, E. & Clark, J. (1978). "Recursively generated B-spline surfaces
//!   on arbitrary topological meshes." Computer-Aided Design, 10(6), 350-355.

mod catmull_clark;
mod loop_subdivision;

pub use catmull_clark::{catmull_clark_subdivide, catmull_clark_subdivide_with_progress};
pub use loop_subdivision::{loop_subdivide, loop_subdivide_with_progress};

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Options for subdivision algorithms.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,

    /// Smooth boundary vertices along the boundary curve only. When false
    /// they get the interior rule like every other vertex.
    pub preserve_boundary: bool,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            preserve_boundary: true,
            parallel: true,
        }
    }

    /// Set whether to preserve boundary edges.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// The two neighbours of `v` along its boundary loop, `[previous, next]`, or
/// `None` for interior and isolated vertices.
fn boundary_neighbors<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Option<[VertexId<I>; 2]> {
    let out = mesh.vertex(v).halfedge;
    if !out.is_valid() || !mesh.is_boundary_halfedge(out) {
        return None;
    }
    Some([mesh.origin(mesh.prev(out)), mesh.dest(out)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_boundary_neighbors() {
        let grid: HalfEdgeMesh = primitives::quad_grid(2, 2, 1.0).unwrap();
        // Corner (0, 0) touches (1, 0) and (0, 1) along the rim.
        let [a, b] = boundary_neighbors(&grid, VertexId::new(0)).unwrap();
        let mut around = [a.index(), b.index()];
        around.sort_unstable();
        assert_eq!(around, [1, 3]);

        assert!(boundary_neighbors(&grid, VertexId::new(4)).is_none());
    }

    #[test]
    fn test_options() {
        let options = SubdivideOptions::new(3).with_preserve_boundary(false).sequential();
        assert_eq!(options.iterations, 3);
        assert!(!options.preserve_boundary);
        assert!(!options.parallel);
    }
}
