//! # Edgefold
//!
//! Edge-collapse simplification of polygon meshes.
//!
//! Edgefold stores meshes in an arena-backed half-edge structure, reads and
//! writes them as OFF files, and reduces triangle meshes by repeatedly
//! collapsing the cheapest legal edge. Loop and Catmull-Clark subdivision
//! cover the opposite direction, and isotropic remeshing evens out edge
//! lengths at a chosen resolution.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Topology-safe collapses**: link-condition checks keep the mesh manifold
//! - **Pluggable policies**: edge length or quadric cost, midpoint or quadric
//!   placement, edge/face count stop predicates
//! - **Isotropic remeshing**: split, collapse, flip and tangential smoothing
//!   towards a target edge length
//! - **Deterministic**: identical input gives identical output, parallel or not
//!
//! ## Quick Start
//!
//! ```no_run
//! use edgefold::prelude::*;
//! use edgefold::algo::simplify::{simplify, EdgeLengthCost, MidpointPlacement};
//!
//! let mut mesh: HalfEdgeMesh = edgefold::io::load("model.off").unwrap();
//! println!("{}", mesh.stats());
//!
//! let target = mesh.num_edges() / 2;
//! let report = simplify(&mut mesh, target, &EdgeLengthCost, &MidpointPlacement).unwrap();
//! println!("{} edges removed", report.edges_removed);
//!
//! edgefold::io::save(&mesh, "out.off").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use edgefold::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_edges(), 6);
//! assert!(mesh.stats().euler_characteristic_ok);
//! ```
//!
//! ## Mesh Traversal
//!
//! ```
//! use edgefold::prelude::*;
//! use edgefold::mesh::primitives;
//!
//! let mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
//! let v = VertexId::new(0);
//! assert_eq!(mesh.vertex_neighbors(v).count(), 4);
//! assert_eq!(mesh.vertex_faces(v).count(), 4);
//!
//! let f = FaceId::new(0);
//! let [a, b, c] = mesh.face_triangle(f);
//! assert!(a != b && b != c && a != c);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use edgefold::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::simplify::{
        simplify, simplify_with, CostPolicy, PlacementPolicy, SimplifyOptions, SimplifyReport,
        StopPredicate, StopReason,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_face_vertex, EdgeId, Face, FaceId, HalfEdge,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, MeshStats, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
