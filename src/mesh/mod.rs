//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and the edits the
//! simplifier performs on it.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], a polygon mesh stored as a half-edge
//! (doubly-connected edge list) structure in flat arenas. Adjacency queries are
//! O(1); edge collapses leave tombstones that [`HalfEdgeMesh::compact`] removes.
//! Edge splits and flips append new elements and leave no tombstones.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies a full edge (a twin pair of half-edges)
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! Meshes are typically constructed from file I/O or from face-vertex lists:
//!
//! ```
//! use edgefold::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 3);
//! ```

mod builder;
mod collapse;
mod edit;
mod halfedge;
mod index;
pub mod primitives;
mod stats;

pub use builder::{build_from_polygons, build_from_triangles, to_face_vertex};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use stats::MeshStats;
