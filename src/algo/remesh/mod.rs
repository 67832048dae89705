//! Isotropic remeshing.
//!
//! Rebuilds the connectivity of a triangle mesh so that edges approach a
//! target length `L` and vertices approach valence 6 (4 on the boundary).
//! Each iteration runs four local passes directly on the half-edge mesh:
//!
//! 1. Split every edge longer than `4/3 L` at its midpoint
//! 2. Collapse every edge shorter than `4/5 L` whose new edges stay below `4/3 L`
//! 3. Flip interior edges whenever that lowers the valence excess of the
//!    four vertices involved
//! 4. Move each vertex towards the centroid of its neighbours, within the
//!    tangent plane of its area-weighted normal
//!
//! With `preserve_boundary` (the default) boundary edges are never split or
//! collapsed and boundary vertices never move, so the rim of an open mesh is
//! kept exactly.
//!
//! # Example
//!
//! ```
//! use edgefold::algo::remesh::{average_edge_length, isotropic_remesh, RemeshOptions};
//! use edgefold::mesh::{primitives, HalfEdgeMesh};
//!
//! let mut mesh: HalfEdgeMesh = primitives::uv_sphere(8, 16, 1.0).unwrap();
//! let target = average_edge_length(&mesh) / 2.0;
//! isotropic_remesh(&mut mesh, &RemeshOptions::with_target_length(target)).unwrap();
//! assert!(mesh.is_valid());
//! ```
//!
//! # References
//!
//! - Botsch, M. & Kobbelt, L. (2004). "A Remeshing Approach to Multiresolution
//!   Modeling." Symposium on Geometry Processing.

mod isotropic;

pub use isotropic::{isotropic_remesh, isotropic_remesh_with_progress, RemeshOptions};

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Mean length of the live edges, or 0 for a mesh without edges.
pub fn average_edge_length<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> f64 {
    let n = mesh.num_edges();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = mesh.edge_ids().map(|e| mesh.edge_length(e.halfedge())).sum();
    total / n as f64
}

/// One round of tangential relaxation. All new positions are computed from
/// the old ones before any vertex moves.
pub(crate) fn tangential_smooth<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    lambda: f64,
    preserve_boundary: bool,
    parallel: bool,
) {
    let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    let positions: Vec<Point3<f64>> = {
        let view: &HalfEdgeMesh<I> = mesh;
        let smoothed = |v: VertexId<I>| smoothed_position(view, v, lambda, preserve_boundary);
        if parallel {
            ids.par_iter().map(|&v| smoothed(v)).collect()
        } else {
            ids.iter().map(|&v| smoothed(v)).collect()
        }
    };

    for (v, p) in ids.into_iter().zip(positions) {
        mesh.set_position(v, p);
    }
}

fn smoothed_position<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    lambda: f64,
    preserve_boundary: bool,
) -> Point3<f64> {
    let p = *mesh.position(v);
    if preserve_boundary && mesh.is_boundary_vertex(v) {
        return p;
    }
    let n = mesh.valence(v);
    if n == 0 {
        return p;
    }

    let neighbors: Vector3<f64> = mesh.vertex_neighbors(v).map(|u| mesh.position(u).coords).sum();
    let centroid = neighbors / n as f64;
    let normal: Vector3<f64> = mesh.vertex_faces(v).map(|f| mesh.face_area_vector(f)).sum();

    let displacement = centroid - p.coords;
    let tangent = match normal.try_normalize(1e-12) {
        Some(n) => displacement - n * n.dot(&displacement),
        None => displacement,
    };
    Point3::from(p.coords + tangent * lambda)
}
