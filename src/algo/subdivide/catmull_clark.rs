//! Catmull-Clark subdivision for polygon meshes.

use log::{debug, info};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::{build_from_polygons, EdgeId, FaceId, HalfEdgeMesh, MeshIndex, VertexId};

use super::{boundary_neighbors, SubdivideOptions};

/// Performs Catmull-Clark subdivision on a polygon mesh.
///
/// Faces of any degree are accepted; an n-gon becomes n quads, so after the
/// first iteration the mesh is all quads.
///
/// # Vertex Rules
///
/// - **Face point**: centroid of the face
/// - **Edge point**: `(v0 + v1 + f_left + f_right) / 4`, or the midpoint on the
///   boundary
/// - **Vertex point**: `(Q + 2R + (n-3)S) / n` where
///   - Q = average of adjacent face points
///   - R = average of adjacent edge midpoints
///   - S = original position
///   - n = valence
/// - **Boundary vertex**: `1/8 * (left + right) + 3/4 * v` when
///   `preserve_boundary` is set
pub fn catmull_clark_subdivide<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &SubdivideOptions) -> Result<()> {
    catmull_clark_subdivide_with_progress(mesh, options, &Progress::none())
}

/// Catmull-Clark subdivision with progress reporting.
pub fn catmull_clark_subdivide_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<()> {
    info!(
        "Catmull-Clark subdivision: {} iterations on {} faces",
        options.iterations,
        mesh.num_faces()
    );
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Catmull-Clark subdivision");
        *mesh = catmull_clark_subdivide_once(mesh, options)?;
        debug!(
            "Catmull-Clark pass {}: {} vertices, {} faces",
            iter + 1,
            mesh.num_vertices(),
            mesh.num_faces()
        );
    }
    progress.report(options.iterations, options.iterations, "Catmull-Clark subdivision");
    info!("Catmull-Clark subdivision done: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    Ok(())
}

/// One pass. New vertices are the updated originals, then one face point per
/// face, then one edge point per edge.
fn catmull_clark_subdivide_once<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    options: &SubdivideOptions,
) -> Result<HalfEdgeMesh<I>> {
    let mut compacted;
    let mesh = if mesh.has_tombstones() {
        compacted = mesh.clone();
        compacted.compact();
        &compacted
    } else {
        mesh
    };

    let num_vertices = mesh.num_vertices();
    let num_faces = mesh.num_faces();
    let num_edges = mesh.num_edges();

    let face_at = |i: usize| mesh.face_centroid(FaceId::new(i));
    let face_points: Vec<Point3<f64>> = if options.parallel {
        (0..num_faces).into_par_iter().map(face_at).collect()
    } else {
        (0..num_faces).map(face_at).collect()
    };

    let fp = &face_points;
    let edge_at = |i: usize| edge_point(mesh, fp, EdgeId::new(i));
    let vertex_at = |i: usize| vertex_point(mesh, fp, VertexId::new(i), options.preserve_boundary);
    let (mut points, edge_points): (Vec<Point3<f64>>, Vec<Point3<f64>>) = if options.parallel {
        (
            (0..num_vertices).into_par_iter().map(vertex_at).collect(),
            (0..num_edges).into_par_iter().map(edge_at).collect(),
        )
    } else {
        (
            (0..num_vertices).map(vertex_at).collect(),
            (0..num_edges).map(edge_at).collect(),
        )
    };
    points.extend_from_slice(&face_points);
    points.extend(edge_points);

    let edge_base = num_vertices + num_faces;
    let mut faces: Vec<[usize; 4]> = Vec::with_capacity(mesh.num_halfedges());
    for f in mesh.face_ids() {
        let center = num_vertices + f.index();
        for he in mesh.face_halfedges(f) {
            let incoming = mesh.prev(he);
            faces.push([
                mesh.origin(he).index(),
                edge_base + he.edge().index(),
                center,
                edge_base + incoming.edge().index(),
            ]);
        }
    }

    build_from_polygons(&points, &faces)
}

fn edge_point<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, face_points: &[Point3<f64>], e: EdgeId<I>) -> Point3<f64> {
    let he = e.halfedge();
    let tw = mesh.twin(he);
    let ends = mesh.position(mesh.origin(he)).coords + mesh.position(mesh.origin(tw)).coords;

    if mesh.is_boundary_edge(he) {
        return Point3::from(ends * 0.5);
    }
    let left = face_points[mesh.face_of(he).index()].coords;
    let right = face_points[mesh.face_of(tw).index()].coords;
    Point3::from((ends + left + right) * 0.25)
}

fn vertex_point<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    face_points: &[Point3<f64>],
    v: VertexId<I>,
    preserve_boundary: bool,
) -> Point3<f64> {
    let s = mesh.position(v).coords;

    if preserve_boundary {
        if let Some([left, right]) = boundary_neighbors(mesh, v) {
            let sum = mesh.position(left).coords + mesh.position(right).coords;
            return Point3::from(sum * (1.0 / 8.0) + s * (3.0 / 4.0));
        }
    }

    let adjacent_faces: Vec<FaceId<I>> = mesh.vertex_faces(v).collect();
    let n = mesh.valence(v);
    if n == 0 || adjacent_faces.is_empty() {
        return Point3::from(s);
    }

    let q = adjacent_faces
        .iter()
        .map(|f| face_points[f.index()].coords)
        .sum::<Vector3<f64>>()
        / adjacent_faces.len() as f64;
    let r = mesh
        .vertex_neighbors(v)
        .map(|u| (s + mesh.position(u).coords) * 0.5)
        .sum::<Vector3<f64>>()
        / n as f64;

    let n_f = n as f64;
    Point3::from((q + r * 2.0 + s * (n_f - 3.0)) / n_f)
}
