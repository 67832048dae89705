//! Loop subdivision for triangle meshes.

use log::{debug, info};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::{build_from_triangles, EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

use super::{boundary_neighbors, SubdivideOptions};

/// Performs Loop subdivision on a triangle mesh.
///
/// Each iteration splits every triangle into four, so the face count grows by
/// a factor of 4 per iteration.
///
/// # Vertex Rules
///
/// - **Interior edge vertex**: `3/8 * (v0 + v1) + 1/8 * (v_left + v_right)`
/// - **Boundary edge vertex**: `1/2 * (v0 + v1)`
/// - **Interior vertex**: `(1 - n*β) * v + β * Σ(neighbors)`
/// - **Boundary vertex**: `1/8 * (left + right) + 3/4 * v`, or the interior
///   rule when `preserve_boundary` is off
///
/// # Errors
/// [`MeshError::NotTriangleMesh`](crate::error::MeshError::NotTriangleMesh)
/// if any face is not a triangle. The mesh is left untouched in that case.
pub fn loop_subdivide<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &SubdivideOptions) -> Result<()> {
    loop_subdivide_with_progress(mesh, options, &Progress::none())
}

/// Loop subdivision with progress reporting.
pub fn loop_subdivide_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<()> {
    mesh.require_triangles()?;

    info!(
        "Loop subdivision: {} iterations on {} faces",
        options.iterations,
        mesh.num_faces()
    );
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Loop subdivision");
        *mesh = loop_subdivide_once(mesh, options)?;
        debug!(
            "Loop pass {}: {} vertices, {} faces",
            iter + 1,
            mesh.num_vertices(),
            mesh.num_faces()
        );
    }
    progress.report(options.iterations, options.iterations, "Loop subdivision");
    info!("Loop subdivision done: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    Ok(())
}

/// One subdivision pass. New vertices are laid out as the updated original
/// vertices followed by one vertex per edge, in id order.
fn loop_subdivide_once<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, options: &SubdivideOptions) -> Result<HalfEdgeMesh<I>> {
    let mut compacted;
    let mesh = if mesh.has_tombstones() {
        compacted = mesh.clone();
        compacted.compact();
        &compacted
    } else {
        mesh
    };

    let num_vertices = mesh.num_vertices();
    let vertex_at = |i: usize| vertex_point(mesh, VertexId::new(i), options.preserve_boundary);
    let edge_at = |i: usize| edge_point(mesh, EdgeId::new(i));

    let (mut points, edge_points): (Vec<Point3<f64>>, Vec<Point3<f64>>) = if options.parallel {
        (
            (0..num_vertices).into_par_iter().map(vertex_at).collect(),
            (0..mesh.num_edges()).into_par_iter().map(edge_at).collect(),
        )
    } else {
        (
            (0..num_vertices).map(vertex_at).collect(),
            (0..mesh.num_edges()).map(edge_at).collect(),
        )
    };
    points.extend(edge_points);

    let mid = |h: HalfEdgeId<I>| num_vertices + h.edge().index();
    let mut faces = Vec::with_capacity(mesh.num_faces() * 4);
    for f in mesh.face_ids() {
        let ha = mesh.face(f).halfedge;
        let hb = mesh.next(ha);
        let hc = mesh.next(hb);
        let [a, b, c] = [ha, hb, hc].map(|h| mesh.origin(h).index());
        let (ab, bc, ca) = (mid(ha), mid(hb), mid(hc));

        faces.push([a, ab, ca]);
        faces.push([b, bc, ab]);
        faces.push([c, ca, bc]);
        faces.push([ab, bc, ca]);
    }

    build_from_triangles(&points, &faces)
}

fn edge_point<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> Point3<f64> {
    let he = e.halfedge();
    let tw = mesh.twin(he);
    let p0 = mesh.position(mesh.origin(he)).coords;
    let p1 = mesh.position(mesh.origin(tw)).coords;

    if mesh.is_boundary_edge(he) {
        return Point3::from((p0 + p1) * 0.5);
    }
    let left = mesh.position(mesh.origin(mesh.prev(he))).coords;
    let right = mesh.position(mesh.origin(mesh.prev(tw))).coords;
    Point3::from((p0 + p1) * (3.0 / 8.0) + (left + right) * (1.0 / 8.0))
}

fn vertex_point<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>, preserve_boundary: bool) -> Point3<f64> {
    let p = *mesh.position(v);

    if preserve_boundary {
        if let Some([left, right]) = boundary_neighbors(mesh, v) {
            let sum = mesh.position(left).coords + mesh.position(right).coords;
            return Point3::from(sum * (1.0 / 8.0) + p.coords * (3.0 / 4.0));
        }
    }

    let n = mesh.valence(v);
    if n == 0 {
        return p;
    }
    let beta = loop_beta(n);
    let sum: Vector3<f64> = mesh.vertex_neighbors(v).map(|u| mesh.position(u).coords).sum();
    Point3::from(p.coords * (1.0 - n as f64 * beta) + sum * beta)
}

/// Loop's vertex weight for valence `n`: `1/n * (5/8 - (3/8 + 1/4 cos(2π/n))²)`.
fn loop_beta(n: usize) -> f64 {
    if n == 3 {
        3.0 / 16.0
    } else {
        let n_f = n as f64;
        let inner = 3.0 / 8.0 + 0.25 * (2.0 * std::f64::consts::PI / n_f).cos();
        (5.0 / 8.0 - inner * inner) / n_f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::mesh::primitives;

    fn single_triangle() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    fn euler(mesh: &HalfEdgeMesh) -> i64 {
        mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
    }

    #[test]
    fn test_single_triangle() {
        let mut mesh = single_triangle();
        loop_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();

        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_edges(), 9);
        assert!(mesh.is_valid());

        // Corners of a lone triangle are boundary vertices with two boundary
        // neighbours, so they move toward them.
        let p = *mesh.position(VertexId::new(0));
        let expected = Point3::new((1.0 + 0.5) / 8.0, 1.0 / 8.0, 0.0);
        assert!((p - expected).norm() < 1e-12);
    }

    #[test]
    fn test_closed_mesh_counts_and_euler() {
        let mut mesh: HalfEdgeMesh = primitives::tetrahedron().unwrap();
        loop_subdivide(&mut mesh, &SubdivideOptions::new(2)).unwrap();

        // E' = 2E + 3F per pass: 6 -> 24 -> 96.
        assert_eq!(mesh.num_faces(), 4 * 16);
        assert_eq!(mesh.num_edges(), 96);
        assert_eq!(euler(&mesh), 2);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_zero_iterations_is_noop() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let before = mesh.clone();
        loop_subdivide(&mut mesh, &SubdivideOptions::new(0)).unwrap();
        assert_eq!(mesh.num_faces(), before.num_faces());
        assert_eq!(mesh.position(VertexId::new(0)), before.position(VertexId::new(0)));
    }

    #[test]
    fn test_rejects_quads() {
        let mut mesh: HalfEdgeMesh = primitives::quad_grid(2, 2, 1.0).unwrap();
        let result = loop_subdivide(&mut mesh, &SubdivideOptions::new(1));
        assert!(matches!(result, Err(MeshError::NotTriangleMesh { degree: 4, .. })));
        assert_eq!(mesh.num_faces(), 4);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut a: HalfEdgeMesh = primitives::uv_sphere(6, 10, 1.0).unwrap();
        let mut b = a.clone();
        loop_subdivide(&mut a, &SubdivideOptions::new(1)).unwrap();
        loop_subdivide(&mut b, &SubdivideOptions::new(1).sequential()).unwrap();

        for v in a.vertex_ids() {
            assert_eq!(a.position(v), b.position(v));
        }
    }

    #[test]
    fn test_interior_edge_point() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(1.0, -2.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();
        let he = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();

        // 3/8 * (0 + 2) + 1/8 * (1 + 1) on x, the y terms cancel.
        let p = edge_point(&mesh, he.edge());
        assert!((p - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_loop_beta() {
        assert!((loop_beta(3) - 3.0 / 16.0).abs() < 1e-12);
        // Regular valence gives Loop's 1/16.
        assert!((loop_beta(6) - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_closed_mesh_shrinks() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        loop_subdivide(&mut mesh, &SubdivideOptions::new(1)).unwrap();
        for v in mesh.vertex_ids() {
            assert!(mesh.position(v).coords.norm() < 1.0 + 1e-12);
        }
    }
}
