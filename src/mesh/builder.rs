//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists, the
//! representation used by OFF files, and converts them back.
//!
//! Construction is deterministic: half-edge pairs are allocated in the order
//! their edges are first met while walking the faces in input order, so two
//! builds from the same lists produce identical arenas.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygonal faces.
///
/// Faces are lists of vertex indices in counter-clockwise order and must have
/// at least three distinct vertices. Vertices not referenced by any face are
/// kept as isolated vertices.
///
/// # Errors
/// - [`MeshError::EmptyMesh`] if `faces` is empty
/// - [`MeshError::InvalidVertexIndex`] / [`MeshError::DegenerateFace`] for bad faces
/// - [`MeshError::NonManifoldEdge`] if an edge is shared by more than two
///   faces or two faces traverse it in the same direction
/// - [`MeshError::NonManifoldVertex`] if the faces around a vertex do not form
///   a single fan
/// - [`MeshError::InvalidParameter`] if the mesh is too large for the index type
///
/// # Example
/// ```
/// use edgefold::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3]];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// assert_eq!(mesh.num_edges(), 4);
/// ```
pub fn build_from_polygons<I, F>(vertices: &[Point3<f64>], faces: &[F]) -> Result<HalfEdgeMesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut corner_count = 0usize;
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..k].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
        corner_count += face.len();
    }

    // Worst case every corner is a boundary edge: two half-edges per corner.
    if !I::can_address(vertices.len())
        || !I::can_address(faces.len())
        || !I::can_address(corner_count * 2)
    {
        return Err(MeshError::invalid_param(
            "mesh size",
            corner_count,
            "too many elements for the chosen index type",
        ));
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect();

    // Directed edge (from, to) -> half-edge with that orientation.
    let mut directed: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(corner_count);
    let mut ring: Vec<HalfEdgeId<I>> = Vec::new();

    for face in faces {
        let face = face.as_ref();
        let n = face.len();
        ring.clear();

        for k in 0..n {
            let (a, b) = (face[k], face[(k + 1) % n]);
            let he = match directed.get(&(a, b)) {
                Some(&he) => {
                    // Allocated as the twin of an earlier (b, a); must still be free.
                    if mesh.face_of(he).is_valid() {
                        return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
                    }
                    he
                }
                None => {
                    let he = mesh.add_edge_pair(vertex_ids[a], vertex_ids[b]);
                    directed.insert((a, b), he);
                    directed.insert((b, a), mesh.twin(he));
                    he
                }
            };
            ring.push(he);
        }

        let face_id = mesh.add_face(ring[0]);
        for k in 0..n {
            mesh.halfedge_mut(ring[k]).face = face_id;
            mesh.link(ring[k], ring[(k + 1) % n]);
        }
    }

    link_boundary_loops(&mut mesh)?;
    assign_vertex_halfedges(&mut mesh)?;

    Ok(mesh)
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use edgefold::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Link boundary half-edges into closed loops.
///
/// Each boundary vertex must have exactly one outgoing boundary half-edge;
/// two or more means several boundary loops pinch at that vertex.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary_hes: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: Vec<HalfEdgeId<I>> = vec![HalfEdgeId::invalid(); mesh.vertices.len()];
    for &he in &boundary_hes {
        let origin = mesh.origin(he).index();
        if outgoing[origin].is_valid() {
            return Err(MeshError::NonManifoldVertex {
                vertex: origin,
                details: "more than one boundary loop passes through it".to_string(),
            });
        }
        outgoing[origin] = he;
    }

    for &he in &boundary_hes {
        // Every boundary half-edge ends at a vertex that has a boundary half-edge
        // leaving it, because the face half-edge into that vertex is unpaired.
        let next = outgoing[mesh.dest(he).index()];
        mesh.link(he, next);
    }

    Ok(())
}

/// Give every vertex an outgoing half-edge (the boundary one when it exists)
/// and check that a single rotation around it reaches all of its half-edges.
fn assign_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let mut degree = vec![0usize; mesh.vertices.len()];

    for he in mesh.halfedge_ids().collect::<Vec<_>>() {
        let v = mesh.origin(he);
        degree[v.index()] += 1;
        let current = mesh.vertex(v).halfedge;
        if !current.is_valid() || (mesh.is_boundary_halfedge(he) && !mesh.is_boundary_halfedge(current)) {
            mesh.vertex_mut(v).halfedge = he;
        }
    }

    for v in mesh.vertex_ids().collect::<Vec<_>>() {
        let reached = mesh.vertex_halfedges(v).take(degree[v.index()] + 1).count();
        if reached != degree[v.index()] {
            return Err(MeshError::NonManifoldVertex {
                vertex: v.index(),
                details: format!(
                    "{} incident half-edges but only {} in one fan",
                    degree[v.index()],
                    reached
                ),
            });
        }
    }

    Ok(())
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Vertices are numbered densely in live-vertex order, skipping removed ones,
/// and every face starts at its stored half-edge. Returns `(vertices, faces)`.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let mut dense = vec![usize::MAX; mesh.vertices.len()];
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for (v, vertex) in mesh.vertices() {
        dense[v.index()] = vertices.len();
        vertices.push(vertex.position);
    }

    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| dense[v.index()]).collect())
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        (vertices, faces)
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing an edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        (vertices, faces)
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert!(mesh.is_valid());

        let shared = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        assert!(!mesh.is_boundary_edge(shared));
    }

    #[test]
    fn test_twins_are_paired() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();
        for he in mesh.halfedge_ids() {
            assert_eq!(mesh.twin(he).index(), he.index() ^ 1);
        }
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(vertices, out_verts);
        let expected: Vec<Vec<usize>> = faces.iter().map(|f| f.to_vec()).collect();
        assert_eq!(expected, out_faces);
    }

    #[test]
    fn test_mixed_polygons() {
        // A quad with a triangle attached along edge (1, 2).
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
        let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 6);
        assert!(mesh.is_valid());
        assert!(!mesh.is_triangle_mesh());
    }

    #[test]
    fn test_isolated_vertex_is_kept() {
        let (mut vertices, faces) = single_triangle();
        vertices.push(Point3::new(9.0, 9.0, 9.0));
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.valence(VertexId::new(3)), 0);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, _) = single_triangle();
        let faces = vec![[0, 0, 2]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));

        let faces = vec![vec![0, 1]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_polygons(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_edge_with_three_faces() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { .. })));
    }

    #[test]
    fn test_inconsistent_orientation() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        // Both faces traverse 0 -> 1.
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::NonManifoldEdge { v0: 0, v1: 1 })
        ));
    }

    #[test]
    fn test_bowtie_vertex() {
        // Two triangles touching only at vertex 0.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 3, 4]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::NonManifoldVertex { vertex: 0, .. })
        ));
    }

    #[test]
    fn test_index_overflow() {
        let vertices: Vec<Point3<f64>> = (0..70_000)
            .map(|i| Point3::new(i as f64, 0.0, 0.0))
            .collect();
        let faces = vec![[0, 1, 2]];
        let result: Result<HalfEdgeMesh<u16>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::InvalidParameter { .. })));
    }
}
