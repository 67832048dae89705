//! Edge collapse on triangle meshes.
//!
//! Collapsing the half-edge `h = (v0 -> v1)` removes `v0` and the edge, moves
//! `v1` to the requested position, and deletes the one or two triangles that
//! shared the edge. Every half-edge that used to leave `v0` leaves `v1`
//! afterwards.
//!
//! [`HalfEdgeMesh::is_collapse_ok`] must be checked first; collapsing an edge
//! that fails it can leave the mesh non-manifold.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

use super::halfedge::HalfEdgeMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Third vertex of the triangle on the left of `he`, if there is a face.
    fn opposite_vertex(&self, he: HalfEdgeId<I>) -> Option<VertexId<I>> {
        if self.is_boundary_halfedge(he) {
            None
        } else {
            Some(self.origin(self.prev(he)))
        }
    }

    /// Topological legality of collapsing `he` (removing its origin).
    ///
    /// Rejects the collapse if:
    /// - the edge or one of its endpoints has been removed
    /// - a face next to the edge is not a triangle
    /// - both endpoints lie on the boundary but the edge is interior
    /// - the edge closes a triangular boundary hole
    /// - the endpoints share a neighbour other than the vertices opposite the
    ///   edge (link condition)
    /// - an opposite interior vertex has valence 3, as in a tetrahedron
    pub fn is_collapse_ok(&self, he: HalfEdgeId<I>) -> bool {
        if self.is_halfedge_removed(he) {
            return false;
        }
        let tw = self.twin(he);
        let v0 = self.origin(he);
        let v1 = self.origin(tw);
        if self.is_vertex_removed(v0) || self.is_vertex_removed(v1) || v0 == v1 {
            return false;
        }

        for h in [he, tw] {
            if self.is_boundary_halfedge(h) {
                // Closing a three-edge hole leaves a dangling edge.
                if self.next(self.next(self.next(h))) == h {
                    return false;
                }
            } else if self.face_degree(self.face_of(h)) != 3 {
                return false;
            }
        }

        let vl = self.opposite_vertex(he);
        let vr = self.opposite_vertex(tw);
        if vl.is_some() && vl == vr {
            return false;
        }

        if self.is_boundary_vertex(v0) && self.is_boundary_vertex(v1) && !self.is_boundary_edge(he) {
            return false;
        }

        for v in [vl, vr].into_iter().flatten() {
            if !self.is_boundary_vertex(v) && self.valence(v) == 3 {
                return false;
            }
        }

        let around_v0: HashSet<VertexId<I>> = self.vertex_neighbors(v0).collect();
        for n in self.vertex_neighbors(v1) {
            if n != v0 && Some(n) != vl && Some(n) != vr && around_v0.contains(&n) {
                return false;
            }
        }

        true
    }

    /// Whether moving both endpoints of `he` to `position` keeps every
    /// surviving incident triangle non-degenerate and keeps its orientation.
    pub fn collapse_preserves_faces(&self, he: HalfEdgeId<I>, position: &Point3<f64>) -> bool {
        let tw = self.twin(he);
        let removed_faces = [self.face_of(he), self.face_of(tw)];
        let v0 = self.origin(he);
        let v1 = self.origin(tw);

        for v in [v0, v1] {
            for f in self.vertex_faces(v) {
                if removed_faces.contains(&f) {
                    continue;
                }
                let corners = self.face_triangle(f);
                let before = self.triangle_cross(corners, None);
                let after = self.triangle_cross(corners, Some((v, position)));
                let scale = before.norm();
                if after.norm() <= 1e-12 * scale.max(f64::MIN_POSITIVE) || before.dot(&after) <= 0.0 {
                    return false;
                }
            }
        }
        true
    }

    fn triangle_cross(
        &self,
        corners: [VertexId<I>; 3],
        moved: Option<(VertexId<I>, &Point3<f64>)>,
    ) -> Vector3<f64> {
        let p = corners.map(|c| match moved {
            Some((v, pos)) if v == c => *pos,
            _ => *self.position(c),
        });
        (p[1] - p[0]).cross(&(p[2] - p[0]))
    }

    /// Collapse `he`, removing its origin and keeping its destination at
    /// `position`. Returns the surviving vertex.
    ///
    /// Increments the mesh generation. Fails with [`MeshError::Topology`] if
    /// the local structure is already corrupt; in that case the mesh may have
    /// been partially modified.
    pub fn collapse_edge(&mut self, he: HalfEdgeId<I>, position: Point3<f64>) -> Result<VertexId<I>> {
        if self.is_halfedge_removed(he) {
            return Err(MeshError::topology(format!("collapse of removed {:?}", he)));
        }

        let tw = self.twin(he);
        let hn = self.next(he);
        let hp = self.prev(he);
        let on = self.next(tw);
        let op = self.prev(tw);
        let fh = self.face_of(he);
        let fo = self.face_of(tw);
        let v0 = self.origin(he);
        let v1 = self.origin(tw);

        for h in [tw, hn, hp, on, op] {
            if self.is_halfedge_removed(h) {
                return Err(MeshError::topology(format!(
                    "{:?} around {:?} is dangling",
                    h,
                    he.edge()
                )));
            }
        }

        // Re-point everything leaving v0 before the rotation around it breaks.
        let outgoing: Vec<HalfEdgeId<I>> = self.vertex_halfedges(v0).collect();
        for h in outgoing {
            self.halfedge_mut(h).origin = v1;
        }

        self.link(hp, hn);
        self.link(op, on);

        if fh.is_valid() {
            self.face_mut(fh).halfedge = hn;
        }
        if fo.is_valid() {
            self.face_mut(fo).halfedge = on;
        }

        self.vertex_mut(v1).halfedge = hn;
        self.vertex_mut(v1).position = position;

        self.remove_edge(he.edge());
        self.remove_vertex(v0);

        if self.next(self.next(hn)) == hn {
            self.collapse_loop(hn)?;
        }
        if self.next(self.next(on)) == on {
            self.collapse_loop(on)?;
        }

        self.adjust_outgoing_halfedge(v1);
        self.generation += 1;

        Ok(v1)
    }

    /// Remove the two-sided face that `h0` and its successor form, letting the
    /// successor take over the place of `twin(h0)`.
    fn collapse_loop(&mut self, h0: HalfEdgeId<I>) -> Result<()> {
        let h1 = self.next(h0);
        let o0 = self.twin(h0);
        let o1 = self.twin(h1);
        let v0 = self.origin(h1);
        let v1 = self.origin(h0);
        let fh = self.face_of(h0);
        let fo = self.face_of(o0);

        if self.next(h1) != h0 || self.is_halfedge_removed(o0) || self.is_halfedge_removed(o1) {
            return Err(MeshError::topology(format!(
                "{:?} does not close a two-sided loop",
                h0
            )));
        }

        let (o0_next, o0_prev) = (self.next(o0), self.prev(o0));
        self.link(h1, o0_next);
        self.link(o0_prev, h1);
        self.halfedge_mut(h1).face = fo;

        self.vertex_mut(v0).halfedge = h1;
        self.vertex_mut(v1).halfedge = o1;

        if fo.is_valid() && self.face(fo).halfedge == o0 {
            self.face_mut(fo).halfedge = h1;
        }

        if fh.is_valid() {
            self.remove_face(fh);
        }
        self.remove_edge(h0.edge());

        self.adjust_outgoing_halfedge(v0);
        self.adjust_outgoing_halfedge(v1);
        Ok(())
    }

    /// Validate the half-edge ring around a vertex after an edit.
    ///
    /// Walks the outgoing half-edges (bounded by the number of live half-edges)
    /// and checks that each one is live, leaves `v`, has a consistent twin and
    /// successor, and sits in a live face with at least three sides.
    pub fn check_vertex_ring(&self, v: VertexId<I>) -> Result<()> {
        if self.is_vertex_removed(v) {
            return Err(MeshError::topology(format!("{:?} has been removed", v)));
        }
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return Ok(());
        }

        let limit = self.num_halfedges() + 1;
        let mut he = start;
        for _ in 0..limit {
            if self.is_halfedge_removed(he) {
                return Err(MeshError::topology(format!(
                    "ring of {:?} reaches removed {:?}",
                    v, he
                )));
            }
            if self.origin(he) != v {
                return Err(MeshError::topology(format!(
                    "{:?} in the ring of {:?} leaves {:?}",
                    he,
                    v,
                    self.origin(he)
                )));
            }
            let tw = self.twin(he);
            if self.is_halfedge_removed(tw) || self.twin(tw) != he {
                return Err(MeshError::topology(format!("{:?} has a broken twin", he)));
            }
            let f: FaceId<I> = self.face_of(he);
            if f.is_valid() {
                if self.is_face_removed(f) {
                    return Err(MeshError::topology(format!(
                        "{:?} belongs to removed {:?}",
                        he, f
                    )));
                }
                if self.next(self.next(he)) == he {
                    return Err(MeshError::topology(format!("{:?} is two-sided", f)));
                }
            }
            if self.dest(he) == v {
                return Err(MeshError::topology(format!("{:?} is a self-loop", he)));
            }

            he = self.next(tw);
            if he == start {
                return Ok(());
            }
        }

        Err(MeshError::topology(format!(
            "ring of {:?} does not close",
            v
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, primitives};

    fn euler<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> i64 {
        mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
    }

    fn halfedge_between(mesh: &HalfEdgeMesh, a: usize, b: usize) -> HalfEdgeId {
        mesh.find_halfedge(VertexId::new(a), VertexId::new(b)).unwrap()
    }

    #[test]
    fn test_collapse_octahedron_edge() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let he = halfedge_between(&mesh, 0, 2);
        assert!(mesh.is_collapse_ok(he));

        let mid = mesh.edge_midpoint(he);
        let survivor = mesh.collapse_edge(he, mid).unwrap();

        assert_eq!(survivor, VertexId::new(2));
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_edges(), 9);
        assert_eq!(euler(&mesh), 2);
        assert_eq!(mesh.generation(), 1);
        assert!(mesh.is_vertex_removed(VertexId::new(0)));
        assert_eq!(*mesh.position(survivor), mid);
        assert!(mesh.check_consistency().is_ok());
        assert!(mesh.check_vertex_ring(survivor).is_ok());
    }

    #[test]
    fn test_tetrahedron_is_rejected() {
        let mesh: HalfEdgeMesh = primitives::tetrahedron().unwrap();
        for he in mesh.halfedge_ids() {
            assert!(!mesh.is_collapse_ok(he));
        }
    }

    #[test]
    fn test_link_condition() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let he = halfedge_between(&mesh, 0, 2);
        mesh.collapse_edge(he, mesh.edge_midpoint(he)).unwrap();

        // Now a bipyramid over the equator (1, 2, 3). Equator vertices 1 and 2
        // share the poles and also vertex 3, which is not opposite their edge.
        let equator = halfedge_between(&mesh, 2, 1);
        assert!(!mesh.is_collapse_ok(equator));
        assert!(!mesh.is_collapse_ok(mesh.twin(equator)));
    }

    #[test]
    fn test_open_fan_collapses() {
        // Closed fan of four triangles around the centre vertex 4.
        let vertices = vec![
            nalgebra::Point3::new(-1.0, 0.0, 0.0),
            nalgebra::Point3::new(0.0, -1.0, 0.0),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(0.0, 1.0, 0.0),
            nalgebra::Point3::new(0.0, 0.0, 0.0),
        ];
        let faces = vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let spoke = halfedge_between(&mesh, 4, 1);
        assert!(mesh.is_collapse_ok(spoke));

        // Rim edges close no hole and have one free side.
        let rim = halfedge_between(&mesh, 0, 1);
        assert!(mesh.is_collapse_ok(rim));
    }

    #[test]
    fn test_interior_edge_between_boundary_vertices_is_rejected() {
        // Two triangles forming a square; the diagonal joins two boundary vertices.
        let vertices = vec![
            nalgebra::Point3::new(0.0, 0.0, 0.0),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(1.0, 1.0, 0.0),
            nalgebra::Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        let diagonal = halfedge_between(&mesh, 0, 2);
        assert!(!mesh.is_collapse_ok(diagonal));
    }

    #[test]
    fn test_single_triangle_is_rejected() {
        let vertices = vec![
            nalgebra::Point3::new(0.0, 0.0, 0.0),
            nalgebra::Point3::new(1.0, 0.0, 0.0),
            nalgebra::Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        for he in mesh.halfedge_ids() {
            assert!(!mesh.is_collapse_ok(he));
        }
    }

    #[test]
    fn test_boundary_collapse_on_grid() {
        let mut mesh: HalfEdgeMesh = primitives::triangle_grid(3, 3, 1.0).unwrap();
        // Bottom rim edge between (1, 0) and (2, 0).
        let he = halfedge_between(&mesh, 1, 2);
        assert!(mesh.is_boundary_edge(he));
        assert!(mesh.is_collapse_ok(he));

        let before = euler(&mesh);
        let survivor = mesh.collapse_edge(he, mesh.edge_midpoint(he)).unwrap();

        assert_eq!(euler(&mesh), before);
        assert_eq!(mesh.num_faces(), 17);
        assert!(mesh.is_boundary_vertex(survivor));
        assert!(mesh.check_consistency().is_ok());
    }

    #[test]
    fn test_flip_detection() {
        let mesh: HalfEdgeMesh = primitives::triangle_grid(2, 2, 1.0).unwrap();
        // Centre vertex 4 at (1, 1); neighbour 1 at (1, 0).
        let he = halfedge_between(&mesh, 4, 1);
        assert!(mesh.collapse_preserves_faces(he, &mesh.edge_midpoint(he)));
        // Dragging the pair far across the grid folds faces over.
        assert!(!mesh.collapse_preserves_faces(he, &nalgebra::Point3::new(1.0, 5.0, 0.0)));
    }

    #[test]
    fn test_collapse_removed_edge_fails() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let he = halfedge_between(&mesh, 0, 2);
        mesh.collapse_edge(he, mesh.edge_midpoint(he)).unwrap();
        let err = mesh.collapse_edge(he, nalgebra::Point3::origin());
        assert!(matches!(err, Err(MeshError::Topology { .. })));
    }

    #[test]
    fn test_check_vertex_ring_detects_removed_vertex() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let he = halfedge_between(&mesh, 0, 2);
        mesh.collapse_edge(he, mesh.edge_midpoint(he)).unwrap();
        assert!(mesh.check_vertex_ring(VertexId::new(0)).is_err());
    }
}
