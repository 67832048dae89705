//! Edge split and edge flip on triangle meshes.
//!
//! Both edits keep every existing id valid and only append new elements, so
//! they never leave tombstones. Together with edge collapse they are the
//! local operations the remesher is built from.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Split the edge of `he` at `position`, returning the new vertex.
    ///
    /// For `he = (a -> b)` the new vertex `m` takes over the `b` end of `he`
    /// and the `m` end of `twin(he)`; every triangle next to the edge is cut
    /// in two by an edge from `m` to its opposite corner. A boundary side
    /// simply gains one more boundary half-edge.
    ///
    /// # Errors
    /// [`MeshError::Topology`] if the edge is removed, or
    /// [`MeshError::NotTriangleMesh`] if a face next to it is not a triangle.
    /// The mesh is untouched in both cases.
    pub fn split_edge(&mut self, he: HalfEdgeId<I>, position: Point3<f64>) -> Result<VertexId<I>> {
        if self.is_halfedge_removed(he) {
            return Err(MeshError::topology(format!("split of removed {:?}", he)));
        }
        let tw = self.twin(he);
        for h in [he, tw] {
            let f = self.face_of(h);
            if f.is_valid() {
                let degree = self.face_degree(f);
                if degree != 3 {
                    return Err(MeshError::NotTriangleMesh {
                        face: f.index(),
                        degree,
                    });
                }
            }
        }

        let b = self.dest(he);
        let (hn, hp) = (self.next(he), self.prev(he));
        let (tn, tp) = (self.next(tw), self.prev(tw));
        let (fh, ft) = (self.face_of(he), self.face_of(tw));

        let m = self.add_vertex(position);
        let h2 = self.add_edge_pair(m, b);
        let t2 = self.twin(h2);
        self.halfedge_mut(tw).origin = m;

        // Side of `he`: a -> m -> b.
        if fh.is_valid() {
            let c = self.origin(hp);
            let mc = self.add_edge_pair(m, c);
            let cm = self.twin(mc);
            let f2 = self.add_face(h2);

            self.link(he, mc);
            self.link(mc, hp);
            self.link(hp, he);
            self.link(h2, hn);
            self.link(hn, cm);
            self.link(cm, h2);

            self.halfedge_mut(mc).face = fh;
            for h in [h2, hn, cm] {
                self.halfedge_mut(h).face = f2;
            }
            self.face_mut(fh).halfedge = he;
        } else {
            self.link(he, h2);
            self.link(h2, hn);
        }

        // Side of `tw`: b -> m -> a.
        if ft.is_valid() {
            let d = self.origin(tp);
            let md = self.add_edge_pair(m, d);
            let dm = self.twin(md);
            let g2 = self.add_face(tw);

            self.link(t2, md);
            self.link(md, tp);
            self.link(tp, t2);
            self.link(tw, tn);
            self.link(tn, dm);
            self.link(dm, tw);

            for h in [t2, md] {
                self.halfedge_mut(h).face = ft;
            }
            for h in [tw, tn, dm] {
                self.halfedge_mut(h).face = g2;
            }
            self.face_mut(ft).halfedge = t2;
        } else {
            self.link(tp, t2);
            self.link(t2, tw);
        }

        if self.vertex(b).halfedge == tw {
            self.vertex_mut(b).halfedge = t2;
        }
        self.vertex_mut(m).halfedge = if fh.is_valid() { tw } else { h2 };
        self.adjust_outgoing_halfedge(m);

        Ok(m)
    }

    /// Whether the interior edge of `he` can be flipped without breaking the
    /// mesh.
    ///
    /// Requires two triangles, distinct opposite corners that are not already
    /// connected, and endpoints that keep at least three neighbours (two on
    /// the boundary).
    pub fn is_flip_ok(&self, he: HalfEdgeId<I>) -> bool {
        if self.is_halfedge_removed(he) || self.is_boundary_edge(he) {
            return false;
        }
        let tw = self.twin(he);
        if self.face_degree(self.face_of(he)) != 3 || self.face_degree(self.face_of(tw)) != 3 {
            return false;
        }

        let c = self.origin(self.prev(he));
        let d = self.origin(self.prev(tw));
        if c == d || self.find_halfedge(c, d).is_some() {
            return false;
        }

        [self.origin(he), self.origin(tw)].into_iter().all(|v| {
            let min = if self.is_boundary_vertex(v) { 3 } else { 4 };
            self.valence(v) >= min
        })
    }

    /// Replace the diagonal `a - b` of the two triangles around `he` by the
    /// other diagonal `c - d`. `he` and its twin are reused for the new edge.
    ///
    /// # Errors
    /// [`MeshError::Topology`] if [`is_flip_ok`](Self::is_flip_ok) fails.
    pub fn flip_edge(&mut self, he: HalfEdgeId<I>) -> Result<()> {
        if !self.is_flip_ok(he) {
            return Err(MeshError::topology(format!("{:?} cannot be flipped", he.edge())));
        }

        let tw = self.twin(he);
        let (hn, hp) = (self.next(he), self.prev(he));
        let (tn, tp) = (self.next(tw), self.prev(tw));
        let (fh, ft) = (self.face_of(he), self.face_of(tw));
        let a = self.origin(he);
        let b = self.origin(tw);
        let c = self.origin(hp);
        let d = self.origin(tp);

        // (d, c, a) and (c, d, b).
        self.halfedge_mut(he).origin = d;
        self.halfedge_mut(tw).origin = c;
        self.link(he, hp);
        self.link(hp, tn);
        self.link(tn, he);
        self.link(tw, tp);
        self.link(tp, hn);
        self.link(hn, tw);

        self.halfedge_mut(tn).face = fh;
        self.halfedge_mut(hn).face = ft;
        self.face_mut(fh).halfedge = he;
        self.face_mut(ft).halfedge = tw;

        if self.vertex(a).halfedge == he {
            self.vertex_mut(a).halfedge = tn;
        }
        if self.vertex(b).halfedge == tw {
            self.vertex_mut(b).halfedge = hn;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, primitives};

    fn euler<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> i64 {
        mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
    }

    /// Two triangles sharing the diagonal (0, 1) of a unit square.
    fn square() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap()
    }

    #[test]
    fn test_split_interior_edge() {
        let mut mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let he = mesh.edge_ids().next().unwrap().halfedge();
        let (a, b) = (mesh.origin(he), mesh.dest(he));
        let mid = mesh.edge_midpoint(he);

        let m = mesh.split_edge(he, mid).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_vertices(), 7);
        assert_eq!(mesh.num_edges(), 15);
        assert_eq!(mesh.num_faces(), 10);
        assert_eq!(euler(&mesh), 2);
        assert_eq!(mesh.valence(m), 4);
        assert!(mesh.find_halfedge(a, b).is_none());
        assert!(mesh.find_halfedge(a, m).is_some());
        assert!(mesh.find_halfedge(m, b).is_some());
        assert!(!mesh.has_tombstones());
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh: HalfEdgeMesh = primitives::triangle_grid(2, 2, 1.0).unwrap();
        let he = mesh
            .halfedge_ids()
            .find(|&h| mesh.is_boundary_halfedge(h))
            .unwrap();
        let mid = mesh.edge_midpoint(he);
        let (edges, faces) = (mesh.num_edges(), mesh.num_faces());
        let boundary_before = mesh.stats().boundary_edge_count;

        let m = mesh.split_edge(he, mid).unwrap();

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_edges(), edges + 2);
        assert_eq!(mesh.num_faces(), faces + 1);
        assert_eq!(mesh.stats().boundary_edge_count, boundary_before + 1);
        assert!(mesh.is_boundary_vertex(m));
        assert_eq!(mesh.valence(m), 3);
        assert_eq!(euler(&mesh), 1);
    }

    #[test]
    fn test_split_rejects_quads() {
        let mut mesh: HalfEdgeMesh = primitives::quad_grid(1, 1, 1.0).unwrap();
        let he = mesh.edge_ids().next().unwrap().halfedge();
        let result = mesh.split_edge(he, Point3::origin());
        assert!(matches!(result, Err(MeshError::NotTriangleMesh { degree: 4, .. })));
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn test_flip_square_diagonal() {
        let mut mesh = square();
        let v = |i| VertexId::new(i);
        let he = mesh.find_halfedge(v(0), v(1)).unwrap();

        assert!(mesh.is_flip_ok(he));
        mesh.flip_edge(he).unwrap();

        assert!(mesh.is_valid());
        assert!(mesh.find_halfedge(v(0), v(1)).is_none());
        assert!(mesh.find_halfedge(v(2), v(3)).is_some() || mesh.find_halfedge(v(3), v(2)).is_some());
        assert_eq!(mesh.num_edges(), 5);
        for f in mesh.face_ids() {
            assert!(mesh.face_normal(f).z > 0.0);
        }
    }

    #[test]
    fn test_flip_twice_restores_diagonal() {
        let mut mesh: HalfEdgeMesh = primitives::uv_sphere(4, 6, 1.0).unwrap();
        let he = mesh
            .edge_ids()
            .map(|e| e.halfedge())
            .find(|&h| mesh.is_flip_ok(h))
            .unwrap();
        let (a, b) = (mesh.origin(he), mesh.dest(he));

        mesh.flip_edge(he).unwrap();
        assert!(mesh.is_valid());
        assert_eq!(euler(&mesh), 2);
        mesh.flip_edge(he).unwrap();
        assert!(mesh.is_valid());

        let (c, d) = (mesh.origin(he), mesh.dest(he));
        assert!((c, d) == (a, b) || (c, d) == (b, a));
    }

    #[test]
    fn test_flip_rejected_on_tetrahedron() {
        // Opposite corners are already connected.
        let mut mesh: HalfEdgeMesh = primitives::tetrahedron().unwrap();
        let he = mesh.edge_ids().next().unwrap().halfedge();
        assert!(!mesh.is_flip_ok(he));
        assert!(matches!(mesh.flip_edge(he), Err(MeshError::Topology { .. })));
    }

    #[test]
    fn test_flip_rejected_on_boundary() {
        let mut mesh = square();
        let he = mesh
            .halfedge_ids()
            .find(|&h| mesh.is_boundary_halfedge(h))
            .unwrap();
        assert!(!mesh.is_flip_ok(he));
        assert!(mesh.flip_edge(he).is_err());
    }
}
