//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for polygon meshes that is cheap to edit in place. All elements live in flat
//! arenas addressed by typed indices; removing an element leaves a tombstone
//! behind so that outstanding indices stay meaningful until [`HalfEdgeMesh::compact`]
//! is called.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions,
//!   allocated as a pair `(2k, 2k + 1)` so that full edge `k` is simply that pair
//! - Each half-edge knows its **twin**, **next**, **prev**, **origin vertex**,
//!   and **incident face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one half-edge on its boundary
//!
//! # Boundary Handling
//!
//! Boundary half-edges have an invalid face ID and are linked into closed loops
//! through `next`/`prev`. A boundary vertex always stores its outgoing boundary
//! half-edge, which makes boundary tests O(1).

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    pub halfedge: HalfEdgeId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
            removed: false,
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Whether this vertex has been merged away by a collapse.
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    /// Invalid once the half-edge has been removed.
    pub origin: VertexId<I>,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face (clockwise).
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    /// Invalid for boundary half-edges.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new uninitialized half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for HalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    /// Invalid once the face has been removed.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self { halfedge }
    }
}

impl<I: MeshIndex> Default for Face<I> {
    fn default() -> Self {
        Self {
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge mesh data structure for polygon meshes.
///
/// Counts returned by [`num_vertices`](Self::num_vertices),
/// [`num_edges`](Self::num_edges) and [`num_faces`](Self::num_faces) are live
/// counts and are maintained incrementally, so they are O(1) even while the
/// arenas contain tombstones.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    /// All vertices in the mesh, including removed ones.
    pub(crate) vertices: Vec<Vertex<I>>,

    /// All half-edges in the mesh, in twin pairs.
    pub(crate) halfedges: Vec<HalfEdge<I>>,

    /// All faces in the mesh, including removed ones.
    pub(crate) faces: Vec<Face<I>>,

    pub(crate) live_vertices: usize,
    pub(crate) live_edges: usize,
    pub(crate) live_faces: usize,

    /// Incremented on every committed collapse.
    pub(crate) generation: u64,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed triangle mesh: HE = 3F; leave some room for boundary half-edges.
        let num_halfedges = num_faces * 3 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
            live_vertices: 0,
            live_edges: 0,
            live_faces: 0,
            generation: 0,
        }
    }

    // ==================== Accessors ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.live_vertices
    }

    /// Number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.live_edges * 2
    }

    /// Number of live edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.live_edges
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.live_faces
    }

    /// Size of the edge arena, including removed edges.
    ///
    /// Every [`EdgeId`] handed out by this mesh is below this bound.
    #[inline]
    pub fn edge_capacity(&self) -> usize {
        self.halfedges.len() / 2
    }

    /// Whether the arenas contain removed elements.
    pub fn has_tombstones(&self) -> bool {
        self.vertices.len() != self.live_vertices
            || self.faces.len() != self.live_faces
            || self.halfedges.len() != self.live_edges * 2
    }

    /// Current mutation generation.
    ///
    /// Starts at zero when a mesh is built and increases by one with every
    /// committed edge collapse.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Liveness ====================

    /// Whether a vertex ID is out of range or refers to a removed vertex.
    #[inline]
    pub fn is_vertex_removed(&self, v: VertexId<I>) -> bool {
        self.vertices.get(v.index()).map_or(true, |vx| vx.removed)
    }

    /// Whether a half-edge ID is out of range or refers to a removed half-edge.
    #[inline]
    pub fn is_halfedge_removed(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedges
            .get(he.index())
            .map_or(true, |h| !h.origin.is_valid())
    }

    /// Whether an edge ID is out of range or refers to a removed edge.
    #[inline]
    pub fn is_edge_removed(&self, e: EdgeId<I>) -> bool {
        self.is_halfedge_removed(e.halfedge())
    }

    /// Whether a face ID is out of range or refers to a removed face.
    #[inline]
    pub fn is_face_removed(&self, f: FaceId<I>) -> bool {
        self.faces
            .get(f.index())
            .map_or(true, |face| !face.halfedge.is_valid())
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// The two endpoints of an edge, origin of the canonical half-edge first.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        let he = e.halfedge();
        [self.origin(he), self.dest(he)]
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary.
    ///
    /// Isolated vertices count as boundary vertices.
    #[inline]
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let he = self.vertex(v).halfedge;
        !he.is_valid() || self.is_boundary_halfedge(he)
    }

    /// Check if an edge (represented by one of its half-edges) is on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    /// Find the half-edge going from `from` to `to`, if the two are adjacent.
    pub fn find_halfedge(&self, from: VertexId<I>, to: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.vertex_halfedges(from).find(|&he| self.dest(he) == to)
    }

    /// Number of sides of a face.
    pub fn face_degree(&self, f: FaceId<I>) -> usize {
        self.face_halfedges(f).count()
    }

    /// Check that every live face is a triangle.
    pub fn is_triangle_mesh(&self) -> bool {
        self.require_triangles().is_ok()
    }

    /// Return an error naming the first live face that is not a triangle.
    pub fn require_triangles(&self) -> Result<()> {
        for f in self.face_ids() {
            let degree = self.face_degree(f);
            if degree != 3 {
                return Err(MeshError::NotTriangleMesh {
                    face: f.index(),
                    degree,
                });
            }
        }
        Ok(())
    }

    // ==================== Iteration ====================

    /// Iterate over live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.removed)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.removed)
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| he.origin.is_valid())
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over live edge IDs in arena order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edge_capacity())
            .map(EdgeId::new)
            .filter(|&e| !self.is_edge_removed(e))
    }

    /// Iterate over live face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.halfedge.is_valid())
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v).filter_map(|he| {
            let f = self.face_of(he);
            f.is_valid().then_some(f)
        })
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Area-weighted normal of a face (Newell's method), not normalized.
    ///
    /// Its length is twice the face area, which also holds for non-planar
    /// polygons.
    pub fn face_area_vector(&self, f: FaceId<I>) -> Vector3<f64> {
        let mut n = Vector3::zeros();
        for he in self.face_halfedges(f) {
            let p = self.position(self.origin(he));
            let q = self.position(self.dest(he));
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
        }
        n
    }

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        self.face_area_vector(f).normalize()
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        0.5 * self.face_area_vector(f).norm()
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm()
    }

    /// Compute the edge vector (from origin to destination).
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        p1 - p0
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, he: HalfEdgeId<I>) -> Point3<f64> {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        Point3::from((p0.coords + p1.coords) * 0.5)
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let mut sum = Vector3::zeros();
        let mut n = 0usize;
        for v in self.face_vertices(f) {
            sum += self.position(v).coords;
            n += 1;
        }
        Point3::from(sum / n.max(1) as f64)
    }

    /// Compute the axis-aligned bounding box of the live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = self.vertices().map(|(_, v)| v.position);
        let first = iter.next()?;

        let (min, max) = iter.fold((first, first), |(mut min, mut max), p| {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
            (min, max)
        });

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new isolated vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        self.live_vertices += 1;
        id
    }

    /// Allocate a twin pair of half-edges `from -> to` and `to -> from`.
    ///
    /// Both start unlinked and without a face; the first one is returned.
    pub(crate) fn add_edge_pair(&mut self, from: VertexId<I>, to: VertexId<I>) -> HalfEdgeId<I> {
        let h = HalfEdgeId::new(self.halfedges.len());
        let t = HalfEdgeId::new(self.halfedges.len() + 1);
        self.halfedges.push(HalfEdge {
            origin: from,
            twin: t,
            ..HalfEdge::new()
        });
        self.halfedges.push(HalfEdge {
            origin: to,
            twin: h,
            ..HalfEdge::new()
        });
        self.live_edges += 1;
        h
    }

    pub(crate) fn add_face(&mut self, halfedge: HalfEdgeId<I>) -> FaceId<I> {
        let id = FaceId::new(self.faces.len());
        self.faces.push(Face::new(halfedge));
        self.live_faces += 1;
        id
    }

    /// Make `b` follow `a` in their shared cycle.
    #[inline]
    pub(crate) fn link(&mut self, a: HalfEdgeId<I>, b: HalfEdgeId<I>) {
        self.halfedges[a.index()].next = b;
        self.halfedges[b.index()].prev = a;
    }

    /// Point a vertex at its outgoing boundary half-edge, if it has one.
    pub(crate) fn adjust_outgoing_halfedge(&mut self, v: VertexId<I>) {
        let boundary = self
            .vertex_halfedges(v)
            .find(|&he| self.is_boundary_halfedge(he));
        if let Some(he) = boundary {
            self.vertex_mut(v).halfedge = he;
        }
    }

    // ==================== Removal ====================

    pub(crate) fn remove_vertex(&mut self, v: VertexId<I>) {
        let vertex = &mut self.vertices[v.index()];
        if !vertex.removed {
            vertex.removed = true;
            vertex.halfedge = HalfEdgeId::invalid();
            self.live_vertices -= 1;
        }
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeId<I>) {
        if self.is_edge_removed(e) {
            return;
        }
        for he in e.halfedges() {
            self.halfedges[he.index()] = HalfEdge::new();
        }
        self.live_edges -= 1;
    }

    pub(crate) fn remove_face(&mut self, f: FaceId<I>) {
        if !self.is_face_removed(f) {
            self.faces[f.index()].halfedge = HalfEdgeId::invalid();
            self.live_faces -= 1;
        }
    }

    /// Drop all tombstones and renumber the remaining elements.
    ///
    /// Relative order of the surviving elements is preserved, and twin pairs
    /// stay adjacent. Any IDs obtained before compaction are invalidated.
    pub fn compact(&mut self) {
        if !self.has_tombstones() {
            return;
        }

        let mut vmap = vec![VertexId::<I>::invalid(); self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.live_vertices);
        for (i, v) in self.vertices.iter().enumerate() {
            if !v.removed {
                vmap[i] = VertexId::new(vertices.len());
                vertices.push(v.clone());
            }
        }

        let mut fmap = vec![FaceId::<I>::invalid(); self.faces.len()];
        let mut faces = Vec::with_capacity(self.live_faces);
        for (i, f) in self.faces.iter().enumerate() {
            if f.halfedge.is_valid() {
                fmap[i] = FaceId::new(faces.len());
                faces.push(*f);
            }
        }

        let mut hmap = vec![HalfEdgeId::<I>::invalid(); self.halfedges.len()];
        let mut halfedges = Vec::with_capacity(self.live_edges * 2);
        for pair in 0..self.edge_capacity() {
            if self.halfedges[2 * pair].origin.is_valid() {
                hmap[2 * pair] = HalfEdgeId::new(halfedges.len());
                hmap[2 * pair + 1] = HalfEdgeId::new(halfedges.len() + 1);
                halfedges.push(self.halfedges[2 * pair]);
                halfedges.push(self.halfedges[2 * pair + 1]);
            }
        }

        let remap_he = |he: HalfEdgeId<I>| {
            if he.is_valid() {
                hmap[he.index()]
            } else {
                he
            }
        };

        for v in &mut vertices {
            v.halfedge = remap_he(v.halfedge);
        }
        for f in &mut faces {
            f.halfedge = remap_he(f.halfedge);
        }
        for he in &mut halfedges {
            he.origin = vmap[he.origin.index()];
            he.twin = remap_he(he.twin);
            he.next = remap_he(he.next);
            he.prev = remap_he(he.prev);
            if he.face.is_valid() {
                he.face = fmap[he.face.index()];
            }
        }

        self.vertices = vertices;
        self.faces = faces;
        self.halfedges = halfedges;
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        self.check_consistency().is_ok()
    }

    /// Verify connectivity of every live element, reporting the first problem.
    pub fn check_consistency(&self) -> Result<()> {
        for (vid, v) in self.vertices() {
            if v.halfedge.is_valid() {
                if self.is_halfedge_removed(v.halfedge) {
                    return Err(MeshError::topology(format!(
                        "{:?} points at removed {:?}",
                        vid, v.halfedge
                    )));
                }
                if self.origin(v.halfedge) != vid {
                    return Err(MeshError::topology(format!(
                        "{:?} stores {:?} which does not leave it",
                        vid, v.halfedge
                    )));
                }
            }
        }

        for heid in self.halfedge_ids() {
            let he = self.halfedge(heid);
            if self.is_vertex_removed(he.origin) {
                return Err(MeshError::topology(format!(
                    "{:?} originates at removed {:?}",
                    heid, he.origin
                )));
            }
            if self.is_halfedge_removed(he.twin) || self.twin(he.twin) != heid {
                return Err(MeshError::topology(format!("{:?} has a broken twin", heid)));
            }
            if self.is_halfedge_removed(he.next) || self.prev(he.next) != heid {
                return Err(MeshError::topology(format!("{:?} has a broken next", heid)));
            }
            if self.is_halfedge_removed(he.prev) || self.next(he.prev) != heid {
                return Err(MeshError::topology(format!("{:?} has a broken prev", heid)));
            }
            if self.origin(he.next) != self.dest(heid) {
                return Err(MeshError::topology(format!(
                    "{:?} is not continued by its next",
                    heid
                )));
            }
            if he.face.is_valid() && self.is_face_removed(he.face) {
                return Err(MeshError::topology(format!(
                    "{:?} belongs to removed {:?}",
                    heid, he.face
                )));
            }
            if he.face != self.face_of(he.next) {
                return Err(MeshError::topology(format!(
                    "{:?} and its next disagree on their face",
                    heid
                )));
            }
        }

        for fid in self.face_ids() {
            let start = self.face(fid).halfedge;
            if self.is_halfedge_removed(start) || self.face_of(start) != fid {
                return Err(MeshError::topology(format!(
                    "{:?} points at a foreign half-edge",
                    fid
                )));
            }
            if self.face_degree(fid) < 3 {
                return Err(MeshError::topology(format!("{:?} has fewer than 3 sides", fid)));
            }
        }

        Ok(())
    }
}

/// Iterator over half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // If he goes v -> w, twin(he) goes w -> v and next(twin(he)) leaves v again.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
