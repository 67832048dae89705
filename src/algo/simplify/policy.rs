//! Cost and placement policies.
//!
//! A [`CostPolicy`] scores how much error collapsing an edge would introduce;
//! a [`PlacementPolicy`] decides where the merged vertex goes. Both are pure
//! functions of the current mesh, so they can be evaluated in parallel and
//! re-evaluated at any time with the same result.

use nalgebra::Point3;

use super::quadric::Quadric;
use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex};

/// Scores candidate edge collapses. Lower is better.
pub trait CostPolicy<I: MeshIndex>: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Non-negative cost of collapsing `edge`, or `None` if the collapse is
    /// topologically illegal or the cost is undefined.
    ///
    /// The simplifier rejects negative and non-finite values as policy errors.
    fn cost(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Option<f64>;
}

/// Chooses the position of the vertex that survives a collapse.
pub trait PlacementPolicy<I: MeshIndex>: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Target position for collapsing `edge`, or `None` if there is none.
    fn place(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Option<Point3<f64>>;
}

/// Cost is the Euclidean length of the edge, so short edges go first.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeLengthCost;

impl<I: MeshIndex> CostPolicy<I> for EdgeLengthCost {
    fn name(&self) -> &'static str {
        "edge-length"
    }

    fn cost(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Option<f64> {
        let he = edge.halfedge();
        mesh.is_collapse_ok(he).then(|| mesh.edge_length(he))
    }
}

/// Cost is the quadric error of the planes around both endpoints, evaluated
/// at the quadric-optimal point.
///
/// The quadric is rebuilt from the current faces on every call rather than
/// accumulated across collapses, which keeps it a pure function of the mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadricCost;

impl<I: MeshIndex> CostPolicy<I> for QuadricCost {
    fn name(&self) -> &'static str {
        "quadric"
    }

    fn cost(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Option<f64> {
        let he = edge.halfedge();
        if !mesh.is_collapse_ok(he) {
            return None;
        }
        let q = Quadric::around_edge(mesh, he);
        // Round-off can push a zero error slightly below zero.
        Some(q.evaluate(&q.best_point(mesh, he)).max(0.0))
    }
}

/// Places the merged vertex at the midpoint of the edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointPlacement;

impl<I: MeshIndex> PlacementPolicy<I> for MidpointPlacement {
    fn name(&self) -> &'static str {
        "midpoint"
    }

    fn place(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Option<Point3<f64>> {
        Some(mesh.edge_midpoint(edge.halfedge()))
    }
}

/// Places the merged vertex where the quadric of the surrounding planes is
/// smallest, falling back to the best of the endpoints and midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadricPlacement;

impl<I: MeshIndex> PlacementPolicy<I> for QuadricPlacement {
    fn name(&self) -> &'static str {
        "quadric"
    }

    fn place(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Option<Point3<f64>> {
        let he = edge.halfedge();
        Some(Quadric::around_edge(mesh, he).best_point(mesh, he))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{primitives, VertexId};

    fn edge_between(mesh: &HalfEdgeMesh, a: usize, b: usize) -> EdgeId {
        mesh.find_halfedge(VertexId::new(a), VertexId::new(b))
            .unwrap()
            .edge()
    }

    #[test]
    fn test_edge_length_cost() {
        let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
        let side = edge_between(&cube, 0, 1);
        let diagonal = edge_between(&cube, 0, 2);

        assert!((EdgeLengthCost.cost(&cube, side).unwrap() - 1.0).abs() < 1e-12);
        assert!((EdgeLengthCost.cost(&cube, diagonal).unwrap() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cost_is_undefined_for_illegal_collapse() {
        let tet: HalfEdgeMesh = primitives::tetrahedron().unwrap();
        for e in tet.edge_ids() {
            assert!(CostPolicy::cost(&EdgeLengthCost, &tet, e).is_none());
            assert!(CostPolicy::cost(&QuadricCost, &tet, e).is_none());
        }
    }

    #[test]
    fn test_flat_quadric_cost_is_zero() {
        let grid: HalfEdgeMesh = primitives::triangle_grid(4, 4, 1.0).unwrap();
        // Interior edge between (1, 1) and (2, 1).
        let e = edge_between(&grid, 6, 7);
        let cost = QuadricCost.cost(&grid, e).unwrap();
        assert!(cost.abs() < 1e-12);

        let p = QuadricPlacement.place(&grid, e).unwrap();
        assert!(p.z.abs() < 1e-12);
    }

    #[test]
    fn test_midpoint_placement() {
        let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
        let e = edge_between(&cube, 0, 1);
        let p = MidpointPlacement.place(&cube, e).unwrap();
        assert_eq!(p, Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_quadric_placement_on_sphere_stays_near_surface() {
        let sphere: HalfEdgeMesh = primitives::uv_sphere(10, 16, 1.0).unwrap();
        for e in sphere.edge_ids().take(40) {
            let p = QuadricPlacement.place(&sphere, e).unwrap();
            let r = p.coords.norm();
            assert!(r > 0.8 && r < 1.2, "radius {} out of range", r);
        }
    }
}
