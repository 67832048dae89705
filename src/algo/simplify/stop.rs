//! Stop predicates.

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Decides when the simplification loop has done enough.
///
/// Checked before every pop, and once before any scoring happens.
pub trait StopPredicate<I: MeshIndex>: Send + Sync {
    /// `true` once the mesh is small enough.
    fn should_stop(&self, mesh: &HalfEdgeMesh<I>, initial_edge_count: usize) -> bool;
}

/// Stop when the mesh has at most `target` edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCountStop {
    /// Edge count to reach.
    pub target: usize,
}

impl EdgeCountStop {
    /// Stop at `target` edges.
    pub fn new(target: usize) -> Self {
        Self { target }
    }
}

impl<I: MeshIndex> StopPredicate<I> for EdgeCountStop {
    fn should_stop(&self, mesh: &HalfEdgeMesh<I>, _initial_edge_count: usize) -> bool {
        mesh.num_edges() <= self.target
    }
}

/// Stop when the edge count falls to `ratio` of what it was at the start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRatioStop {
    ratio: f64,
}

impl EdgeRatioStop {
    /// Keep `ratio` of the edges.
    ///
    /// # Errors
    /// [`MeshError::InvalidParameter`] unless `0 <= ratio <= 1`.
    pub fn new(ratio: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(MeshError::invalid_param("ratio", ratio, "must be in [0, 1]"));
        }
        Ok(Self { ratio })
    }

    /// The fraction of edges to keep.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl<I: MeshIndex> StopPredicate<I> for EdgeRatioStop {
    fn should_stop(&self, mesh: &HalfEdgeMesh<I>, initial_edge_count: usize) -> bool {
        mesh.num_edges() as f64 <= self.ratio * initial_edge_count as f64
    }
}

/// Stop when the mesh has at most `target` faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCountStop {
    /// Face count to reach.
    pub target: usize,
}

impl FaceCountStop {
    /// Stop at `target` faces.
    pub fn new(target: usize) -> Self {
        Self { target }
    }
}

impl<I: MeshIndex> StopPredicate<I> for FaceCountStop {
    fn should_stop(&self, mesh: &HalfEdgeMesh<I>, _initial_edge_count: usize) -> bool {
        mesh.num_faces() <= self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_edge_count_stop() {
        let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
        assert!(EdgeCountStop::new(18).should_stop(&cube, 18));
        assert!(!EdgeCountStop::new(17).should_stop(&cube, 18));
    }

    #[test]
    fn test_edge_ratio_stop() {
        let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
        let half = EdgeRatioStop::new(0.5).unwrap();
        assert!(!half.should_stop(&cube, 18));
        assert!(half.should_stop(&cube, 36));
        assert!(EdgeRatioStop::new(1.0).unwrap().should_stop(&cube, 18));
    }

    #[test]
    fn test_edge_ratio_out_of_range() {
        assert!(matches!(
            EdgeRatioStop::new(1.5),
            Err(MeshError::InvalidParameter { name: "ratio", .. })
        ));
        assert!(EdgeRatioStop::new(f64::NAN).is_err());
    }

    #[test]
    fn test_face_count_stop() {
        let cube: HalfEdgeMesh = primitives::unit_cube().unwrap();
        assert!(FaceCountStop::new(12).should_stop(&cube, 18));
        assert!(!FaceCountStop::new(11).should_stop(&cube, 18));
    }
}
