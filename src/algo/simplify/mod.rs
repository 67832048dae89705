//! Edge-collapse simplification.
//!
//! Repeatedly collapses the cheapest legal edge of a triangle mesh until a
//! stop predicate is satisfied or no legal collapse is left. Each collapse
//! merges the two endpoints of an edge into one vertex and removes the one or
//! two triangles that shared it.
//!
//! The behaviour is assembled from three pluggable pieces:
//!
//! - a [`CostPolicy`] ([`EdgeLengthCost`], [`QuadricCost`]) that orders
//!   candidate collapses,
//! - a [`PlacementPolicy`] ([`MidpointPlacement`], [`QuadricPlacement`]) that
//!   positions the merged vertex,
//! - a [`StopPredicate`] ([`EdgeCountStop`], [`EdgeRatioStop`],
//!   [`FaceCountStop`]) that ends the run.
//!
//! Candidates live in a binary heap with lazy deletion: when a collapse
//! changes the neighbourhood of an edge, the edge is re-scored under a new
//! stamp and its old heap entries are discarded as they surface. Equal costs
//! pop in insertion order, so runs are deterministic.
//!
//! # Example
//!
//! ```
//! use edgefold::algo::simplify::{simplify, EdgeLengthCost, MidpointPlacement};
//! use edgefold::mesh::{primitives, HalfEdgeMesh};
//!
//! let mut mesh: HalfEdgeMesh = primitives::uv_sphere(12, 24, 1.0).unwrap();
//! let before = mesh.num_edges();
//!
//! let report = simplify(&mut mesh, before / 2, &EdgeLengthCost, &MidpointPlacement).unwrap();
//! assert!(report.target_reached());
//! assert!(mesh.num_edges() <= before / 2);
//! assert_eq!(report.edges_removed, before - mesh.num_edges());
//! ```
//!
//! # References
//!
//! - Garland, M. & Heckbert, P. (1997). "Surface Simplification Using Quadric
//!   Error Metrics." SIGGRAPH '97.
//! - Dey, T. K. et al. (1999). "Topology Preserving Edge Contraction."

mod executor;
mod policy;
mod quadric;
mod queue;
mod stop;

use std::collections::HashSet;
use std::fmt;

pub use policy::{
    CostPolicy, EdgeLengthCost, MidpointPlacement, PlacementPolicy, QuadricCost, QuadricPlacement,
};
pub use stop::{EdgeCountStop, EdgeRatioStop, FaceCountStop, StopPredicate};

use crate::algo::progress::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Options for edge-collapse simplification.
#[derive(Debug, Clone)]
pub struct SimplifyOptions<I: MeshIndex = u32> {
    /// Keep the boundary fixed: boundary edges are never collapsed and
    /// boundary vertices never move.
    pub preserve_boundary: bool,

    /// Reject collapses that would flip or flatten a surviving triangle.
    pub prevent_face_flips: bool,

    /// Vertices that must survive unchanged. Edges touching them are never
    /// collapsed.
    pub pinned: HashSet<VertexId<I>>,

    /// Upper bound on the number of collapses in one run.
    pub max_collapses: Option<usize>,

    /// Score the initial edges in parallel. Results are identical either way.
    pub parallel: bool,
}

impl<I: MeshIndex> Default for SimplifyOptions<I> {
    fn default() -> Self {
        Self {
            preserve_boundary: true,
            prevent_face_flips: true,
            pinned: HashSet::new(),
            max_collapses: None,
            parallel: true,
        }
    }
}

impl<I: MeshIndex> SimplifyOptions<I> {
    /// Set whether boundary vertices stay fixed.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set whether collapses that flip faces are rejected.
    pub fn with_prevent_face_flips(mut self, prevent: bool) -> Self {
        self.prevent_face_flips = prevent;
        self
    }

    /// Pin a set of vertices.
    pub fn with_pinned(mut self, pinned: impl IntoIterator<Item = VertexId<I>>) -> Self {
        self.pinned.extend(pinned);
        self
    }

    /// Limit the number of collapses.
    pub fn with_max_collapses(mut self, max: usize) -> Self {
        self.max_collapses = Some(max);
        self
    }

    /// Enable or disable parallel initial scoring.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Why a simplification run ended.
#[derive(Debug)]
pub enum StopReason {
    /// The stop predicate was satisfied.
    TargetReached,
    /// No legal collapse was left before the target was met.
    QueueExhausted,
    /// [`SimplifyOptions::max_collapses`] was reached.
    CollapseLimit,
    /// A collapse found corrupt topology. Collapses applied before it are
    /// kept and the mesh is left uncompacted.
    Aborted(MeshError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "target reached"),
            StopReason::QueueExhausted => write!(f, "no legal collapse left"),
            StopReason::CollapseLimit => write!(f, "collapse limit reached"),
            StopReason::Aborted(err) => write!(f, "aborted: {}", err),
        }
    }
}

/// Summary of a simplification run.
#[derive(Debug)]
pub struct SimplifyReport {
    /// Edges before the run.
    pub initial_edge_count: usize,
    /// Edges after the run.
    pub final_edge_count: usize,
    /// `initial_edge_count - final_edge_count`.
    pub edges_removed: usize,
    /// Collapses applied.
    pub collapses: usize,
    /// Queue entries dropped because their edge changed or vanished.
    pub rejected_stale: usize,
    /// Candidates that failed the legality or face-flip check when popped.
    pub rejected_illegal: usize,
    /// Edges skipped because a policy returned a negative or non-finite value.
    pub rejected_policy: usize,
    /// Why the run ended.
    pub stop_reason: StopReason,
}

impl SimplifyReport {
    fn new(initial_edge_count: usize) -> Self {
        Self {
            initial_edge_count,
            final_edge_count: initial_edge_count,
            edges_removed: 0,
            collapses: 0,
            rejected_stale: 0,
            rejected_illegal: 0,
            rejected_policy: 0,
            stop_reason: StopReason::TargetReached,
        }
    }

    /// Whether the stop predicate was met.
    pub fn target_reached(&self) -> bool {
        matches!(self.stop_reason, StopReason::TargetReached)
    }
}

/// Simplify until the mesh has at most `target_edge_count` edges.
///
/// Uses [`SimplifyOptions::default`]. The mesh is compacted afterwards if
/// anything was collapsed. Running out of legal collapses first is reported
/// as [`StopReason::QueueExhausted`], not as an error.
///
/// # Errors
/// [`MeshError::NotTriangleMesh`] if a face is not a triangle. Corrupt
/// topology discovered mid-run is reported through
/// [`StopReason::Aborted`] instead.
pub fn simplify<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    target_edge_count: usize,
    cost: &dyn CostPolicy<I>,
    placement: &dyn PlacementPolicy<I>,
) -> Result<SimplifyReport> {
    simplify_with(
        mesh,
        &EdgeCountStop::new(target_edge_count),
        cost,
        placement,
        &SimplifyOptions::default(),
    )
}

/// Simplify with an arbitrary stop predicate and options.
pub fn simplify_with<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    stop: &dyn StopPredicate<I>,
    cost: &dyn CostPolicy<I>,
    placement: &dyn PlacementPolicy<I>,
    options: &SimplifyOptions<I>,
) -> Result<SimplifyReport> {
    executor::run(mesh, stop, cost, placement, options, &Progress::none())
}

/// Like [`simplify_with`], reporting progress as edges are removed.
pub fn simplify_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    stop: &dyn StopPredicate<I>,
    cost: &dyn CostPolicy<I>,
    placement: &dyn PlacementPolicy<I>,
    options: &SimplifyOptions<I>,
    progress: &Progress,
) -> Result<SimplifyReport> {
    executor::run(mesh, stop, cost, placement, options, progress)
}
