//! Split, collapse, flip and relax passes of the isotropic remesher.

use log::{debug, info};
use nalgebra::Point3;

use crate::algo::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

use super::tangential_smooth;

const MAX_SPLIT_PASSES: usize = 20;
const MAX_COLLAPSE_PASSES: usize = 30;

/// Options for isotropic remeshing.
#[derive(Debug, Clone)]
pub struct RemeshOptions {
    /// Target edge length for the remeshed surface.
    pub target_length: f64,

    /// Number of remeshing iterations.
    pub iterations: usize,

    /// Keep boundary edges and boundary vertices exactly where they are.
    pub preserve_boundary: bool,

    /// Number of tangential smoothing rounds per remeshing iteration.
    pub smoothing_iterations: usize,

    /// Fraction of the tangential displacement applied per round, in `[0, 1]`.
    pub smoothing_lambda: f64,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl RemeshOptions {
    /// Create options with the specified target edge length.
    pub fn with_target_length(target_length: f64) -> Self {
        Self {
            target_length,
            iterations: 5,
            preserve_boundary: true,
            smoothing_iterations: 3,
            smoothing_lambda: 0.5,
            parallel: true,
        }
    }

    /// Set the number of remeshing iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether to preserve boundary edges.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set the number of smoothing rounds per remeshing iteration.
    pub fn with_smoothing_iterations(mut self, iterations: usize) -> Self {
        self.smoothing_iterations = iterations;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.target_length.is_finite() && self.target_length > 0.0) {
            return Err(MeshError::invalid_param(
                "target_length",
                self.target_length,
                "must be positive and finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_lambda) {
            return Err(MeshError::invalid_param(
                "smoothing_lambda",
                self.smoothing_lambda,
                "must be in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Performs isotropic remeshing on a triangle mesh.
///
/// Produces near-equilateral triangles with edge lengths close to
/// `options.target_length`. The mesh is edited in place and compacted at the
/// end, so all previously held ids are invalidated.
///
/// # Algorithm Steps (per iteration)
///
/// 1. **Edge splitting**: Split edges longer than 4/3 × target_length
/// 2. **Edge collapsing**: Collapse edges shorter than 4/5 × target_length
/// 3. **Edge flipping**: Flip edges to equalize vertex valence
/// 4. **Tangential smoothing**: Relax vertices within their tangent plane
///
/// # Errors
/// - [`MeshError::InvalidParameter`] for a non-positive target length or a
///   smoothing factor outside `[0, 1]`
/// - [`MeshError::NotTriangleMesh`] if any face is not a triangle
///
/// The mesh is untouched in both cases. A [`MeshError::Topology`] from a
/// local edit leaves the mesh as it was after the last successful edit.
pub fn isotropic_remesh<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &RemeshOptions) -> Result<()> {
    isotropic_remesh_with_progress(mesh, options, &Progress::none())
}

/// Performs isotropic remeshing with progress reporting.
///
/// Every iteration reports four sub-steps (split, collapse, flip, smooth) on
/// one bar of `iterations * 4` steps.
pub fn isotropic_remesh_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &RemeshOptions,
    progress: &Progress,
) -> Result<()> {
    options.validate()?;
    mesh.require_triangles()?;
    if options.iterations == 0 {
        return Ok(());
    }

    let high = options.target_length * 4.0 / 3.0;
    let low = options.target_length * 4.0 / 5.0;
    let total_steps = options.iterations * 4;

    info!(
        "Isotropic remeshing: target length {:.6}, {} iterations on {} faces",
        options.target_length,
        options.iterations,
        mesh.num_faces()
    );

    for iter in 0..options.iterations {
        let base_step = iter * 4;

        let splits = split_long_edges(mesh, high, options.preserve_boundary, progress, base_step, total_steps)?;
        let collapses = collapse_short_edges(
            mesh,
            low,
            high,
            options.preserve_boundary,
            progress,
            base_step + 1,
            total_steps,
        )?;

        progress.report_sub(0, 1, base_step + 2, total_steps, "Flipping edges");
        let flips = flip_edges_for_valence(mesh)?;

        for round in 0..options.smoothing_iterations {
            progress.report_sub(round, options.smoothing_iterations, base_step + 3, total_steps, "Smoothing");
            tangential_smooth(mesh, options.smoothing_lambda, options.preserve_boundary, options.parallel);
        }

        debug!(
            "Remesh pass {}: {} splits, {} collapses, {} flips, {} vertices",
            iter + 1,
            splits,
            collapses,
            flips,
            mesh.num_vertices()
        );
    }

    mesh.compact();
    progress.report(total_steps, total_steps, "Isotropic remeshing");
    info!(
        "Isotropic remeshing done: {} vertices, {} faces",
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(())
}

/// Split edges longer than `high` at their midpoint until none is left or
/// the pass limit is hit.
fn split_long_edges<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    high: f64,
    preserve_boundary: bool,
    progress: &Progress,
    step: usize,
    total_steps: usize,
) -> Result<usize> {
    let mut total = 0;
    for pass in 0..MAX_SPLIT_PASSES {
        let long: Vec<EdgeId<I>> = mesh
            .edge_ids()
            .filter(|&e| {
                let he = e.halfedge();
                !(preserve_boundary && mesh.is_boundary_edge(he)) && mesh.edge_length(he) > high
            })
            .collect();
        if long.is_empty() {
            break;
        }

        for &e in &long {
            let he = e.halfedge();
            let mid = mesh.edge_midpoint(he);
            mesh.split_edge(he, mid)?;
        }
        total += long.len();
        progress.report_sub(pass + 1, MAX_SPLIT_PASSES, step, total_steps, "Splitting edges");
    }
    Ok(total)
}

/// Collapse edges shorter than `low` as long as no edge around the merged
/// vertex grows beyond `high`.
fn collapse_short_edges<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    low: f64,
    high: f64,
    preserve_boundary: bool,
    progress: &Progress,
    step: usize,
    total_steps: usize,
) -> Result<usize> {
    let mut total = 0;
    for pass in 0..MAX_COLLAPSE_PASSES {
        let short: Vec<EdgeId<I>> = mesh
            .edge_ids()
            .filter(|&e| mesh.edge_length(e.halfedge()) < low)
            .collect();

        let mut collapsed = 0;
        for e in short {
            // Earlier collapses in this pass may have removed or stretched it.
            if mesh.is_edge_removed(e) || mesh.edge_length(e.halfedge()) >= low {
                continue;
            }
            let Some((he, position)) = collapse_target(mesh, e, high, preserve_boundary) else {
                continue;
            };
            let survivor = mesh.collapse_edge(he, position)?;
            mesh.check_vertex_ring(survivor)?;
            collapsed += 1;
        }

        if collapsed == 0 {
            break;
        }
        total += collapsed;
        progress.report_sub(pass + 1, MAX_COLLAPSE_PASSES, step, total_steps, "Collapsing edges");
    }
    Ok(total)
}

/// The half-edge to collapse (its origin is removed) and where the survivor
/// goes, or `None` if the collapse is not allowed.
fn collapse_target<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    e: EdgeId<I>,
    high: f64,
    preserve_boundary: bool,
) -> Option<(HalfEdgeId<I>, Point3<f64>)> {
    let mut he = e.halfedge();
    let [a, b] = mesh.edge_vertices(e);
    let mut position = mesh.edge_midpoint(he);

    if preserve_boundary {
        if mesh.is_boundary_edge(he) {
            return None;
        }
        match (mesh.is_boundary_vertex(a), mesh.is_boundary_vertex(b)) {
            (true, true) => return None,
            (true, false) => {
                he = mesh.twin(he);
                position = *mesh.position(a);
            }
            (false, true) => position = *mesh.position(b),
            (false, false) => {}
        }
    }

    if !mesh.is_collapse_ok(he) {
        return None;
    }
    let stretches = [a, b]
        .into_iter()
        .flat_map(|v| mesh.vertex_neighbors(v))
        .filter(|&n| n != a && n != b)
        .any(|n| (mesh.position(n) - position).norm() > high);
    if stretches || !mesh.collapse_preserves_faces(he, &position) {
        return None;
    }
    Some((he, position))
}

/// Flip every interior edge whose flip lowers the total valence excess of
/// its four vertices. Returns the number of flips.
fn flip_edges_for_valence<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<usize> {
    let edges: Vec<EdgeId<I>> = mesh.edge_ids().collect();
    let mut flips = 0;

    for e in edges {
        let he = e.halfedge();
        if !mesh.is_flip_ok(he) {
            continue;
        }
        if !flip_improves_valence(mesh, he) || !flip_keeps_orientation(mesh, he) {
            continue;
        }

        mesh.flip_edge(he)?;
        flips += 1;
    }
    Ok(flips)
}

/// Whether flipping `he` lowers the summed valence excess of its two
/// endpoints and two opposite corners.
fn flip_improves_valence<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> bool {
    let tw = mesh.twin(he);
    let a = mesh.origin(he);
    let b = mesh.origin(tw);
    let c = mesh.origin(mesh.prev(he));
    let d = mesh.origin(mesh.prev(tw));

    let excess = |v: VertexId<I>, delta: i64| (mesh.valence(v) as i64 + delta - target_valence(mesh, v)).abs();
    let before = excess(a, 0) + excess(b, 0) + excess(c, 0) + excess(d, 0);
    let after = excess(a, -1) + excess(b, -1) + excess(c, 1) + excess(d, 1);
    after < before
}

fn target_valence<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> i64 {
    if mesh.is_boundary_vertex(v) {
        4
    } else {
        6
    }
}

/// Both triangles after the flip face the same side as the pair before it
/// and are not degenerate.
fn flip_keeps_orientation<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> bool {
    let tw = mesh.twin(he);
    let reference = mesh.face_area_vector(mesh.face_of(he)) + mesh.face_area_vector(mesh.face_of(tw));
    let scale = reference.norm();
    if scale <= 0.0 {
        return false;
    }

    let a = *mesh.position(mesh.origin(he));
    let b = *mesh.position(mesh.origin(tw));
    let c = *mesh.position(mesh.origin(mesh.prev(he)));
    let d = *mesh.position(mesh.origin(mesh.prev(tw)));

    [(d, c, a), (c, d, b)].into_iter().all(|(p, q, r)| {
        let n = (q - p).cross(&(r - p));
        n.dot(&reference) > 0.0 && n.norm() > 1e-10 * scale
    })
}
