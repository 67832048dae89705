//! The collapse loop.

use log::{debug, info, trace, warn};
use nalgebra::Point3;
use rayon::prelude::*;

use super::policy::{CostPolicy, PlacementPolicy};
use super::queue::CollapseQueue;
use super::stop::StopPredicate;
use super::{SimplifyOptions, SimplifyReport, StopReason};
use crate::algo::progress::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex};

/// Outcome of scoring one edge.
enum Score<I: MeshIndex> {
    Candidate {
        halfedge: HalfEdgeId<I>,
        cost: f64,
        placement: Point3<f64>,
    },
    Skip,
    Invalid(MeshError),
}

struct Collapser<'a, I: MeshIndex> {
    cost: &'a dyn CostPolicy<I>,
    placement: &'a dyn PlacementPolicy<I>,
    options: &'a SimplifyOptions<I>,
}

impl<I: MeshIndex> Collapser<'_, I> {
    fn is_pinned(&self, mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> bool {
        let pinned = &self.options.pinned;
        !pinned.is_empty() && (pinned.contains(&mesh.origin(he)) || pinned.contains(&mesh.dest(he)))
    }

    fn score(&self, mesh: &HalfEdgeMesh<I>, edge: EdgeId<I>) -> Score<I> {
        let mut he = edge.halfedge();
        if self.is_pinned(mesh, he) {
            return Score::Skip;
        }

        // With a fixed boundary, only interior vertices may disappear, and
        // they merge into their boundary neighbour without moving it.
        let mut anchor = None;
        if self.options.preserve_boundary {
            if mesh.is_boundary_edge(he) {
                return Score::Skip;
            }
            let on_boundary = |v| mesh.is_boundary_vertex(v);
            match (on_boundary(mesh.origin(he)), on_boundary(mesh.dest(he))) {
                (true, true) => return Score::Skip,
                (true, false) => he = mesh.twin(he),
                (false, _) => {}
            }
            if mesh.is_boundary_vertex(mesh.dest(he)) {
                anchor = Some(*mesh.position(mesh.dest(he)));
            }
        }

        let Some(cost) = self.cost.cost(mesh, edge) else {
            return Score::Skip;
        };
        if !cost.is_finite() || cost < 0.0 {
            return Score::Invalid(MeshError::InvalidPolicyValue {
                policy: self.cost.name(),
                value: cost.to_string(),
            });
        }

        let placement = match anchor {
            Some(p) => p,
            None => match self.placement.place(mesh, edge) {
                Some(p) => p,
                None => return Score::Skip,
            },
        };
        if !placement.coords.iter().all(|c| c.is_finite()) {
            return Score::Invalid(MeshError::InvalidPolicyValue {
                policy: self.placement.name(),
                value: format!("({}, {}, {})", placement.x, placement.y, placement.z),
            });
        }

        Score::Candidate {
            halfedge: he,
            cost,
            placement,
        }
    }

    fn enqueue(
        &self,
        queue: &mut CollapseQueue<I>,
        report: &mut SimplifyReport,
        edge: EdgeId<I>,
        score: Score<I>,
        stamp: u64,
    ) {
        match score {
            Score::Candidate {
                halfedge,
                cost,
                placement,
            } => queue.push(edge, halfedge, cost, placement, stamp),
            Score::Skip => {}
            Score::Invalid(err) => {
                trace!("skipping {:?}: {}", edge, err);
                report.rejected_policy += 1;
            }
        }
    }
}

pub(crate) fn run<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    stop: &dyn StopPredicate<I>,
    cost: &dyn CostPolicy<I>,
    placement: &dyn PlacementPolicy<I>,
    options: &SimplifyOptions<I>,
    progress: &Progress,
) -> Result<SimplifyReport> {
    mesh.require_triangles()?;

    let initial = mesh.num_edges();
    let mut report = SimplifyReport::new(initial);
    if stop.should_stop(mesh, initial) {
        report.stop_reason = StopReason::TargetReached;
        return Ok(report);
    }

    info!(
        "simplifying {} vertices, {} faces, {} edges (cost: {}, placement: {})",
        mesh.num_vertices(),
        mesh.num_faces(),
        initial,
        cost.name(),
        placement.name()
    );

    let collapser = Collapser {
        cost,
        placement,
        options,
    };

    let mut stamps = vec![mesh.generation(); mesh.edge_capacity()];
    let edges: Vec<EdgeId<I>> = mesh.edge_ids().collect();
    let scores: Vec<Score<I>> = {
        let mesh = &*mesh;
        if options.parallel {
            edges.par_iter().map(|&e| collapser.score(mesh, e)).collect()
        } else {
            edges.iter().map(|&e| collapser.score(mesh, e)).collect()
        }
    };

    let mut queue = CollapseQueue::with_capacity(edges.len());
    for (edge, score) in edges.into_iter().zip(scores) {
        collapser.enqueue(&mut queue, &mut report, edge, score, stamps[edge.index()]);
    }
    debug!("{} initial candidates", queue.len());

    loop {
        if stop.should_stop(mesh, initial) {
            report.stop_reason = StopReason::TargetReached;
            break;
        }
        if options.max_collapses.is_some_and(|max| report.collapses >= max) {
            report.stop_reason = StopReason::CollapseLimit;
            break;
        }
        let Some(candidate) = queue.pop() else {
            report.stop_reason = StopReason::QueueExhausted;
            break;
        };

        if mesh.is_edge_removed(candidate.edge) || stamps[candidate.edge.index()] != candidate.stamp {
            report.rejected_stale += 1;
            trace!("stale candidate for {:?}", candidate.edge);
            continue;
        }
        let he = candidate.halfedge;
        if !mesh.is_collapse_ok(he) || collapser.is_pinned(mesh, he) {
            report.rejected_illegal += 1;
            trace!("{:?} is no longer collapsible", candidate.edge);
            continue;
        }
        if options.prevent_face_flips && !mesh.collapse_preserves_faces(he, &candidate.placement) {
            report.rejected_illegal += 1;
            trace!("collapsing {:?} would flip a face", candidate.edge);
            continue;
        }

        let survivor = match mesh.collapse_edge(he, candidate.placement) {
            Ok(v) => v,
            Err(err) => {
                report.stop_reason = StopReason::Aborted(err);
                break;
            }
        };
        report.collapses += 1;
        if let Err(err) = mesh.check_vertex_ring(survivor) {
            report.stop_reason = StopReason::Aborted(err);
            break;
        }

        // Legality of an edge depends on the rings of both endpoints, so every
        // edge touching the survivor or one of its neighbours is re-scored.
        let generation = mesh.generation();
        let around: Vec<EdgeId<I>> = std::iter::once(survivor)
            .chain(mesh.vertex_neighbors(survivor))
            .flat_map(|v| mesh.vertex_halfedges(v))
            .map(|h| h.edge())
            .collect();
        for edge in around {
            if stamps[edge.index()] == generation {
                continue;
            }
            stamps[edge.index()] = generation;
            let score = collapser.score(mesh, edge);
            collapser.enqueue(&mut queue, &mut report, edge, score, generation);
        }

        progress.report(initial - mesh.num_edges(), initial, "Collapsing edges");
    }

    if let StopReason::Aborted(err) = &report.stop_reason {
        warn!("simplification aborted after {} collapses: {}", report.collapses, err);
    } else if report.collapses > 0 {
        mesh.compact();
    }
    report.final_edge_count = mesh.num_edges();
    report.edges_removed = initial.saturating_sub(report.final_edge_count);

    debug!(
        "rejected {} stale, {} illegal, {} by policy",
        report.rejected_stale, report.rejected_illegal, report.rejected_policy
    );
    info!(
        "removed {} edges in {} collapses, {} edges left ({})",
        report.edges_removed, report.collapses, report.final_edge_count, report.stop_reason
    );
    Ok(report)
}
