//! Min-priority queue of collapse candidates with lazy deletion.
//!
//! Entries are never removed when their edge changes; instead each carries the
//! stamp its edge had when it was scored, and the executor drops entries whose
//! stamp no longer matches.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point3;

use crate::mesh::{EdgeId, HalfEdgeId, MeshIndex};

/// A scored edge collapse.
#[derive(Debug, Clone)]
pub(crate) struct CollapseCandidate<I: MeshIndex> {
    pub edge: EdgeId<I>,
    /// Half-edge whose origin is removed.
    pub halfedge: HalfEdgeId<I>,
    pub cost: f64,
    pub placement: Point3<f64>,
    /// Edge stamp at scoring time.
    pub stamp: u64,
    /// Insertion order, breaks cost ties.
    seq: u64,
}

impl<I: MeshIndex> PartialEq for CollapseCandidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<I: MeshIndex> Eq for CollapseCandidate<I> {}

impl<I: MeshIndex> PartialOrd for CollapseCandidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: MeshIndex> Ord for CollapseCandidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the cheapest and oldest.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub(crate) struct CollapseQueue<I: MeshIndex> {
    heap: BinaryHeap<CollapseCandidate<I>>,
    next_seq: u64,
}

impl<I: MeshIndex> CollapseQueue<I> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn push(
        &mut self,
        edge: EdgeId<I>,
        halfedge: HalfEdgeId<I>,
        cost: f64,
        placement: Point3<f64>,
        stamp: u64,
    ) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(CollapseCandidate {
            edge,
            halfedge,
            cost,
            placement,
            stamp,
            seq,
        });
    }

    pub fn pop(&mut self) -> Option<CollapseCandidate<I>> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(queue: &mut CollapseQueue<u32>, edge: usize, cost: f64) {
        let e = EdgeId::new(edge);
        queue.push(e, e.halfedge(), cost, Point3::origin(), 0);
    }

    #[test]
    fn test_pops_cheapest_first() {
        let mut queue = CollapseQueue::with_capacity(4);
        push(&mut queue, 0, 3.0);
        push(&mut queue, 1, 1.0);
        push(&mut queue, 2, 2.0);

        let order: Vec<usize> = std::iter::from_fn(|| queue.pop())
            .map(|c| c.edge.index())
            .collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_ties_pop_in_insertion_order() {
        let mut queue = CollapseQueue::with_capacity(4);
        for edge in [5, 2, 7, 0] {
            push(&mut queue, edge, 1.0);
        }
        push(&mut queue, 9, 0.5);

        assert_eq!(queue.len(), 5);
        let order: Vec<usize> = std::iter::from_fn(|| queue.pop())
            .map(|c| c.edge.index())
            .collect();
        assert_eq!(order, vec![9, 5, 2, 7, 0]);
    }
}
