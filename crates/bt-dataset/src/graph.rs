//! Way-level path search.
//!
//! Used to discover the interior ways of a multi-way bridge: ways that lie
//! between the two ways carrying the bridge's end points and therefore
//! contain none of its split points.
//!
//! The search is a breadth-first walk over the undirected node graph (every
//! way segment is an edge in both directions), so the returned path has the
//! fewest node hops, not the shortest length.  Neighbour order follows
//! [`Dataset::ways`], which keeps results deterministic.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use bt_core::{NodeId, WayId};

use crate::dataset::Dataset;
use crate::{DatasetError, DatasetResult};

/// Undirected adjacency snapshot of a dataset's ways.
pub struct WayGraph {
    adjacency: FxHashMap<NodeId, Vec<(NodeId, WayId)>>,
}

impl WayGraph {
    /// Snapshot the current ways of `dataset`.
    pub fn build<D: Dataset>(dataset: &D) -> Self {
        let mut adjacency: FxHashMap<NodeId, Vec<(NodeId, WayId)>> = FxHashMap::default();
        for way in dataset.ways() {
            for pair in way.nodes.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                adjacency.entry(a).or_default().push((b, way.id));
                adjacency.entry(b).or_default().push((a, way.id));
            }
        }
        Self { adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Ways traversed on a fewest-hops path from `from` to `to`, in order,
    /// with consecutive repeats collapsed.
    ///
    /// Returns `None` if `to` is unreachable.  `from == to` yields an empty
    /// path.
    pub fn way_path(&self, from: NodeId, to: NodeId) -> Option<Vec<WayId>> {
        if from == to {
            return Some(vec![]);
        }

        // prev[v] = (node we came from, way of that edge)
        let mut prev: FxHashMap<NodeId, (NodeId, WayId)> = FxHashMap::default();
        let mut queue = VecDeque::from([from]);
        let mut found = false;

        while let Some(node) = queue.pop_front() {
            if node == to {
                found = true;
                break;
            }
            let Some(neighbors) = self.adjacency.get(&node) else {
                continue;
            };
            for &(next, way) in neighbors {
                if next == from || prev.contains_key(&next) {
                    continue;
                }
                prev.insert(next, (node, way));
                queue.push_back(next);
            }
        }

        if !found {
            return None;
        }

        let mut ways = Vec::new();
        let mut cur = to;
        while let Some(&(back, way)) = prev.get(&cur) {
            if ways.last() != Some(&way) {
                ways.push(way);
            }
            cur = back;
        }
        ways.reverse();
        Some(ways)
    }

    /// Ways strictly between `from_way` and `to_way`.
    ///
    /// Walks from the first node of `from_way` to the first node of
    /// `to_way` and drops both end ways from the result.
    ///
    /// # Errors
    ///
    /// - [`DatasetError::WayNotFound`] if either way is missing.
    /// - [`DatasetError::DegenerateWay`] if either way has no nodes.
    /// - [`DatasetError::NoWayPath`] if the two are not connected.
    pub fn interior_ways<D: Dataset>(
        &self,
        dataset:  &D,
        from_way: WayId,
        to_way:   WayId,
    ) -> DatasetResult<Vec<WayId>> {
        let start = first_node(dataset, from_way)?;
        let goal = first_node(dataset, to_way)?;

        let path = self
            .way_path(start, goal)
            .ok_or(DatasetError::NoWayPath { from: from_way, to: to_way })?;

        let mut interior: Vec<WayId> = Vec::with_capacity(path.len());
        for way in path {
            if way != from_way && way != to_way && !interior.contains(&way) {
                interior.push(way);
            }
        }
        Ok(interior)
    }
}

fn first_node<D: Dataset>(dataset: &D, way: WayId) -> DatasetResult<NodeId> {
    dataset
        .way(way)
        .ok_or(DatasetError::WayNotFound(way))?
        .first_node()
        .ok_or(DatasetError::DegenerateWay(way))
}
