//! Insert a node at a located position and split the way there.

use bt_core::WayId;
use bt_dataset::{
    Dataset, Journal, Mutation, Node, SplitAtNode, Way, WayTopology, split_way_at_selected_node,
};

use crate::locator::SplitResult;
use crate::{EditError, EditResult};

/// The two halves of a split and the node they share.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    pub node:   Node,
    /// Keeps the split way's id; ends at `node`.
    pub before: Way,
    /// Freshly created; starts at `node`.
    pub after:  Way,
}

/// Inserts located nodes and performs the topological split.
#[derive(Debug, Clone, Default)]
pub struct WaySplitter<T: WayTopology = SplitAtNode> {
    topology: T,
}

impl WaySplitter {
    pub fn new() -> Self {
        Self { topology: SplitAtNode }
    }
}

impl<T: WayTopology> WaySplitter<T> {
    pub fn with_topology(topology: T) -> Self {
        Self { topology }
    }

    /// Create a node at `result.closest`, insert it after
    /// `result.segment_index`, and split `way` at it.
    ///
    /// Journal order: node creation, the widened way, then the split's own
    /// way change and way creation.
    ///
    /// # Errors
    ///
    /// - [`EditError::WayNotFound`] if `way` is missing.
    /// - [`EditError::NoClosestSegment`] if `result` does not name a segment
    ///   of `way` (stale result).
    /// - [`EditError::Dataset`] if the split primitive refuses the cut.
    pub fn split_at<D, J>(
        &self,
        dataset: &mut D,
        journal: &mut J,
        way:     WayId,
        result:  &SplitResult,
    ) -> EditResult<SplitOutcome>
    where
        D: Dataset,
        J: Journal,
    {
        let original = dataset.way(way).cloned().ok_or(EditError::WayNotFound(way))?;
        if result.segment_index >= original.segment_count() {
            return Err(EditError::NoClosestSegment { way, coord: result.closest });
        }

        let node = Node::new(dataset.new_node_id(), result.closest);
        dataset.add_node(node);
        journal.record(Mutation::AddNode(node));

        let mut widened = original;
        widened.nodes.insert(result.insert_index(), node.id);
        let previous = dataset.replace_way(widened.clone())?;
        journal.record(Mutation::ChangeWay { before: previous, after: widened });

        dataset.select_nodes(&[node.id]);
        let (before_id, after_id) = split_way_at_selected_node(dataset, &self.topology, journal)?;

        let before = dataset.way(before_id).cloned().ok_or(EditError::WayNotFound(before_id))?;
        let after = dataset.way(after_id).cloned().ok_or(EditError::WayNotFound(after_id))?;
        log::debug!(
            "inserted {} at {} into {way} (segment {}), split into {before_id} + {after_id}",
            node.id,
            node.coord,
            result.segment_index
        );
        Ok(SplitOutcome { node, before, after })
    }
}
