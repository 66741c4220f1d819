//! Topological way split.
//!
//! [`WayTopology`] is the seam between the edit core and whatever performs
//! the actual cut: [`SplitAtNode`] is a pure, dataset-free implementation, and
//! [`split_way_at_selected_node`] drives it against a [`Dataset`] the way a
//! desktop editor's "split way" action does.

use bt_core::{NodeId, WayId};

use crate::dataset::Dataset;
use crate::journal::{Journal, Mutation};
use crate::model::Way;
use crate::{DatasetError, DatasetResult};

/// Splits one way into two at an interior node.
pub trait WayTopology {
    /// Cut `way` at `node`.
    ///
    /// Returns `(before, after)`: `before` keeps `way.id` and runs from the
    /// first node up to and including `node`; `after` gets `new_way` and runs
    /// from `node` to the last node.  Both carry `way`'s tags.
    fn split_at(&self, way: &Way, node: NodeId, new_way: WayId) -> DatasetResult<(Way, Way)>;
}

// ── SplitAtNode ───────────────────────────────────────────────────────────────

/// Reference [`WayTopology`]: cuts at the first occurrence of the node.
#[derive(Copy, Clone, Debug, Default)]
pub struct SplitAtNode;

impl WayTopology for SplitAtNode {
    fn split_at(&self, way: &Way, node: NodeId, new_way: WayId) -> DatasetResult<(Way, Way)> {
        let idx = way
            .nodes
            .iter()
            .position(|&n| n == node)
            .ok_or(DatasetError::SplitRejected {
                way:    way.id,
                node,
                reason: "node is not part of the way",
            })?;

        if idx == 0 || idx == way.nodes.len() - 1 {
            return Err(DatasetError::SplitRejected {
                way:    way.id,
                node,
                reason: "node is an end point",
            });
        }

        let before = Way {
            id:    way.id,
            nodes: way.nodes[..=idx].to_vec(),
            tags:  way.tags.clone(),
        };
        let after = Way {
            id:    new_way,
            nodes: way.nodes[idx..].to_vec(),
            tags:  way.tags.clone(),
        };
        Ok((before, after))
    }
}

// ── Split primitive ───────────────────────────────────────────────────────────

/// Split the single way passing through the single selected node.
///
/// Records the shortened original way and the newly created way in
/// `journal`, then leaves both selected.  Returns `(before, after)` ids.
///
/// # Errors
///
/// - [`DatasetError::SelectionInvalid`] unless exactly one node is selected.
/// - [`DatasetError::AmbiguousSplit`] unless exactly one way contains it.
/// - Whatever `topology` rejects.
pub fn split_way_at_selected_node<D, T, J>(
    dataset:  &mut D,
    topology: &T,
    journal:  &mut J,
) -> DatasetResult<(WayId, WayId)>
where
    D: Dataset,
    T: WayTopology,
    J: Journal,
{
    let selected = dataset.selected_nodes();
    let &[node] = selected.as_slice() else {
        return Err(DatasetError::SelectionInvalid(selected.len()));
    };

    let containing = dataset.ways_containing(node);
    let &[way_id] = containing.as_slice() else {
        return Err(DatasetError::AmbiguousSplit { node, ways: containing.len() });
    };
    let way = dataset
        .way(way_id)
        .cloned()
        .ok_or(DatasetError::WayNotFound(way_id))?;

    // The fresh id is only drawn once the topology accepts the split.
    let (before, mut after) = topology.split_at(&way, node, way_id)?;
    after.id = dataset.new_way_id();
    let (before_id, after_id) = (before.id, after.id);

    let previous = dataset.replace_way(before.clone())?;
    journal.record(Mutation::ChangeWay { before: previous, after: before });
    dataset.add_way(after.clone());
    journal.record(Mutation::AddWay(after));

    dataset.select_ways(&[before_id, after_id]);
    log::debug!("split way {way_id} at {node} into {before_id} + {after_id}");
    Ok((before_id, after_id))
}
