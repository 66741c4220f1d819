//! The `Dataset` boundary and its in-memory implementation.
//!
//! # Pluggability
//!
//! Every edit operation reaches the node/way store through the [`Dataset`]
//! trait, so a host editor can adapt its own store and selection model
//! without the edit core knowing about it.  [`MemoryDataset`] is the
//! reference implementation used by tests and the batch demo.
//!
//! # Selection
//!
//! Selection mirrors desktop editors: selecting nodes replaces the whole
//! selection (ways included) and vice versa.  The split primitive selects the
//! node to cut at, then leaves the two resulting ways selected.

use std::collections::BTreeMap;

use bt_core::{Coordinate, NodeId, WayId};

use crate::model::{Node, Way};
use crate::{DatasetError, DatasetResult};

// ── Dataset trait ─────────────────────────────────────────────────────────────

/// Mutable store of nodes and ways keyed by id, with a selection.
pub trait Dataset {
    fn node(&self, id: NodeId) -> Option<&Node>;

    fn way(&self, id: WayId) -> Option<&Way>;

    /// All ways, in a stable order.
    fn ways(&self) -> Vec<&Way>;

    /// Ids of every way whose node list references `node`.
    fn ways_containing(&self, node: NodeId) -> Vec<WayId>;

    /// Hand out a fresh id for a node created in this session.
    fn new_node_id(&mut self) -> NodeId;

    /// Hand out a fresh id for a way created in this session.
    fn new_way_id(&mut self) -> WayId;

    fn add_node(&mut self, node: Node);

    fn add_way(&mut self, way: Way);

    /// Replace the way with the same id, returning the previous value.
    ///
    /// # Errors
    ///
    /// [`DatasetError::WayNotFound`] if no way with `way.id` exists.
    fn replace_way(&mut self, way: Way) -> DatasetResult<Way>;

    fn remove_node(&mut self, id: NodeId) -> Option<Node>;

    fn remove_way(&mut self, id: WayId) -> Option<Way>;

    /// Make `nodes` the whole selection.
    fn select_nodes(&mut self, nodes: &[NodeId]);

    fn selected_nodes(&self) -> Vec<NodeId>;

    /// Make `ways` the whole selection.
    fn select_ways(&mut self, ways: &[WayId]);

    /// Currently selected ways that still exist, in selection order.
    fn selected_ways(&self) -> Vec<&Way>;

    /// Resolve a way's node references to coordinates.
    ///
    /// # Errors
    ///
    /// [`DatasetError::NodeNotFound`] for the first dangling reference.
    fn way_coordinates(&self, way: &Way) -> DatasetResult<Vec<Coordinate>> {
        way.nodes
            .iter()
            .map(|&id| {
                self.node(id)
                    .map(|n| n.coord)
                    .ok_or(DatasetError::NodeNotFound(id))
            })
            .collect()
    }
}

// ── MemoryDataset ─────────────────────────────────────────────────────────────

/// `BTreeMap`-backed dataset.
///
/// New ids count down from `-1`, below any negative id already present, so
/// session-created primitives never collide with loaded ones.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    nodes:          BTreeMap<NodeId, Node>,
    ways:           BTreeMap<WayId, Way>,
    selected_nodes: Vec<NodeId>,
    selected_ways:  Vec<WayId>,
    next_node_id:   i64,
    next_way_id:    i64,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self {
            nodes:          BTreeMap::new(),
            ways:           BTreeMap::new(),
            selected_nodes: Vec::new(),
            selected_ways:  Vec::new(),
            next_node_id:   -1,
            next_way_id:    -1,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Convenience for fixtures: add a node at `(lat, lon)` with a given id.
    pub fn insert_node(&mut self, id: i64, lat: f64, lon: f64) -> NodeId {
        let id = NodeId(id);
        self.add_node(Node::new(id, Coordinate::new(lat, lon)));
        id
    }
}

impl Default for MemoryDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset for MemoryDataset {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn way(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    fn ways(&self) -> Vec<&Way> {
        self.ways.values().collect()
    }

    fn ways_containing(&self, node: NodeId) -> Vec<WayId> {
        self.ways
            .values()
            .filter(|w| w.nodes.contains(&node))
            .map(|w| w.id)
            .collect()
    }

    fn new_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id -= 1;
        id
    }

    fn new_way_id(&mut self) -> WayId {
        let id = WayId(self.next_way_id);
        self.next_way_id -= 1;
        id
    }

    fn add_node(&mut self, node: Node) {
        if node.id.0 <= self.next_node_id {
            self.next_node_id = node.id.0 - 1;
        }
        self.nodes.insert(node.id, node);
    }

    fn add_way(&mut self, way: Way) {
        if way.id.0 <= self.next_way_id {
            self.next_way_id = way.id.0 - 1;
        }
        self.ways.insert(way.id, way);
    }

    fn replace_way(&mut self, way: Way) -> DatasetResult<Way> {
        match self.ways.get_mut(&way.id) {
            Some(slot) => Ok(std::mem::replace(slot, way)),
            None => Err(DatasetError::WayNotFound(way.id)),
        }
    }

    fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.selected_nodes.retain(|&n| n != id);
        self.nodes.remove(&id)
    }

    fn remove_way(&mut self, id: WayId) -> Option<Way> {
        self.selected_ways.retain(|&w| w != id);
        self.ways.remove(&id)
    }

    fn select_nodes(&mut self, nodes: &[NodeId]) {
        self.selected_ways.clear();
        self.selected_nodes = nodes.to_vec();
    }

    fn selected_nodes(&self) -> Vec<NodeId> {
        self.selected_nodes.clone()
    }

    fn select_ways(&mut self, ways: &[WayId]) {
        self.selected_nodes.clear();
        self.selected_ways = ways.to_vec();
    }

    fn selected_ways(&self) -> Vec<&Way> {
        self.selected_ways
            .iter()
            .filter_map(|id| self.ways.get(id))
            .collect()
    }
}
