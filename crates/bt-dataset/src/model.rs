//! Dataset primitives: nodes, ways, and tags.

use std::collections::BTreeMap;

use bt_core::{Coordinate, NodeId, WayId};

/// Key → value tag map.  Ordered so tag dumps and comparisons are stable.
pub type Tags = BTreeMap<String, String>;

// ── Node ──────────────────────────────────────────────────────────────────────

/// A single geographic point with identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id:    NodeId,
    pub coord: Coordinate,
}

impl Node {
    #[inline]
    pub fn new(id: NodeId, coord: Coordinate) -> Self {
        Self { id, coord }
    }
}

// ── Way ───────────────────────────────────────────────────────────────────────

/// An ordered polyline of node references plus its tags.
///
/// Node order is significant: it defines both the path and the direction of
/// the way.  Segment `i` is the pair `(nodes[i], nodes[i + 1])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id:    WayId,
    pub nodes: Vec<NodeId>,
    pub tags:  Tags,
}

impl Way {
    pub fn new(id: WayId, nodes: Vec<NodeId>) -> Self {
        Self { id, nodes, tags: Tags::new() }
    }

    /// Builder-style tag setter, mostly for fixtures.
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Number of segments; zero for ways with fewer than two nodes.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// `true` if the way has no valid segment.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.nodes.len() < 2
    }

    pub fn first_node(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last_node(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// `true` if every `(key, value)` in `tags` is already present.
    pub fn has_tags(&self, tags: &Tags) -> bool {
        tags.iter().all(|(k, v)| self.tags.get(k) == Some(v))
    }
}
