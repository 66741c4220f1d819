//! Ordered node-id chain test used to pick the bridge way.
//!
//! # Rules
//!
//! | Rule        | A way matches `start → end` when…                                 |
//! |-------------|-------------------------------------------------------------------|
//! | `Literal`   | walking from the first node, every visited id equals the expected |
//! |             | id (which starts at `start` and never advances) until `end` is hit |
//! | `Endpoints` | its first node is `start` and its last node is `end`               |
//!
//! `Literal` is the default.  Because the expected id never advances, it can
//! only succeed when the way starts at `start` and `start == end`; it never
//! accepts a way that merely runs from one to the other.  `Endpoints` is the
//! rule the multi-way tagging pass applies to freshly split ways.

use serde::{Deserialize, Serialize};

use bt_core::NodeId;
use bt_dataset::Way;

/// How [`ChainMatcher`] compares a way against a `start → end` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainRule {
    #[default]
    Literal,
    Endpoints,
}

/// Tests whether a way's node sequence forms the chain `start → end`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainMatcher {
    rule: ChainRule,
}

impl ChainMatcher {
    pub fn new(rule: ChainRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> ChainRule {
        self.rule
    }

    /// Order-sensitive: `matches(w, s, e)` and `matches(w, e, s)` differ
    /// unless the way reads the same in both directions.
    pub fn matches(&self, way: &Way, start: NodeId, end: NodeId) -> bool {
        match self.rule {
            ChainRule::Literal   => literal(&way.nodes, start, end),
            ChainRule::Endpoints => endpoints(&way.nodes, start, end),
        }
    }
}

fn literal(nodes: &[NodeId], start: NodeId, end: NodeId) -> bool {
    let mut expected = start;
    for &id in nodes {
        if id != expected {
            return false;
        }
        expected = id;
        if expected == end {
            return true;
        }
    }
    false
}

fn endpoints(nodes: &[NodeId], start: NodeId, end: NodeId) -> bool {
    nodes.len() >= 2 && nodes.first() == Some(&start) && nodes.last() == Some(&end)
}
