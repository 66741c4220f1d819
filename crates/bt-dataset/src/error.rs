//! Dataset-subsystem error type.

use thiserror::Error;

use bt_core::{NodeId, WayId};

/// Errors produced by `bt-dataset`.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("way {0} not found in dataset")]
    WayNotFound(WayId),

    #[error("node {0} not found in dataset")]
    NodeNotFound(NodeId),

    #[error("node {node} has an invalid coordinate")]
    InvalidCoordinate { node: NodeId },

    #[error("way {0} has fewer than two nodes")]
    DegenerateWay(WayId),

    #[error("split needs exactly one selected node, found {0}")]
    SelectionInvalid(usize),

    #[error("node {node} lies on {ways} ways, split needs exactly one")]
    AmbiguousSplit { node: NodeId, ways: usize },

    #[error("cannot split way {way} at node {node}: {reason}")]
    SplitRejected {
        way:    WayId,
        node:   NodeId,
        reason: &'static str,
    },

    #[error("no path of ways connects {from} to {to}")]
    NoWayPath { from: WayId, to: WayId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "scene")]
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DatasetResult<T> = Result<T, DatasetError>;
