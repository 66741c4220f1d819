//! Edit-core error type.
//!
//! Every kind except the I/O and parse wrappers is recoverable: the session
//! logs it, reports it to the observer, and moves on to the next point or
//! group.

use thiserror::Error;

use bt_core::{Coordinate, NodeId, WayId};
use bt_dataset::DatasetError;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("way {0} not found")]
    WayNotFound(WayId),

    #[error("way {0} has fewer than two nodes")]
    DegenerateWay(WayId),

    #[error("failed to find a suitable segment on way {way} for {coord}")]
    NoClosestSegment { way: WayId, coord: Coordinate },

    #[error("no unique way among {candidates} candidates runs from {start} to {end}")]
    AmbiguousBridge {
        start:      NodeId,
        end:        NodeId,
        candidates: usize,
    },

    #[error("additional bridge way {0} not found")]
    MissingAdditionalWay(WayId),

    #[error("bridge {0} node was never created")]
    MissingEndpoint(&'static str),

    #[error("dataset error: {0}")]
    Dataset(DatasetError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EditError {
    /// Short kind name used as the tag of log lines and report rows.
    pub fn kind(&self) -> &'static str {
        match self {
            EditError::WayNotFound(_)          => "WayNotFound",
            EditError::DegenerateWay(_)        => "DegenerateWay",
            EditError::NoClosestSegment { .. } => "NoClosestSegment",
            EditError::AmbiguousBridge { .. }  => "AmbiguousBridge",
            EditError::MissingAdditionalWay(_) => "MissingAdditionalWay",
            EditError::MissingEndpoint(_)      => "MissingEndpoint",
            EditError::Dataset(_)              => "Dataset",
            EditError::Config(_)               => "Config",
            EditError::Io(_)                   => "Io",
            EditError::Json(_)                 => "Json",
            EditError::Csv(_)                  => "Csv",
        }
    }
}

/// Lifts the dataset kinds that have an edit-level name.
impl From<DatasetError> for EditError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::WayNotFound(id)   => EditError::WayNotFound(id),
            DatasetError::DegenerateWay(id) => EditError::DegenerateWay(id),
            other                           => EditError::Dataset(other),
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
