//! Coordinate groups and batch configuration.
//!
//! # JSON format
//!
//! A batch is either a bare array of groups or an object with an optional
//! `session` block:
//!
//! ```json
//! {
//!   "session": { "tags": { "bridge": "yes", "layer": "1" }, "chainRule": "endpoints" },
//!   "groups": [
//!     [
//!       { "latitude": 36.99063067649576, "longitude": -85.90225171619728, "wayId": 108707726 },
//!       { "latitude": 36.990448735147304, "longitude": -85.90199932269573, "wayId": 108707726 }
//!     ],
//!     {
//!       "points": [
//!         { "latitude": 37.9340811, "longitude": -87.5476108, "wayId": 17561921 },
//!         { "latitude": 37.9363173, "longitude": -87.5462384, "wayId": 97759371 }
//!       ],
//!       "additionalBridgeWayIds": [17563421]
//!     }
//!   ]
//! }
//! ```
//!
//! A bare array of points is a **simple** group (one bridge on one way); an
//! object with `points` is a **multi-way** group.  `way_id` and
//! `additional_bridge_way_ids` are accepted as aliases.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use bt_core::{Coordinate, WayId};
use bt_dataset::Tags;

use crate::chain::ChainRule;
use crate::tagger::bridge_tags;
use crate::{EditError, EditResult};

// ── Points and groups ─────────────────────────────────────────────────────────

/// One split point: a coordinate and the way it should land on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPoint {
    pub latitude:  f64,
    pub longitude: f64,
    #[serde(alias = "way_id")]
    pub way_id:    WayId,
}

impl GroupPoint {
    pub fn new(latitude: f64, longitude: f64, way_id: WayId) -> Self {
        Self { latitude, longitude, way_id }
    }

    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// All points sit on one bridge way; the bridge runs first → last point.
    Simple,
    /// Points sit on the ways at either end of a bridge spanning several ways.
    MultiWay,
}

/// One logical bridge-tagging task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawGroup", into = "RawGroup")]
pub struct CoordinateGroup {
    pub kind:                      GroupKind,
    pub points:                    Vec<GroupPoint>,
    /// Ways known to be part of the bridge that no split point touches.
    pub additional_bridge_way_ids: Vec<WayId>,
}

impl CoordinateGroup {
    pub fn simple(points: Vec<GroupPoint>) -> Self {
        Self {
            kind: GroupKind::Simple,
            points,
            additional_bridge_way_ids: Vec::new(),
        }
    }

    pub fn multi_way(points: Vec<GroupPoint>, additional_bridge_way_ids: Vec<WayId>) -> Self {
        Self {
            kind: GroupKind::MultiWay,
            points,
            additional_bridge_way_ids,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawGroup {
    Simple(Vec<GroupPoint>),
    MultiWay {
        points: Vec<GroupPoint>,
        #[serde(
            default,
            rename = "additionalBridgeWayIds",
            alias = "additional_bridge_way_ids"
        )]
        additional: Vec<WayId>,
    },
}

impl From<RawGroup> for CoordinateGroup {
    fn from(raw: RawGroup) -> Self {
        match raw {
            RawGroup::Simple(points) => CoordinateGroup::simple(points),
            RawGroup::MultiWay { points, additional } => CoordinateGroup::multi_way(points, additional),
        }
    }
}

impl From<CoordinateGroup> for RawGroup {
    fn from(group: CoordinateGroup) -> Self {
        match group.kind {
            GroupKind::Simple if group.additional_bridge_way_ids.is_empty() => {
                RawGroup::Simple(group.points)
            }
            _ => RawGroup::MultiWay {
                points:     group.points,
                additional: group.additional_bridge_way_ids,
            },
        }
    }
}

// ── Session configuration ─────────────────────────────────────────────────────

/// Knobs for an [`EditSession`](crate::EditSession).  Every field has a
/// default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Tags applied to every bridge way.  Default `bridge=yes`.
    pub tags:                   Tags,
    /// How the bridge way is recognised among split results.
    pub chain_rule:             ChainRule,
    /// Fill an empty `additionalBridgeWayIds` from the way graph.
    pub discover_interior_ways: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tags:                   bridge_tags(),
            chain_rule:             ChainRule::default(),
            discover_interior_ways: false,
        }
    }
}

// ── Batch files ───────────────────────────────────────────────────────────────

/// A session config plus the groups to run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchConfig {
    pub session: SessionConfig,
    pub groups:  Vec<CoordinateGroup>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBatch {
    Groups(Vec<CoordinateGroup>),
    Full {
        #[serde(default)]
        session: SessionConfig,
        groups:  Vec<CoordinateGroup>,
    },
}

impl BatchConfig {
    /// Reject groups that can never run: no points, or a point whose
    /// coordinate is out of range.
    pub fn validate(&self) -> EditResult<()> {
        if self.session.tags.is_empty() {
            return Err(EditError::Config("session tag set is empty".into()));
        }
        for (i, group) in self.groups.iter().enumerate() {
            if group.points.is_empty() {
                return Err(EditError::Config(format!("group {i} has no points")));
            }
            for (j, p) in group.points.iter().enumerate() {
                Coordinate::checked(p.latitude, p.longitude)
                    .map_err(|e| EditError::Config(format!("group {i} point {j}: {e}")))?;
            }
        }
        Ok(())
    }
}

/// Load and validate a batch file.
pub fn load_batch(path: &Path) -> EditResult<BatchConfig> {
    let file = File::open(path)?;
    load_batch_reader(BufReader::new(file))
}

/// Like [`load_batch`] but accepts any `Read` source.
pub fn load_batch_reader<R: Read>(reader: R) -> EditResult<BatchConfig> {
    let batch = match serde_json::from_reader(reader)? {
        RawBatch::Groups(groups) => BatchConfig { session: SessionConfig::default(), groups },
        RawBatch::Full { session, groups } => BatchConfig { session, groups },
    };
    batch.validate()?;
    Ok(batch)
}
