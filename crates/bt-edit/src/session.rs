//! Batch orchestration: runs coordinate groups through locate, split, and
//! tag.
//!
//! # Group state machine
//!
//! ```text
//! Pending ─▶ Splitting(0) ─▶ … ─▶ Splitting(n-1) ─▶ Tagging ─▶ Done
//!    └──────────────┴─────────────────┴────────────────┴─────▶ Failed(reason)
//! ```
//!
//! A point that cannot be located or split is reported and skipped.  A group
//! ends `Failed` only when no bridge way was tagged; the next group runs
//! either way.
//!
//! # Split lineage
//!
//! Splitting a way keeps its id on the first piece and gives the second
//! piece a fresh id.  A later point configured with the original id may lie
//! on either piece, so the session remembers every piece descended from a
//! configured way and locates each point against all of them, keeping the
//! global minimum (earliest piece on ties).
//!
//! # Bridge search
//!
//! | Group     | Candidates                          | Start → end                            | Rule                    |
//! |-----------|-------------------------------------|----------------------------------------|-------------------------|
//! | simple    | selected ways, then all pieces      | first point's node → last point's node | `SessionConfig::chain_rule` |
//! | multi-way | the two halves of each split        | new node ↔ the split way's far end     | `Endpoints`             |
//!
//! In a multi-way group the first point's bridge piece runs from the new node
//! to the old last node of its way; every other current point's piece runs
//! from the old last node to the new node, and the final point's piece runs
//! from the old first node of its way to the new node.

use std::fmt;

use rustc_hash::FxHashMap;

use bt_core::{Coordinate, NodeId, Projector, WayId, WebMercator};
use bt_dataset::{Dataset, Journal, SplitAtNode, WayGraph, WayTopology};

use crate::chain::{ChainMatcher, ChainRule};
use crate::group::{CoordinateGroup, GroupKind, GroupPoint, SessionConfig};
use crate::locator::{NearestPointLocator, SplitResult};
use crate::observer::SessionObserver;
use crate::splitter::{SplitOutcome, WaySplitter};
use crate::tagger::BridgeTagger;
use crate::{EditError, EditResult};

// ── Reports ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupState {
    Pending,
    /// Working on the point with this index.
    Splitting(usize),
    Tagging,
    Done,
    Failed(String),
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupState::Pending         => write!(f, "pending"),
            GroupState::Splitting(i)    => write!(f, "splitting point {i}"),
            GroupState::Tagging         => write!(f, "tagging"),
            GroupState::Done            => write!(f, "done"),
            GroupState::Failed(reason)  => write!(f, "failed: {reason}"),
        }
    }
}

/// A recovered error, kept as text so reports stay `Clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind:    &'static str,
    pub message: String,
}

impl From<&EditError> for Failure {
    fn from(e: &EditError) -> Self {
        Self { kind: e.kind(), message: e.to_string() }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointOutcome {
    Split {
        /// The piece that was split.
        way:        WayId,
        node:       NodeId,
        /// Id of the newly created second piece.
        after:      WayId,
        distance_m: f64,
    },
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointReport {
    pub index:     usize,
    /// Way id the point was configured with.
    pub requested: WayId,
    pub outcome:   PointOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub index:   usize,
    pub kind:    GroupKind,
    pub state:   GroupState,
    pub points:  Vec<PointReport>,
    /// Ways that carry the bridge tags after this group, in tagging order.
    pub bridges: Vec<WayId>,
    /// Bridge-search and explicit-tagging failures.
    pub errors:  Vec<Failure>,
}

impl GroupReport {
    fn new(index: usize, kind: GroupKind) -> Self {
        Self {
            index,
            kind,
            state:   GroupState::Pending,
            points:  Vec::new(),
            bridges: Vec::new(),
            errors:  Vec::new(),
        }
    }

    /// New node ids, in point order.
    pub fn split_nodes(&self) -> Vec<NodeId> {
        self.points
            .iter()
            .filter_map(|p| match p.outcome {
                PointOutcome::Split { node, .. } => Some(node),
                PointOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn is_done(&self) -> bool {
        self.state == GroupState::Done
    }

    fn set_state(&mut self, state: GroupState) {
        log::trace!("group {}: {} -> {}", self.index, self.state, state);
        self.state = state;
    }

    fn add_bridge(&mut self, way: WayId) {
        if !self.bridges.contains(&way) {
            self.bridges.push(way);
        }
    }

    fn finish(&mut self) {
        let state = if !self.bridges.is_empty() {
            GroupState::Done
        } else {
            let reason = self
                .errors
                .last()
                .map(Failure::to_string)
                .unwrap_or_else(|| "no bridge way tagged".to_owned());
            GroupState::Failed(reason)
        };
        self.set_state(state);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub groups: Vec<GroupReport>,
}

impl SessionReport {
    pub fn done_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_done()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.state, GroupState::Failed(_)))
            .count()
    }

    /// Every tagged bridge way, in group order.
    pub fn bridges(&self) -> impl Iterator<Item = WayId> + '_ {
        self.groups.iter().flat_map(|g| g.bridges.iter().copied())
    }
}

// ── Split lineage ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Lineage {
    /// Configured way id → every piece descended from it, oldest first.
    pieces: FxHashMap<WayId, Vec<WayId>>,
    root:   FxHashMap<WayId, WayId>,
}

impl Lineage {
    fn root_of(&self, way: WayId) -> WayId {
        self.root.get(&way).copied().unwrap_or(way)
    }

    fn pieces(&self, way: WayId) -> Vec<WayId> {
        let root = self.root_of(way);
        self.pieces.get(&root).cloned().unwrap_or_else(|| vec![root])
    }

    fn record(&mut self, split: WayId, created: WayId) {
        let root = self.root_of(split);
        self.pieces.entry(root).or_insert_with(|| vec![root]).push(created);
        self.root.insert(created, root);
    }
}

// ── EditSession ───────────────────────────────────────────────────────────────

/// Runs coordinate groups against a dataset, journaling every mutation.
pub struct EditSession<P: Projector = WebMercator, T: WayTopology = SplitAtNode> {
    config:   SessionConfig,
    locator:  NearestPointLocator<P>,
    splitter: WaySplitter<T>,
    /// Simple groups: the configured chain rule.
    tagger:   BridgeTagger,
    /// Multi-way groups: always the endpoint rule.
    anchored: BridgeTagger,
}

impl EditSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_parts(config, NearestPointLocator::new(), WaySplitter::new())
    }
}

impl<P: Projector, T: WayTopology> EditSession<P, T> {
    pub fn with_parts(
        config:   SessionConfig,
        locator:  NearestPointLocator<P>,
        splitter: WaySplitter<T>,
    ) -> Self {
        let tagger = BridgeTagger::new(ChainMatcher::new(config.chain_rule), config.tags.clone());
        let anchored = BridgeTagger::new(ChainMatcher::new(ChainRule::Endpoints), config.tags.clone());
        Self { config, locator, splitter, tagger, anchored }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Process `groups` in order.
    ///
    /// Never fails: every error is recovered at the point or group level,
    /// reported to `observer`, and recorded in the returned report.
    pub fn run<D, J, O>(
        &self,
        dataset:  &mut D,
        journal:  &mut J,
        groups:   &[CoordinateGroup],
        observer: &mut O,
    ) -> SessionReport
    where
        D: Dataset,
        J: Journal,
        O: SessionObserver,
    {
        let mut lineage = Lineage::default();
        let mut report = SessionReport::default();

        for (index, group) in groups.iter().enumerate() {
            observer.on_group_start(index, group);
            let mut ctx = GroupRun {
                index,
                report: GroupReport::new(index, group.kind),
                lineage: &mut lineage,
                observer: &mut *observer,
            };
            match group.kind {
                GroupKind::Simple   => self.run_simple(dataset, journal, group, &mut ctx),
                GroupKind::MultiWay => self.run_multi_way(dataset, journal, group, &mut ctx),
            }
            let mut group_report = ctx.report;
            group_report.finish();
            log::debug!("group {index}: {}", group_report.state);
            observer.on_group_end(index, &group_report);
            report.groups.push(group_report);
        }

        observer.on_session_end(&report);
        report
    }

    // ── Simple groups ─────────────────────────────────────────────────────────

    fn run_simple<D, J, O>(
        &self,
        dataset: &mut D,
        journal: &mut J,
        group:   &CoordinateGroup,
        ctx:     &mut GroupRun<'_, O>,
    ) where
        D: Dataset,
        J: Journal,
        O: SessionObserver,
    {
        let last = group.points.len().saturating_sub(1);
        let mut start = None;
        let mut end = None;

        for (i, point) in group.points.iter().enumerate() {
            let Some(outcome) = self.process_point(dataset, journal, i, point, ctx) else {
                continue;
            };
            if i == 0 {
                start = Some(outcome.node.id);
            }
            if i == last {
                end = Some(outcome.node.id);
            }
        }

        ctx.report.set_state(GroupState::Tagging);
        let result = self.tag_simple(dataset, journal, group, ctx.lineage, start, end);
        ctx.tagged(result);
    }

    fn tag_simple<D, J>(
        &self,
        dataset: &mut D,
        journal: &mut J,
        group:   &CoordinateGroup,
        lineage: &Lineage,
        start:   Option<NodeId>,
        end:     Option<NodeId>,
    ) -> EditResult<WayId>
    where
        D: Dataset,
        J: Journal,
    {
        let start = start.ok_or(EditError::MissingEndpoint("start"))?;
        let end = end.ok_or(EditError::MissingEndpoint("end"))?;

        let mut candidates: Vec<WayId> = dataset.selected_ways().iter().map(|w| w.id).collect();
        for point in &group.points {
            for piece in lineage.pieces(point.way_id) {
                if !candidates.contains(&piece) {
                    candidates.push(piece);
                }
            }
        }
        self.tagger.tag_bridge(dataset, journal, &candidates, start, end)
    }

    // ── Multi-way groups ──────────────────────────────────────────────────────

    fn run_multi_way<D, J, O>(
        &self,
        dataset: &mut D,
        journal: &mut J,
        group:   &CoordinateGroup,
        ctx:     &mut GroupRun<'_, O>,
    ) where
        D: Dataset,
        J: Journal,
        O: SessionObserver,
    {
        // Discovery runs before any split so both end ways still start at
        // their loaded first nodes.
        let explicit = match self.explicit_ways(dataset, group) {
            Ok(ways) => ways,
            Err(e) => {
                ctx.tagged(Err(e));
                Vec::new()
            }
        };

        let n = group.points.len();
        for i in 0..n.saturating_sub(1) {
            if let Some(outcome) = self.process_point(dataset, journal, i, &group.points[i], ctx) {
                let result = outcome
                    .after
                    .last_node()
                    .ok_or(EditError::MissingEndpoint("anchor"))
                    .and_then(|anchor| {
                        let (start, end) = if i == 0 {
                            (outcome.node.id, anchor)
                        } else {
                            (anchor, outcome.node.id)
                        };
                        self.tag_halves(dataset, journal, &outcome, start, end)
                    });
                ctx.tagged(result);
            }

            if i + 2 == n {
                let next = &group.points[i + 1];
                if let Some(outcome) = self.process_point(dataset, journal, i + 1, next, ctx) {
                    let result = outcome
                        .before
                        .first_node()
                        .ok_or(EditError::MissingEndpoint("anchor"))
                        .and_then(|anchor| {
                            self.tag_halves(dataset, journal, &outcome, anchor, outcome.node.id)
                        });
                    ctx.tagged(result);
                }
            }
        }

        ctx.report.set_state(GroupState::Tagging);
        let outcome = self.anchored.tag_explicit(dataset, journal, &explicit);
        for way in outcome.tagged {
            ctx.tagged(Ok(way));
        }
        for way in outcome.missing {
            ctx.tagged(Err(EditError::MissingAdditionalWay(way)));
        }
    }

    fn tag_halves<D, J>(
        &self,
        dataset: &mut D,
        journal: &mut J,
        outcome: &SplitOutcome,
        start:   NodeId,
        end:     NodeId,
    ) -> EditResult<WayId>
    where
        D: Dataset,
        J: Journal,
    {
        let candidates = [outcome.before.id, outcome.after.id];
        self.anchored.tag_bridge(dataset, journal, &candidates, start, end)
    }

    /// The group's explicit bridge ways, or the discovered interior ways when
    /// none are listed and discovery is on.
    fn explicit_ways<D: Dataset>(&self, dataset: &D, group: &CoordinateGroup) -> EditResult<Vec<WayId>> {
        if !group.additional_bridge_way_ids.is_empty() || !self.config.discover_interior_ways {
            return Ok(group.additional_bridge_way_ids.clone());
        }
        let (Some(first), Some(last)) = (group.points.first(), group.points.last()) else {
            return Ok(Vec::new());
        };
        if first.way_id == last.way_id {
            return Ok(Vec::new());
        }

        let graph = WayGraph::build(dataset);
        let interior = graph.interior_ways(dataset, first.way_id, last.way_id)?;
        log::debug!(
            "discovered {} interior ways between {} and {}: {interior:?}",
            interior.len(),
            first.way_id,
            last.way_id
        );
        Ok(interior)
    }

    // ── Points ────────────────────────────────────────────────────────────────

    /// Locate and split one point, reporting the outcome.
    fn process_point<D, J, O>(
        &self,
        dataset: &mut D,
        journal: &mut J,
        index:   usize,
        point:   &GroupPoint,
        ctx:     &mut GroupRun<'_, O>,
    ) -> Option<SplitOutcome>
    where
        D: Dataset,
        J: Journal,
        O: SessionObserver,
    {
        ctx.report.set_state(GroupState::Splitting(index));

        let result = self
            .locate_on_pieces(dataset, ctx.lineage, point.way_id, point.coordinate())
            .and_then(|(piece, located)| {
                let outcome = self.splitter.split_at(dataset, journal, piece, &located)?;
                Ok((piece, located, outcome))
            });

        match result {
            Ok((piece, located, outcome)) => {
                ctx.lineage.record(piece, outcome.after.id);
                ctx.observer.on_point_split(ctx.index, index, piece, &outcome);
                ctx.report.points.push(PointReport {
                    index,
                    requested: point.way_id,
                    outcome:   PointOutcome::Split {
                        way:        piece,
                        node:       outcome.node.id,
                        after:      outcome.after.id,
                        distance_m: located.distance_m,
                    },
                });
                Some(outcome)
            }
            Err(e) => {
                ctx.observer.on_point_failed(ctx.index, index, point, &e);
                ctx.report.points.push(PointReport {
                    index,
                    requested: point.way_id,
                    outcome:   PointOutcome::Failed(Failure::from(&e)),
                });
                None
            }
        }
    }

    /// Nearest point over every live piece of `way`.
    fn locate_on_pieces<D: Dataset>(
        &self,
        dataset: &D,
        lineage: &Lineage,
        way:     WayId,
        query:   Coordinate,
    ) -> EditResult<(WayId, SplitResult)> {
        let mut best: Option<(WayId, SplitResult)> = None;
        let mut first_error = None;

        for piece in lineage.pieces(way) {
            match self.locator.locate_way(dataset, piece, query) {
                Ok(found) => {
                    if best.is_none_or(|(_, b)| found.distance_m < b.distance_m) {
                        best = Some((piece, found));
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match (best, first_error) {
            (Some(found), _) => Ok(found),
            (None, Some(e)) => Err(e),
            (None, None) => Err(EditError::WayNotFound(way)),
        }
    }
}

/// Per-group mutable state threaded through the helpers.
struct GroupRun<'a, O: SessionObserver> {
    index:    usize,
    report:   GroupReport,
    lineage:  &'a mut Lineage,
    observer: &'a mut O,
}

impl<O: SessionObserver> GroupRun<'_, O> {
    /// Record a tagging outcome.
    fn tagged(&mut self, result: EditResult<WayId>) {
        match result {
            Ok(way) => {
                self.observer.on_bridge_tagged(self.index, way);
                self.report.add_bridge(way);
            }
            Err(e) => {
                self.observer.on_tagging_failed(self.index, &e);
                self.report.errors.push(Failure::from(&e));
            }
        }
    }
}
