//! Session observer trait for progress reporting and outcome collection.

use bt_core::WayId;

use crate::group::{CoordinateGroup, GroupPoint};
use crate::session::{GroupReport, SessionReport};
use crate::splitter::SplitOutcome;
use crate::EditError;

/// Callbacks invoked by [`EditSession::run`][crate::EditSession::run] as it
/// works through each group.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Indices are zero-based.
///
/// # Example: failure counter
///
/// ```rust,ignore
/// struct Failures(usize);
///
/// impl SessionObserver for Failures {
///     fn on_point_failed(&mut self, _g: usize, _p: usize, _pt: &GroupPoint, _e: &EditError) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SessionObserver {
    /// Called before the first point of a group is processed.
    fn on_group_start(&mut self, _group: usize, _spec: &CoordinateGroup) {}

    /// Called after a point's node was inserted and its way split.
    ///
    /// `way` is the piece that was actually split; it differs from the
    /// point's configured way id when an earlier point already split it.
    fn on_point_split(
        &mut self,
        _group:   usize,
        _point:   usize,
        _way:     WayId,
        _outcome: &SplitOutcome,
    ) {}

    /// Called when a point could not be located or split.  The session moves
    /// on to the next point.
    fn on_point_failed(
        &mut self,
        _group: usize,
        _point: usize,
        _spec:  &GroupPoint,
        _error: &EditError,
    ) {}

    /// Called once per way that received the bridge tags.
    fn on_bridge_tagged(&mut self, _group: usize, _way: WayId) {}

    /// Called when a bridge search or explicit tag failed.
    fn on_tagging_failed(&mut self, _group: usize, _error: &EditError) {}

    /// Called after a group reached `Done` or `Failed`.
    fn on_group_end(&mut self, _group: usize, _report: &GroupReport) {}

    /// Called once after the last group.
    fn on_session_end(&mut self, _report: &SessionReport) {}
}

/// A [`SessionObserver`] that does nothing.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Writes the progress log through the `log` facade: one `info` line per
/// split point and per tagged bridge, one `warn` line per failure tagged with
/// the error kind.
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_group_start(&mut self, group: usize, spec: &CoordinateGroup) {
        log::info!(
            "group {group}: {:?} bridge, {} points",
            spec.kind,
            spec.points.len()
        );
    }

    fn on_point_split(&mut self, group: usize, point: usize, way: WayId, outcome: &SplitOutcome) {
        log::info!(
            "group {group} point {point}: node {} added at {} on {way} ({} + {})",
            outcome.node.id,
            outcome.node.coord,
            outcome.before.id,
            outcome.after.id
        );
    }

    fn on_point_failed(&mut self, group: usize, point: usize, spec: &GroupPoint, error: &EditError) {
        log::warn!(
            "group {group} point {point} ({} on {}): [{}] {error}",
            spec.coordinate(),
            spec.way_id,
            error.kind()
        );
    }

    fn on_bridge_tagged(&mut self, group: usize, way: WayId) {
        log::info!("group {group}: bridge way {way} tagged");
    }

    fn on_tagging_failed(&mut self, group: usize, error: &EditError) {
        log::warn!("group {group}: [{}] {error}", error.kind());
    }

    fn on_session_end(&mut self, report: &SessionReport) {
        log::info!(
            "session finished: {} groups done, {} failed, {} bridge ways tagged",
            report.done_count(),
            report.failed_count(),
            report.bridges().count()
        );
    }
}
