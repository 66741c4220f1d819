//! `CsvReport<W>`: writes session outcomes as CSV rows.
//!
//! One row per split point, per point failure, per tagged bridge way, and per
//! tagging failure:
//!
//! ```text
//! group,event,way_id,node_id,latitude,longitude,detail
//! 0,split,108707726,-1,36.9906307,-85.9022517,new way -1
//! 0,bridge,-1,,,,
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use bt_core::WayId;

use crate::group::GroupPoint;
use crate::observer::SessionObserver;
use crate::session::SessionReport;
use crate::splitter::SplitOutcome;
use crate::{EditError, EditResult};

const HEADER: [&str; 7] = ["group", "event", "way_id", "node_id", "latitude", "longitude", "detail"];

/// A [`SessionObserver`] that writes an outcome row for every event.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After `session.run()` returns, check for errors
/// with [`take_error`][Self::take_error].
pub struct CsvReport<W: Write> {
    writer:     Writer<W>,
    rows:       usize,
    last_error: Option<EditError>,
}

impl CsvReport<File> {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: &Path) -> EditResult<Self> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> CsvReport<W> {
    /// Wrap any `Write` sink and write the header row.
    pub fn from_writer(sink: W) -> EditResult<Self> {
        let mut writer = Writer::from_writer(sink);
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0, last_error: None })
    }

    /// Data rows written so far (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Take the stored write error (if any) after `session.run()` returns.
    pub fn take_error(&mut self) -> Option<EditError> {
        self.last_error.take()
    }

    /// Flush and unwrap the inner sink.
    pub fn into_inner(self) -> EditResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| EditError::Io(e.into_error()))
    }

    fn row(
        &mut self,
        group:  usize,
        event:  &str,
        way:    Option<WayId>,
        node:   Option<i64>,
        coord:  Option<(f64, f64)>,
        detail: &str,
    ) {
        let (lat, lon) = match coord {
            Some((lat, lon)) => (format!("{lat:.7}"), format!("{lon:.7}")),
            None => (String::new(), String::new()),
        };
        let record = [
            group.to_string(),
            event.to_owned(),
            way.map(|w| w.0.to_string()).unwrap_or_default(),
            node.map(|n| n.to_string()).unwrap_or_default(),
            lat,
            lon,
            detail.to_owned(),
        ];
        match self.writer.write_record(&record) {
            Ok(()) => self.rows += 1,
            Err(e) => self.store_err(e.into()),
        }
    }

    fn store_err(&mut self, e: EditError) {
        // Keep only the first error.
        if self.last_error.is_none() {
            self.last_error = Some(e);
        }
    }
}

impl<W: Write> SessionObserver for CsvReport<W> {
    fn on_point_split(&mut self, group: usize, _point: usize, way: WayId, outcome: &SplitOutcome) {
        let detail = format!("new way {}", outcome.after.id.0);
        self.row(
            group,
            "split",
            Some(way),
            Some(outcome.node.id.0),
            Some((outcome.node.coord.lat, outcome.node.coord.lon)),
            &detail,
        );
    }

    fn on_point_failed(&mut self, group: usize, _point: usize, spec: &GroupPoint, error: &EditError) {
        let detail = format!("{}: {error}", error.kind());
        self.row(
            group,
            "point_failed",
            Some(spec.way_id),
            None,
            Some((spec.latitude, spec.longitude)),
            &detail,
        );
    }

    fn on_bridge_tagged(&mut self, group: usize, way: WayId) {
        self.row(group, "bridge", Some(way), None, None, "");
    }

    fn on_tagging_failed(&mut self, group: usize, error: &EditError) {
        let detail = format!("{}: {error}", error.kind());
        self.row(group, "tagging_failed", None, None, None, &detail);
    }

    fn on_session_end(&mut self, _report: &SessionReport) {
        if let Err(e) = self.writer.flush() {
            self.store_err(e.into());
        }
    }
}
