//! `bt-edit`: locate, split, and bridge-tag ways, one coordinate group at a
//! time.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                          |
//! |--------------|-------------------------------------------------------------------|
//! | [`locator`]  | `NearestPointLocator`, `SplitResult`                              |
//! | [`splitter`] | `WaySplitter`, `SplitOutcome`                                     |
//! | [`chain`]    | `ChainMatcher`, `ChainRule`                                       |
//! | [`tagger`]   | `BridgeTagger`, `ExplicitOutcome`, `bridge_tags`                  |
//! | [`group`]    | `CoordinateGroup`, `GroupPoint`, `SessionConfig`, batch loaders   |
//! | [`session`]  | `EditSession`, `GroupState`, `SessionReport`                      |
//! | [`observer`] | `SessionObserver` trait, `NoopObserver`, `LogObserver`            |
//! | [`report`]   | `CsvReport` outcome writer                                        |
//! | [`planner`]  | `SplitPlanner`, bridge-site CSV loader                            |
//! | [`error`]    | `EditError`, `EditResult<T>`                                      |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use bt_dataset::{CommandJournal, MemoryDataset};
//! use bt_edit::{EditSession, LogObserver, load_batch};
//!
//! let batch = load_batch(Path::new("groups.json"))?;
//! let mut journal = CommandJournal::new();
//! let session = EditSession::new(batch.session);
//! let report = session.run(&mut dataset, &mut journal, &batch.groups, &mut LogObserver);
//! println!("{} bridges tagged, {} mutations", report.bridges().count(), journal.len());
//! ```

pub mod chain;
pub mod error;
pub mod group;
pub mod locator;
pub mod observer;
pub mod planner;
pub mod report;
pub mod session;
pub mod splitter;
pub mod tagger;

#[cfg(test)]
mod tests;

pub use chain::{ChainMatcher, ChainRule};
pub use error::{EditError, EditResult};
pub use group::{
    BatchConfig, CoordinateGroup, GroupKind, GroupPoint, SessionConfig, load_batch, load_batch_reader,
};
pub use locator::{NearestPointLocator, SplitResult};
pub use observer::{LogObserver, NoopObserver, SessionObserver};
pub use planner::{BridgeSite, PlannedSplit, SplitPlanner, load_sites_csv, load_sites_reader};
pub use report::CsvReport;
pub use session::{
    EditSession, Failure, GroupReport, GroupState, PointOutcome, PointReport, SessionReport,
};
pub use splitter::{SplitOutcome, WaySplitter};
pub use tagger::{BRIDGE_KEY, BRIDGE_VALUE, BridgeTagger, ExplicitOutcome, bridge_tags};
