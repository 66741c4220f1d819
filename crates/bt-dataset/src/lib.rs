//! `bt-dataset`: the node/way store the edit core works against.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`model`]    | `Node`, `Way`, `Tags`                                        |
//! | [`dataset`]  | `Dataset` trait, `MemoryDataset`                             |
//! | [`journal`]  | `Mutation`, `Journal` trait, `CommandJournal` (with undo)    |
//! | [`topology`] | `WayTopology` trait, `SplitAtNode`, `split_way_at_selected_node` |
//! | [`graph`]    | `WayGraph` way-path search                                   |
//! | [`scene`]    | JSON scene load/save (feature = `"scene"` only)              |
//! | [`error`]    | `DatasetError`, `DatasetResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `scene` | Enables JSON scene files via `serde_json`.                   |

pub mod dataset;
pub mod error;
pub mod graph;
pub mod journal;
pub mod model;
pub mod topology;

#[cfg(feature = "scene")]
pub mod scene;


pub use dataset::{Dataset, MemoryDataset};
pub use error::{DatasetError, DatasetResult};
pub use graph::WayGraph;
pub use journal::{CommandJournal, Journal, Mutation};
pub use model::{Node, Tags, Way};
pub use topology::{SplitAtNode, WayTopology, split_way_at_selected_node};

#[cfg(feature = "scene")]
pub use scene::{load_scene, load_scene_reader, save_scene, write_scene};
