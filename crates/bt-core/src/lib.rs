//! `bt-core`: foundational types for the `bridge_tagger` way editor.
//!
//! This crate is a dependency of every other `bt-*` crate.  It has no `bt-*`
//! dependencies and only `thiserror` (plus optional `serde`) from outside.
//!
//! # What lives here
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`ids`]        | `NodeId`, `WayId`                                      |
//! | [`geo`]        | `Coordinate`, `PlanarPoint`, great-circle helpers      |
//! | [`projection`] | `Projector` trait, `WebMercator`                       |
//! | [`error`]      | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids and `Coordinate`.    |

pub mod error;
pub mod geo;
pub mod ids;
pub mod projection;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{Coordinate, PlanarPoint};
pub use ids::{NodeId, WayId};
pub use projection::{Projector, WebMercator};
