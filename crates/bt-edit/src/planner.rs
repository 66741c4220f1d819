//! Split-point planning from bridge sites.
//!
//! A bridge site is a way, the bridge's centre coordinate, and its length.
//! The planner snaps the centre onto the way and walks half the length along
//! the polyline in each direction.  A walk that runs off the way's end
//! continues onto the way joined at that end node, if any, and reports that
//! way for its split point.  The two end points become a [`CoordinateGroup`]
//! ready for an [`EditSession`](crate::EditSession): simple when both land on
//! the site's way, multi-way otherwise.
//!
//! # CSV format
//!
//! ```csv
//! way_id,bridge_length,latitude,longitude
//! 108707726,20.0,36.9879919,-85.9069943
//! ```
//!
//! `bridge_length` is in metres.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use bt_core::{Coordinate, NodeId, Projector, WayId, WebMercator};
use bt_dataset::{Dataset, Way};

use crate::group::{CoordinateGroup, GroupPoint};
use crate::locator::{NearestPointLocator, SplitResult};
use crate::{EditError, EditResult};

// ── Bridge sites ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeSite {
    pub way_id:   WayId,
    pub length_m: f64,
    pub center:   Coordinate,
}

#[derive(Deserialize)]
struct SiteRecord {
    way_id:        i64,
    bridge_length: f64,
    latitude:      f64,
    longitude:     f64,
}

/// Load bridge sites from a CSV file.
pub fn load_sites_csv(path: &Path) -> EditResult<Vec<BridgeSite>> {
    let file = File::open(path)?;
    load_sites_reader(file)
}

/// Like [`load_sites_csv`] but accepts any `Read` source.
///
/// # Errors
///
/// [`EditError::Config`] for a negative or non-finite length or an
/// out-of-range coordinate, naming the 1-based data row.
pub fn load_sites_reader<R: Read>(reader: R) -> EditResult<Vec<BridgeSite>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut sites = Vec::new();

    for (row, result) in csv_reader.deserialize::<SiteRecord>().enumerate() {
        let rec = result?;
        let center = Coordinate::checked(rec.latitude, rec.longitude)
            .map_err(|e| EditError::Config(format!("site row {}: {e}", row + 1)))?;
        if !rec.bridge_length.is_finite() || rec.bridge_length < 0.0 {
            return Err(EditError::Config(format!(
                "site row {}: invalid bridge length {}",
                row + 1,
                rec.bridge_length
            )));
        }
        sites.push(BridgeSite {
            way_id:   WayId(rec.way_id),
            length_m: rec.bridge_length,
            center,
        });
    }
    Ok(sites)
}

// ── Planning ──────────────────────────────────────────────────────────────────

/// Split points planned for one site.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSplit {
    pub site:             BridgeSite,
    /// The centre snapped onto the way.
    pub snapped:          SplitResult,
    pub backward:         Coordinate,
    /// The way `backward` lies on.
    pub backward_way:     WayId,
    pub forward:          Coordinate,
    pub forward_way:      WayId,
    /// The backward walk ran out of ways and stopped at the last end node.
    pub backward_clamped: bool,
    /// The forward walk ran out of ways and stopped at the last end node.
    pub forward_clamped:  bool,
}

impl PlannedSplit {
    pub fn is_clamped(&self) -> bool {
        self.backward_clamped || self.forward_clamped
    }

    pub fn is_multi_way(&self) -> bool {
        self.backward_way != self.forward_way
    }

    /// A group splitting at the backward point, then the forward point.
    ///
    /// Multi-way when the ends lie on different ways; the site's way is then
    /// listed as an additional bridge way if neither end lies on it.
    pub fn to_group(&self) -> CoordinateGroup {
        let points = vec![
            GroupPoint::new(self.backward.lat, self.backward.lon, self.backward_way),
            GroupPoint::new(self.forward.lat, self.forward.lon, self.forward_way),
        ];
        if !self.is_multi_way() {
            return CoordinateGroup::simple(points);
        }
        let site = self.site.way_id;
        let interior = if self.backward_way != site && self.forward_way != site {
            vec![site]
        } else {
            Vec::new()
        };
        CoordinateGroup::multi_way(points, interior)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SplitPlanner<P: Projector = WebMercator> {
    locator: NearestPointLocator<P>,
}

impl SplitPlanner {
    pub fn new() -> Self {
        Self { locator: NearestPointLocator::new() }
    }
}

impl<P: Projector> SplitPlanner<P> {
    pub fn with_locator(locator: NearestPointLocator<P>) -> Self {
        Self { locator }
    }

    /// Plan the split points of a bridge `length_m` long centred near
    /// `center` on `way`.
    ///
    /// # Errors
    ///
    /// Same as [`NearestPointLocator::locate_way`].
    pub fn plan<D: Dataset>(
        &self,
        dataset:  &D,
        way:      WayId,
        center:   Coordinate,
        length_m: f64,
    ) -> EditResult<PlannedSplit> {
        let snapped = self.locator.locate_way(dataset, way, center)?;
        let w = dataset.way(way).ok_or(EditError::WayNotFound(way))?;
        let polyline = dataset.way_coordinates(w)?;
        let half = length_m / 2.0;

        let (Some(first), Some(last)) = (w.first_node(), w.last_node()) else {
            return Err(EditError::DegenerateWay(way));
        };

        let seg = snapped.segment_index;
        let (backward, backward_way, backward_clamped) = continue_past(
            dataset,
            way,
            first,
            walk(snapped.closest, (0..=seg).rev().map(|i| polyline[i]), half),
        )?;
        let (forward, forward_way, forward_clamped) = continue_past(
            dataset,
            way,
            last,
            walk(snapped.closest, polyline[seg + 1..].iter().copied(), half),
        )?;

        if backward_clamped || forward_clamped {
            log::warn!(
                "bridge of {length_m} m at {center} runs past the end of the ways around {way}; clamped to an endpoint"
            );
        }
        if backward_way != forward_way {
            log::debug!("bridge at {center} spans {backward_way} to {forward_way}");
        }
        Ok(PlannedSplit {
            site: BridgeSite { way_id: way, length_m, center },
            snapped,
            backward,
            backward_way,
            forward,
            forward_way,
            backward_clamped,
            forward_clamped,
        })
    }

    /// [`plan`](Self::plan) every site, in order.  Failures are logged and
    /// returned in place.
    pub fn plan_sites<D: Dataset>(&self, dataset: &D, sites: &[BridgeSite]) -> Vec<EditResult<PlannedSplit>> {
        sites
            .iter()
            .map(|site| {
                let planned = self.plan(dataset, site.way_id, site.center, site.length_m);
                if let Err(e) = &planned {
                    log::warn!("site on {} at {}: [{}] {e}", site.way_id, site.center, e.kind());
                }
                planned
            })
            .collect()
    }
}

/// Walk `distance_m` from `from` through `vertices`, interpolating inside
/// the segment where the distance runs out.  Returns the point reached and
/// the distance still left, which is zero unless the vertices run out first.
fn walk<I>(from: Coordinate, vertices: I, distance_m: f64) -> (Coordinate, f64)
where
    I: IntoIterator<Item = Coordinate>,
{
    let mut current = from;
    let mut remaining = distance_m;
    for vertex in vertices {
        let step = current.distance_m(vertex);
        if step >= remaining {
            return (current.interpolate_toward(vertex, remaining), 0.0);
        }
        remaining -= step;
        current = vertex;
    }
    (current, remaining)
}

/// Finish a walk that left `way` at its end node `end` with distance to
/// spare by walking on along the way joined there, oriented away from `end`.
///
/// Returns the point reached, the way it lies on, and whether the walk was
/// clamped because no joined way exists or that one ran out too.
fn continue_past<D: Dataset>(
    dataset: &D,
    way:     WayId,
    end:     NodeId,
    (reached, remaining): (Coordinate, f64),
) -> EditResult<(Coordinate, WayId, bool)> {
    if remaining <= Coordinate::EPSILON_M {
        return Ok((reached, way, false));
    }
    let Some(next) = joined_way(dataset, way, end) else {
        return Ok((reached, way, true));
    };

    let mut coords = dataset.way_coordinates(next)?;
    if next.first_node() != Some(end) {
        coords.reverse();
    }
    let (point, left) = walk(reached, coords.into_iter().skip(1), remaining);
    Ok((point, next.id, left > Coordinate::EPSILON_M))
}

/// The first way other than `way` that starts or ends at `end`.
fn joined_way<D: Dataset>(dataset: &D, way: WayId, end: NodeId) -> Option<&Way> {
    dataset
        .ways_containing(end)
        .into_iter()
        .filter(|&id| id != way)
        .filter_map(|id| dataset.way(id))
        .find(|w| w.first_node() == Some(end) || w.last_node() == Some(end))
}
