//! Nearest point on a polyline.
//!
//! For each segment the endpoints and the query are projected to the plane,
//! the clamped foot point is computed there, and the foot point is projected
//! back.  Candidates are ranked by great-circle distance to the query.  Ties
//! keep the earliest segment: the comparison is strict less-than.

use bt_core::{Coordinate, Projector, WayId, WebMercator};
use bt_dataset::Dataset;

use crate::{EditError, EditResult};

/// The winning segment for a query coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitResult {
    /// Segment `i` joins `way.nodes[i]` and `way.nodes[i + 1]`.
    pub segment_index: usize,
    /// Closest point on that segment.
    pub closest: Coordinate,
    /// Great-circle distance from the query to `closest`, in metres.
    pub distance_m: f64,
}

impl SplitResult {
    /// Position a new node takes in the way's node list.
    #[inline]
    pub fn insert_index(&self) -> usize {
        self.segment_index + 1
    }
}

/// Finds the closest point lying on a way.
#[derive(Debug, Clone, Default)]
pub struct NearestPointLocator<P: Projector = WebMercator> {
    projector: P,
}

impl NearestPointLocator {
    pub fn new() -> Self {
        Self { projector: WebMercator }
    }
}

impl<P: Projector> NearestPointLocator<P> {
    pub fn with_projector(projector: P) -> Self {
        Self { projector }
    }

    pub fn projector(&self) -> &P {
        &self.projector
    }

    /// Closest point on `polyline` to `query`.
    ///
    /// Returns `None` for fewer than two points, or when no distance compares
    /// less than infinity (non-finite input).
    pub fn locate(&self, polyline: &[Coordinate], query: Coordinate) -> Option<SplitResult> {
        let q = self.projector.to_planar(query);
        let mut best: Option<SplitResult> = None;
        let mut best_distance = f64::INFINITY;

        for (i, pair) in polyline.windows(2).enumerate() {
            let a = self.projector.to_planar(pair[0]);
            let b = self.projector.to_planar(pair[1]);
            let foot = self.projector.to_geographic(q.closest_on_segment(a, b));
            let distance = self.projector.distance(query, foot);

            if distance < best_distance {
                best_distance = distance;
                best = Some(SplitResult {
                    segment_index: i,
                    closest:       foot,
                    distance_m:    distance,
                });
            }
        }
        best
    }

    /// [`locate`](Self::locate) against a way in `dataset`.
    ///
    /// # Errors
    ///
    /// - [`EditError::WayNotFound`] if `way` is missing.
    /// - [`EditError::DegenerateWay`] if it has fewer than two nodes.
    /// - [`EditError::NoClosestSegment`] if no segment produced a finite distance.
    pub fn locate_way<D: Dataset>(
        &self,
        dataset: &D,
        way:     WayId,
        query:   Coordinate,
    ) -> EditResult<SplitResult> {
        let w = dataset.way(way).ok_or(EditError::WayNotFound(way))?;
        if w.is_degenerate() {
            return Err(EditError::DegenerateWay(way));
        }
        let polyline = dataset.way_coordinates(w)?;
        self.locate(&polyline, query)
            .ok_or(EditError::NoClosestSegment { way, coord: query })
    }
}
