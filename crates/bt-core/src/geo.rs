//! Geographic and planar coordinate types.
//!
//! `Coordinate` is the persisted WGS-84 position of a node.  `PlanarPoint` is
//! a projected working value used only for segment math; it never leaves the
//! locate step.  Both use `f64`: split points are written back into the
//! dataset, so single precision (~1 m) would visibly shift new nodes.

use std::fmt;

use crate::{CoreError, CoreResult};

/// Mean Earth radius in metres, used for every great-circle computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ── Coordinate ────────────────────────────────────────────────────────────────

/// A WGS-84 geographic coordinate in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Distances at or below this many metres count as the same position.
    pub const EPSILON_M: f64 = 1e-6;

    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Like [`new`](Self::new) but rejects positions [`is_valid`](Self::is_valid)
    /// refuses.
    pub fn checked(lat: f64, lon: f64) -> CoreResult<Self> {
        let c = Self::new(lat, lon);
        if c.is_valid() {
            Ok(c)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lon })
        }
    }

    /// `true` if both components are finite and inside the WGS-84 ranges.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Non-negative and symmetric; zero for identical inputs.
    pub fn distance_m(self, other: Coordinate) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// `true` if `other` lies within [`Self::EPSILON_M`] of `self`.
    #[inline]
    pub fn same_position(self, other: Coordinate) -> bool {
        self.distance_m(other) <= Self::EPSILON_M
    }

    /// The point `distance_m` metres from `self` along the great circle
    /// towards `target`.
    ///
    /// Distances beyond the target extrapolate along the same great circle.
    /// Returns `self` when the two inputs coincide.
    pub fn interpolate_toward(self, target: Coordinate, distance_m: f64) -> Coordinate {
        let total = self.distance_m(target);
        if total <= Self::EPSILON_M {
            return self;
        }
        let fraction = distance_m / total;
        let d = total / EARTH_RADIUS_M;

        let (lat1, lon1) = (self.lat.to_radians(), self.lon.to_radians());
        let (lat2, lon2) = (target.lat.to_radians(), target.lon.to_radians());

        let a = ((1.0 - fraction) * d).sin() / d.sin();
        let b = (fraction * d).sin() / d.sin();

        let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
        let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
        let z = a * lat1.sin() + b * lat2.sin();

        let lat = z.atan2((x * x + y * y).sqrt());
        let lon = y.atan2(x);
        Coordinate::new(lat.to_degrees(), lon.to_degrees())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat, self.lon)
    }
}

// ── PlanarPoint ───────────────────────────────────────────────────────────────

/// A projected `(x, y)` position in metres.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Closest point to `self` on the segment `a`–`b`, clamped to the
    /// segment's end points.
    ///
    /// A zero-length segment yields `a`.
    pub fn closest_on_segment(self, a: PlanarPoint, b: PlanarPoint) -> PlanarPoint {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return a;
        }
        let t = ((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq;
        let t = t.clamp(0.0, 1.0);
        PlanarPoint::new(a.x + t * dx, a.y + t * dy)
    }

    /// Euclidean distance in projected units.
    #[inline]
    pub fn distance(self, other: PlanarPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
