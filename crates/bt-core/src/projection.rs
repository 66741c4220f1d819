//! Planar projection used for segment math.
//!
//! The locate step projects every segment and the query point into a locally
//! flat plane, solves the closest-point problem there, and projects the answer
//! back.  Distances used for ranking are always measured on the sphere via
//! [`Projector::distance`], never in the plane.

use crate::geo::{Coordinate, PlanarPoint};

/// Converts between geographic and planar coordinates.
///
/// Implementations must be deterministic and invertible:
/// `to_geographic(to_planar(c)) ≈ c` for every valid `c`.
pub trait Projector {
    fn to_planar(&self, coordinate: Coordinate) -> PlanarPoint;

    fn to_geographic(&self, point: PlanarPoint) -> Coordinate;

    /// Great-circle distance in metres.  Defaults to haversine.
    fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        a.distance_m(b)
    }
}

// ── WebMercator ───────────────────────────────────────────────────────────────

/// Spherical (web) Mercator, EPSG:3857.
///
/// Conformal: perpendicular foot points computed in the plane stay
/// perpendicular on the sphere at street scale.
#[derive(Copy, Clone, Debug, Default)]
pub struct WebMercator;

impl WebMercator {
    /// WGS-84 semi-major axis in metres.
    pub const RADIUS_M: f64 = 6_378_137.0;

    /// Latitudes are clamped to the square-map limit before projecting.
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
}

impl Projector for WebMercator {
    fn to_planar(&self, coordinate: Coordinate) -> PlanarPoint {
        let lat = coordinate.lat.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
        let x = Self::RADIUS_M * coordinate.lon.to_radians();
        let y = Self::RADIUS_M
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        PlanarPoint::new(x, y)
    }

    fn to_geographic(&self, point: PlanarPoint) -> Coordinate {
        let lon = (point.x / Self::RADIUS_M).to_degrees();
        let lat = (2.0 * (point.y / Self::RADIUS_M).exp().atan()
            - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        Coordinate::new(lat, lon)
    }
}
