//! geo.rs — Position and leg-line geometry
//!
//! Great-circle distance and initial bearing between GPS fixes, plus the two
//! leg-line queries the tacking strategy needs (side of line, distance to
//! line). Line queries project into a local tangent plane centred on the
//! line's first point, which is accurate at mark-to-mark scale.
//!
//! Non-finite inputs are not trapped; NaN flows through the arithmetic.

use serde::{Deserialize, Serialize};
use sail_types::Gps;

/// Mean Earth radius, meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Wrap an angle to (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a > 180.0 { a - 360.0 } else { a }
}

/// Wrap an angle to [0, 360).
pub fn wrap_360(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Distance (m) and initial bearing (degrees, [0, 360)) between two positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Course {
    pub distance: f64,
    pub heading: f64,
}

/// Which side of a leg line a point lies on, looking along the leg
/// (previous waypoint → current waypoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSide {
    /// Left of the leg. Signed value -1.
    Port,
    /// Right of the leg, or exactly on it. Signed value +1.
    Starboard,
}

impl LineSide {
    pub fn sign(self) -> f64 {
        match self {
            LineSide::Port => -1.0,
            LineSide::Starboard => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            LineSide::Port => LineSide::Starboard,
            LineSide::Starboard => LineSide::Port,
        }
    }
}

/// A GPS position (degrees). Immutable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Gps> for Position {
    fn from(gps: Gps) -> Self {
        Position::new(gps.latitude, gps.longitude)
    }
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance and initial great-circle bearing to `other`.
    pub fn distance_heading_to(&self, other: &Position) -> Course {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let distance = 2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt());

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        let heading = wrap_360(y.atan2(x).to_degrees());

        Course { distance, heading }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        self.distance_heading_to(other).distance
    }

    /// Flat-earth displacement by `north_m` / `east_m` meters. Longitude
    /// stays in (-180, 180].
    pub fn offset(&self, north_m: f64, east_m: f64) -> Position {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let dlon = (east_m / (EARTH_RADIUS_M * self.latitude.to_radians().cos())).to_degrees();
        Position::new(self.latitude + dlat, wrap_degrees(self.longitude + dlon))
    }

    /// East/north meters of `self` relative to `origin` (equirectangular).
    fn local_xy(&self, origin: &Position) -> (f64, f64) {
        let x = wrap_degrees(self.longitude - origin.longitude).to_radians()
            * origin.latitude.to_radians().cos()
            * EARTH_RADIUS_M;
        let y = (self.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M;
        (x, y)
    }

    /// Side of the line through `current` and `previous`, looking from
    /// `previous` toward `current`.
    pub fn side_of_line(&self, current: &Position, previous: &Position) -> LineSide {
        let (bx, by) = previous.local_xy(current);
        let (px, py) = self.local_xy(current);
        // Positive: right of current→previous, i.e. left of the leg.
        let d = px * by - py * bx;
        if d > 0.0 { LineSide::Port } else { LineSide::Starboard }
    }

    /// Perpendicular distance (m) to the infinite line through `current`
    /// and `previous`. Falls back to point distance when the two coincide.
    pub fn distance_to_line(&self, current: &Position, previous: &Position) -> f64 {
        let (bx, by) = previous.local_xy(current);
        let (px, py) = self.local_xy(current);
        let len = (bx * bx + by * by).sqrt();
        if len == 0.0 {
            return (px * px + py * py).sqrt();
        }
        (px * by - py * bx).abs() / len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_wrap_degrees_range() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(720.0 + 45.0), 45.0);
        assert!(wrap_degrees(f64::NAN).is_nan());
    }

    #[test]
    fn test_wrap_360_range() {
        assert_eq!(wrap_360(-90.0), 270.0);
        assert_eq!(wrap_360(360.0), 0.0);
        assert_eq!(wrap_360(725.0), 5.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let o = Position::new(0.0, 0.0);
        let north = o.distance_heading_to(&Position::new(0.001, 0.0));
        let east = o.distance_heading_to(&Position::new(0.0, 0.001));
        let south = o.distance_heading_to(&Position::new(-0.001, 0.0));
        let west = o.distance_heading_to(&Position::new(0.0, -0.001));
        assert!(north.heading.abs() < EPS);
        assert!((east.heading - 90.0).abs() < EPS);
        assert!((south.heading - 180.0).abs() < EPS);
        assert!((west.heading - 270.0).abs() < EPS);
    }

    #[test]
    fn test_distance_one_millidegree_latitude() {
        let o = Position::new(0.0, 0.0);
        let d = o.distance_to(&Position::new(0.001, 0.0));
        // 0.001° of arc on a 6371 km sphere
        assert!((d - 111.19).abs() < 0.01, "got {d}");
        assert_eq!(o.distance_to(&o), 0.0);
    }

    #[test]
    fn test_offset_matches_distance() {
        let o = Position::new(-36.84, 174.76);
        let p = o.offset(30.0, 40.0);
        let c = o.distance_heading_to(&p);
        assert!((c.distance - 50.0).abs() < 0.05, "got {}", c.distance);
        assert!((c.heading - 53.13).abs() < 0.05, "got {}", c.heading);
    }

    #[test]
    fn test_side_of_line_looking_along_leg() {
        // Leg runs north from prev to current
        let prev = Position::new(0.0, 0.0);
        let current = Position::new(0.001, 0.0);
        let west = Position::new(0.0005, -0.0001);
        let east = Position::new(0.0005, 0.0001);
        assert_eq!(west.side_of_line(&current, &prev), LineSide::Port);
        assert_eq!(east.side_of_line(&current, &prev), LineSide::Starboard);
    }

    #[test]
    fn test_line_queries_across_antimeridian() {
        // Northbound leg just west of 180°, boat just east of it
        let prev = Position::new(0.0, 179.9995);
        let current = Position::new(0.001, 179.9995);
        let boat = Position::new(0.0005, -179.9999);
        let same_boat = Position::new(0.0005, 180.0001);

        let d = boat.distance_to_line(&current, &prev);
        assert!((d - 66.7).abs() < 0.1, "got {d}");
        assert!((d - same_boat.distance_to_line(&current, &prev)).abs() < 1e-3);
        assert_eq!(boat.side_of_line(&current, &prev), LineSide::Starboard);
        assert_eq!(same_boat.side_of_line(&current, &prev), LineSide::Starboard);
    }

    #[test]
    fn test_offset_wraps_longitude() {
        let p = Position::new(0.0, 179.9995).offset(0.0, 100.0);
        assert!(p.longitude < -179.99 && p.longitude > -180.0, "got {}", p.longitude);
        let c = Position::new(0.0, 179.9995).distance_heading_to(&p);
        assert!((c.distance - 100.0).abs() < 0.05, "got {}", c.distance);
        assert!((c.heading - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_point_on_line_is_starboard() {
        let prev = Position::new(0.0, 0.0);
        let current = Position::new(0.001, 0.0);
        assert_eq!(prev.side_of_line(&current, &prev), LineSide::Starboard);
        assert_eq!(Position::new(0.0005, 0.0).side_of_line(&current, &prev), LineSide::Starboard);
    }

    #[test]
    fn test_distance_to_line() {
        let prev = Position::new(0.0, 0.0);
        let current = Position::new(0.001, 0.0);
        let p = prev.offset(50.0, 12.0);
        assert!((p.distance_to_line(&current, &prev) - 12.0).abs() < 0.01);
        // Beyond the segment end still measures to the infinite line
        let q = current.offset(500.0, -7.0);
        assert!((q.distance_to_line(&current, &prev) - 7.0).abs() < 0.01);
    }

    #[test]
    fn test_distance_to_degenerate_line() {
        let a = Position::new(10.0, 10.0);
        let p = a.offset(3.0, 4.0);
        assert!((p.distance_to_line(&a, &a) - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_line_side_sign_and_opposite() {
        assert_eq!(LineSide::Port.sign(), -1.0);
        assert_eq!(LineSide::Starboard.sign(), 1.0);
        assert_eq!(LineSide::Port.opposite(), LineSide::Starboard);
    }
}
