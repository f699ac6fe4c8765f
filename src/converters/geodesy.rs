//! Geodetic helpers.
//!
//! Offsets are given in yards relative to a tactical scenario origin and
//! projected on the WGS-84 ellipsoid. Results are rendered as degrees and
//! decimal minutes, e.g. `N 53° 07.41'`.

use crate::models::Origin;

pub const YARDS_PER_METRE: f64 = 1.09361;

/// WGS-84 semi-major axis in metres
const WGS84_A: f64 = 6378137.0;
/// WGS-84 first eccentricity
const WGS84_E: f64 = 0.08181919084262;

/// Project an `(x, y)` yard offset from `origin` to decimal degrees.
///
/// Returns `None` for a zero offset on either axis, which the projection
/// cannot resolve.
pub fn yards_to_degrees(x_yards: f64, y_yards: f64, origin: Origin) -> Option<(f64, f64)> {
    if x_yards == 0.0 || y_yards == 0.0 {
        return None;
    }

    let origin_lat = origin.latitude.to_radians();
    let x = x_yards / YARDS_PER_METRE;
    let y = y_yards / YARDS_PER_METRE;

    // Bearing from the quotient; the sign of y is carried by beta
    let alpha = (x / y).atan();
    let rho = WGS84_A * (1.0 - WGS84_E * WGS84_E * origin_lat.sin() * origin_lat.sin()).sqrt();
    let beta = signum(y) * ((x * x + y * y).sqrt() / rho).atan();

    let latitude = (origin_lat.sin() * beta.cos() + origin_lat.cos() * beta.sin() * alpha.cos())
        .asin()
        .to_degrees();
    let longitude = origin.longitude
        + (alpha.sin() * beta.sin() / latitude.to_radians().cos())
            .asin()
            .to_degrees();

    Some((latitude, longitude))
}

fn signum(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `N|S DD° MM.MM'`
pub fn format_latitude(latitude: f64) -> String {
    format_coordinate(latitude, ('N', 'S'), 2)
}

/// `E|W DDD° MM.MM'`
pub fn format_longitude(longitude: f64) -> String {
    format_coordinate(longitude, ('E', 'W'), 3)
}

fn format_coordinate(value: f64, (positive, negative): (char, char), width: usize) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let magnitude = value.abs();

    let mut degrees = magnitude.trunc();
    let mut minutes = ((magnitude - degrees) * 60.0 * 100.0).round() / 100.0;
    if minutes >= 60.0 {
        degrees += 1.0;
        minutes -= 60.0;
    }

    format!(
        "{} {:0width$}° {:05.2}'",
        hemisphere,
        degrees as u32,
        minutes,
        width = width
    )
}
