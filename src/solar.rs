//! Sun position and day/night illumination.
//!
//! Implements the NOAA solar calculator terms needed to place the
//! subsolar point, plus the terminator curve used to shade the night
//! side of the map.

use chrono::{DateTime, Utc};

use crate::scheduler::Tick;
use crate::time::{julian_century, utc_day_start, MILLIS_PER_DAY};
use crate::trail::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunPosition {
    pub subsolar_longitude: f64,
    pub subsolar_declination: f64,
}

impl SunPosition {
    pub fn subsolar_point(&self) -> GeoPoint {
        GeoPoint::new(self.subsolar_declination, self.subsolar_longitude)
    }
}

fn geom_mean_long_sun(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + t * 0.0003032)).rem_euclid(360.0)
}

fn geom_mean_anomaly_sun(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - 0.0001537 * t)
}

fn eccent_earth_orbit(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + 0.0000001267 * t)
}

fn sun_eq_of_center(t: f64) -> f64 {
    let m = geom_mean_anomaly_sun(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289
}

fn sun_apparent_long(t: f64) -> f64 {
    let true_long = geom_mean_long_sun(t) + sun_eq_of_center(t);
    let omega = (125.04 - 1934.136 * t).to_radians();
    true_long - 0.00569 - 0.00478 * omega.sin()
}

fn mean_obliquity_of_ecliptic(t: f64) -> f64 {
    let seconds = 21.448 - t * (46.815 + t * (0.00059 - t * 0.001813));
    23.0 + (26.0 + seconds / 60.0) / 60.0
}

fn obliquity_correction(t: f64) -> f64 {
    let omega = (125.04 - 1934.136 * t).to_radians();
    mean_obliquity_of_ecliptic(t) + 0.00256 * omega.cos()
}

/// Solar declination in degrees.
pub fn solar_declination(t: f64) -> f64 {
    let e = obliquity_correction(t).to_radians();
    let lambda = sun_apparent_long(t).to_radians();
    (e.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time in minutes.
pub fn equation_of_time(t: f64) -> f64 {
    let epsilon = obliquity_correction(t).to_radians();
    let l0 = geom_mean_long_sun(t).to_radians();
    let e = eccent_earth_orbit(t);
    let m = geom_mean_anomaly_sun(t).to_radians();
    let y = (epsilon / 2.0).tan().powi(2);

    let eot = y * (2.0 * l0).sin() - 2.0 * e * m.sin()
        + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    eot.to_degrees() * 4.0
}

pub fn compute_subsolar_point(timestamp: DateTime<Utc>) -> SunPosition {
    let t = julian_century(timestamp);
    let day_start = utc_day_start(timestamp);
    let day_fraction = (day_start - timestamp).num_milliseconds() as f64 / MILLIS_PER_DAY;
    // 15°/hour is 0.25°/minute.
    let longitude = day_fraction * 360.0 - 180.0 - equation_of_time(t) / 4.0;
    SunPosition {
        subsolar_longitude: GeoPoint::normalize_lon(longitude),
        subsolar_declination: solar_declination(t),
    }
}

/// True when the sun is above the geometric horizon at `point`.
pub fn is_daylight(point: GeoPoint, sun: &SunPosition) -> bool {
    let (lat, lon) = (point.lat.to_radians(), point.lon.to_radians());
    let (dec, sub_lon) = (
        sun.subsolar_declination.to_radians(),
        sun.subsolar_longitude.to_radians(),
    );
    let cos_angle = lat.sin() * dec.sin() + lat.cos() * dec.cos() * (lon - sub_lon).cos();
    cos_angle > 0.0
}

/// Terminator as `[lon, lat]` map coordinates for `steps + 1` longitudes
/// spanning the full map width, -180..=180.
pub fn terminator(sun: &SunPosition, steps: usize) -> Vec<[f64; 2]> {
    let steps = steps.max(2);
    // Declination of exactly zero puts the terminator on the meridians.
    let dec = match sun.subsolar_declination.to_radians() {
        d if d.abs() < 1e-6 => 1e-6_f64.copysign(d),
        d => d,
    };
    (0..=steps)
        .map(|i| {
            let lon = -180.0 + 360.0 * i as f64 / steps as f64;
            let ha = (lon - sun.subsolar_longitude).to_radians();
            let lat = (-ha.cos() / dec.tan()).atan().to_degrees();
            [lon, lat]
        })
        .collect()
}

/// Night side as vertical trapezoids between consecutive terminator
/// samples and the dark pole. Each piece is convex so it can be filled
/// directly by the plot.
pub fn night_bands(sun: &SunPosition, steps: usize) -> Vec<[[f64; 2]; 4]> {
    let pole = if sun.subsolar_declination >= 0.0 { -90.0 } else { 90.0 };
    terminator(sun, steps)
        .windows(2)
        .map(|w| [w[0], w[1], [w[1][0], pole], [w[0][0], pole]])
        .collect()
}

/// Per-frame cache of the sun position.
pub struct SunTracker {
    pub position: SunPosition,
    pub updated_at: DateTime<Utc>,
}

impl SunTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            position: compute_subsolar_point(now),
            updated_at: now,
        }
    }
}

impl Tick for SunTracker {
    fn on_tick(&mut self, now: DateTime<Utc>) {
        self.position = compute_subsolar_point(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn equinox_noon_declination_near_zero() {
        let noon = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let sun = compute_subsolar_point(noon);
        assert_abs_diff_eq!(sun.subsolar_declination, 0.0, epsilon = 0.5);
    }

    #[test]
    fn solstice_declination_near_tilt() {
        let june = Utc.with_ymd_and_hms(2024, 6, 20, 20, 0, 0).unwrap();
        assert_abs_diff_eq!(compute_subsolar_point(june).subsolar_declination, 23.44, epsilon = 0.1);
        let december = Utc.with_ymd_and_hms(2024, 12, 21, 9, 0, 0).unwrap();
        assert_abs_diff_eq!(compute_subsolar_point(december).subsolar_declination, -23.44, epsilon = 0.1);
    }

    #[test]
    fn noon_utc_puts_sun_near_greenwich() {
        let noon = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let sun = compute_subsolar_point(noon);
        // Equation of time never exceeds ~17 minutes, about 4.1° of longitude.
        assert!(sun.subsolar_longitude.abs() < 4.5, "{}", sun.subsolar_longitude);
    }

    #[test]
    fn subsolar_longitude_moves_west() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 20, 6, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 3, 20, 18, 0, 0).unwrap();
        let a = compute_subsolar_point(t0).subsolar_longitude;
        let b = compute_subsolar_point(t1).subsolar_longitude;
        assert_abs_diff_eq!(a, 90.0, epsilon = 5.0);
        assert_abs_diff_eq!(b, -90.0, epsilon = 5.0);
    }

    #[test]
    fn longitude_stays_in_range() {
        for hour in 0..24 {
            let t = Utc.with_ymd_and_hms(2025, 1, 15, hour, 30, 0).unwrap();
            let lon = compute_subsolar_point(t).subsolar_longitude;
            assert!(lon > -180.0 && lon <= 180.0, "{lon}");
        }
    }

    #[test]
    fn subsolar_point_is_lit_and_antipode_is_dark() {
        let sun = SunPosition { subsolar_longitude: 30.0, subsolar_declination: 10.0 };
        assert!(is_daylight(GeoPoint::new(10.0, 30.0), &sun));
        assert!(!is_daylight(GeoPoint::new(-10.0, -150.0), &sun));
    }

    #[test]
    fn terminator_is_ninety_degrees_from_sun() {
        let sun = SunPosition { subsolar_longitude: -45.0, subsolar_declination: 20.0 };
        for [lon, lat] in terminator(&sun, 36) {
            let (lat, lon) = (lat.to_radians(), lon.to_radians());
            let (dec, sl) = (20f64.to_radians(), (-45f64).to_radians());
            let cos_angle = lat.sin() * dec.sin() + lat.cos() * dec.cos() * (lon - sl).cos();
            assert_abs_diff_eq!(cos_angle, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn night_bands_close_on_dark_pole() {
        let northern_summer = SunPosition { subsolar_longitude: 0.0, subsolar_declination: 23.0 };
        let bands = night_bands(&northern_summer, 10);
        assert_eq!(bands.len(), 10);
        assert!(bands.iter().all(|b| b[2][1] == -90.0 && b[3][1] == -90.0));
        assert_eq!(bands[0][0][0], -180.0);
        assert_eq!(bands[9][1][0], 180.0);

        let southern_summer = SunPosition { subsolar_longitude: 0.0, subsolar_declination: -23.0 };
        assert!(night_bands(&southern_summer, 10).iter().all(|b| b[2][1] == 90.0));
    }
}
