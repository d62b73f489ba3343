//! Tracker configuration.
//!
//! Compile-time constants for polling cadence, trail length, pass
//! prediction and the station's nominal orbit, plus `TrackerConfig`,
//! the runtime view of those values that the session is built from.

use chrono::{DateTime, TimeZone, Utc};

use crate::location::ObserverLocation;

pub const POSITION_POLL_SECONDS: i64 = 5;
pub const TELEMETRY_TICK_SECONDS: i64 = 3;
pub const STATS_TICK_SECONDS: i64 = 1;
pub const CREW_REFRESH_SECONDS: i64 = 600;
pub const LOCATION_TIMEOUT_MS: u32 = 10_000;

pub const TRAIL_CAPACITY: usize = 60;

pub const MIN_PASS_ELEVATION_DEG: f64 = 10.0;
pub const PASS_STEP_SECONDS: i64 = 10;
pub const PASS_WINDOW_HOURS: i64 = 48;
pub const MAX_PASSES: usize = 5;
pub const ELEMENT_SET_MAX_AGE_HOURS: i64 = 24;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const ISS_NOMINAL_ALTITUDE_KM: f64 = 408.0;
pub const ISS_ORBITAL_PERIOD_MINUTES: f64 = 92.68;
pub const ISS_NORAD_ID: u32 = 25544;

/// Zarya, the first module, lifted off at 06:40 UTC.
pub fn iss_launch_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1998, 11, 20, 6, 40, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub const POSITION_PRIMARY_URL: &str = "https://api.wheretheiss.at/v1/satellites/25544";
pub const POSITION_FALLBACK_URL: &str = "http://api.open-notify.org/iss-now.json";
pub const CREW_PRIMARY_URL: &str = "http://api.open-notify.org/astros.json";
pub const CREW_FALLBACK_URL: &str =
    "https://corquaid.github.io/international-space-station-APIs/JSON/people-in-space.json";
pub const TLE_PRIMARY_URL: &str = "https://celestrak.org/NORAD/elements/gp.php?CATNR=25544&FORMAT=TLE";
pub const TLE_FALLBACK_URL: &str = "https://tle.ivanstanojevic.me/api/tle/25544";
pub const REVERSE_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const USER_AGENT: &str = concat!("iss-globe/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    pub position_poll_seconds: i64,
    pub trail_capacity: usize,
    pub min_pass_elevation_deg: f64,
    pub pass_step_seconds: i64,
    pub pass_window_hours: i64,
    pub max_passes: usize,
    pub element_set_max_age_hours: i64,
    pub observer: Option<ObserverLocation>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            position_poll_seconds: POSITION_POLL_SECONDS,
            trail_capacity: TRAIL_CAPACITY,
            min_pass_elevation_deg: MIN_PASS_ELEVATION_DEG,
            pass_step_seconds: PASS_STEP_SECONDS,
            pass_window_hours: PASS_WINDOW_HOURS,
            max_passes: MAX_PASSES,
            element_set_max_age_hours: ELEMENT_SET_MAX_AGE_HOURS,
            observer: None,
        }
    }
}

impl TrackerConfig {
    /// Reads `ISS_OBSERVER` ("lat,lon[,alt_km]") and `ISS_POLL_SECONDS`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("ISS_OBSERVER") {
            match parse_observer(&raw) {
                Some(observer) => config.observer = Some(observer),
                None => log::warn!("ignoring malformed ISS_OBSERVER={raw:?}"),
            }
        }
        if let Ok(raw) = std::env::var("ISS_POLL_SECONDS") {
            match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => config.position_poll_seconds = secs,
                _ => log::warn!("ignoring malformed ISS_POLL_SECONDS={raw:?}"),
            }
        }
        config
    }
}

pub fn parse_observer(raw: &str) -> Option<ObserverLocation> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let (lat, lon, alt) = match parts.as_slice() {
        [lat, lon] => (*lat, *lon, 0.0),
        [lat, lon, alt] => (*lat, *lon, *alt),
        _ => return None,
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some(ObserverLocation::new(lat, lon, alt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_from_two_or_three_fields() {
        let o = parse_observer("51.5, -0.12").unwrap();
        assert_eq!(o.lat, 51.5);
        assert_eq!(o.lon, -0.12);
        assert_eq!(o.altitude_km, 0.0);

        let o = parse_observer("40,-75,0.3").unwrap();
        assert_eq!(o.altitude_km, 0.3);
    }

    #[test]
    fn observer_rejects_garbage_and_out_of_range() {
        assert!(parse_observer("north").is_none());
        assert!(parse_observer("1").is_none());
        assert!(parse_observer("95,0").is_none());
        assert!(parse_observer("0,200").is_none());
    }

    #[test]
    fn launch_epoch_is_zarya() {
        assert_eq!(iss_launch_epoch().to_rfc3339(), "1998-11-20T06:40:00+00:00");
    }
}
