//! Two-Line Element (TLE) sets for the tracked station.
//!
//! Parses CelesTrak-style text blocks (with or without a name line) and
//! the JSON `{name, line1, line2}` form served by the fallback mirror,
//! and exposes the result as an SGP4 `Propagator` for pass prediction.

use chrono::{DateTime, Duration, Utc};
use sgp4::Constants;

use crate::error::FetchError;
use crate::pass::Propagator;
use crate::time::SECONDS_PER_DAY;

pub const EARTH_MU_KM3_S2: f64 = 398600.4418;
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;

#[derive(Clone)]
pub struct ElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub constants: Constants,
    pub epoch: DateTime<Utc>,
    pub epoch_minutes: f64,
    pub inclination_deg: f64,
    pub mean_motion: f64,
    pub fetched_at: DateTime<Utc>,
}

impl ElementSet {
    pub fn from_lines(
        name: &str,
        line1: &str,
        line2: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, FetchError> {
        let name = name.trim().to_string();
        let object_name = if name.is_empty() { None } else { Some(name.clone()) };
        let elements = sgp4::Elements::from_tle(object_name, line1.trim().as_bytes(), line2.trim().as_bytes())
            .map_err(|e| FetchError::Decode(format!("TLE: {}", e)))?;
        let constants = Constants::from_elements(&elements)
            .map_err(|e| FetchError::Decode(format!("elements: {}", e)))?;
        Ok(Self {
            name,
            line1: line1.trim().to_string(),
            line2: line2.trim().to_string(),
            constants,
            epoch: elements.datetime.and_utc(),
            epoch_minutes: datetime_to_minutes(&elements.datetime),
            inclination_deg: elements.inclination,
            mean_motion: elements.mean_motion,
            fetched_at,
        })
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    pub fn is_stale(&self, now: DateTime<Utc>, max_age_hours: i64) -> bool {
        self.age(now) > Duration::hours(max_age_hours)
    }

    pub fn nominal_altitude_km(&self) -> f64 {
        mean_motion_to_altitude_km(self.mean_motion)
    }
}

impl Propagator for ElementSet {
    fn position_eci(&self, t: DateTime<Utc>) -> Option<[f64; 3]> {
        let minutes_since_epoch = t.timestamp_millis() as f64 / 60_000.0 - self.epoch_minutes;
        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes_since_epoch))
            .ok()?;
        let [x, y, z] = prediction.position;
        if x.is_finite() && y.is_finite() && z.is_finite() {
            Some(prediction.position)
        } else {
            None
        }
    }
}

pub fn mean_motion_to_altitude_km(n_revs_per_day: f64) -> f64 {
    let n_rad_s = n_revs_per_day * 2.0 * std::f64::consts::PI / SECONDS_PER_DAY;
    let a = (EARTH_MU_KM3_S2 / (n_rad_s * n_rad_s)).powf(1.0 / 3.0);
    a - EARTH_EQUATORIAL_RADIUS_KM
}

pub fn datetime_to_minutes(dt: &sgp4::chrono::NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64 / 60_000.0
}

/// First valid element set in a plain-text block of two- or three-line
/// records.
pub fn parse_tle_text(data: &str, fetched_at: DateTime<Utc>) -> Result<ElementSet, FetchError> {
    let lines: Vec<&str> = data.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return Err(FetchError::Empty);
    }

    let mut last_error = None;
    let mut i = 0;
    while i + 1 < lines.len() {
        let line1 = lines[i];
        let line2 = lines[i + 1];
        if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
            i += 1;
            continue;
        }
        let name = if i > 0 && !lines[i - 1].starts_with("2 ") { lines[i - 1] } else { "" };
        match ElementSet::from_lines(name, line1, line2, fetched_at) {
            Ok(set) => return Ok(set),
            Err(e) => {
                log::debug!("skipping unparsable element set: {}", e);
                last_error = Some(e);
            }
        }
        i += 2;
    }

    Err(last_error.unwrap_or_else(|| FetchError::Decode("no element set found".to_string())))
}

pub fn parse_tle_json(data: &str, fetched_at: DateTime<Utc>) -> Result<ElementSet, FetchError> {
    let v: serde_json::Value = serde_json::from_str(data)?;
    let line1 = v["line1"].as_str().ok_or_else(|| FetchError::Decode("missing line1".to_string()))?;
    let line2 = v["line2"].as_str().ok_or_else(|| FetchError::Decode("missing line2".to_string()))?;
    let name = v["name"].as_str().unwrap_or_default();
    ElementSet::from_lines(name, line1, line2, fetched_at)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    pub(crate) const ISS_LINE1: &str = "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992";
    pub(crate) const ISS_LINE2: &str = "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008";

    pub(crate) fn iss_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 0).unwrap()
    }

    pub(crate) fn iss_elements() -> ElementSet {
        ElementSet::from_lines("ISS (ZARYA)", ISS_LINE1, ISS_LINE2, iss_epoch()).unwrap()
    }

    #[test]
    fn parses_three_line_block() {
        let text = format!("ISS (ZARYA)\n{}\n{}\n", ISS_LINE1, ISS_LINE2);
        let set = parse_tle_text(&text, iss_epoch()).unwrap();
        assert_eq!(set.name, "ISS (ZARYA)");
        assert_abs_diff_eq!(set.inclination_deg, 51.6461, epsilon = 1e-9);
        assert_eq!(set.epoch.date_naive(), chrono::NaiveDate::from_ymd_opt(2020, 7, 12).unwrap());
    }

    #[test]
    fn parses_two_line_block_without_name() {
        let text = format!("{}\r\n{}\r\n", ISS_LINE1, ISS_LINE2);
        let set = parse_tle_text(&text, iss_epoch()).unwrap();
        assert!(set.name.is_empty());
    }

    #[test]
    fn parses_json_mirror() {
        let json = format!(
            r#"{{"@id":"x","name":"ISS (ZARYA)","date":"2020-07-12T21:16:01+00:00","line1":"{}","line2":"{}"}}"#,
            ISS_LINE1, ISS_LINE2
        );
        let set = parse_tle_json(&json, iss_epoch()).unwrap();
        assert_eq!(set.line2, ISS_LINE2);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_tle_text("  \n", iss_epoch()).err(), Some(FetchError::Empty));
        assert!(matches!(parse_tle_text("<html>503</html>", iss_epoch()), Err(FetchError::Decode(_))));
        assert!(matches!(parse_tle_json(r#"{"name":"x"}"#, iss_epoch()), Err(FetchError::Decode(_))));
    }

    #[test]
    fn staleness_after_max_age() {
        let set = iss_elements();
        assert!(!set.is_stale(iss_epoch() + Duration::hours(23), 24));
        assert!(set.is_stale(iss_epoch() + Duration::hours(25), 24));
    }

    #[test]
    fn propagates_to_low_earth_orbit() {
        let set = iss_elements();
        let [x, y, z] = set.position_eci(iss_epoch() + Duration::minutes(30)).unwrap();
        let r = (x * x + y * y + z * z).sqrt();
        assert!(r > 6600.0 && r < 6900.0, "radius {r}");
        assert_abs_diff_eq!(set.nominal_altitude_km(), 420.0, epsilon = 20.0);
    }
}
