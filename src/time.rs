//! Time and astronomical calculations.
//!
//! Julian dates and centuries for the solar calculator, and Greenwich
//! Mean Sidereal Time (GMST) for rotating inertial positions into the
//! Earth-fixed frame.

use chrono::{DateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86400.0;
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;
pub const UNIX_EPOCH_JULIAN_DATE: f64 = 2440587.5;
pub const J2000_JULIAN_DATE: f64 = 2451545.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
pub const GMST_BASE_DEG: f64 = 280.46061837;
pub const GMST_ROTATION_PER_DAY: f64 = 360.98564736629;
pub const GMST_CORRECTION: f64 = 0.000387933;

pub fn julian_date(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JULIAN_DATE
}

/// Julian centuries elapsed since J2000.0.
pub fn julian_century(timestamp: DateTime<Utc>) -> f64 {
    (julian_date(timestamp) - J2000_JULIAN_DATE) / DAYS_PER_JULIAN_CENTURY
}

/// GMST in radians, normalized to [0, 2π).
pub fn greenwich_mean_sidereal_time(timestamp: DateTime<Utc>) -> f64 {
    let d = julian_date(timestamp) - J2000_JULIAN_DATE;
    let t = d / DAYS_PER_JULIAN_CENTURY;
    let degrees = GMST_BASE_DEG + GMST_ROTATION_PER_DAY * d + t * t * (GMST_CORRECTION - t / 38_710_000.0);
    degrees.rem_euclid(360.0).to_radians()
}

/// Timestamp truncated to 00:00 UTC of the same day.
pub fn utc_day_start(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn j2000_is_zero_centuries() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(julian_date(j2000), J2000_JULIAN_DATE, epsilon = 1e-9);
        assert_abs_diff_eq!(julian_century(j2000), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn gmst_at_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let gmst = greenwich_mean_sidereal_time(j2000).to_degrees();
        assert_abs_diff_eq!(gmst, GMST_BASE_DEG, epsilon = 1e-6);
    }

    #[test]
    fn day_start_truncates() {
        let t = Utc.with_ymd_and_hms(2024, 3, 20, 17, 45, 12).unwrap();
        assert_eq!(utc_day_start(t), Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap());
    }
}
