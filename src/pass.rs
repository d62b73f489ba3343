use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;

use crate::config::TrackerConfig;
use crate::location::ObserverLocation;
use crate::time::greenwich_mean_sidereal_time;

const WGS84_A_KM: f64 = 6378.137;
const WGS84_F: f64 = 1.0 / 298.257223563;

/// Source of inertial (TEME) satellite positions in km.
pub trait Propagator {
    /// `None` when the orbit cannot be evaluated at `t`, e.g. after decay.
    fn position_eci(&self, t: DateTime<Utc>) -> Option<[f64; 3]>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LookAngles {
    pub azimuth: f64,
    pub elevation: f64,
    pub range_km: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pass {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_azimuth: f64,
    pub end_azimuth: f64,
    pub max_elevation: f64,
    pub max_elevation_time: DateTime<Utc>,
    /// Closest slant range seen during the pass.
    pub min_range_km: f64,
}

impl Pass {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: i64,
    pub min_elevation_deg: f64,
    pub max_passes: usize,
}

impl PassWindow {
    pub fn from_config(start: DateTime<Utc>, config: &TrackerConfig) -> Self {
        Self {
            start,
            end: start + Duration::hours(config.pass_window_hours),
            step_seconds: config.pass_step_seconds,
            min_elevation_deg: config.min_pass_elevation_deg,
            max_passes: config.max_passes,
        }
    }
}

/// Observer position in the Earth-fixed frame on the WGS-84 ellipsoid.
pub fn observer_ecef(observer: &ObserverLocation) -> Vector3<f64> {
    let lat = observer.lat.to_radians();
    let lon = observer.lon.to_radians();
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let n = WGS84_A_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    let h = observer.altitude_km;
    Vector3::new(
        (n + h) * lat.cos() * lon.cos(),
        (n + h) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + h) * lat.sin(),
    )
}

pub fn eci_to_ecef(eci: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (s, c) = gmst.sin_cos();
    Vector3::new(c * eci.x + s * eci.y, -s * eci.x + c * eci.y, eci.z)
}

/// Azimuth (clockwise from north) and elevation of `sat_eci` as seen by
/// `observer` when the Earth has rotated by `gmst` radians.
pub fn look_angles(sat_eci: [f64; 3], observer: &ObserverLocation, gmst: f64) -> LookAngles {
    let sat = eci_to_ecef(&Vector3::from(sat_eci), gmst);
    let range = sat - observer_ecef(observer);
    let range_km = range.norm();

    let (sin_lat, cos_lat) = observer.lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = observer.lon.to_radians().sin_cos();

    let south = sin_lat * cos_lon * range.x + sin_lat * sin_lon * range.y - cos_lat * range.z;
    let east = -sin_lon * range.x + cos_lon * range.y;
    let zenith = cos_lat * cos_lon * range.x + cos_lat * sin_lon * range.y + sin_lat * range.z;

    if range_km < 1e-9 {
        return LookAngles { azimuth: 0.0, elevation: 90.0, range_km };
    }
    LookAngles {
        azimuth: east.atan2(-south).to_degrees().rem_euclid(360.0),
        elevation: (zenith / range_km).clamp(-1.0, 1.0).asin().to_degrees(),
        range_km,
    }
}

enum PassState {
    OutsidePass,
    InPass(Pass),
}

/// Samples `look` across the window and extracts above-threshold
/// intervals. A sample that yields `None` is skipped without touching
/// the state. A pass still open when the window runs out is discarded.
pub fn find_passes<F>(mut look: F, window: &PassWindow) -> Vec<Pass>
where
    F: FnMut(DateTime<Utc>) -> Option<LookAngles>,
{
    let step = Duration::seconds(window.step_seconds.max(1));
    let mut passes = Vec::new();
    let mut state = PassState::OutsidePass;
    let mut t = window.start;

    while t <= window.end && passes.len() < window.max_passes {
        if let Some(angles) = look(t) {
            let above = angles.elevation >= window.min_elevation_deg;
            state = match (state, above) {
                (PassState::OutsidePass, true) => PassState::InPass(Pass {
                    start: t,
                    end: t,
                    start_azimuth: angles.azimuth,
                    end_azimuth: angles.azimuth,
                    max_elevation: angles.elevation,
                    max_elevation_time: t,
                    min_range_km: angles.range_km,
                }),
                (PassState::InPass(mut pass), true) => {
                    pass.end = t;
                    pass.end_azimuth = angles.azimuth;
                    if angles.elevation > pass.max_elevation {
                        pass.max_elevation = angles.elevation;
                        pass.max_elevation_time = t;
                    }
                    pass.min_range_km = pass.min_range_km.min(angles.range_km);
                    PassState::InPass(pass)
                }
                (PassState::InPass(pass), false) => {
                    passes.push(pass);
                    PassState::OutsidePass
                }
                (PassState::OutsidePass, false) => PassState::OutsidePass,
            };
        }
        t += step;
    }

    if let PassState::InPass(open) = state {
        log::debug!("dropping pass still open at window end (started {})", open.start);
    }
    passes
}

pub fn compute_passes<P: Propagator>(
    propagator: Option<&P>,
    observer: &ObserverLocation,
    window: &PassWindow,
) -> Vec<Pass> {
    let Some(propagator) = propagator else {
        return Vec::new();
    };
    let passes = find_passes(
        |t| {
            let sat = propagator.position_eci(t)?;
            Some(look_angles(sat, observer, greenwich_mean_sidereal_time(t)))
        },
        window,
    );
    log::info!(
        "predicted {} passes over {:.2},{:.2} between {} and {}",
        passes.len(), observer.lat, observer.lon, window.start, window.end
    );
    passes
}

/// Sixteen-point compass name for an azimuth in degrees.
pub fn compass_point(azimuth: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE",
        "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
    ];
    let idx = ((azimuth.rem_euclid(360.0) / 22.5) + 0.5).floor() as usize % 16;
    POINTS[idx]
}
