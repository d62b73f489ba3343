//! Cumulative orbital statistics since launch.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};

use crate::config::{iss_launch_epoch, EARTH_RADIUS_KM, ISS_NOMINAL_ALTITUDE_KM, ISS_ORBITAL_PERIOD_MINUTES};
use crate::scheduler::Tick;

const MINUTES_PER_DAY: f64 = 1440.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitalStats {
    pub days_in_orbit: u64,
    pub years_in_space: f64,
    pub total_orbits: u64,
    pub total_distance_km: f64,
    pub sunrises_per_orbit_day: u32,
    pub orbital_period_minutes: f64,
}

pub fn compute_stats(
    now: DateTime<Utc>,
    launch_epoch: DateTime<Utc>,
    orbital_period_minutes: f64,
) -> OrbitalStats {
    let minutes_since_launch = ((now - launch_epoch).num_milliseconds() as f64 / 60_000.0).max(0.0);
    let days = minutes_since_launch / MINUTES_PER_DAY;
    let total_orbits = (minutes_since_launch / orbital_period_minutes).floor() as u64;
    let circumference_km = 2.0 * PI * (EARTH_RADIUS_KM + ISS_NOMINAL_ALTITUDE_KM);
    OrbitalStats {
        days_in_orbit: days.floor() as u64,
        years_in_space: days / DAYS_PER_YEAR,
        total_orbits,
        total_distance_km: total_orbits as f64 * circumference_km,
        sunrises_per_orbit_day: (MINUTES_PER_DAY / orbital_period_minutes).floor() as u32,
        orbital_period_minutes,
    }
}

/// Live counter behind the stats panel, refreshed once a second.
pub struct StatsCounter {
    pub launch_epoch: DateTime<Utc>,
    pub orbital_period_minutes: f64,
    pub stats: OrbitalStats,
}

impl StatsCounter {
    pub fn new(now: DateTime<Utc>) -> Self {
        let launch_epoch = iss_launch_epoch();
        Self {
            launch_epoch,
            orbital_period_minutes: ISS_ORBITAL_PERIOD_MINUTES,
            stats: compute_stats(now, launch_epoch, ISS_ORBITAL_PERIOD_MINUTES),
        }
    }

    /// One sunrise per orbit.
    pub fn sunrises_since_launch(&self) -> u64 {
        self.stats.total_orbits
    }
}

impl Tick for StatsCounter {
    fn on_tick(&mut self, now: DateTime<Utc>) {
        self.stats = compute_stats(now, self.launch_epoch, self.orbital_period_minutes);
    }
}
