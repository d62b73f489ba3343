//! Simulated life-support and power telemetry.
//!
//! Not derived from any real downlink: each channel is a bounded random
//! walk that gives the side panel a plausibly moving signal.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::scheduler::Tick;

#[derive(Clone, Debug, PartialEq)]
pub struct TelemetryChannel {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
}

impl TelemetryChannel {
    const fn new(name: &'static str, unit: &'static str, min: f64, max: f64, step: f64) -> Self {
        Self { name, unit, min, max, step, value: (min + max) / 2.0 }
    }

    /// Position of the value inside its band, 0..=1.
    pub fn fraction(&self) -> f64 {
        ((self.value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

pub fn default_channels() -> Vec<TelemetryChannel> {
    vec![
        TelemetryChannel::new("Cabin pressure", "kPa", 99.9, 102.7, 0.15),
        TelemetryChannel::new("Cabin temperature", "°C", 18.0, 26.7, 0.3),
        TelemetryChannel::new("O₂ partial pressure", "kPa", 19.5, 23.1, 0.1),
        TelemetryChannel::new("CO₂ partial pressure", "mmHg", 1.5, 4.0, 0.1),
        TelemetryChannel::new("Humidity", "%", 25.0, 75.0, 1.5),
        TelemetryChannel::new("Bus voltage", "V", 151.0, 160.0, 0.4),
        TelemetryChannel::new("Solar array power", "kW", 75.0, 120.0, 2.5),
    ]
}

pub struct TelemetrySimulator {
    pub channels: Vec<TelemetryChannel>,
    pub updated_at: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl TelemetrySimulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    #[cfg(test)]
    pub(crate) fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self { channels: default_channels(), updated_at: None, rng }
    }

    pub fn step(&mut self) {
        for ch in &mut self.channels {
            let delta = self.rng.gen_range(-ch.step..=ch.step);
            ch.value = (ch.value + delta).clamp(ch.min, ch.max);
        }
    }
}

impl Default for TelemetrySimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tick for TelemetrySimulator {
    fn on_tick(&mut self, now: DateTime<Utc>) {
        self.step();
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_within_bounds() {
        let mut sim = TelemetrySimulator::seeded(7);
        for _ in 0..5_000 {
            sim.step();
            for ch in &sim.channels {
                assert!(ch.value >= ch.min && ch.value <= ch.max, "{} = {}", ch.name, ch.value);
            }
        }
    }

    #[test]
    fn steps_are_bounded() {
        let mut sim = TelemetrySimulator::seeded(11);
        let before: Vec<f64> = sim.channels.iter().map(|c| c.value).collect();
        sim.step();
        for (ch, prev) in sim.channels.iter().zip(before) {
            assert!((ch.value - prev).abs() <= ch.step + 1e-12);
        }
    }

    #[test]
    fn same_seed_same_signal() {
        let mut a = TelemetrySimulator::seeded(3);
        let mut b = TelemetrySimulator::seeded(3);
        for _ in 0..10 {
            a.step();
            b.step();
        }
        assert_eq!(a.channels, b.channels);
    }

    #[test]
    fn tick_records_time() {
        let mut sim = TelemetrySimulator::seeded(1);
        let now = Utc::now();
        sim.on_tick(now);
        assert_eq!(sim.updated_at, Some(now));
        assert!(sim.channels.iter().all(|c| (0.0..=1.0).contains(&c.fraction())));
    }
}
