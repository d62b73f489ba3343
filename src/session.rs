//! Everything the tracker knows, owned in one place.
//!
//! The frame loop is the only writer. Network results arrive as
//! `FetchEvent`s and are folded in here; the UI reads the fields directly.

use chrono::{DateTime, Utc};

use crate::config::TrackerConfig;
use crate::error::{FetchError, LocationError};
use crate::feeds::{CrewManifest, PositionFix};
use crate::geo::{resolve_label, LocationLabel};
use crate::location::ObserverLocation;
use crate::meteor::{active_and_upcoming, ShowerReport};
use crate::pass::{compute_passes, Pass, PassWindow};
use crate::solar::SunTracker;
use crate::stats::StatsCounter;
use crate::telemetry::TelemetrySimulator;
use crate::tle::ElementSet;
use crate::trail::{GeoPoint, PathSegment, TrailBuffer};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PassStatus {
    #[default]
    Idle,
    Locating,
    FetchingElements,
    Ready {
        computed_at: DateTime<Utc>,
        passes: Vec<Pass>,
    },
    Failed(String),
}

/// What the app has to do next for a pass prediction to complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassAction {
    Done,
    Locate,
    FetchElements,
}

pub struct Session {
    pub config: TrackerConfig,
    pub trail: TrailBuffer,
    pub segments: Vec<PathSegment>,
    pub last_fix: Option<PositionFix>,
    last_fix_seq: u64,
    pub location_label: Option<LocationLabel>,
    last_label_seq: u64,
    pub elements: Option<ElementSet>,
    pub observer: Option<ObserverLocation>,
    pub crew: Option<CrewManifest>,
    pub sun: SunTracker,
    pub telemetry: TelemetrySimulator,
    pub stats: StatsCounter,
    pub passes: PassStatus,
    pub showers: Option<ShowerReport>,
}

impl Session {
    pub fn new(config: TrackerConfig, now: DateTime<Utc>) -> Self {
        Self::with_telemetry(config, now, TelemetrySimulator::new())
    }

    pub fn with_telemetry(config: TrackerConfig, now: DateTime<Utc>, telemetry: TelemetrySimulator) -> Self {
        Self {
            trail: TrailBuffer::with_capacity(config.trail_capacity),
            observer: config.observer,
            config,
            segments: Vec::new(),
            last_fix: None,
            last_fix_seq: 0,
            location_label: None,
            last_label_seq: 0,
            elements: None,
            crew: None,
            sun: SunTracker::new(now),
            telemetry,
            stats: StatsCounter::new(now),
            passes: PassStatus::Idle,
            showers: None,
        }
    }

    /// Records a fix unless a newer request has already been applied.
    pub fn apply_fix(&mut self, seq: u64, fix: PositionFix) -> bool {
        if seq <= self.last_fix_seq {
            log::debug!("discarding out-of-order fix #{} (last #{})", seq, self.last_fix_seq);
            return false;
        }
        self.last_fix_seq = seq;
        self.trail.add_point(fix.point);
        self.segments = self.trail.segments();
        self.last_fix = Some(fix);
        true
    }

    pub fn latest_point(&self) -> Option<GeoPoint> {
        self.trail.latest()
    }

    pub fn apply_label(&mut self, seq: u64, point: GeoPoint, result: Result<LocationLabel, FetchError>) -> bool {
        if seq <= self.last_label_seq {
            return false;
        }
        self.last_label_seq = seq;
        self.location_label = Some(resolve_label(result, point));
        true
    }

    /// A failed refresh keeps the previous manifest.
    pub fn apply_crew(&mut self, result: Result<CrewManifest, FetchError>) {
        match result {
            Ok(crew) => {
                log::debug!("crew manifest: {} aboard", crew.members.len());
                self.crew = Some(crew);
            }
            Err(e) => log::warn!("crew refresh failed: {}", e),
        }
    }

    pub fn needs_elements(&self, now: DateTime<Utc>) -> bool {
        self.elements
            .as_ref()
            .map_or(true, |e| e.is_stale(now, self.config.element_set_max_age_hours))
    }

    /// Stores a fetched element set and resumes a prediction that was waiting on it.
    pub fn set_elements(&mut self, result: Result<ElementSet, FetchError>, now: DateTime<Utc>) {
        let awaiting = self.passes == PassStatus::FetchingElements;
        match result {
            Ok(elements) => {
                log::info!("element set epoch {} (i = {:.4}°)", elements.epoch, elements.inclination_deg);
                self.elements = Some(elements);
                if awaiting {
                    self.predict_passes(now);
                }
            }
            Err(e) => {
                log::warn!("element set fetch failed: {}", e);
                if awaiting {
                    self.passes = PassStatus::Failed(format!("Could not load orbital elements ({})", e));
                }
            }
        }
    }

    pub fn set_observer(&mut self, result: Result<ObserverLocation, LocationError>, now: DateTime<Utc>) -> PassAction {
        match result {
            Ok(observer) => {
                self.observer = Some(observer);
                self.continue_prediction(now)
            }
            Err(e) => {
                log::warn!("observer location: {}", e);
                if self.passes == PassStatus::Locating {
                    self.passes = PassStatus::Failed(match e {
                        LocationError::Denied => {
                            "Location access was denied. Enter coordinates to predict passes.".to_string()
                        }
                        other => format!("Could not determine your location ({}).", other),
                    });
                }
                PassAction::Done
            }
        }
    }

    /// Entry point when the passes drawer is opened.
    pub fn begin_pass_prediction(&mut self, now: DateTime<Utc>) -> PassAction {
        if self.observer.is_none() {
            self.passes = PassStatus::Locating;
            return PassAction::Locate;
        }
        self.continue_prediction(now)
    }

    fn continue_prediction(&mut self, now: DateTime<Utc>) -> PassAction {
        if self.needs_elements(now) {
            self.passes = PassStatus::FetchingElements;
            return PassAction::FetchElements;
        }
        self.predict_passes(now);
        PassAction::Done
    }

    pub fn predict_passes(&mut self, now: DateTime<Utc>) -> &[Pass] {
        let passes = match &self.observer {
            Some(observer) => compute_passes(
                self.elements.as_ref(),
                observer,
                &PassWindow::from_config(now, &self.config),
            ),
            None => Vec::new(),
        };
        self.passes = PassStatus::Ready { computed_at: now, passes };
        match &self.passes {
            PassStatus::Ready { passes, .. } => passes,
            _ => &[],
        }
    }

    pub fn showers(&mut self, now: DateTime<Utc>) -> &ShowerReport {
        self.showers.insert(active_and_upcoming(now))
    }
}
