//! Fixed-rate tickers driving the independently owned subsystems.
//!
//! The frame loop asks the scheduler which tickers are due and then
//! calls `on_tick` on whichever subsystem owns that signal.

use chrono::{DateTime, Duration, Utc};

use crate::config::{CREW_REFRESH_SECONDS, STATS_TICK_SECONDS, TELEMETRY_TICK_SECONDS};

pub trait Tick {
    fn on_tick(&mut self, now: DateTime<Utc>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickKind {
    Position,
    Sun,
    Telemetry,
    Stats,
    Crew,
}

#[derive(Clone, Debug)]
struct Ticker {
    kind: TickKind,
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    tickers: Vec<Ticker>,
}

impl Scheduler {
    pub fn new(position_poll_seconds: i64) -> Self {
        Self::with_intervals(&[
            (TickKind::Position, Duration::seconds(position_poll_seconds)),
            // Every frame; the sun only needs sub-second freshness.
            (TickKind::Sun, Duration::zero()),
            (TickKind::Telemetry, Duration::seconds(TELEMETRY_TICK_SECONDS)),
            (TickKind::Stats, Duration::seconds(STATS_TICK_SECONDS)),
            (TickKind::Crew, Duration::seconds(CREW_REFRESH_SECONDS)),
        ])
    }

    pub fn with_intervals(intervals: &[(TickKind, Duration)]) -> Self {
        Self {
            tickers: intervals
                .iter()
                .map(|&(kind, interval)| Ticker { kind, interval, next_due: None })
                .collect(),
        }
    }

    /// Kinds whose deadline has passed, each rescheduled to `now + interval`.
    /// Everything is due on the first call.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<TickKind> {
        let mut due = Vec::new();
        for ticker in &mut self.tickers {
            if ticker.next_due.map_or(true, |next| now >= next) {
                ticker.next_due = Some(now + ticker.interval);
                due.push(ticker.kind);
            }
        }
        due
    }

    /// Forces `kind` to fire on the next `due` call.
    pub fn trigger(&mut self, kind: TickKind) {
        for ticker in self.tickers.iter_mut().filter(|t| t.kind == kind) {
            ticker.next_due = None;
        }
    }

    /// Time until the earliest non-zero-interval deadline, for repaint scheduling.
    pub fn time_until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.tickers
            .iter()
            .filter(|t| t.interval > Duration::zero())
            .filter_map(|t| t.next_due)
            .map(|next| (next - now).max(Duration::zero()))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn everything_fires_first() {
        let mut s = Scheduler::new(5);
        let due = s.due(t0());
        assert_eq!(due.len(), 5);
    }

    #[test]
    fn fixed_rates() {
        let mut s = Scheduler::new(5);
        s.due(t0());
        let due = s.due(t0() + Duration::milliseconds(1500));
        assert_eq!(due, vec![TickKind::Sun, TickKind::Stats]);
        let due = s.due(t0() + Duration::seconds(5));
        assert_eq!(due, vec![TickKind::Position, TickKind::Sun, TickKind::Telemetry, TickKind::Stats]);
    }

    #[test]
    fn trigger_forces_next_due() {
        let mut s = Scheduler::new(5);
        s.due(t0());
        s.trigger(TickKind::Crew);
        assert!(s.due(t0() + Duration::milliseconds(10)).contains(&TickKind::Crew));
    }

    #[test]
    fn next_deadline() {
        let mut s = Scheduler::new(5);
        assert_eq!(s.time_until_next(t0()), None);
        s.due(t0());
        assert_eq!(s.time_until_next(t0()), Some(Duration::seconds(1)));
    }

    struct Counter(u32);

    impl Tick for Counter {
        fn on_tick(&mut self, _now: DateTime<Utc>) {
            self.0 += 1;
        }
    }

    #[test]
    fn dispatch_reaches_owner() {
        let mut s = Scheduler::with_intervals(&[(TickKind::Telemetry, Duration::seconds(3))]);
        let mut counter = Counter(0);
        for secs in 0..10 {
            let now = t0() + Duration::seconds(secs);
            for kind in s.due(now) {
                if kind == TickKind::Telemetry {
                    counter.on_tick(now);
                }
            }
        }
        assert_eq!(counter.0, 4);
    }
}
