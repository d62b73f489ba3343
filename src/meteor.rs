//! Annual meteor shower calendar.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

const fn md(month: u32, day: u32) -> MonthDay {
    MonthDay { month, day }
}

impl MonthDay {
    fn in_year(self, year: i32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month, 28))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeteorShower {
    pub name: &'static str,
    pub peak: MonthDay,
    pub start: MonthDay,
    pub end: MonthDay,
    pub hourly_rate: u32,
    pub parent_body: &'static str,
}

pub const SHOWERS: [MeteorShower; 10] = [
    MeteorShower { name: "Quadrantids", peak: md(1, 3), start: md(12, 28), end: md(1, 12), hourly_rate: 120, parent_body: "2003 EH1" },
    MeteorShower { name: "Lyrids", peak: md(4, 22), start: md(4, 14), end: md(4, 30), hourly_rate: 18, parent_body: "C/1861 G1 (Thatcher)" },
    MeteorShower { name: "Eta Aquariids", peak: md(5, 6), start: md(4, 19), end: md(5, 28), hourly_rate: 50, parent_body: "1P/Halley" },
    MeteorShower { name: "Southern Delta Aquariids", peak: md(7, 30), start: md(7, 12), end: md(8, 23), hourly_rate: 25, parent_body: "96P/Machholz" },
    MeteorShower { name: "Perseids", peak: md(8, 12), start: md(7, 17), end: md(8, 24), hourly_rate: 100, parent_body: "109P/Swift-Tuttle" },
    MeteorShower { name: "Draconids", peak: md(10, 8), start: md(10, 6), end: md(10, 10), hourly_rate: 10, parent_body: "21P/Giacobini-Zinner" },
    MeteorShower { name: "Orionids", peak: md(10, 21), start: md(10, 2), end: md(11, 7), hourly_rate: 20, parent_body: "1P/Halley" },
    MeteorShower { name: "Leonids", peak: md(11, 17), start: md(11, 6), end: md(11, 30), hourly_rate: 15, parent_body: "55P/Tempel-Tuttle" },
    MeteorShower { name: "Geminids", peak: md(12, 14), start: md(12, 4), end: md(12, 17), hourly_rate: 150, parent_body: "3200 Phaethon" },
    MeteorShower { name: "Ursids", peak: md(12, 22), start: md(12, 17), end: md(12, 26), hourly_rate: 10, parent_body: "8P/Tuttle" },
];

pub const UPCOMING_HORIZON_DAYS: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShowerStatus {
    pub shower: &'static MeteorShower,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub peak: DateTime<Utc>,
    pub is_peak: bool,
    pub days_until_start: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShowerReport {
    pub active: Vec<ShowerStatus>,
    pub upcoming: Vec<ShowerStatus>,
}

/// Start, end and peak of `shower` for the season relevant to `now`.
fn season_dates(shower: &MeteorShower, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
    let year = now.year();
    let mut start = shower.start.in_year(year);
    let mut end = shower.end.in_year(year);
    let mut peak = shower.peak.in_year(year);

    if end < start {
        let peak_on_start_side = peak >= start;
        if now.month() <= 6 {
            start = shower.start.in_year(year - 1);
            if peak_on_start_side {
                peak = shower.peak.in_year(year - 1);
            }
        } else {
            end = shower.end.in_year(year + 1);
            if !peak_on_start_side {
                peak = shower.peak.in_year(year + 1);
            }
        }
    } else if end < now {
        start = shower.start.in_year(year + 1);
        end = shower.end.in_year(year + 1);
        peak = shower.peak.in_year(year + 1);
    }
    (start, end, peak)
}

fn ceil_days(d: Duration) -> i64 {
    let ms = d.num_milliseconds();
    let day = Duration::days(1).num_milliseconds();
    ms.div_euclid(day) + i64::from(ms.rem_euclid(day) != 0)
}

pub fn shower_status(shower: &'static MeteorShower, now: DateTime<Utc>) -> ShowerStatus {
    let (start, end, peak) = season_dates(shower, now);
    ShowerStatus {
        shower,
        start,
        end,
        peak,
        is_peak: (now - peak).abs() < Duration::hours(24),
        days_until_start: ceil_days(start - now),
    }
}

impl ShowerStatus {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }
}

pub fn active_and_upcoming(now: DateTime<Utc>) -> ShowerReport {
    let mut report = ShowerReport::default();
    for shower in SHOWERS.iter() {
        let status = shower_status(shower, now);
        if status.is_active(now) {
            report.active.push(status);
        } else if status.days_until_start > 0 && status.days_until_start <= UPCOMING_HORIZON_DAYS {
            report.upcoming.push(status);
        }
    }
    report
}
