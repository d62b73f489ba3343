//! Side panel readouts and the pop-out drawers.

use chrono::{DateTime, Utc};
use eframe::egui;

use crate::config::ISS_NORAD_ID;
use crate::feeds::FixSource;
use crate::geo::LabelSource;
use crate::location::ObserverLocation;
use crate::meteor::{ShowerReport, ShowerStatus};
use crate::pass::{compass_point, Pass};
use crate::session::{PassStatus, Session};
use crate::solar::is_daylight;
use crate::tle::ElementSet;
use crate::trail::TrailBuffer;

/// Requests raised by the drawers, handled by the app after drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanelAction {
    PredictPasses,
    LocateObserver,
    UseObserver(ObserverLocation),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ObserverInput {
    pub lat: f64,
    pub lon: f64,
}

fn age_label(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else {
        format!("{}m ago", secs / 60)
    }
}

fn trail_summary(trail: &TrailBuffer) -> Option<String> {
    if trail.is_empty() {
        return None;
    }
    Some(format!("Trail: {} of {} fixes", trail.len(), trail.capacity()))
}

fn no_passes_message(window_hours: i64) -> String {
    format!("No visible passes in the next {} hours.", window_hours)
}

fn element_set_title(elements: &ElementSet) -> String {
    let name = if elements.name.is_empty() { "Unnamed object" } else { elements.name.as_str() };
    format!("{} elements", name)
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn draw_side_panel(ui: &mut egui::Ui, session: &Session, now: DateTime<Utc>) {
    ui.heading("Position");
    match &session.last_fix {
        Some(fix) => {
            egui::Grid::new("position_grid").num_columns(2).show(ui, |ui| {
                ui.label("Latitude");
                ui.label(format!("{:.3}°", fix.point.lat));
                ui.end_row();
                ui.label("Longitude");
                ui.label(format!("{:.3}°", fix.point.lon));
                ui.end_row();
                ui.label("Altitude");
                ui.label(fix.altitude_km.map_or("n/a".to_string(), |a| format!("{:.1} km", a)));
                ui.end_row();
                ui.label("Velocity");
                ui.label(fix.velocity_kmh.map_or("n/a".to_string(), |v| format!("{:.0} km/h", v)));
                ui.end_row();
                ui.label("Lighting");
                ui.label(if is_daylight(fix.point, &session.sun.position) { "Daylight" } else { "Eclipse" });
                ui.end_row();
            });
            let source = match fix.source {
                FixSource::Primary => "primary feed",
                FixSource::Fallback => "fallback feed",
            };
            ui.weak(format!("Updated {} via {}", age_label(now, fix.timestamp), source));
            if let Some(summary) = trail_summary(&session.trail) {
                ui.weak(summary);
            }
        }
        None => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for first fix");
            });
        }
    }

    if let Some(label) = &session.location_label {
        ui.add_space(4.0);
        ui.label(egui::RichText::new(format!("Over {}", label.name)).strong());
        if let Some(detail) = &label.detail {
            ui.weak(detail);
        }
        if label.source == LabelSource::Offline {
            ui.weak("(approximate)");
        }
    }

    ui.separator();
    ui.heading("Sun");
    let sub = session.sun.position.subsolar_point();
    ui.label(format!("Subsolar point: {:.2}°, {:.2}°", sub.lat, sub.lon));

    ui.separator();
    ui.heading("Since launch");
    let stats = &session.stats.stats;
    egui::Grid::new("stats_grid").num_columns(2).show(ui, |ui| {
        ui.label("Days in orbit");
        ui.label(thousands(stats.days_in_orbit));
        ui.end_row();
        ui.label("Years in space");
        ui.label(format!("{:.2}", stats.years_in_space));
        ui.end_row();
        ui.label("Orbits");
        ui.label(thousands(stats.total_orbits));
        ui.end_row();
        ui.label("Distance");
        ui.label(format!("{} km", thousands(stats.total_distance_km as u64)));
        ui.end_row();
        ui.label("Sunrises");
        ui.label(thousands(session.stats.sunrises_since_launch()));
        ui.end_row();
        ui.label("Sunrises per day");
        ui.label(format!("{}", stats.sunrises_per_orbit_day));
        ui.end_row();
        ui.label("Orbital period");
        ui.label(format!("{:.2} min", stats.orbital_period_minutes));
        ui.end_row();
    });

    ui.separator();
    ui.heading("Crew");
    match &session.crew {
        Some(crew) => {
            ui.label(format!("{} aboard, {} in space", crew.members.len(), crew.total_in_space));
            for member in &crew.members {
                if member.craft.is_empty() || member.craft == "ISS" {
                    ui.label(format!("  {}", member.name));
                } else {
                    ui.label(format!("  {} ({})", member.name, member.craft));
                }
            }
        }
        None => {
            ui.weak("Crew manifest not loaded");
        }
    }

    ui.separator();
    ui.heading("Telemetry");
    ui.weak("Simulated");
    for ch in &session.telemetry.channels {
        ui.horizontal(|ui| {
            ui.add_sized([140.0, 16.0], egui::Label::new(ch.name));
            ui.add(
                egui::ProgressBar::new(ch.fraction() as f32)
                    .desired_width(90.0)
                    .text(format!("{:.1} {}", ch.value, ch.unit)),
            );
        });
    }
}

fn pass_table(ui: &mut egui::Ui, passes: &[Pass], window_hours: i64) {
    if passes.is_empty() {
        ui.label(no_passes_message(window_hours));
        return;
    }
    egui::Grid::new("passes_grid").striped(true).show(ui, |ui| {
        ui.strong("Start (UTC)");
        ui.strong("Duration");
        ui.strong("Max el.");
        ui.strong("Range");
        ui.strong("From");
        ui.strong("To");
        ui.end_row();
        for pass in passes {
            ui.label(pass.start.format("%a %d %b %H:%M").to_string());
            let secs = pass.duration().num_seconds();
            ui.label(format!("{}m {:02}s", secs / 60, secs % 60));
            ui.label(format!("{:.0}°", pass.max_elevation));
            ui.label(format!("{:.0} km", pass.min_range_km));
            ui.label(compass_point(pass.start_azimuth));
            ui.label(compass_point(pass.end_azimuth));
            ui.end_row();
        }
    });
}

pub fn draw_passes_window(
    ctx: &egui::Context,
    open: &mut bool,
    session: &Session,
    input: &mut ObserverInput,
) -> Option<PanelAction> {
    let mut action = None;
    egui::Window::new("Visible passes")
        .open(open)
        .default_width(420.0)
        .show(ctx, |ui| {
            match &session.observer {
                Some(obs) => {
                    ui.label(format!("Observer: {:.3}°, {:.3}°", obs.lat, obs.lon));
                }
                None => {
                    ui.weak("Observer location unknown");
                }
            }

            match &session.passes {
                PassStatus::Idle => {}
                PassStatus::Locating => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Finding your location");
                    });
                }
                PassStatus::FetchingElements => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading orbital elements");
                    });
                }
                PassStatus::Ready { computed_at, passes } => {
                    ui.weak(format!("Computed {} UTC", computed_at.format("%H:%M:%S")));
                    pass_table(ui, passes, session.config.pass_window_hours);
                }
                PassStatus::Failed(msg) => {
                    ui.colored_label(egui::Color32::from_rgb(230, 120, 80), msg);
                }
            }

            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Lat");
                ui.add(egui::DragValue::new(&mut input.lat).range(-90.0..=90.0).speed(0.1).max_decimals(4));
                ui.label("Lon");
                ui.add(egui::DragValue::new(&mut input.lon).range(-180.0..=180.0).speed(0.1).max_decimals(4));
                if ui.button("Use").clicked() {
                    action = Some(PanelAction::UseObserver(ObserverLocation::new(input.lat, input.lon, 0.0)));
                }
            });
            ui.horizontal(|ui| {
                if cfg!(target_arch = "wasm32") && ui.button("Locate me").clicked() {
                    action = Some(PanelAction::LocateObserver);
                }
                if ui.button("Recompute").clicked() {
                    action = Some(PanelAction::PredictPasses);
                }
            });
            if let Some(elements) = &session.elements {
                ui.weak(format!(
                    "Elements epoch {}, mean altitude {:.0} km",
                    elements.epoch.format("%Y-%m-%d %H:%M UTC"),
                    elements.nominal_altitude_km()
                ));
                egui::CollapsingHeader::new(element_set_title(elements))
                    .id_salt("element_set_lines")
                    .show(ui, |ui| {
                        ui.monospace(&elements.line1);
                        ui.monospace(&elements.line2);
                    });
            }
        });
    action
}

fn shower_row(ui: &mut egui::Ui, status: &ShowerStatus, now: DateTime<Utc>) {
    let s = status.shower;
    ui.label(s.name);
    ui.label(status.peak.format("%b %d").to_string());
    ui.label(format!("{}/h", s.hourly_rate));
    ui.label(s.parent_body);
    if status.is_peak {
        ui.colored_label(egui::Color32::from_rgb(255, 210, 60), "Peak");
    } else if status.is_active(now) {
        ui.label("Active");
    } else {
        ui.label(format!("in {} days", status.days_until_start));
    }
    ui.end_row();
}

pub fn draw_meteor_window(ctx: &egui::Context, open: &mut bool, report: Option<&ShowerReport>, now: DateTime<Utc>) {
    egui::Window::new("Meteor showers")
        .open(open)
        .default_width(420.0)
        .show(ctx, |ui| {
            let Some(report) = report else {
                ui.spinner();
                return;
            };
            if report.active.is_empty() && report.upcoming.is_empty() {
                ui.label("No showers active or starting in the next 60 days.");
                return;
            }
            egui::Grid::new("showers_grid").striped(true).show(ui, |ui| {
                ui.strong("Shower");
                ui.strong("Peak");
                ui.strong("ZHR");
                ui.strong("Parent");
                ui.strong("Status");
                ui.end_row();
                for status in report.active.iter().chain(&report.upcoming) {
                    shower_row(ui, status, now);
                }
            });
        });
}

pub fn draw_about_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("About")
        .open(open)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("ISS Globe");
            ui.label(format!("Tracking NORAD {}", ISS_NORAD_ID));
            ui.label(format!("Version {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")));
            ui.label("Live position, visible passes and sky events for the International Space Station.");
            ui.hyperlink_to("Position: wheretheiss.at", "https://wheretheiss.at/");
            ui.hyperlink_to("Elements: CelesTrak", "https://celestrak.org/");
            ui.hyperlink_to("Geocoding: OpenStreetMap Nominatim", "https://nominatim.openstreetmap.org/");
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn empty_pass_message_follows_window() {
        assert_eq!(no_passes_message(48), "No visible passes in the next 48 hours.");
        assert_eq!(no_passes_message(12), "No visible passes in the next 12 hours.");
    }

    #[test]
    fn trail_summary_counts_fixes() {
        let mut trail = TrailBuffer::with_capacity(3);
        assert_eq!(trail_summary(&trail), None);
        for lon in [10.0, 20.0, 30.0, 40.0] {
            trail.add_point(crate::trail::GeoPoint::new(0.0, lon));
        }
        assert_eq!(trail_summary(&trail).as_deref(), Some("Trail: 3 of 3 fixes"));
    }

    #[test]
    fn element_set_titles() {
        let mut elements = crate::tle::tests::iss_elements();
        assert_eq!(element_set_title(&elements), "ISS (ZARYA) elements");
        elements.name.clear();
        assert_eq!(element_set_title(&elements), "Unnamed object elements");
    }

    #[test]
    fn ages() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(age_label(t + Duration::seconds(4), t), "4s ago");
        assert_eq!(age_label(t + Duration::seconds(130), t), "2m ago");
        assert_eq!(age_label(t, t + Duration::seconds(3)), "0s ago");
    }
}
