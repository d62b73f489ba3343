//! Equirectangular ground-track map.
//!
//! Layers, bottom to top: graticule, night shading and terminator, the
//! station's visibility footprint, trail segments, then point markers.

use eframe::egui;
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::config::{EARTH_RADIUS_KM, ISS_NOMINAL_ALTITUDE_KM};
use crate::location::ObserverLocation;
use crate::session::Session;
use crate::solar::{night_bands, terminator};
use crate::trail::{segment, GeoPoint, PathSegment};

pub const COLOR_TRAIL: egui::Color32 = egui::Color32::from_rgb(255, 120, 60);
pub const COLOR_ISS: egui::Color32 = egui::Color32::from_rgb(255, 70, 40);
pub const COLOR_SUN: egui::Color32 = egui::Color32::from_rgb(255, 210, 60);
pub const COLOR_OBSERVER: egui::Color32 = egui::Color32::from_rgb(80, 220, 120);
const COLOR_NIGHT: egui::Color32 = egui::Color32::from_rgba_premultiplied(0, 0, 20, 110);
const COLOR_TERMINATOR: egui::Color32 = egui::Color32::from_rgb(255, 180, 0);
const COLOR_GRID: egui::Color32 = egui::Color32::from_rgb(70, 80, 95);

const TERMINATOR_STEPS: usize = 180;
const FOOTPRINT_STEPS: usize = 72;

/// Horizon circle of a satellite at `altitude_km` above `center`, split at
/// the antimeridian like the trail.
pub fn footprint(center: GeoPoint, altitude_km: f64, steps: usize) -> Vec<PathSegment> {
    let radius = (EARTH_RADIUS_KM / (EARTH_RADIUS_KM + altitude_km.max(0.0))).acos();
    let (lat1, lon1) = (center.lat.to_radians(), center.lon.to_radians());
    let ring = (0..=steps).map(|i| {
        let bearing = 2.0 * std::f64::consts::PI * i as f64 / steps as f64;
        let lat2 = (lat1.sin() * radius.cos() + lat1.cos() * radius.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * radius.sin() * lat1.cos()).atan2(radius.cos() - lat1.sin() * lat2.sin());
        GeoPoint::new(lat2.to_degrees(), lon2.to_degrees())
    });
    segment(ring)
}

fn segment_points(seg: &[GeoPoint]) -> PlotPoints<'static> {
    seg.iter().map(GeoPoint::plot_xy).collect()
}

fn graticule(plot_ui: &mut egui_plot::PlotUi) {
    for lon in (-150..=150).step_by(30) {
        let x = lon as f64;
        plot_ui.line(
            Line::new("", PlotPoints::new(vec![[x, -90.0], [x, 90.0]]))
                .color(COLOR_GRID)
                .width(if lon == 0 { 1.0 } else { 0.5 }),
        );
    }
    for lat in (-60..=60).step_by(30) {
        let y = lat as f64;
        plot_ui.line(
            Line::new("", PlotPoints::new(vec![[-180.0, y], [180.0, y]]))
                .color(COLOR_GRID)
                .width(if lat == 0 { 1.0 } else { 0.5 }),
        );
    }
}

pub fn draw_ground_track(ui: &mut egui::Ui, id: &str, session: &Session, show_footprint: bool) {
    let sun = session.sun.position;
    let observer: Option<ObserverLocation> = session.observer;

    let plot = Plot::new(id)
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .show_axes([true, true])
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .label_formatter(|_, p| format!("{:.1}°, {:.1}°", p.y, p.x));

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(egui_plot::PlotBounds::from_min_max([-180.0, -90.0], [180.0, 90.0]));

        graticule(plot_ui);

        for band in night_bands(&sun, TERMINATOR_STEPS) {
            plot_ui.polygon(
                Polygon::new("", PlotPoints::new(band.to_vec()))
                    .fill_color(COLOR_NIGHT)
                    .stroke(egui::Stroke::NONE),
            );
        }
        plot_ui.line(
            Line::new("", PlotPoints::new(terminator(&sun, TERMINATOR_STEPS)))
                .color(COLOR_TERMINATOR)
                .width(1.5),
        );

        if let (true, Some(fix)) = (show_footprint, session.last_fix) {
            let altitude = fix.altitude_km.unwrap_or(ISS_NOMINAL_ALTITUDE_KM);
            for seg in footprint(fix.point, altitude, FOOTPRINT_STEPS) {
                plot_ui.line(
                    Line::new("", segment_points(&seg))
                        .color(COLOR_ISS.gamma_multiply(0.5))
                        .width(1.0),
                );
            }
        }

        for seg in &session.segments {
            plot_ui.line(Line::new("", segment_points(seg)).color(COLOR_TRAIL).width(2.0));
        }

        let sub = sun.subsolar_point();
        plot_ui.points(
            Points::new("", PlotPoints::new(vec![sub.plot_xy()]))
                .color(COLOR_SUN)
                .radius(7.0)
                .filled(true),
        );

        if let Some(obs) = observer {
            let p = GeoPoint::new(obs.lat, obs.lon);
            plot_ui.points(
                Points::new("", PlotPoints::new(vec![p.plot_xy()]))
                    .color(COLOR_OBSERVER)
                    .shape(egui_plot::MarkerShape::Diamond)
                    .radius(5.0)
                    .filled(true),
            );
        }

        if let Some(p) = session.latest_point() {
            plot_ui.points(
                Points::new("", PlotPoints::new(vec![p.plot_xy()]))
                    .color(COLOR_ISS)
                    .radius(6.0)
                    .filled(true),
            );
            plot_ui.text(
                Text::new("", PlotPoint::new(p.lon, p.lat + 6.0), "ISS")
                    .color(egui::Color32::WHITE),
            );
        }
    });
}
