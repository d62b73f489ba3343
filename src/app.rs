//! Application shell and eframe integration.
//!
//! Each frame the app dispatches due scheduler ticks, folds finished
//! fetches into the session and then lays out the map, side panel and
//! drawers.

use chrono::{DateTime, Utc};
use eframe::egui;

use crate::config::TrackerConfig;
use crate::drawing::draw_ground_track;
use crate::net::{FetchEvent, FetchQueue};
use crate::panels::{
    draw_about_window, draw_meteor_window, draw_passes_window, draw_side_panel, ObserverInput, PanelAction,
};
use crate::scheduler::{Scheduler, Tick, TickKind};
use crate::session::{PassAction, PassStatus, Session};

pub(crate) struct App {
    session: Session,
    scheduler: Scheduler,
    fetches: FetchQueue,
    observer_input: ObserverInput,
    show_passes: bool,
    show_meteors: bool,
    show_about: bool,
    show_footprint: bool,
}

impl App {
    pub(crate) fn new(config: TrackerConfig) -> Self {
        let now = Utc::now();
        let observer_input = config
            .observer
            .map(|o| ObserverInput { lat: o.lat, lon: o.lon })
            .unwrap_or_default();
        Self {
            scheduler: Scheduler::new(config.position_poll_seconds),
            session: Session::new(config, now),
            fetches: FetchQueue::new(),
            observer_input,
            show_passes: false,
            show_meteors: false,
            show_about: false,
            show_footprint: true,
        }
    }

    fn dispatch_ticks(&mut self, ctx: &egui::Context, now: DateTime<Utc>) {
        for kind in self.scheduler.due(now) {
            match kind {
                TickKind::Position => {
                    self.fetches.request_position(ctx);
                }
                TickKind::Sun => self.session.sun.on_tick(now),
                TickKind::Telemetry => self.session.telemetry.on_tick(now),
                TickKind::Stats => self.session.stats.on_tick(now),
                TickKind::Crew => self.fetches.request_crew(ctx),
            }
        }
    }

    fn apply_fetches(&mut self, ctx: &egui::Context, now: DateTime<Utc>) {
        for event in self.fetches.drain() {
            match event {
                FetchEvent::Position { seq, result } => match result {
                    Ok(fix) => {
                        if self.session.apply_fix(seq, fix) {
                            self.fetches.request_geocode(ctx, fix.point);
                        }
                    }
                    Err(e) => log::warn!("position update #{} failed: {}", seq, e),
                },
                FetchEvent::Crew(result) => self.session.apply_crew(result),
                FetchEvent::Geocode { seq, point, result } => {
                    self.session.apply_label(seq, point, result);
                }
                FetchEvent::Elements(result) => self.session.set_elements(result, now),
                FetchEvent::Location(result) => {
                    if let Ok(o) = &result {
                        self.observer_input = ObserverInput { lat: o.lat, lon: o.lon };
                    }
                    let next = self.session.set_observer(result, now);
                    self.follow_up(ctx, next);
                }
            }
        }
    }

    fn follow_up(&mut self, ctx: &egui::Context, action: PassAction) {
        match action {
            PassAction::Done => {}
            PassAction::Locate => self.fetches.request_location(ctx),
            PassAction::FetchElements => self.fetches.request_elements(ctx),
        }
    }

    fn handle_panel_action(&mut self, ctx: &egui::Context, action: PanelAction, now: DateTime<Utc>) {
        let next = match action {
            PanelAction::PredictPasses => self.session.begin_pass_prediction(now),
            PanelAction::LocateObserver => {
                self.session.passes = PassStatus::Locating;
                PassAction::Locate
            }
            PanelAction::UseObserver(observer) => {
                log::info!("observer set to {:.4}, {:.4}", observer.lat, observer.lon);
                self.session.set_observer(Ok(observer), now)
            }
        };
        self.follow_up(ctx, next);
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Utc::now();
        self.dispatch_ticks(ctx, now);
        self.apply_fetches(ctx, now);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("ISS Globe");
                ui.separator();
                if ui.selectable_label(self.show_passes, "Passes").clicked() {
                    self.show_passes = !self.show_passes;
                    if self.show_passes {
                        let next = self.session.begin_pass_prediction(now);
                        self.follow_up(ctx, next);
                    }
                }
                if ui.selectable_label(self.show_meteors, "Meteor showers").clicked() {
                    self.show_meteors = !self.show_meteors;
                    if self.show_meteors {
                        self.session.showers(now);
                    }
                }
                if ui.button("Refresh").clicked() {
                    self.scheduler.trigger(TickKind::Position);
                    self.scheduler.trigger(TickKind::Crew);
                }
                ui.checkbox(&mut self.show_footprint, "Footprint");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = !self.show_about;
                    }
                    ui.label(now.format("%Y-%m-%d %H:%M:%S UTC").to_string());
                });
            });
        });

        egui::SidePanel::left("details_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    draw_side_panel(ui, &self.session, now);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            draw_ground_track(ui, "ground_track", &self.session, self.show_footprint);
        });

        if self.show_passes {
            let action = draw_passes_window(ctx, &mut self.show_passes, &self.session, &mut self.observer_input);
            if let Some(action) = action {
                self.handle_panel_action(ctx, action, now);
            }
        }
        if self.show_meteors {
            draw_meteor_window(ctx, &mut self.show_meteors, self.session.showers.as_ref(), now);
        }
        draw_about_window(ctx, &mut self.show_about);

        // The sun moves continuously; other tickers only need their deadlines.
        let wait = self
            .scheduler
            .time_until_next(now)
            .and_then(|d| d.to_std().ok())
            .unwrap_or(std::time::Duration::from_secs(1))
            .min(std::time::Duration::from_secs(1));
        ctx.request_repaint_after(wait);
    }
}
