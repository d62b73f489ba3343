mod app;
mod config;
mod drawing;
mod error;
mod feeds;
mod geo;
mod location;
mod meteor;
mod net;
mod panels;
mod pass;
mod scheduler;
mod session;
mod solar;
mod stats;
mod telemetry;
mod time;
mod tle;
mod trail;

use app::App;
use config::TrackerConfig;
#[cfg(not(target_arch = "wasm32"))]
use eframe::egui;

#[cfg(target_arch = "wasm32")]
use eframe::wasm_bindgen::JsCast;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrackerConfig::from_env();
    log::info!("starting iss-globe {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1400.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ISS Globe",
        options,
        Box::new(|_cc| Ok(Box::new(App::new(config)))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("canvas")
            .expect("No canvas element")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("Not a canvas");

        let web_options = eframe::WebOptions::default();
        eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|_cc| Ok(Box::new(App::new(TrackerConfig::default())))),
            )
            .await
            .expect("Failed to start eframe");
    });
}
