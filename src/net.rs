//! HTTP plumbing shared by all feeds.
//!
//! A `TwoStage` feed tries its primary endpoint and only moves on to the
//! fallback when the failure kind is transient. Requests run on worker
//! threads natively and as `spawn_local` futures on wasm32; either way
//! the results land in the `FetchQueue` and are drained by the frame loop.

use eframe::egui;

use crate::error::{FetchError, LocationError};
use crate::feeds::{self, CrewManifest, PositionFix};
use crate::geo::{self, LocationLabel};
use crate::location::{self, ObserverLocation};
use crate::tle::ElementSet;
use crate::trail::GeoPoint;

pub struct Endpoint<T> {
    pub url: String,
    pub parse: fn(&str) -> Result<T, FetchError>,
}

impl<T> Endpoint<T> {
    pub fn new(url: impl Into<String>, parse: fn(&str) -> Result<T, FetchError>) -> Self {
        Self { url: url.into(), parse }
    }

    pub fn resolve_with<G>(&self, mut get: G) -> Result<T, FetchError>
    where
        G: FnMut(&str) -> Result<String, FetchError>,
    {
        get(&self.url).and_then(|body| (self.parse)(&body))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn fetch_blocking(&self) -> Result<T, FetchError> {
        self.resolve_with(fetch_text_blocking)
    }

    #[cfg(target_arch = "wasm32")]
    pub async fn fetch(&self) -> Result<T, FetchError> {
        let body = fetch_text(&self.url).await?;
        (self.parse)(&body)
    }
}

pub struct TwoStage<T> {
    pub primary: Endpoint<T>,
    pub fallback: Endpoint<T>,
}

impl<T> TwoStage<T> {
    pub fn resolve_with<G>(&self, mut get: G) -> Result<T, FetchError>
    where
        G: FnMut(&str) -> Result<String, FetchError>,
    {
        match self.primary.resolve_with(&mut get) {
            Ok(value) => Ok(value),
            Err(e) if e.is_transient() => {
                log::warn!("{} failed ({}), trying {}", self.primary.url, e, self.fallback.url);
                self.fallback.resolve_with(&mut get)
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn fetch_blocking(&self) -> Result<T, FetchError> {
        self.resolve_with(fetch_text_blocking)
    }

    #[cfg(target_arch = "wasm32")]
    pub async fn fetch(&self) -> Result<T, FetchError> {
        match self.primary.fetch().await {
            Ok(value) => Ok(value),
            Err(e) if e.is_transient() => {
                log::warn!("{} failed ({}), trying {}", self.primary.url, e, self.fallback.url);
                self.fallback.fetch().await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_text_blocking(url: &str) -> Result<String, FetchError> {
    let response = ureq::get(url)
        .set("User-Agent", crate::config::USER_AGENT)
        .timeout(std::time::Duration::from_secs(10))
        .call()
        .map_err(|e| match e {
            ureq::Error::Status(code, _) => FetchError::Status(code),
            ureq::Error::Transport(t) => FetchError::Network(t.to_string()),
        })?;

    let body = response
        .into_string()
        .map_err(|e| FetchError::Network(format!("read error: {}", e)))?;
    if body.trim().is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(body)
}

#[cfg(target_arch = "wasm32")]
pub async fn fetch_text(url: &str) -> Result<String, FetchError> {
    use wasm_bindgen::JsCast as _;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| FetchError::Network(format!("{:?}", e)))?;

    let window = web_sys::window().ok_or_else(|| FetchError::Unavailable("no window".to_string()))?;
    let resp_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| FetchError::Network(format!("{:?}", e)))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| FetchError::Decode("response is not a Response".to_string()))?;

    if !resp.ok() {
        return Err(FetchError::Status(resp.status()));
    }

    let text = wasm_bindgen_futures::JsFuture::from(
        resp.text().map_err(|e| FetchError::Network(format!("{:?}", e)))?,
    )
    .await
    .map_err(|e| FetchError::Network(format!("{:?}", e)))?;

    let body = text.as_string().unwrap_or_default();
    if body.trim().is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(body)
}

pub enum FetchEvent {
    Position { seq: u64, result: Result<PositionFix, FetchError> },
    Crew(Result<CrewManifest, FetchError>),
    Geocode { seq: u64, point: GeoPoint, result: Result<LocationLabel, FetchError> },
    Elements(Result<ElementSet, FetchError>),
    Location(Result<ObserverLocation, LocationError>),
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static FETCH_RESULTS: std::cell::RefCell<Vec<FetchEvent>> = std::cell::RefCell::new(Vec::new());
}

pub struct FetchQueue {
    #[cfg(not(target_arch = "wasm32"))]
    tx: std::sync::mpsc::Sender<FetchEvent>,
    #[cfg(not(target_arch = "wasm32"))]
    rx: std::sync::mpsc::Receiver<FetchEvent>,
    next_seq: u64,
}

impl Default for FetchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchQueue {
    pub fn new() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            tx,
            #[cfg(not(target_arch = "wasm32"))]
            rx,
            next_seq: 0,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Completed requests, in completion order.
    pub fn drain(&self) -> Vec<FetchEvent> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.rx.try_iter().collect()
        }
        #[cfg(target_arch = "wasm32")]
        {
            FETCH_RESULTS.with(|cell| cell.borrow_mut().drain(..).collect())
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn<F>(&self, ctx: &egui::Context, job: F)
    where
        F: FnOnce() -> FetchEvent + Send + 'static,
    {
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(job());
            ctx.request_repaint();
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn<Fut>(&self, ctx: &egui::Context, job: Fut)
    where
        Fut: std::future::Future<Output = FetchEvent> + 'static,
    {
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let event = job.await;
            FETCH_RESULTS.with(|cell| cell.borrow_mut().push(event));
            ctx.request_repaint();
        });
    }

    pub fn request_position(&mut self, ctx: &egui::Context) -> u64 {
        let seq = self.bump_seq();
        #[cfg(not(target_arch = "wasm32"))]
        self.spawn(ctx, move || FetchEvent::Position { seq, result: feeds::position_feed().fetch_blocking() });
        #[cfg(target_arch = "wasm32")]
        self.spawn(ctx, async move { FetchEvent::Position { seq, result: feeds::position_feed().fetch().await } });
        seq
    }

    pub fn request_crew(&mut self, ctx: &egui::Context) {
        #[cfg(not(target_arch = "wasm32"))]
        self.spawn(ctx, || FetchEvent::Crew(feeds::crew_feed().fetch_blocking()));
        #[cfg(target_arch = "wasm32")]
        self.spawn(ctx, async { FetchEvent::Crew(feeds::crew_feed().fetch().await) });
    }

    pub fn request_geocode(&mut self, ctx: &egui::Context, point: GeoPoint) -> u64 {
        let seq = self.bump_seq();
        let endpoint = Endpoint::new(geo::reverse_geocode_url(point), geo::parse_reverse_geocode);
        #[cfg(not(target_arch = "wasm32"))]
        self.spawn(ctx, move || FetchEvent::Geocode { seq, point, result: endpoint.fetch_blocking() });
        #[cfg(target_arch = "wasm32")]
        self.spawn(ctx, async move { FetchEvent::Geocode { seq, point, result: endpoint.fetch().await } });
        seq
    }

    pub fn request_elements(&mut self, ctx: &egui::Context) {
        log::info!("fetching element set");
        #[cfg(not(target_arch = "wasm32"))]
        self.spawn(ctx, || FetchEvent::Elements(feeds::element_set_feed().fetch_blocking()));
        #[cfg(target_arch = "wasm32")]
        self.spawn(ctx, async { FetchEvent::Elements(feeds::element_set_feed().fetch().await) });
    }

    pub fn request_location(&mut self, ctx: &egui::Context) {
        #[cfg(not(target_arch = "wasm32"))]
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        location::request_location(move |result| {
            #[cfg(not(target_arch = "wasm32"))]
            let _ = tx.send(FetchEvent::Location(result));
            #[cfg(target_arch = "wasm32")]
            FETCH_RESULTS.with(|cell| cell.borrow_mut().push(FetchEvent::Location(result)));
            ctx.request_repaint();
        });
    }
}
