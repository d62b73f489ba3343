//! Observer location for pass prediction.
//!
//! In the browser the position comes from the Geolocation API with a
//! 10 second timeout. Native builds have no such capability and rely on
//! `ISS_OBSERVER` or manual entry in the passes drawer.

use crate::error::LocationError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverLocation {
    pub lat: f64,
    pub lon: f64,
    pub altitude_km: f64,
}

impl ObserverLocation {
    pub fn new(lat: f64, lon: f64, altitude_km: f64) -> Self {
        Self { lat, lon, altitude_km }
    }

    /// Builds a location from platform coordinates, whose altitude is in metres.
    pub fn from_platform(lat: f64, lon: f64, altitude_m: Option<f64>) -> Self {
        Self::new(lat, lon, altitude_m.unwrap_or(0.0) / 1000.0)
    }
}

/// Maps a W3C `GeolocationPositionError.code`.
pub fn location_error_from_code(code: u16, message: String) -> LocationError {
    match code {
        1 => LocationError::Denied,
        3 => LocationError::Timeout,
        _ => LocationError::Unavailable(message),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn request_location<F>(on_result: F)
where
    F: FnOnce(Result<ObserverLocation, LocationError>) + 'static,
{
    on_result(Err(LocationError::Unavailable(
        "no geolocation on this platform; enter coordinates manually".to_string(),
    )));
}

#[cfg(target_arch = "wasm32")]
pub fn request_location<F>(on_result: F)
where
    F: FnOnce(Result<ObserverLocation, LocationError>) + 'static,
{
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast as _;

    let geolocation = match web_sys::window().map(|w| w.navigator().geolocation()) {
        Some(Ok(g)) => g,
        _ => {
            on_result(Err(LocationError::Unavailable("geolocation not supported".to_string())));
            return;
        }
    };

    // Success and error callbacks share the single FnOnce.
    let slot = Rc::new(RefCell::new(Some(on_result)));
    let ok_slot = slot.clone();
    let on_success = Closure::once_into_js(move |pos: web_sys::GeolocationPosition| {
        let coords = pos.coords();
        let location = ObserverLocation::from_platform(coords.latitude(), coords.longitude(), coords.altitude());
        if let Some(cb) = ok_slot.borrow_mut().take() {
            cb(Ok(location));
        }
    });
    let err_slot = slot.clone();
    let on_error = Closure::once_into_js(move |err: web_sys::GeolocationPositionError| {
        if let Some(cb) = err_slot.borrow_mut().take() {
            cb(Err(location_error_from_code(err.code(), err.message())));
        }
    });

    let options = web_sys::PositionOptions::new();
    options.set_timeout(crate::config::LOCATION_TIMEOUT_MS);
    options.set_enable_high_accuracy(false);

    if let Err(e) = geolocation.get_current_position_with_error_callback_and_options(
        on_success.unchecked_ref(),
        Some(on_error.unchecked_ref()),
        &options,
    ) {
        if let Some(cb) = slot.borrow_mut().take() {
            cb(Err(LocationError::Unavailable(format!("{:?}", e))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_altitude_is_metres() {
        let o = ObserverLocation::from_platform(48.1, 11.6, Some(520.0));
        assert_eq!(o.altitude_km, 0.52);
        assert_eq!(ObserverLocation::from_platform(0.0, 0.0, None).altitude_km, 0.0);
    }

    #[test]
    fn error_codes() {
        assert_eq!(location_error_from_code(1, String::new()), LocationError::Denied);
        assert_eq!(location_error_from_code(3, String::new()), LocationError::Timeout);
        assert!(matches!(location_error_from_code(2, "gps".into()), LocationError::Unavailable(m) if m == "gps"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_request_reports_unavailable() {
        let result = std::rc::Rc::new(std::cell::RefCell::new(None));
        let sink = result.clone();
        request_location(move |r| *sink.borrow_mut() = Some(r));
        assert!(matches!(result.borrow().as_ref(), Some(Err(LocationError::Unavailable(_)))));
    }
}
