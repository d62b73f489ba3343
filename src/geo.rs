//! Reverse geocoding of the ground point under the station.
//!
//! Nominatim answers for land; over water (or on any failure) a coarse
//! offline table of lat/lon boxes names the ocean or region instead.

use crate::config::REVERSE_GEOCODE_URL;
use crate::error::FetchError;
use crate::trail::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelSource {
    Service,
    Offline,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocationLabel {
    pub name: String,
    pub detail: Option<String>,
    pub source: LabelSource,
}

pub fn reverse_geocode_url(point: GeoPoint) -> String {
    format!(
        "{}?format=json&lat={:.4}&lon={:.4}&zoom=5&accept-language=en",
        REVERSE_GEOCODE_URL, point.lat, point.lon
    )
}

fn first_str<'a>(obj: &'a serde_json::Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj[*k].as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

pub fn parse_reverse_geocode(json: &str) -> Result<LocationLabel, FetchError> {
    let v: serde_json::Value = serde_json::from_str(json)?;
    if let Some(err) = v["error"].as_str() {
        return Err(FetchError::Decode(err.to_string()));
    }
    let address = &v["address"];

    if let Some(water) = first_str(address, &["ocean", "sea"]) {
        return Ok(LocationLabel { name: water.to_string(), detail: None, source: LabelSource::Service });
    }

    let locality = first_str(address, &["city", "town", "village", "municipality", "county"]);
    let region = first_str(address, &["state", "region"]);
    let country = first_str(address, &["country"]);

    let name = match (locality, region, country) {
        (Some(l), _, Some(c)) => format!("{}, {}", l, c),
        (None, Some(r), Some(c)) => format!("{}, {}", r, c),
        (_, _, Some(c)) => c.to_string(),
        (Some(l), _, None) => l.to_string(),
        (None, Some(r), None) => r.to_string(),
        (None, None, None) => match v["display_name"].as_str().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => return Err(FetchError::Decode("no usable address".to_string())),
        },
    };
    let detail = v["display_name"].as_str().map(str::to_string).filter(|d| *d != name);
    Ok(LocationLabel { name, detail, source: LabelSource::Service })
}

struct Region {
    name: &'static str,
    lat: (f64, f64),
    lon: (f64, f64),
}

const fn region(name: &'static str, lat: (f64, f64), lon: (f64, f64)) -> Region {
    Region { name, lat, lon }
}

// First match wins, so smaller land boxes come before the oceans around them.
const REGIONS: &[Region] = &[
    region("Antarctica", (-90.0, -60.0), (-180.0, 180.0)),
    region("Arctic Ocean", (66.0, 90.0), (-180.0, 180.0)),
    region("Mediterranean Sea", (30.0, 46.0), (-6.0, 36.0)),
    region("Europe", (36.0, 71.0), (-10.0, 40.0)),
    region("North Africa", (15.0, 36.0), (-17.0, 35.0)),
    region("Sub-Saharan Africa", (-35.0, 15.0), (-17.0, 51.0)),
    region("Middle East", (12.0, 42.0), (35.0, 60.0)),
    region("Russia", (42.0, 66.0), (40.0, 180.0)),
    region("South Asia", (5.0, 36.0), (60.0, 92.0)),
    region("East Asia", (18.0, 42.0), (92.0, 146.0)),
    region("Southeast Asia", (-11.0, 18.0), (92.0, 141.0)),
    region("Australia", (-44.0, -11.0), (113.0, 154.0)),
    region("North America", (15.0, 66.0), (-168.0, -52.0)),
    region("Central America", (7.0, 15.0), (-92.0, -77.0)),
    region("South America", (-56.0, 12.0), (-82.0, -34.0)),
    region("Southern Ocean", (-90.0, -45.0), (-180.0, 180.0)),
    region("Indian Ocean", (-45.0, 25.0), (20.0, 120.0)),
    region("Atlantic Ocean", (-45.0, 66.0), (-70.0, 20.0)),
    region("Pacific Ocean", (-45.0, 66.0), (120.0, 180.0)),
    region("Pacific Ocean", (-45.0, 66.0), (-180.0, -70.0)),
];

/// Deterministic offline guess; always yields a label.
pub fn approximate_region(point: GeoPoint) -> LocationLabel {
    let name = REGIONS
        .iter()
        .find(|r| {
            point.lat >= r.lat.0 && point.lat <= r.lat.1 && point.lon >= r.lon.0 && point.lon <= r.lon.1
        })
        .map(|r| r.name)
        .unwrap_or("Open ocean");
    LocationLabel { name: name.to_string(), detail: None, source: LabelSource::Offline }
}

/// Falls back to the offline table on any geocoding failure.
pub fn resolve_label(result: Result<LocationLabel, FetchError>, point: GeoPoint) -> LocationLabel {
    match result {
        Ok(label) => label,
        Err(e) => {
            log::debug!("reverse geocode failed ({}), using offline regions", e);
            approximate_region(point)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_and_country() {
        let json = r#"{"display_name":"Lyon, Auvergne-Rhône-Alpes, France","address":{"city":"Lyon","state":"Auvergne-Rhône-Alpes","country":"France"}}"#;
        let label = parse_reverse_geocode(json).unwrap();
        assert_eq!(label.name, "Lyon, France");
        assert_eq!(label.source, LabelSource::Service);
        assert_eq!(label.detail.as_deref(), Some("Lyon, Auvergne-Rhône-Alpes, France"));
    }

    #[test]
    fn region_when_no_locality() {
        let json = r#"{"address":{"state":"Northern Territory","country":"Australia"}}"#;
        assert_eq!(parse_reverse_geocode(json).unwrap().name, "Northern Territory, Australia");
    }

    #[test]
    fn ocean_wins() {
        let json = r#"{"display_name":"Pacific Ocean","address":{"ocean":"Pacific Ocean"}}"#;
        assert_eq!(parse_reverse_geocode(json).unwrap().name, "Pacific Ocean");
    }

    #[test]
    fn service_error_is_failure() {
        assert!(parse_reverse_geocode(r#"{"error":"Unable to geocode"}"#).is_err());
        assert!(parse_reverse_geocode(r#"{"address":{}}"#).is_err());
        assert!(parse_reverse_geocode("not json").is_err());
    }

    #[test]
    fn offline_table() {
        assert_eq!(approximate_region(GeoPoint::new(48.0, 2.0)).name, "Europe");
        assert_eq!(approximate_region(GeoPoint::new(-25.0, 134.0)).name, "Australia");
        assert_eq!(approximate_region(GeoPoint::new(0.0, -150.0)).name, "Pacific Ocean");
        assert_eq!(approximate_region(GeoPoint::new(0.0, -30.0)).name, "Atlantic Ocean");
        assert_eq!(approximate_region(GeoPoint::new(-20.0, 80.0)).name, "Indian Ocean");
        assert_eq!(approximate_region(GeoPoint::new(-75.0, 0.0)).name, "Antarctica");
        assert_eq!(approximate_region(GeoPoint::new(38.0, 18.0)).name, "Mediterranean Sea");
    }

    #[test]
    fn offline_always_labels() {
        for lat in (-90..=90).step_by(5) {
            for lon in (-175..=180).step_by(5) {
                let label = approximate_region(GeoPoint::new(lat as f64, lon as f64));
                assert!(!label.name.is_empty());
                assert_eq!(label.source, LabelSource::Offline);
            }
        }
    }

    #[test]
    fn failure_resolves_offline() {
        let label = resolve_label(Err(FetchError::Status(429)), GeoPoint::new(-20.0, 80.0));
        assert_eq!(label.source, LabelSource::Offline);
        assert_eq!(label.name, "Indian Ocean");
    }

    #[test]
    fn url_has_coordinates() {
        let url = reverse_geocode_url(GeoPoint::new(12.5, -45.25));
        assert!(url.contains("lat=12.5000") && url.contains("lon=-45.2500"));
    }
}
