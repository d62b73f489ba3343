//! Live data feeds: station position, crew manifest and element sets.
//!
//! Every feed is a pair of endpoints with their own response formats;
//! the parsers here are pure so they can be exercised without a network.

use chrono::{DateTime, TimeZone, Utc};

use crate::config::{
    CREW_FALLBACK_URL, CREW_PRIMARY_URL, POSITION_FALLBACK_URL, POSITION_PRIMARY_URL,
    TLE_FALLBACK_URL, TLE_PRIMARY_URL,
};
use crate::error::FetchError;
use crate::net::{Endpoint, TwoStage};
use crate::tle::{parse_tle_json, parse_tle_text, ElementSet};
use crate::trail::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixSource {
    Primary,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionFix {
    pub point: GeoPoint,
    pub altitude_km: Option<f64>,
    pub velocity_kmh: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub source: FixSource,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrewMember {
    pub name: String,
    pub craft: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrewManifest {
    /// Aboard the station only.
    pub members: Vec<CrewMember>,
    /// Everyone currently in space, any craft.
    pub total_in_space: usize,
}

/// Accepts numbers and numeric strings, as open-notify sends strings.
fn number(v: &serde_json::Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn timestamp_or_now(v: &serde_json::Value) -> DateTime<Utc> {
    v.as_i64()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}

fn coordinates(lat: &serde_json::Value, lon: &serde_json::Value) -> Result<GeoPoint, FetchError> {
    let lat = number(lat).ok_or_else(|| FetchError::Decode("missing latitude".to_string()))?;
    let lon = number(lon).ok_or_else(|| FetchError::Decode("missing longitude".to_string()))?;
    if !(-90.0..=90.0).contains(&lat) || !lon.is_finite() {
        return Err(FetchError::Decode(format!("coordinates out of range: {lat}, {lon}")));
    }
    Ok(GeoPoint::new(lat, lon))
}

/// `{latitude, longitude, altitude, velocity, timestamp}` with altitude in
/// km and velocity in km/h.
pub fn parse_primary_position(json: &str) -> Result<PositionFix, FetchError> {
    let v: serde_json::Value = serde_json::from_str(json)?;
    Ok(PositionFix {
        point: coordinates(&v["latitude"], &v["longitude"])?,
        altitude_km: number(&v["altitude"]).or_else(|| number(&v["altitude_km"])),
        velocity_kmh: number(&v["velocity"]).or_else(|| number(&v["velocity_kmh"])),
        timestamp: timestamp_or_now(&v["timestamp"]),
        source: FixSource::Primary,
    })
}

/// `{iss_position: {latitude, longitude}, timestamp}`; no altitude or velocity.
pub fn parse_fallback_position(json: &str) -> Result<PositionFix, FetchError> {
    let v: serde_json::Value = serde_json::from_str(json)?;
    let pos = &v["iss_position"];
    if pos.is_null() {
        return Err(FetchError::Decode("missing iss_position".to_string()));
    }
    Ok(PositionFix {
        point: coordinates(&pos["latitude"], &pos["longitude"])?,
        altitude_km: None,
        velocity_kmh: None,
        timestamp: timestamp_or_now(&v["timestamp"]),
        source: FixSource::Fallback,
    })
}

/// Handles both `{name, craft}` and `{name, iss: bool, spacecraft}` entries.
pub fn parse_crew(json: &str) -> Result<CrewManifest, FetchError> {
    let v: serde_json::Value = serde_json::from_str(json)?;
    let people = v["people"].as_array().ok_or_else(|| FetchError::Decode("no people".to_string()))?;

    let members: Vec<CrewMember> = people
        .iter()
        .filter_map(|p| {
            let name = p["name"].as_str()?.trim().to_string();
            let craft = p["craft"]
                .as_str()
                .or_else(|| p["station"].as_str())
                .or_else(|| p["spacecraft"].as_str())
                .unwrap_or_default()
                .to_string();
            let aboard = p["iss"].as_bool().unwrap_or(false)
                || p["craft"].as_str() == Some("ISS")
                || p["station"].as_str() == Some("ISS");
            (aboard && !name.is_empty()).then_some(CrewMember { name, craft })
        })
        .collect();

    let total_in_space = v["number"].as_u64().map(|n| n as usize).unwrap_or(people.len());
    Ok(CrewManifest { members, total_in_space })
}

fn parse_tle_text_now(data: &str) -> Result<ElementSet, FetchError> {
    parse_tle_text(data, Utc::now())
}

fn parse_tle_json_now(data: &str) -> Result<ElementSet, FetchError> {
    parse_tle_json(data, Utc::now())
}

pub fn position_feed() -> TwoStage<PositionFix> {
    TwoStage {
        primary: Endpoint::new(POSITION_PRIMARY_URL, parse_primary_position),
        fallback: Endpoint::new(POSITION_FALLBACK_URL, parse_fallback_position),
    }
}

pub fn crew_feed() -> TwoStage<CrewManifest> {
    TwoStage {
        primary: Endpoint::new(CREW_PRIMARY_URL, parse_crew),
        fallback: Endpoint::new(CREW_FALLBACK_URL, parse_crew),
    }
}

pub fn element_set_feed() -> TwoStage<ElementSet> {
    TwoStage {
        primary: Endpoint::new(TLE_PRIMARY_URL, parse_tle_text_now),
        fallback: Endpoint::new(TLE_FALLBACK_URL, parse_tle_json_now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_position() {
        let json = r#"{"name":"iss","id":25544,"latitude":-12.5,"longitude":170.25,"altitude":418.2,"velocity":27580.1,"visibility":"daylight","timestamp":1700000000}"#;
        let fix = parse_primary_position(json).unwrap();
        assert_eq!(fix.point, GeoPoint::new(-12.5, 170.25));
        assert_eq!(fix.altitude_km, Some(418.2));
        assert_eq!(fix.velocity_kmh, Some(27580.1));
        assert_eq!(fix.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(fix.source, FixSource::Primary);
    }

    #[test]
    fn fallback_position_with_string_numbers() {
        let json = r#"{"message":"success","timestamp":1700000005,"iss_position":{"latitude":"51.2040","longitude":"-179.9"}}"#;
        let fix = parse_fallback_position(json).unwrap();
        assert_eq!(fix.point, GeoPoint::new(51.204, -179.9));
        assert_eq!(fix.altitude_km, None);
        assert_eq!(fix.velocity_kmh, None);
        assert_eq!(fix.source, FixSource::Fallback);
    }

    #[test]
    fn malformed_positions() {
        assert!(parse_primary_position(r#"{"latitude":"north"}"#).is_err());
        assert!(parse_primary_position(r#"{"latitude":95,"longitude":0}"#).is_err());
        assert!(parse_fallback_position(r#"{"message":"success"}"#).is_err());
        assert!(parse_fallback_position("").is_err());
    }

    #[test]
    fn crew_by_craft() {
        let json = r#"{"message":"success","number":3,"people":[{"name":"A","craft":"ISS"},{"name":"B","craft":"Tiangong"},{"name":"C","craft":"ISS"}]}"#;
        let crew = parse_crew(json).unwrap();
        assert_eq!(crew.total_in_space, 3);
        assert_eq!(crew.members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(), vec!["A", "C"]);
    }

    #[test]
    fn crew_by_flag() {
        let json = r#"{"number":2,"people":[{"name":"D","iss":true,"spacecraft":"Crew-9"},{"name":"E","iss":false,"spacecraft":"Shenzhou 19"}]}"#;
        let crew = parse_crew(json).unwrap();
        assert_eq!(crew.members, vec![CrewMember { name: "D".into(), craft: "Crew-9".into() }]);
        assert_eq!(crew.total_in_space, 2);
    }

    #[test]
    fn crew_without_people_fails() {
        assert!(matches!(parse_crew(r#"{"number":0}"#), Err(FetchError::Decode(_))));
    }

    #[test]
    fn feeds_point_at_distinct_sources() {
        let feed = position_feed();
        assert_ne!(feed.primary.url, feed.fallback.url);
        assert!(element_set_feed().primary.url.contains("CATNR=25544"));
    }
}
