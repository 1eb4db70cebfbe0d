//! Parsing of the `aircraft.json` resource into an [`AircraftSnapshot`].
//!
//! Every optional field the decoder may omit is optional here too. Unknown
//! fields are ignored so newer decoder builds keep working.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{ParseError, Position, Resource, Result};

/// A single aircraft entry from the decoder's current aircraft list.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftRecord {
    /// ICAO address as published by the decoder (lowercase hex).
    pub id: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Barometric altitude in feet; surface reports map to 0.
    pub altitude: Option<f64>,
    pub has_multilateration: bool,
    /// Seconds since any message was received from the aircraft.
    pub seen: f64,
    /// Seconds since the position was last updated, when reported.
    pub seen_pos: Option<f64>,
}

impl AircraftRecord {
    pub fn position(&self) -> Option<Position> {
        Position::from_parts(self.lat, self.lon)
    }
}

/// The aircraft document from one successful poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AircraftSnapshot {
    /// Decoder timestamp (epoch seconds) at which the document was written.
    pub timestamp: Option<f64>,
    /// Total Mode S messages processed by the decoder since start-up.
    pub messages: Option<f64>,
    pub aircraft: Vec<AircraftRecord>,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AircraftDocument {
    now: Option<f64>,
    messages: Option<f64>,
    aircraft: Vec<AircraftEntry>,
}

/// Feeds differ in spelling (`hex`/`id`, `seen`/`lastSeen`); each spelling is
/// its own field so an entry carrying both still parses. The dump1090 name wins.
#[derive(Deserialize)]
struct AircraftEntry {
    hex: Option<String>,
    id: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    altitude: Option<Value>,
    alt_baro: Option<Value>,
    mlat: Option<Value>,
    #[serde(rename = "hasMultilateration")]
    has_multilateration: Option<bool>,
    seen: Option<f64>,
    #[serde(rename = "lastSeen")]
    last_seen: Option<f64>,
    seen_pos: Option<f64>,
}

impl AircraftEntry {
    fn into_record(self) -> AircraftRecord {
        let altitude = self
            .altitude
            .as_ref()
            .or(self.alt_baro.as_ref())
            .and_then(altitude_feet);
        let has_multilateration =
            self.has_multilateration.unwrap_or(false) || mlat_covers_position(self.mlat.as_ref());

        AircraftRecord {
            id: self.hex.or(self.id).unwrap_or_default(),
            lat: self.lat,
            lon: self.lon,
            altitude,
            has_multilateration,
            seen: self.seen.or(self.last_seen).unwrap_or(0.0),
            seen_pos: self.seen_pos,
        }
    }
}

/// Altitude is numeric in flight and the string `"ground"` on the surface.
fn altitude_feet(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.eq_ignore_ascii_case("ground") => Some(0.0),
        _ => None,
    }
}

/// `mlat` lists the fields derived by multilateration. Older feeds use a bool.
fn mlat_covers_position(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Array(fields)) => fields.iter().any(|f| f.as_str() == Some("lat")),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Interpret a fetched `aircraft.json` document.
pub fn parse_aircraft(doc: &Value) -> Result<AircraftSnapshot> {
    let parsed = AircraftDocument::deserialize(doc).map_err(|e| ParseError::Schema {
        resource: Resource::Aircraft,
        reason: e.to_string(),
    })?;

    Ok(AircraftSnapshot {
        timestamp: parsed.now,
        messages: parsed.messages,
        aircraft: parsed
            .aircraft
            .into_iter()
            .map(AircraftEntry::into_record)
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
