//! Receiver location: parsing `receiver.json` and the origin state machine.
//!
//! The receiver poll starts in [`ReceiverPhase::Seeking`] and polls often
//! until a coordinate pair is known, then moves to [`ReceiverPhase::Locked`]
//! and polls rarely. Locked is terminal.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::types::{metric_name, MetricSample, ParseError, Position, Resource, Result};

/// Location published by the decoder in `receiver.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReceiverInfo {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl ReceiverInfo {
    pub fn is_set(&self) -> bool {
        self.position().is_some()
    }

    pub fn position(&self) -> Option<Position> {
        Position::from_parts(self.lat, self.lon)
    }
}

#[derive(Deserialize)]
struct ReceiverDocument {
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Interpret a fetched `receiver.json` document.
pub fn parse_receiver(doc: &Value) -> Result<ReceiverInfo> {
    let parsed = ReceiverDocument::deserialize(doc).map_err(|e| ParseError::Schema {
        resource: Resource::Receiver,
        reason: e.to_string(),
    })?;
    Ok(ReceiverInfo {
        lat: parsed.lat,
        lon: parsed.lon,
    })
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Receiver polling phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverPhase {
    Seeking,
    Locked,
}

/// Poll intervals for each receiver phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverIntervals {
    pub seeking: Duration,
    pub locked: Duration,
}

impl Default for ReceiverIntervals {
    fn default() -> Self {
        ReceiverIntervals {
            seeking: Duration::from_secs(10),
            locked: Duration::from_secs(300),
        }
    }
}

/// Outcome of feeding one successful receiver poll into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Phase did not change.
    Unchanged,
    /// Moved from Seeking to Locked on this poll.
    Locked,
}

/// Tracks the receiver origin and the polling phase.
#[derive(Debug, Clone)]
pub struct ReceiverTracker {
    phase: ReceiverPhase,
    override_position: Option<Position>,
    polled: Option<Position>,
    intervals: ReceiverIntervals,
}

impl ReceiverTracker {
    pub fn new(override_position: Option<Position>, intervals: ReceiverIntervals) -> Self {
        ReceiverTracker {
            phase: ReceiverPhase::Seeking,
            override_position,
            polled: None,
            intervals,
        }
    }

    pub fn phase(&self) -> ReceiverPhase {
        self.phase
    }

    /// Interval to wait before the next receiver poll.
    pub fn interval(&self) -> Duration {
        match self.phase {
            ReceiverPhase::Seeking => self.intervals.seeking,
            ReceiverPhase::Locked => self.intervals.locked,
        }
    }

    /// Effective origin: the configured override wins over the polled value.
    pub fn origin(&self) -> Option<Position> {
        self.override_position.or(self.polled)
    }

    /// Record a successfully fetched receiver document.
    ///
    /// A null or partial coordinate pair in the document does not erase a
    /// previously polled position.
    pub fn observe(&mut self, info: &ReceiverInfo) -> Transition {
        if let Some(pos) = info.position() {
            self.polled = Some(pos);
        }

        match self.phase {
            ReceiverPhase::Locked => Transition::Unchanged,
            ReceiverPhase::Seeking if self.origin().is_some() => {
                self.phase = ReceiverPhase::Locked;
                Transition::Locked
            }
            ReceiverPhase::Seeking => Transition::Unchanged,
        }
    }

    /// Receiver gauges for the current origin. Empty while no origin is known.
    pub fn samples(&self) -> Vec<MetricSample> {
        match self.origin() {
            Some(pos) => vec![
                MetricSample::gauge(
                    metric_name("receiver_latitude"),
                    "Latitude of the receiver used as the range origin (degrees)",
                    pos.lat,
                ),
                MetricSample::gauge(
                    metric_name("receiver_longitude"),
                    "Longitude of the receiver used as the range origin (degrees)",
                    pos.lon,
                ),
            ],
            None => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
