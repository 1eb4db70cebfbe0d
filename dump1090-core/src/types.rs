//! Shared types, error enum, and metric sample model for dump1090-core.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Namespace prefixed onto every exported metric name.
pub const METRIC_PREFIX: &str = "dump1090";

/// Errors raised while interpreting a dump1090 JSON document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON in {resource}: {source}")]
    Json {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected document shape in {resource}: {reason}")]
    Schema { resource: Resource, reason: String },
    #[error("unknown time period: {0}")]
    UnknownTimePeriod(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// One of the JSON documents published by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Receiver,
    Aircraft,
    Stats,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Receiver, Resource::Aircraft, Resource::Stats];

    /// File name of the resource relative to the decoder's data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Receiver => "receiver.json",
            Resource::Aircraft => "aircraft.json",
            Resource::Stats => "stats.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Receiver => "receiver",
            Resource::Aircraft => "aircraft",
            Resource::Stats => "stats",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time periods
// ---------------------------------------------------------------------------

/// Aggregation windows present in `stats.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimePeriod {
    Latest,
    Last1Min,
    Last5Min,
    Last15Min,
    Total,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 5] = [
        TimePeriod::Latest,
        TimePeriod::Last1Min,
        TimePeriod::Last5Min,
        TimePeriod::Last15Min,
        TimePeriod::Total,
    ];

    /// Key used in the stats document and in the `time_period` label.
    pub fn key(self) -> &'static str {
        match self {
            TimePeriod::Latest => "latest",
            TimePeriod::Last1Min => "last1min",
            TimePeriod::Last5Min => "last5min",
            TimePeriod::Last15Min => "last15min",
            TimePeriod::Total => "total",
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TimePeriod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        TimePeriod::ALL
            .into_iter()
            .find(|p| p.key() == s.trim())
            .ok_or_else(|| ParseError::UnknownTimePeriod(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Position { lat, lon }
    }

    /// Build a position only when both coordinates are present.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Position { lat, lon }),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Metric samples
// ---------------------------------------------------------------------------

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Label set. Keys are unique and iterate in sorted order.
pub type Labels = BTreeMap<String, String>;

/// One exported value: a metric name, its label set, and the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub labels: Labels,
    pub value: f64,
}

impl MetricSample {
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        MetricSample {
            name: name.into(),
            help: help.into(),
            kind: MetricKind::Gauge,
            labels: Labels::new(),
            value,
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        MetricSample {
            kind: MetricKind::Counter,
            ..MetricSample::gauge(name, help, value)
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Prefix a bare metric name with the exporter namespace.
pub fn metric_name(suffix: &str) -> String {
    format!("{METRIC_PREFIX}_{suffix}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
