//! Aircraft counts and receiver range derived from one aircraft snapshot.

use crate::aircraft::AircraftSnapshot;
use crate::types::{metric_name, MetricSample, Position};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6371.0e3;

/// Aircraft not heard from within this many seconds are ignored.
pub const DEFAULT_RECENT_THRESHOLD_SECS: f64 = 15.0;

/// Label value used for all aircraft-derived samples.
const LATEST: &str = "latest";

/// Great-circle distance in metres.
pub fn haversine_m(from: Position, to: Position) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.lon - from.lon).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Aggregate view of the recent aircraft in one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeSummary {
    pub observed: u64,
    pub with_position: u64,
    pub with_mlat: u64,
    /// Furthest positioned aircraft in metres. `None` when no origin is known.
    pub max_range_m: Option<f64>,
}

/// Count recent aircraft and find the furthest positioned one from `origin`.
///
/// An aircraft is observed when `seen < threshold_secs`. It is positioned when
/// it is observed, carries both coordinates, and its position fix (if aged) is
/// recent too, so `with_position` never exceeds `observed`.
pub fn summarize(
    snapshot: &AircraftSnapshot,
    origin: Option<Position>,
    threshold_secs: f64,
) -> RangeSummary {
    let mut summary = RangeSummary {
        max_range_m: origin.map(|_| 0.0),
        ..RangeSummary::default()
    };

    for ac in &snapshot.aircraft {
        if ac.seen >= threshold_secs {
            continue;
        }
        summary.observed += 1;

        let Some(pos) = ac.position() else {
            continue;
        };
        if ac.seen_pos.is_some_and(|age| age >= threshold_secs) {
            continue;
        }

        summary.with_position += 1;
        if ac.has_multilateration {
            summary.with_mlat += 1;
        }
        if let (Some(origin), Some(max)) = (origin, summary.max_range_m.as_mut()) {
            let d = haversine_m(origin, pos);
            if d > *max {
                *max = d;
            }
        }
    }

    summary
}

/// Samples exported for the aircraft resource.
pub fn aircraft_samples(snapshot: &AircraftSnapshot, summary: &RangeSummary) -> Vec<MetricSample> {
    let mut samples = vec![
        MetricSample::gauge(
            metric_name("recent_aircraft_observed"),
            "Number of aircraft recently observed",
            summary.observed as f64,
        ),
        MetricSample::gauge(
            metric_name("recent_aircraft_with_position"),
            "Number of aircraft recently observed with position",
            summary.with_position as f64,
        ),
        MetricSample::gauge(
            metric_name("recent_aircraft_with_multilateration"),
            "Number of aircraft recently observed with multilateration",
            summary.with_mlat as f64,
        ),
    ];

    if let Some(max) = summary.max_range_m {
        samples.push(MetricSample::gauge(
            metric_name("aircraft_recent_max_range"),
            "Maximum range of recently observed aircraft (metres)",
            max,
        ));
    }

    if let Some(messages) = snapshot.messages {
        samples.push(MetricSample::counter(
            metric_name("messages_total"),
            "Number of Mode-S messages processed since start up",
            messages,
        ));
    }

    samples
        .into_iter()
        .map(|s| s.with_label("time_period", LATEST))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
