//! Flattening of `stats.json` into labeled samples.
//!
//! Each numeric leaf becomes one sample named after its path through the
//! document (`dump1090_stats_<key>_<key>...`) and labeled with the enclosing
//! time period. No key whitelist is applied below the period level, so fields
//! added by newer decoder builds are exported as-is.
//!
//! Array leaves (e.g. `local.accepted`, indexed by corrected bit count) expand
//! to one sample per element with an `index` label. Arrays nested inside
//! arrays use `index_1`, `index_2`, and so on. Booleans export as 1/0; strings
//! and nulls are skipped.
//!
//! Distinct paths can flatten to the same series (`local.signal` and
//! `local_signal`). Keys are walked in sorted order and the first series wins;
//! later ones are dropped with a warning.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::{
    metric_name, Labels, MetricSample, ParseError, Resource, Result, TimePeriod,
};

/// Label carrying the stats period.
pub const TIME_PERIOD_LABEL: &str = "time_period";

/// Separator used when joining document keys into a metric name.
pub const PATH_SEPARATOR: char = '_';

const STATS_PREFIX: &str = "stats";

/// Help text for the stats fields dump1090 is known to publish.
const KNOWN_FIELDS: &[(&str, &str)] = &[
    ("messages", "Number of Mode-S messages processed"),
    ("cpr_airborne", "Number of airborne CPR messages received"),
    ("cpr_surface", "Number of surface CPR messages received"),
    ("cpr_filtered", "Number of CPR messages ignored"),
    ("cpr_global_bad", "Global positions that were rejected"),
    ("cpr_global_ok", "Global positions successfully derived"),
    ("cpr_global_range", "Global positions rejected due to receiver max range check"),
    ("cpr_global_skipped", "Global position attempts skipped due to missing data"),
    ("cpr_global_speed", "Global positions rejected due to speed check"),
    ("cpr_local_aircraft_relative", "Local positions found relative to a previous aircraft position"),
    ("cpr_local_ok", "Local (relative) positions successfully found"),
    ("cpr_local_range", "Local positions rejected due to receiver max range check"),
    ("cpr_local_receiver_relative", "Local positions found relative to the receiver position"),
    ("cpr_local_skipped", "Local (relative) positions skipped due to missing data"),
    ("cpr_local_speed", "Local positions rejected due to speed check"),
    ("cpu_background", "Time spent in network I/O, processing and periodic tasks (milliseconds)"),
    ("cpu_demod", "Time spent demodulating and decoding data from the SDR dongle (milliseconds)"),
    ("cpu_reader", "Time spent reading sample data from the SDR dongle (milliseconds)"),
    ("local_accepted", "Number of valid Mode S messages accepted, indexed by corrected bit errors"),
    ("local_signal", "Signal strength (dBFS)"),
    ("local_peak_signal", "Peak signal strength (dBFS)"),
    ("local_noise", "Noise level (dBFS)"),
    ("local_strong_signals", "Number of messages that had a signal power above -3dBFS"),
    ("local_bad", "Number of Mode S preambles that didn't result in a valid message"),
    ("local_modes", "Number of Mode S preambles received"),
    ("local_modeac", "Number of Mode A/C preambles decoded"),
    ("local_samples_dropped", "Number of samples dropped"),
    ("local_samples_processed", "Number of samples processed"),
    ("local_unknown_icao", "Number of Mode S preambles containing unrecognized ICAO"),
    ("remote_accepted", "Number of valid Mode S messages accepted from remote clients, indexed by corrected bit errors"),
    ("remote_bad", "Number of remote Mode S preambles that didn't result in a valid message"),
    ("remote_modeac", "Number of remote Mode A/C preambles decoded"),
    ("remote_modes", "Number of remote Mode S preambles received"),
    ("remote_unknown_icao", "Number of remote Mode S preambles containing unrecognized ICAO"),
    ("tracks_all", "Number of tracks created"),
    ("tracks_single_message", "Number of tracks consisting of only a single message"),
];

/// Help text for a flattened stats path.
pub fn help_for(path: &str) -> String {
    KNOWN_FIELDS
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, help)| (*help).to_string())
        .unwrap_or_else(|| format!("dump1090 statistic '{path}'"))
}

/// Replace characters that are not valid in a metric name.
fn sanitize(key: &str) -> String {
    if key.is_empty() {
        return "_".to_string();
    }
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn index_label(depth: usize) -> String {
    if depth == 0 {
        "index".to_string()
    } else {
        format!("index_{depth}")
    }
}

/// Periods requested for export but absent from the document.
pub fn missing_periods(doc: &Value, periods: &[TimePeriod]) -> Vec<TimePeriod> {
    periods
        .iter()
        .copied()
        .filter(|p| doc.get(p.key()).is_none())
        .collect()
}

/// Flatten the selected periods of a `stats.json` document.
///
/// Missing periods are skipped; see [`missing_periods`]. A document that is
/// not an object, or a period whose value is not an object, is a schema error.
pub fn flatten_stats(doc: &Value, periods: &[TimePeriod]) -> Result<Vec<MetricSample>> {
    let root = doc.as_object().ok_or_else(|| ParseError::Schema {
        resource: Resource::Stats,
        reason: "top level is not an object".into(),
    })?;

    let mut out = Vec::new();
    let mut seen = Vec::with_capacity(periods.len());

    for &period in periods {
        if seen.contains(&period) {
            continue;
        }
        seen.push(period);

        let Some(tree) = root.get(period.key()) else {
            continue;
        };
        if !tree.is_object() {
            return Err(ParseError::Schema {
                resource: Resource::Stats,
                reason: format!("period '{period}' is not an object"),
            });
        }

        let mut labels = Labels::new();
        labels.insert(TIME_PERIOD_LABEL.into(), period.key().into());

        let mut path = Vec::new();
        walk(tree, &mut path, &labels, 0, &mut out);
    }

    Ok(drop_collisions(out))
}

fn drop_collisions(samples: Vec<MetricSample>) -> Vec<MetricSample> {
    let mut series = HashSet::with_capacity(samples.len());
    samples
        .into_iter()
        .filter(|s| {
            let fresh = series.insert((s.name.clone(), s.labels.clone()));
            if !fresh {
                tracing::warn!(
                    metric = %s.name,
                    labels = ?s.labels,
                    dropped = s.value,
                    "stats paths flatten to the same series, keeping the first"
                );
            }
            fresh
        })
        .collect()
}

fn walk(
    value: &Value,
    path: &mut Vec<String>,
    labels: &Labels,
    array_depth: usize,
    out: &mut Vec<MetricSample>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(sanitize(key));
                walk(child, path, labels, array_depth, out);
                path.pop();
            }
        }
        Value::Array(items) => {
            let key = index_label(array_depth);
            for (i, child) in items.iter().enumerate() {
                let mut indexed = labels.clone();
                indexed.insert(key.clone(), i.to_string());
                walk(child, path, &indexed, array_depth + 1, out);
            }
        }
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                out.push(leaf(path, labels, v));
            }
        }
        Value::Bool(b) => out.push(leaf(path, labels, if *b { 1.0 } else { 0.0 })),
        Value::Null | Value::String(_) => {}
    }
}

fn leaf(path: &[String], labels: &Labels, value: f64) -> MetricSample {
    let joined = path.join(&PATH_SEPARATOR.to_string());
    let mut sample = MetricSample::gauge(
        metric_name(&format!("{STATS_PREFIX}{PATH_SEPARATOR}{joined}")),
        help_for(&joined),
        value,
    );
    sample.labels = labels.clone();
    sample
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
