//! Prometheus text exposition (format 0.0.4).
//!
//! Samples are grouped into `prometheus` metric families ordered by metric
//! name, then by label set, and written with the crate's [`TextEncoder`]. The
//! same samples always yield the same bytes regardless of input order.

use std::collections::BTreeMap;

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};
use thiserror::Error;

use crate::types::{Labels, MetricKind, MetricSample};

/// Content type served alongside the rendered text.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),

    #[error("encoded metrics are not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

struct Family<'a> {
    help: &'a str,
    kind: MetricKind,
    series: BTreeMap<&'a Labels, f64>,
}

/// Samples grouped by metric name, ready to be encoded.
pub struct Exposition<'a> {
    families: BTreeMap<&'a str, Family<'a>>,
}

impl<'a> Exposition<'a> {
    /// Group samples by name. The first help/kind seen for a name is kept and
    /// a repeated (name, labels) pair keeps the last value.
    pub fn new(samples: impl IntoIterator<Item = &'a MetricSample>) -> Self {
        let mut families: BTreeMap<&'a str, Family<'a>> = BTreeMap::new();
        for s in samples {
            families
                .entry(s.name.as_str())
                .or_insert_with(|| Family {
                    help: &s.help,
                    kind: s.kind,
                    series: BTreeMap::new(),
                })
                .series
                .insert(&s.labels, s.value);
        }
        Exposition { families }
    }

    /// Metric families in exposition order.
    pub fn families(&self) -> Vec<MetricFamily> {
        self.families
            .iter()
            .map(|(name, family)| to_proto(name, family))
            .collect()
    }

    pub fn encode(&self) -> Result<String, RenderError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.families(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Render samples as exposition text.
pub fn render<'a>(
    samples: impl IntoIterator<Item = &'a MetricSample>,
) -> Result<String, RenderError> {
    Exposition::new(samples).encode()
}

fn to_proto(name: &str, family: &Family<'_>) -> MetricFamily {
    let mut mf = MetricFamily::default();
    mf.set_name(name.to_string());
    mf.set_help(family.help.to_string());
    mf.set_field_type(match family.kind {
        MetricKind::Counter => MetricType::COUNTER,
        MetricKind::Gauge => MetricType::GAUGE,
    });

    for (labels, value) in &family.series {
        let mut metric = Metric::default();
        let pairs: Vec<LabelPair> = labels
            .iter()
            .map(|(key, value)| {
                let mut pair = LabelPair::default();
                pair.set_name(key.clone());
                pair.set_value(value.clone());
                pair
            })
            .collect();
        metric.set_label(pairs.into());

        match family.kind {
            MetricKind::Counter => {
                let mut counter = Counter::default();
                counter.set_value(*value);
                metric.set_counter(counter);
            }
            MetricKind::Gauge => {
                let mut gauge = Gauge::default();
                gauge.set_value(*value);
                metric.set_gauge(gauge);
            }
        }
        mf.mut_metric().push(metric);
    }

    mf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
