//! dump1090-core: turns dump1090 JSON snapshots into Prometheus samples.
//!
//! No async and no network I/O. Parsing, derived metrics and rendering live
//! here; the `dump1090-exporter` crate supplies the fetchers, poll loops and
//! HTTP endpoint around them.

pub mod aircraft;
pub mod range;
pub mod receiver;
pub mod render;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use aircraft::{parse_aircraft, AircraftRecord, AircraftSnapshot};
pub use range::{aircraft_samples, haversine_m, summarize, RangeSummary};
pub use receiver::{parse_receiver, ReceiverInfo, ReceiverIntervals, ReceiverPhase, ReceiverTracker};
pub use render::RenderError;
pub use stats::flatten_stats;
pub use store::MetricStore;
pub use types::*;
