//! Command-line configuration.
//!
//! Every flag can also be supplied through an environment variable, which is
//! convenient when running under a container or service manager.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use dump1090_core::{Position, ReceiverIntervals, TimePeriod};

use crate::error::ConfigError;
use crate::poller::PollerConfig;

pub const DEFAULT_RESOURCE_PATH: &str = "http://localhost:8080/data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9105;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dump1090exporter",
    version,
    about = "Prometheus exporter for dump1090 receiver, aircraft and statistics data"
)]
pub struct Cli {
    /// dump1090 data URL or directory containing receiver.json, aircraft.json and stats.json
    #[arg(long, env = "DUMP1090_RESOURCE_PATH", default_value = DEFAULT_RESOURCE_PATH)]
    pub resource_path: String,

    /// Address to serve metrics on
    #[arg(long, env = "DUMP1090_EXPORTER_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to serve metrics on
    #[arg(long, env = "DUMP1090_EXPORTER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Seconds between aircraft data updates
    #[arg(long, env = "DUMP1090_AIRCRAFT_INTERVAL", default_value_t = 10)]
    pub aircraft_interval: u64,

    /// Seconds between statistics data updates
    #[arg(long, env = "DUMP1090_STATS_INTERVAL", default_value_t = 60)]
    pub stats_interval: u64,

    /// Seconds between receiver data updates while no position is known
    #[arg(long, env = "DUMP1090_RECEIVER_INTERVAL", default_value_t = 10)]
    pub receiver_interval: u64,

    /// Seconds between receiver data updates once a position is known
    #[arg(long, env = "DUMP1090_RECEIVER_INTERVAL_ORIGIN_OK", default_value_t = 300)]
    pub receiver_interval_origin_ok: u64,

    /// Receiver latitude; overrides the position reported by dump1090
    #[arg(long, env = "DUMP1090_LATITUDE", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Receiver longitude; overrides the position reported by dump1090
    #[arg(long, env = "DUMP1090_LONGITUDE", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Statistics time periods to export (latest, last1min, last5min, last15min, total)
    #[arg(
        long,
        env = "DUMP1090_TIME_PERIODS",
        value_delimiter = ',',
        default_value = "last1min"
    )]
    pub time_periods: Vec<String>,

    /// Seconds to wait for a dump1090 resource before giving up
    #[arg(long, env = "DUMP1090_FETCH_TIMEOUT", default_value_t = 2.0)]
    pub fetch_timeout: f64,

    /// Aircraft not seen within this many seconds are excluded from the counts
    #[arg(long, env = "DUMP1090_AIRCRAFT_THRESHOLD", default_value_t = 15.0)]
    pub aircraft_threshold: f64,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Where the dump1090 JSON resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceBase {
    Url(String),
    Dir(PathBuf),
}

impl ResourceBase {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::EmptyResourcePath);
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(ResourceBase::Url(raw.trim_end_matches('/').to_string()))
        } else if raw.contains("://") {
            Err(ConfigError::UnsupportedScheme(raw.to_string()))
        } else {
            Ok(ResourceBase::Dir(PathBuf::from(raw)))
        }
    }
}

impl std::fmt::Display for ResourceBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceBase::Url(url) => f.write_str(url),
            ResourceBase::Dir(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Validated exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub resource: ResourceBase,
    pub host: String,
    pub port: u16,
    pub fetch_timeout: Duration,
    pub poller: PollerConfig,
}

impl ExporterConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::NonPositive { name });
    }
    Ok(Duration::from_secs(secs))
}

fn positive_f64(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::NonPositive { name });
    }
    Ok(value)
}

fn origin(lat: Option<f64>, lon: Option<f64>) -> Result<Option<Position>, ConfigError> {
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::OutOfRange {
                    name: "latitude",
                    value: lat,
                });
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::OutOfRange {
                    name: "longitude",
                    value: lon,
                });
            }
            Ok(Some(Position::new(lat, lon)))
        }
        _ => Err(ConfigError::PartialOrigin),
    }
}

fn time_periods(raw: &[String]) -> Result<Vec<TimePeriod>, ConfigError> {
    let mut periods = Vec::new();
    for name in raw.iter().filter(|s| !s.trim().is_empty()) {
        let period: TimePeriod = name.parse()?;
        if !periods.contains(&period) {
            periods.push(period);
        }
    }
    if periods.is_empty() {
        return Err(ConfigError::NoTimePeriods);
    }
    Ok(periods)
}

impl TryFrom<Cli> for ExporterConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, ConfigError> {
        let fetch_timeout = positive_f64("fetch timeout", cli.fetch_timeout)?;

        let poller = PollerConfig {
            aircraft_interval: positive_secs("aircraft interval", cli.aircraft_interval)?,
            stats_interval: positive_secs("stats interval", cli.stats_interval)?,
            receiver_intervals: ReceiverIntervals {
                seeking: positive_secs("receiver interval", cli.receiver_interval)?,
                locked: positive_secs(
                    "receiver interval (origin ok)",
                    cli.receiver_interval_origin_ok,
                )?,
            },
            origin_override: origin(cli.latitude, cli.longitude)?,
            time_periods: time_periods(&cli.time_periods)?,
            recent_threshold_secs: positive_f64("aircraft threshold", cli.aircraft_threshold)?,
        };

        Ok(ExporterConfig {
            resource: ResourceBase::parse(&cli.resource_path)?,
            host: cli.host,
            port: cli.port,
            fetch_timeout: Duration::from_secs_f64(fetch_timeout),
            poller,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
