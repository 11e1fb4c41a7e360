//! Converts a directory of declarative health-check files into Prometheus
//! gauges reporting the liveness (`1`/`0`) of each monitored target.
//!
//! Every `*.yml` file in the configuration directory describes a metric and
//! exactly one probe (a TCP port, an HTTP endpoint, or a local command). A
//! [`Collector`] loads each file, runs its probe once and renders the result in
//! the Prometheus text-exposition format.

pub mod collector;
pub mod config;
pub mod metric;
pub mod probe;
pub mod scanner;

pub use collector::{join_metrics, Collector, CollectorConfig, DEFAULT_CONFIG_PATH};
pub use config::{Alive, Config, ConfigError, Labels, Metadata};
pub use probe::{Probe, ProbeOptions};
pub use scanner::scan_config_dir;
