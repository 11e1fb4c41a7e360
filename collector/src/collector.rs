use crate::config::{Config, ConfigError};
use crate::probe::ProbeOptions;
use crate::scanner::scan_config_dir;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;
use tracing::{debug, warn};

/// Where probe configuration files are read from unless told otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/node_exporter/yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Directory scanned for `*.yml` probe configurations.
    pub config_dir: PathBuf,

    /// Verify certificates of `https` targets. Off by default, in which case
    /// invalid certificates are accepted.
    pub verify_tls: bool,

    /// Bound on every individual probe. `None` means no bound.
    pub probe_timeout: Option<Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_PATH),
            verify_tls: false,
            probe_timeout: None,
        }
    }
}

/// Runs every configured probe and renders the results.
///
/// Probes run one after the other in file-name order, so a collection takes
/// as long as all of its probes combined.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    config: CollectorConfig,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            verify_tls: self.config.verify_tls,
            timeout: self.config.probe_timeout,
        }
    }

    /// Collect all probe metrics and append them to `base_metric`.
    ///
    /// This never fails: files that cannot be loaded are logged and skipped,
    /// and if nothing can be collected the result is just `base_metric`.
    pub async fn collect(&self, base_metric: &str) -> String {
        let dir = self.config.config_dir.clone();
        let files = match task::spawn_blocking(move || scan_config_dir(dir)).await {
            Ok(files) => files,
            Err(err) => {
                warn!(%err, "Unable to scan the probe configuration directory");
                Vec::new()
            }
        };
        debug!(
            dir = ?self.config.config_dir,
            count = files.len(),
            "Collecting probe metrics"
        );

        let mut blocks = vec![base_metric.to_string()];

        for path in files {
            match self.collect_file(&path).await {
                Ok(Some(block)) => blocks.push(block),
                Ok(None) => debug!(?path, "No probe configured, skipping"),
                Err(err) => warn!(?path, %err, "Skipping invalid probe configuration"),
            }
        }

        join_metrics(&blocks)
    }

    /// Load a single file, run its probe and render the metric.
    ///
    /// Returns `Ok(None)` when the file is valid but configures no probe.
    pub async fn collect_file(&self, path: &Path) -> Result<Option<String>, ConfigError> {
        let config = Config::load(path).await?;

        let Some(probe) = config.probe() else {
            return Ok(None);
        };

        let healthy = probe.healthy(&self.probe_options()).await;
        debug!(
            ?path,
            metric = %config.metadata.metric,
            probe = probe.kind(),
            healthy,
            "Probe finished"
        );

        Ok(Some(config.metric_info(healthy)))
    }
}

/// Concatenate metric blocks, separating them with a newline unless the text
/// so far is empty or already ends with one.
pub fn join_metrics<S: AsRef<str>>(blocks: &[S]) -> String {
    let mut joined = String::new();

    for block in blocks {
        if !joined.is_empty() && !joined.ends_with('\n') {
            joined.push('\n');
        }
        joined.push_str(block.as_ref());
    }

    joined
}
