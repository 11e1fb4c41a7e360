use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// This struct represents the exporter settings file. All properties are
/// optional so that the user only specifies the ones that they want in that
/// file. Command line arguments and environment variables take precedence.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExporterConfig {
    /// Directory containing the `*.yml` probe configurations.
    pub config_dir: Option<PathBuf>,

    /// Address the `serve` command listens on.
    pub listen_address: Option<SocketAddr>,

    /// Verify certificates of `https` probe targets.
    pub verify_tls: Option<bool>,

    /// Upper bound for each individual probe, e.g. `"5s"`.
    #[serde(default, with = "humantime_serde::option")]
    pub probe_timeout: Option<Duration>,
}

impl ExporterConfig {
    pub fn load(path: &Path) -> Result<ExporterConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Unable to read settings file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Unable to parse settings file {}", path.display()))
    }
}
