use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use config_collector::CollectorConfig;
use config_collector_exporter::config::ExporterConfig;
use std::path::PathBuf;
use std::time::Duration;

pub mod collect;
pub mod serve;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Application {
    #[command(subcommand)]
    pub command: SubCommands,

    /// Emit logs as JSON instead of human readable text.
    #[clap(long, env = "CC_EXPORTER_LOG_JSON", global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum SubCommands {
    /// Run every configured probe once and print the metrics to stdout.
    Collect(collect::Arguments),

    /// Serve the probe metrics over HTTP, probing on every scrape.
    Serve(serve::Arguments),
}

/// Settings shared by every command that runs probes.
#[derive(Args, Clone, Debug)]
pub struct CollectorArguments {
    /// Directory containing the `*.yml` probe configurations.
    ///
    /// Defaults to `/etc/node_exporter/yml`.
    #[clap(short, long, env = "CC_EXPORTER_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Verify certificates of https probe targets.
    ///
    /// When disabled (the default), invalid certificates are accepted.
    #[clap(long, env = "CC_EXPORTER_VERIFY_TLS")]
    verify_tls: Option<bool>,

    /// Upper bound for each individual probe, for example `5s` or `1m`.
    ///
    /// Without it a probe waits for as long as the underlying call does.
    #[clap(long, env = "CC_EXPORTER_PROBE_TIMEOUT", value_parser = humantime::parse_duration)]
    probe_timeout: Option<Duration>,

    /// Optional TOML file with exporter settings.
    #[clap(long, env = "CC_EXPORTER_CONFIG_FILE")]
    config_file: Option<PathBuf>,
}

impl CollectorArguments {
    /// Load the settings file, if one was given.
    pub fn settings(&self) -> Result<ExporterConfig> {
        match &self.config_file {
            Some(path) => ExporterConfig::load(path),
            None => Ok(ExporterConfig::default()),
        }
    }

    /// If the user specified a value using args, then use that. Otherwise use
    /// the value from the settings file, and fall back to the defaults if
    /// neither is configured.
    pub fn collector_config(&self, settings: &ExporterConfig) -> CollectorConfig {
        let defaults = CollectorConfig::default();

        CollectorConfig {
            config_dir: self
                .config_dir
                .clone()
                .or_else(|| settings.config_dir.clone())
                .unwrap_or(defaults.config_dir),
            verify_tls: self
                .verify_tls
                .or(settings.verify_tls)
                .unwrap_or(defaults.verify_tls),
            probe_timeout: self.probe_timeout.or(settings.probe_timeout),
        }
    }
}

pub async fn handle_command(app: Application) -> Result<()> {
    match app.command {
        SubCommands::Collect(args) => collect::handle_command(args).await,
        SubCommands::Serve(args) => serve::handle_command(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector_arguments(args: &[&str]) -> CollectorArguments {
        let app = Application::try_parse_from(
            ["cc-exporter", "collect"].iter().chain(args.iter()).copied(),
        )
        .expect("expected valid arguments");

        match app.command {
            SubCommands::Collect(args) => args.collector,
            SubCommands::Serve(_) => panic!("expected the collect command"),
        }
    }

    #[test]
    fn defaults_without_arguments_or_settings() {
        let args = collector_arguments(&[]);

        assert_eq!(
            args.collector_config(&ExporterConfig::default()),
            CollectorConfig::default()
        );
    }

    #[test]
    fn settings_fill_in_missing_arguments() {
        let args = collector_arguments(&["--probe-timeout", "2s"]);
        let settings = ExporterConfig {
            config_dir: Some(PathBuf::from("/srv/probes")),
            verify_tls: Some(true),
            probe_timeout: Some(Duration::from_secs(30)),
            ..ExporterConfig::default()
        };

        assert_eq!(
            args.collector_config(&settings),
            CollectorConfig {
                config_dir: PathBuf::from("/srv/probes"),
                verify_tls: true,
                probe_timeout: Some(Duration::from_secs(2)),
            }
        );
    }

    #[test]
    fn arguments_take_precedence() {
        let args = collector_arguments(&["--config-dir", "/opt/probes/", "--verify-tls", "false"]);
        let settings = ExporterConfig {
            config_dir: Some(PathBuf::from("/srv/probes")),
            verify_tls: Some(true),
            ..ExporterConfig::default()
        };

        let config = args.collector_config(&settings);

        assert_eq!(config.config_dir, PathBuf::from("/opt/probes/"));
        assert!(!config.verify_tls);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let result = Application::try_parse_from(["cc-exporter", "collect", "--probe-timeout", "soon"]);
        assert!(result.is_err());
    }
}
