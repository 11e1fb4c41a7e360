use crate::metric;
use crate::probe::{ExecCheck, HttpCheck, Probe, TcpCheck};
use serde::{de, Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Metric labels, kept sorted by key so the rendered output is stable.
pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no `spec.alive` section defined")]
    MissingAlive,

    #[error("parsing YAML file {}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        source: Box<ConfigError>,
    },
}

/// A single health-check definition, as loaded from one `*.yml` file.
///
/// A `Config` is immutable once loaded. It is parsed fresh on every
/// collection and dropped once its metric has been rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Free-text discriminator. Not interpreted.
    pub kind: String,
    pub metadata: Metadata,
    pub alive: Alive,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metadata {
    /// Prometheus metric name.
    pub metric: String,

    #[serde(default)]
    pub help: String,

    /// Optional, a missing or empty `labels` block renders as a bare metric
    /// name.
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub labels: Labels,
}

/// The `spec.alive` block. Only one of `tcp`, `http` and `exec` is expected to
/// be present; see [`Alive::probe`] for what happens otherwise.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Alive {
    pub tcp: Option<TcpCheck>,
    pub http: Option<HttpCheck>,
    pub exec: Option<ExecCheck>,

    /// Accepted for compatibility with existing files, never used.
    #[serde(
        default,
        rename = "delayseconds",
        deserialize_with = "deserialize_optional_scalar"
    )]
    pub delay_seconds: Option<String>,
}

impl Alive {
    /// Select the probe to run, picking the first configured block in the
    /// order TCP, HTTP, Exec. Returns `None` when no block is configured.
    pub fn probe(&self) -> Option<Probe<'_>> {
        if let Some(tcp) = &self.tcp {
            Some(Probe::Tcp(tcp))
        } else if let Some(http) = &self.http {
            Some(Probe::Http(http))
        } else {
            self.exec.as_ref().map(Probe::Exec)
        }
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    kind: Option<String>,
    metadata: Metadata,
    spec: Option<SpecSection>,
}

#[derive(Deserialize)]
struct SpecSection {
    alive: Option<Alive>,
}

impl Config {
    /// Parse a YAML document into a `Config`.
    ///
    /// A document without a `spec.alive` section is rejected, so a malformed
    /// file can be told apart from one that simply defines no check.
    pub fn from_yaml(input: &str) -> Result<Config, ConfigError> {
        let document: Document = serde_yaml::from_str(input)?;

        let alive = document
            .spec
            .and_then(|spec| spec.alive)
            .ok_or(ConfigError::MissingAlive)?;

        Ok(Config {
            kind: document.kind.unwrap_or_default(),
            metadata: document.metadata,
            alive,
        })
    }

    /// Read and parse the given file. Any error carries the file path.
    pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Config::from_file_content(path, &content)
    }

    /// Same as [`Config::load_file`], without blocking the async runtime.
    pub async fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Config::from_file_content(path, &content)
    }

    fn from_file_content(path: &Path, content: &str) -> Result<Config, ConfigError> {
        Config::from_yaml(content).map_err(|err| ConfigError::InFile {
            path: path.to_path_buf(),
            source: Box::new(err),
        })
    }

    pub fn probe(&self) -> Option<Probe<'_>> {
        self.alive.probe()
    }

    /// Render this config's gauge with the given health value.
    pub fn metric_info(&self, healthy: bool) -> String {
        metric::render_gauge(&self.metadata, healthy)
    }
}

/// Scalars are accepted wherever a string is expected, so `code: 200` works
/// the same as `code: "200"`.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn deserialize_labels<'de, D: Deserializer<'de>>(input: D) -> Result<Labels, D::Error> {
    let raw: Option<BTreeMap<String, Value>> = Deserialize::deserialize(input)?;

    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| match scalar_to_string(value) {
            Some(value) => Ok((key, value)),
            None => Err(de::Error::custom(format!("label `{key}` must be a scalar value"))),
        })
        .collect()
}

fn deserialize_optional_scalar<'de, D: Deserializer<'de>>(
    input: D,
) -> Result<Option<String>, D::Error> {
    let raw: Option<Value> = Deserialize::deserialize(input)?;

    match raw {
        None => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a scalar value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    const TCP_CONFIG: &str = r#"
kind: alive
metadata:
  labels:
    env: prod
    team: infra
  metric: probe_up
  help: svc up
spec:
  alive:
    tcp:
      port: 9999
    delayseconds: "5"
"#;

    #[test]
    fn parse_tcp_config() {
        let config = Config::from_yaml(TCP_CONFIG).expect("expected a valid config");

        assert_eq!(config.kind, "alive");
        assert_eq!(config.metadata.metric, "probe_up");
        assert_eq!(config.metadata.help, "svc up");
        assert_eq!(
            config.metadata.labels,
            Labels::from([
                ("env".to_string(), "prod".to_string()),
                ("team".to_string(), "infra".to_string()),
            ])
        );
        assert_eq!(config.alive.tcp, Some(TcpCheck { port: 9999 }));
        assert_eq!(config.alive.delay_seconds.as_deref(), Some("5"));
        assert!(matches!(config.probe(), Some(Probe::Tcp(_))));
    }

    #[test]
    fn parse_http_config() {
        let input = r#"
kind: alive
metadata:
  metric: web_up
  help: web up
spec:
  alive:
    http:
      scheme: https
      host: localhost
      port: 8443
      path: /healthz
      method: HEAD
"#;
        let config = Config::from_yaml(input).expect("expected a valid config");

        assert_eq!(
            config.alive.http,
            Some(HttpCheck {
                scheme: "https".to_string(),
                host: "localhost".to_string(),
                port: 8443,
                path: "/healthz".to_string(),
                method: "HEAD".to_string(),
            })
        );
        assert!(config.metadata.labels.is_empty());
    }

    #[test]
    fn parse_exec_config() {
        let input = r#"
metadata:
  metric: cron_up
  help: cron running
spec:
  alive:
    exec:
      command: ["pgrep", "-x", "cron"]
"#;
        let config = Config::from_yaml(input).expect("expected a valid config");

        assert_eq!(config.kind, "");
        assert_eq!(
            config.alive.exec,
            Some(ExecCheck {
                command: vec!["pgrep".to_string(), "-x".to_string(), "cron".to_string()],
            })
        );
    }

    #[rstest]
    #[case("labels:")]
    #[case("labels: {}")]
    #[case("")]
    fn missing_or_empty_labels(#[case] labels: &str) {
        let input = format!(
            "metadata:\n  metric: m\n  help: h\n  {labels}\nspec:\n  alive:\n    tcp:\n      port: 1\n"
        );
        let config = Config::from_yaml(&input).expect("expected a valid config");

        assert!(config.metadata.labels.is_empty());
    }

    #[test]
    fn scalar_label_values_are_stringified() {
        let input = r#"
metadata:
  metric: m
  help: h
  labels: { code: 200, primary: true }
spec:
  alive:
    tcp: { port: 80 }
"#;
        let config = Config::from_yaml(input).expect("expected a valid config");

        assert_eq!(config.metadata.labels["code"], "200");
        assert_eq!(config.metadata.labels["primary"], "true");
    }

    #[test]
    fn nested_label_values_are_rejected() {
        let input = r#"
metadata:
  metric: m
  labels: { nested: [1, 2] }
spec:
  alive:
    tcp: { port: 80 }
"#;
        let err = Config::from_yaml(input).expect_err("expected an error");
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[rstest]
    #[case::no_spec("metadata:\n  metric: m\n")]
    #[case::no_alive("metadata:\n  metric: m\nspec:\n  other: 1\n")]
    #[case::null_alive("metadata:\n  metric: m\nspec:\n  alive:\n")]
    fn missing_alive_section(#[case] input: &str) {
        let err = Config::from_yaml(input).expect_err("expected an error");
        assert!(matches!(err, ConfigError::MissingAlive), "got {err:?}");
    }

    #[rstest]
    #[case::not_yaml("metadata: [unclosed")]
    #[case::no_metadata("spec:\n  alive:\n    tcp: { port: 80 }\n")]
    #[case::port_not_a_number("metadata:\n  metric: m\nspec:\n  alive:\n    tcp: { port: abc }\n")]
    fn malformed_documents(#[case] input: &str) {
        let err = Config::from_yaml(input).expect_err("expected an error");
        assert!(matches!(err, ConfigError::Yaml(_)), "got {err:?}");
    }

    #[test]
    fn out_of_range_values_still_parse() {
        let input = r#"
metadata:
  metric: m
spec:
  alive:
    http: { scheme: http, host: localhost, port: 70000, path: /, method: get }
"#;
        let config = Config::from_yaml(input).expect("expected a valid config");
        let http = config.alive.http.expect("expected an http block");

        assert_eq!(http.port, 70000);
        assert_eq!(http.method, "get");
    }

    #[test]
    fn probe_priority_is_tcp_http_exec() {
        let all = r#"
metadata:
  metric: m
spec:
  alive:
    exec: { command: ["true"] }
    http: { scheme: http, host: localhost, port: 80, path: /, method: GET }
    tcp: { port: 80 }
"#;
        let config = Config::from_yaml(all).expect("expected a valid config");
        assert!(matches!(config.probe(), Some(Probe::Tcp(_))));

        let http_and_exec = r#"
metadata:
  metric: m
spec:
  alive:
    exec: { command: ["true"] }
    http: { scheme: http, host: localhost, port: 80, path: /, method: GET }
"#;
        let config = Config::from_yaml(http_and_exec).expect("expected a valid config");
        assert!(matches!(config.probe(), Some(Probe::Http(_))));
    }

    #[test]
    fn empty_alive_section_has_no_probe() {
        let input = "metadata:\n  metric: m\nspec:\n  alive:\n    delayseconds: 10\n";
        let config = Config::from_yaml(input).expect("expected a valid config");

        assert!(config.probe().is_none());
        assert_eq!(config.alive.delay_seconds.as_deref(), Some("10"));
    }

    #[test]
    fn load_file_wraps_errors_with_path() {
        let mut file = tempfile::Builder::new()
            .suffix(".yml")
            .tempfile()
            .expect("unable to create temp file");
        write!(file, "metadata:\n  metric: m\n").expect("unable to write temp file");

        let err = Config::load_file(file.path()).expect_err("expected an error");

        match &err {
            ConfigError::InFile { path, source } => {
                assert_eq!(path, file.path());
                assert!(matches!(**source, ConfigError::MissingAlive));
            }
            other => panic!("expected ConfigError::InFile, got {other:?}"),
        }
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let path = dir.path().join("absent.yml");

        let err = Config::load_file(&path).expect_err("expected an error");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_valid_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yml")
            .tempfile()
            .expect("unable to create temp file");
        file.write_all(TCP_CONFIG.as_bytes())
            .expect("unable to write temp file");

        let config = Config::load_file(file.path()).expect("expected a valid config");
        assert_eq!(config.metadata.metric, "probe_up");
    }

    #[tokio::test]
    async fn async_load_matches_load_file() {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let valid = dir.path().join("valid.yml");
        let broken = dir.path().join("broken.yml");
        std::fs::write(&valid, TCP_CONFIG).expect("unable to write");
        std::fs::write(&broken, "metadata: [unclosed").expect("unable to write");

        assert_eq!(
            Config::load(&valid).await.expect("expected a valid config"),
            Config::load_file(&valid).expect("expected a valid config")
        );
        assert!(matches!(
            Config::load(&broken).await,
            Err(ConfigError::InFile { .. })
        ));
        assert!(matches!(
            Config::load(&dir.path().join("absent.yml")).await,
            Err(ConfigError::Read { .. })
        ));
    }
}
