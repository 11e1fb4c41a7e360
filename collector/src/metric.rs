//! Prometheus text-exposition rendering.

use crate::config::{Labels, Metadata};
use std::borrow::Cow;

/// Render a gauge block for `metadata` with value `1` if `healthy`, else `0`:
///
/// ```text
/// # HELP <metric> <help>
/// # TYPE <metric> gauge
/// <metric>{<key>="<value>", ...} <0|1>
/// ```
///
/// The block always ends with a newline.
pub fn render_gauge(metadata: &Metadata, healthy: bool) -> String {
    let metric = &metadata.metric;

    format!(
        "# HELP {metric} {help}\n# TYPE {metric} gauge\n{series} {value}\n",
        help = escape_help(&metadata.help),
        series = series_name(metric, &metadata.labels),
        value = u8::from(healthy),
    )
}

/// The metric name followed by its label set, or the bare name when there are
/// no labels.
pub fn series_name(metric: &str, labels: &Labels) -> String {
    if labels.is_empty() {
        return metric.to_string();
    }

    let labels = labels
        .iter()
        .map(|(key, value)| format!("{key}=\"{}\"", escape_label_value(value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{metric}{{{labels}}}")
}

/// HELP text only needs backslashes and newlines escaped, quotes are kept.
fn escape_help(help: &str) -> Cow<'_, str> {
    if !help.contains(&['\\', '\n'][..]) {
        return Cow::Borrowed(help);
    }

    Cow::Owned(help.replace('\\', "\\\\").replace('\n', "\\n"))
}

fn escape_label_value(value: &str) -> Cow<'_, str> {
    if !value.contains(&['\\', '"', '\n'][..]) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}
