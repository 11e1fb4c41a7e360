use std::future::Future;
use std::time::Duration;

mod exec;
mod http;
mod tcp;

pub use exec::ExecCheck;
pub use http::{format_url, get, head, post, HttpCheck, HttpMethod};
pub use tcp::TcpCheck;

/// Ports must be strictly between these bounds to be probed.
const MIN_PORT: i64 = 0;
const MAX_PORT: i64 = 65535;

/// Settings shared by every probe in a collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Verify certificates of `https` targets. When disabled, invalid
    /// certificates are accepted.
    pub verify_tls: bool,

    /// Upper bound for a single TCP dial, HTTP request or command. `None`
    /// waits for as long as the underlying call does.
    pub timeout: Option<Duration>,
}

/// One configured health check.
///
/// All variants share the same contract: [`Probe::healthy`] never fails, every
/// error collapses into "not healthy".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Probe<'a> {
    Tcp(&'a TcpCheck),
    Http(&'a HttpCheck),
    Exec(&'a ExecCheck),
}

impl Probe<'_> {
    pub async fn healthy(&self, options: &ProbeOptions) -> bool {
        match self {
            Probe::Tcp(check) => check.healthy(options).await,
            Probe::Http(check) => check.healthy(options).await,
            Probe::Exec(check) => check.healthy(options).await,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Probe::Tcp(_) => "tcp",
            Probe::Http(_) => "http",
            Probe::Exec(_) => "exec",
        }
    }
}

/// Returns the port as `u16` if it lies strictly inside `(0, 65535)`.
pub(crate) fn valid_port(port: i64) -> Option<u16> {
    if port <= MIN_PORT || port >= MAX_PORT {
        return None;
    }

    u16::try_from(port).ok()
}

/// Await `future`, giving up after `timeout` if one is set.
pub(crate) async fn with_timeout<F: Future>(
    timeout: Option<Duration>,
    future: F,
) -> Option<F::Output> {
    match timeout {
        Some(duration) => tokio::time::timeout(duration, future).await.ok(),
        None => Some(future.await),
    }
}
