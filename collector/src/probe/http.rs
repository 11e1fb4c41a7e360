use super::{valid_port, ProbeOptions};
use reqwest::{Client, Method};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("config-collector/", env!("CARGO_PKG_VERSION"));

/// The request methods an HTTP check may use. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Head => "HEAD",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "HEAD" => Ok(Self::Head),
            _ => Err(format!("unsupported HTTP method: {s:?}")),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Head => Method::HEAD,
        }
    }
}

/// Checks that an HTTP endpoint answers with a 2xx status.
///
/// `method` is kept as written in the file: an unsupported method is not a
/// parse error, it only makes the check unhealthy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpCheck {
    pub scheme: String,
    pub host: String,
    pub port: i64,
    pub path: String,
    pub method: String,
}

impl HttpCheck {
    /// The URL this check requests, or `None` if the port is out of range or
    /// the parts do not form a valid URL.
    pub fn url(&self) -> Option<Url> {
        let port = valid_port(self.port)?;
        format_url(&self.scheme, &self.host, port, &self.path).ok()
    }

    pub async fn healthy(&self, options: &ProbeOptions) -> bool {
        let Some(port) = valid_port(self.port) else {
            debug!(port = self.port, "HTTP port out of range, not probing");
            return false;
        };

        let url = match format_url(&self.scheme, &self.host, port, &self.path) {
            Ok(url) => url,
            Err(err) => {
                debug!(scheme = %self.scheme, host = %self.host, %err, "Unable to build probe URL");
                return false;
            }
        };

        match self.method.parse::<HttpMethod>() {
            Ok(method) => request(method, url, options).await,
            Err(err) => {
                debug!(%url, %err, "Not probing");
                false
            }
        }
    }
}

/// Build `scheme://host:port/path`.
///
/// IPv6 hosts are wrapped in brackets. `path` is resolved against the
/// `scheme://host:port` base and may carry a query string. Only its path, query
/// and fragment are kept, so an absolute URL in `path` cannot redirect the
/// check to another host.
pub fn format_url(scheme: &str, host: &str, port: u16, path: &str) -> Result<Url, url::ParseError> {
    let authority = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };

    let mut url = Url::parse(&format!("{scheme}://{authority}"))?;
    let target = url.join(path)?;

    url.set_path(target.path());
    url.set_query(target.query());
    url.set_fragment(target.fragment());

    Ok(url)
}

pub async fn get(url: &str, options: &ProbeOptions) -> bool {
    send(HttpMethod::Get, url, options).await
}

pub async fn post(url: &str, options: &ProbeOptions) -> bool {
    send(HttpMethod::Post, url, options).await
}

pub async fn head(url: &str, options: &ProbeOptions) -> bool {
    send(HttpMethod::Head, url, options).await
}

async fn send(method: HttpMethod, url: &str, options: &ProbeOptions) -> bool {
    match Url::parse(url) {
        Ok(url) => request(method, url, options).await,
        Err(err) => {
            debug!(url, %err, "Invalid probe URL");
            false
        }
    }
}

/// Create a fresh client for a single probe. Certificate checks are turned
/// off for `https` targets unless `verify_tls` is set.
fn client(url: &Url, options: &ProbeOptions) -> reqwest::Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(accepts_invalid_certs(url.as_str(), options));

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

fn accepts_invalid_certs(url: &str, options: &ProbeOptions) -> bool {
    !options.verify_tls && url.get(..5).map_or(false, |prefix| prefix.eq_ignore_ascii_case("https"))
}

/// Sends one request with an empty body. Healthy only when the response body
/// could be read completely and the status is in `[200, 300)`.
async fn request(method: HttpMethod, url: Url, options: &ProbeOptions) -> bool {
    let client = match client(&url, options) {
        Ok(client) => client,
        Err(err) => {
            debug!(%url, %err, "Unable to create HTTP client");
            return false;
        }
    };

    let response = match client
        .request(method.into(), url.clone())
        .body("")
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            debug!(%method, %url, %err, "HTTP probe failed");
            return false;
        }
    };

    let status = response.status();

    if let Err(err) = response.bytes().await {
        debug!(%method, %url, %err, "Unable to read HTTP probe response body");
        return false;
    }

    if !status.is_success() {
        debug!(%method, %url, %status, "HTTP probe returned a non 2xx status code");
        return false;
    }

    debug!(%method, %url, %status, "HTTP probe succeeded");
    true
}
