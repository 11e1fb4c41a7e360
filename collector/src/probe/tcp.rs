use super::{valid_port, with_timeout, ProbeOptions};
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::TcpStream;
use tracing::debug;

/// Checks that something accepts TCP connections on a local port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TcpCheck {
    #[serde(default)]
    pub port: i64,
}

impl TcpCheck {
    /// The IPv4 address to dial, or `None` if the port is out of range.
    pub fn address(&self) -> Option<SocketAddrV4> {
        valid_port(self.port).map(|port| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
    }

    /// Healthy if a bare TCP connection can be established. The connection is
    /// closed again straight away.
    pub async fn healthy(&self, options: &ProbeOptions) -> bool {
        let Some(address) = self.address() else {
            debug!(port = self.port, "TCP port out of range, not probing");
            return false;
        };

        match with_timeout(options.timeout, TcpStream::connect(address)).await {
            Some(Ok(_stream)) => {
                debug!(%address, "TCP probe succeeded");
                true
            }
            Some(Err(err)) => {
                debug!(%address, %err, "TCP probe failed");
                false
            }
            None => {
                debug!(%address, timeout = ?options.timeout, "TCP probe timed out");
                false
            }
        }
    }
}
