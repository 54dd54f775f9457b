//! Connection utilities.
//!
//! Parsing of sender targets, detection of the address a listener should
//! advertise, and socket tuning shared by both roles.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Validate a sender target and turn it into a socket address.
///
/// The address must be a literal IP; no name resolution is performed.
///
/// # Examples
///
/// ```
/// use ferry_core::connection::parse_target;
///
/// let addr = parse_target("192.168.1.100", 40123).unwrap();
/// assert_eq!(addr.port(), 40123);
///
/// assert!(parse_target("", 40123).is_err());
/// assert!(parse_target("192.168.1.100", 0).is_err());
/// ```
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for an empty or non-literal address or port 0.
pub fn parse_target(address: &str, port: u16) -> Result<SocketAddr> {
    let address = address.trim();

    if address.is_empty() {
        return Err(Error::InvalidArgument("target address is empty".to_string()));
    }
    if port == 0 {
        return Err(Error::InvalidArgument("target port must not be 0".to_string()));
    }

    let ip: IpAddr = address
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| {
            Error::InvalidArgument(format!(
                "'{address}' is not an IP address (e.g. 192.168.1.100)"
            ))
        })?;

    Ok(SocketAddr::new(ip, port))
}

/// Determine the IPv4 address a listener should advertise.
///
/// Resolution order:
/// 1. the first IPv4 address the local hostname resolves to
/// 2. the address of the interface used for outbound traffic
/// 3. `127.0.0.1`
pub async fn advertised_ipv4() -> Ipv4Addr {
    if let Some(ip) = hostname_ipv4().await {
        return ip;
    }

    tracing::warn!("Local hostname did not resolve to IPv4, using outbound interface address");
    outbound_ipv4().unwrap_or(Ipv4Addr::LOCALHOST)
}

async fn hostname_ipv4() -> Option<Ipv4Addr> {
    let host = hostname::get().ok()?.to_string_lossy().to_string();
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await
        .ok()?
        .collect();

    addrs.iter().find_map(|addr| match addr.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    })
}

/// Get the local outbound IPv4 address by connecting a UDP socket to a public DNS.
fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:53").ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

/// Configure TCP keep-alive on a socket.
///
/// A peer that disappears without closing the connection surfaces as a
/// read/write error instead of a transfer that hangs forever.
///
/// Configuration:
/// - Start probing after 10 seconds of idle time
/// - Send probes every 5 seconds
pub fn configure_tcp_keepalive(stream: &TcpStream) -> Result<()> {
    let socket_ref = SockRef::from(stream);

    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(10))
        .with_interval(Duration::from_secs(5));

    socket_ref
        .set_tcp_keepalive(&keepalive)
        .map_err(Error::Network)?;

    tracing::debug!("TCP keep-alive enabled on socket");
    Ok(())
}
