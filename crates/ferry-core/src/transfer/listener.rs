//! Single-shot listener.
//!
//! A [`Listener`] is consumed by [`Listener::accept_once`], and the
//! resulting [`IncomingTransfer`] is consumed by
//! [`IncomingTransfer::receive`]. Neither can be reused, which encodes the
//! one-connection-per-listen rule in the types.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use tokio::net::{TcpListener, TcpStream};

use super::{receiver, TransferConfig, TransferSummary};
use crate::connection::{advertised_ipv4, configure_tcp_keepalive};
use crate::error::{Error, Result};
use crate::progress::{Reporter, TransferStatus};

/// Where a peer should connect to reach a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddress {
    /// Advertised IP address
    pub address: String,
    /// Bound port
    pub port: u16,
}

impl ListenAddress {
    /// Status announcing this address.
    #[must_use]
    pub fn waiting_status(&self) -> TransferStatus {
        TransferStatus::Waiting {
            address: self.address.clone(),
            port: self.port,
        }
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A bound listening socket that has not accepted yet.
#[derive(Debug)]
pub struct Listener {
    listener: TcpListener,
    address: ListenAddress,
    config: TransferConfig,
}

impl Listener {
    /// Bind an OS-assigned port on the configured address.
    ///
    /// Returns as soon as the socket is bound and the advertised address is
    /// known; nothing blocks on a peer here.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an unparsable bind address and
    /// `Error::Bind` if the socket cannot be bound.
    pub async fn bind(config: TransferConfig) -> Result<Self> {
        let ip: IpAddr = config.bind_address.parse().map_err(|_| {
            Error::InvalidArgument(format!("invalid bind address '{}'", config.bind_address))
        })?;
        let bind_addr = SocketAddr::new(ip, 0);

        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|source| Error::Bind {
                addr: bind_addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| Error::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;

        let advertised = if ip.is_unspecified() {
            IpAddr::V4(advertised_ipv4().await)
        } else {
            ip
        };

        let address = ListenAddress {
            address: advertised.to_string(),
            port: local_addr.port(),
        };
        tracing::info!("Listening on {} (advertised as {})", local_addr, address);

        Ok(Self {
            listener,
            address,
            config,
        })
    }

    /// Address and port to give to the sender.
    #[must_use]
    pub fn listen_address(&self) -> &ListenAddress {
        &self.address
    }

    /// Actual local socket address.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot report the address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|source| Error::Bind {
            addr: self.address.to_string(),
            source,
        })
    }

    /// Wait for exactly one peer. The listening socket closes afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Error::Accept` if accepting fails.
    pub async fn accept_once(self) -> Result<IncomingTransfer> {
        let (stream, peer) = self.listener.accept().await.map_err(Error::Accept)?;
        tracing::info!("Connection from {}", peer);

        configure_tcp_keepalive(&stream)?;

        Ok(IncomingTransfer {
            stream,
            peer,
            config: self.config,
        })
    }
}

/// An accepted connection waiting to be drained into a file.
#[derive(Debug)]
pub struct IncomingTransfer {
    stream: TcpStream,
    peer: SocketAddr,
    config: TransferConfig,
}

impl IncomingTransfer {
    /// Remote end of the connection.
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Run the receive loop into `destination`.
    ///
    /// The socket is closed when this returns, on every path. Failures are
    /// reported as a `Failed` status before being returned.
    ///
    /// # Errors
    ///
    /// See [`receiver::receive_stream`].
    pub async fn receive(
        mut self,
        destination: impl AsRef<Path>,
        reporter: &Reporter,
    ) -> Result<TransferSummary> {
        reporter.status(&TransferStatus::Connected { peer: self.peer });

        let result = receiver::receive_stream(
            &mut self.stream,
            destination.as_ref(),
            &self.config,
            reporter,
        )
        .await;

        if let Err(ref e) = result {
            tracing::warn!("Receive from {} failed: {}", self.peer, e);
            reporter.status(&TransferStatus::Failed {
                message: e.status_text(),
            });
        }

        result
    }
}
