use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use log::info;
use tokio::net::TcpListener;

#[derive(Debug)]
pub enum ServerError {
    Bind(io::Error),
    Accept(io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind(err) => write!(
                f,
                "Problem while trying to create listening socket. Server will not be started: {}",
                err
            ),
            ServerError::Accept(err) => write!(f, "Accept failed: {}", err),
        }
    }
}

impl Error for ServerError {}

/// Listening endpoint for inbound connections.
///
/// Accepts a single connection and returns; no message format is
/// defined past the accept, so nothing is exchanged yet and the
/// degraded take only ever reaches disk.
#[derive(Debug, Clone, Copy)]
pub struct ListenServer {
    port: u16,
}

impl ListenServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> Result<(), ServerError> {
        let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port);
        let listener = TcpListener::bind(address).await.map_err(ServerError::Bind)?;
        info!(
            "Listening socket has been successfully created at port {}",
            self.port
        );
        let (_stream, peer) = listener.accept().await.map_err(ServerError::Accept)?;
        info!("Accepted connection from {}", peer);
        Ok(())
    }
}
