//! The broker stream socket.

use crate::app::error::Error;
use crate::network::error::Error as NetError;
use crate::network::{Interface, TcpSocket};
use core::net::SocketAddr;

/// The connection type a network interface's stream sockets produce.
pub type ConnectionOf<I> = <<I as Interface>::TcpSocket as TcpSocket>::Connection;

/// Opens a stream socket on `network` and connects it to `host:port`.
///
/// Open and connect are separate phases; a failure in either is final.
/// A host name that does not resolve fails the connect phase.
pub fn open_and_connect<I>(network: &mut I, host: &str, port: u16) -> Result<ConnectionOf<I>, Error>
where
    I: Interface<Error = NetError>,
    I::TcpSocket: TcpSocket<Error = NetError>,
{
    log::info!("Connecting to host {}:{} ...", host, port);

    let socket = network.open_tcp().map_err(|e| {
        log::error!("Could not open socket! Returned {:?}", e);
        Error::SocketOpen(e)
    })?;

    let connected = network
        .get_host_by_name(host)
        .and_then(|address| socket.connect(SocketAddr::new(address, port)));
    connected.map_err(|e| {
        log::error!("Could not connect! Returned {:?}", e);
        Error::SocketConnect(e)
    })
}
