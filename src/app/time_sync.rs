//! One-shot wall clock synchronization.

use crate::app::error::Error;
use crate::network::Interface;
use crate::network::application::ntp;
use crate::network::error::Error as NetError;
use crate::system::clock::{self, Monotonic, Timestamp};
use core::net::SocketAddr;

/// Queries `server:port` once and sets the process-wide clock.
///
/// The NTP client and its socket live only inside this call and are
/// released on every path. Nothing is set unless the server returns a
/// positive timestamp.
pub fn sync_time<I, M>(
    network: &mut I,
    server: &str,
    port: u16,
    uptime: &M,
) -> Result<Timestamp, Error>
where
    I: Interface<Error = NetError>,
    M: Monotonic,
{
    let fetched = query(network, server, port);

    match fetched {
        Ok(now) if now.as_secs() > 0 => {
            clock::set_time(now, uptime);
            log::info!("Time is now {}", now);
            Ok(now)
        }
        Ok(now) => {
            log::error!(
                "Failed to retrieve the time from {}:{} (got {})",
                server,
                port,
                now.as_secs()
            );
            Err(Error::TimeSync)
        }
        Err(e) => {
            log::error!("Failed to retrieve the time from {}:{} ({:?})", server, port, e);
            Err(Error::TimeSync)
        }
    }
}

fn query<I>(network: &mut I, server: &str, port: u16) -> Result<Timestamp, NetError>
where
    I: Interface<Error = NetError>,
{
    let address = network.get_host_by_name(server)?;
    let mut ntp = ntp::Client::new(network.open_udp()?);
    ntp.set_server(SocketAddr::new(address, port));
    ntp.get_timestamp()
}
