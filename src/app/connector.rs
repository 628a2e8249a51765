//! Network interface bring-up.

use crate::app::config::RetryPolicy;
use crate::app::error::Error;
use crate::network::Interface;
use crate::network::error::Error as NetError;
use core::net::IpAddr;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};
use embedded_hal::delay::DelayNs;

/// Stops a retrying bring-up from another context (a signal handler, a
/// watchdog task, a supervisor button).
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    /// A token that has not been cancelled. Usable in `static` items.
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Requests cancellation. Interrupt-safe.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A network interface that is up.
///
/// Takes the interface down when dropped, so every exit path after
/// bring-up (including startup failures further down) releases it.
#[derive(Debug)]
pub struct Network<I: Interface> {
    iface: I,
}

impl<I: Interface> Deref for Network<I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.iface
    }
}

impl<I: Interface> DerefMut for Network<I> {
    fn deref_mut(&mut self) -> &mut I {
        &mut self.iface
    }
}

impl<I: Interface> Drop for Network<I> {
    fn drop(&mut self) {
        match self.iface.disconnect() {
            Ok(()) => log::debug!("network interface down"),
            Err(e) => log::warn!("network disconnect failed: {:?}", e),
        }
    }
}

/// Brings `iface` up and reports its address.
///
/// `None` stands for a board without a default interface. Both the
/// connect and the address query are retried per `policy`, sleeping on
/// `delay` between attempts, until they succeed, the policy gives up, or
/// `cancel` fires.
pub fn connect<I, D>(
    iface: Option<I>,
    policy: &RetryPolicy,
    cancel: &CancelToken,
    delay: &mut D,
) -> Result<(Network<I>, IpAddr), Error>
where
    I: Interface<Error = NetError>,
    D: DelayNs,
{
    let Some(mut iface) = iface else {
        log::error!("Unable to open network interface.");
        return Err(Error::NoInterface);
    };

    retry(&mut iface, policy, cancel, delay, "connect to network", |i| {
        i.connect()
    })?;
    let mut network = Network { iface };
    let address = retry(&mut *network, policy, cancel, delay, "get IP address", |i| {
        i.ip_address()
    })?;
    log::info!(
        "Connected to the network successfully. IP address: {}",
        address
    );
    Ok((network, address))
}

fn retry<I, D, T>(
    iface: &mut I,
    policy: &RetryPolicy,
    cancel: &CancelToken,
    delay: &mut D,
    what: &str,
    mut attempt_once: impl FnMut(&mut I) -> Result<T, NetError>,
) -> Result<T, Error>
where
    I: Interface<Error = NetError>,
    D: DelayNs,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            log::warn!("Gave up trying to {}: cancelled", what);
            return Err(Error::Cancelled);
        }
        attempt = attempt.saturating_add(1);
        match attempt_once(iface) {
            Ok(value) => return Ok(value),
            Err(e) if policy.is_exhausted(attempt) => {
                log::error!("Unable to {} ({:?}) after {} attempts", what, e, attempt);
                return Err(Error::NetworkUnavailable(e));
            }
            Err(e) => {
                let wait = policy.backoff_ms(attempt);
                log::warn!("Unable to {} ({:?}). Retrying in {} ms...", what, e, wait);
                delay.delay_ms(wait);
            }
        }
    }
}
