//! Network-side collaborator contract for the socket bank.
//!
//! The monitor drives the device exclusively through [`NetDevice`]: one
//! bounded accept attempt per tick, best-effort payload sends, and explicit
//! slot reclamation. Pool exhaustion is an expected condition and is kept
//! separate from real I/O faults in [`AcceptError`].

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::pool::SlotIndex;

use super::endpoint::Endpoint;

/// A connection handed over by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    /// Slot the connection landed on.
    pub slot: SlotIndex,
    /// Peer address.
    pub peer: Endpoint,
}

/// Why the device could not take another connection.
///
/// Both reasons are one condition from the monitor's point of view; the
/// distinction only flavors the report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    /// Every slot holds a live connection or the listener.
    AllInUse,
    /// An idle slot exists but reservations keep it out of reach.
    OutOfSockets,
}

impl fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllInUse => f.write_str("all sockets in use"),
            Self::OutOfSockets => f.write_str("out of sockets"),
        }
    }
}

/// Failure of one accept attempt.
#[derive(Debug, Error)]
pub enum AcceptError {
    /// No slot available. Recoverable; reported once per episode.
    #[error("socket pool exhausted: {0}")]
    Exhausted(ExhaustReason),
    /// Transport fault. Fatal to the monitor.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Network-side collaborator contract.
///
/// All calls are non-blocking. `slot` arguments must be below the pool's
/// socket count.
pub trait NetDevice {
    /// Performs exactly one accept attempt, with no internal retry.
    ///
    /// Returns `Ok(None)` when no connection is pending.
    ///
    /// # Errors
    ///
    /// [`AcceptError::Exhausted`] when no slot can take a connection,
    /// [`AcceptError::Io`] on transport faults.
    fn try_accept(&mut self) -> Result<Option<Accepted>, AcceptError>;

    /// Sends a payload to the connection on `slot`, best effort.
    ///
    /// A payload that cannot be written right now is dropped, not queued;
    /// heartbeats tolerate loss by contract.
    ///
    /// # Errors
    ///
    /// Returns an error only on faults that invalidate the device.
    fn send(&mut self, slot: SlotIndex, payload: &[u8]) -> io::Result<()>;

    /// Closes the connection on `slot` and returns the slot to the pool.
    ///
    /// # Errors
    ///
    /// Returns an error only on faults that invalidate the device.
    fn close(&mut self, slot: SlotIndex) -> io::Result<()>;

    /// Per-tick device housekeeping (status refresh, lease upkeep).
    ///
    /// Runs at the top of every tick, before the accept attempt.
    ///
    /// # Errors
    ///
    /// Returns an error only on faults that invalidate the device.
    fn maintain(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Slot the listener is currently armed on, if any.
    fn listen_slot(&self) -> Option<SlotIndex>;

    /// Address the device serves on.
    fn local_endpoint(&self) -> Endpoint;

    /// Parks the caller for up to `timeout` between ticks.
    ///
    /// Implementations may wake early when the device becomes ready.
    fn idle(&mut self, timeout: Duration) {
        std::thread::sleep(timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaust_reasons_keep_their_report_texts() {
        assert_eq!(format!("{}", ExhaustReason::AllInUse), "all sockets in use");
        assert_eq!(format!("{}", ExhaustReason::OutOfSockets), "out of sockets");
    }

    #[test]
    fn accept_error_display() {
        let err = AcceptError::Exhausted(ExhaustReason::AllInUse);
        assert_eq!(format!("{err}"), "socket pool exhausted: all sockets in use");
    }
}
