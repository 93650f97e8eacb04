//! Accept front-end and exhaustion edge-reporting.

use std::io;

use minstant::Instant;

use crate::net::{AcceptError, Endpoint, ExhaustReason, NetDevice};
use crate::pool::SlotIndex;
use crate::trace::{debug, info};

use super::sessions::SessionTracker;
use super::wire;

/// Outcome of one accept attempt worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptEvent {
    /// A connection landed on `slot`.
    Connected { slot: SlotIndex, peer: Endpoint },
    /// The pool had no slot for a pending connection. Yielded only on the
    /// transition into exhaustion.
    Exhausted(ExhaustReason),
}

/// Non-blocking accept path with edge-triggered exhaustion reporting.
#[derive(Debug, Default)]
pub struct Listener {
    out_of_sockets: bool,
}

impl Listener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while the pool is exhausted and that has already been reported.
    #[must_use]
    pub const fn out_of_sockets(&self) -> bool {
        self.out_of_sockets
    }

    /// Performs exactly one accept attempt.
    ///
    /// Nothing pending is a silent outcome. A success registers the session
    /// stamped at `now`, sends the welcome payload, clears the exhaustion
    /// flag, and yields [`AcceptEvent::Connected`]. Exhaustion sets the flag
    /// and yields [`AcceptEvent::Exhausted`] only when the flag was clear.
    ///
    /// # Errors
    ///
    /// Any device failure other than exhaustion is fatal and propagates.
    pub fn poll<D: NetDevice + ?Sized>(
        &mut self,
        device: &mut D,
        sessions: &mut SessionTracker,
        now: Instant,
    ) -> io::Result<Option<AcceptEvent>> {
        match device.try_accept() {
            Ok(Some(accepted)) => {
                self.out_of_sockets = false;
                sessions.register(accepted.slot, accepted.peer, now);
                device.send(accepted.slot, &wire::welcome(accepted.slot))?;
                info!(slot = %accepted.slot, peer = %accepted.peer, "connection accepted");
                Ok(Some(AcceptEvent::Connected {
                    slot: accepted.slot,
                    peer: accepted.peer,
                }))
            }
            Ok(None) => Ok(None),
            Err(AcceptError::Exhausted(reason)) => {
                if self.out_of_sockets {
                    return Ok(None);
                }
                self.out_of_sockets = true;
                debug!(reason = %reason, "socket pool exhausted");
                Ok(Some(AcceptEvent::Exhausted(reason)))
            }
            Err(AcceptError::Io(e)) => Err(e),
        }
    }
}
