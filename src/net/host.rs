//! Hosted socket bank backed by the OS TCP stack.
//!
//! [`HostDevice`] stands in for the hardware socket bank when the monitor
//! runs on a regular host: a fixed number of slots, a listener that occupies
//! one of them, and per-slot connection state derived from non-blocking
//! probes instead of status registers.
//!
//! Slot semantics follow the hardware driver:
//! - allocation always takes the lowest-indexed free, unreserved slot;
//! - on accept, the connection takes over the listen slot and the listener
//!   re-arms on the next free slot;
//! - the reservation table has one entry per slot above 0, slot 0 is exempt.

use std::io::{self, ErrorKind, Read, Write};
use std::net::Shutdown;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use thiserror::Error;

use crate::pool::{MAX_SOCKETS, RawStatus, SlotIndex, SocketPool, SocketStatus};
use crate::trace::{debug, info, trace, warn};

use super::device::{AcceptError, Accepted, ExhaustReason, NetDevice};
use super::endpoint::Endpoint;

const LISTENER_TOKEN: Token = Token(0);

/// Scratch buffer for connection probes. Inbound bytes are protocol noise
/// and get discarded, so the size only bounds per-probe work.
const PROBE_LEN: usize = 512;

/// Failure constructing a [`HostDevice`].
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Failed to bind the listener.
    #[error("failed to bind listener: {0}")]
    Bind(io::Error),
    /// Requested socket count is zero or above [`MAX_SOCKETS`].
    #[error("unsupported socket count: {0}")]
    SlotCount(usize),
    /// Reservation named slot 0 or a slot outside the bank.
    #[error("socket {0} cannot be reserved")]
    Reservation(SlotIndex),
    /// No slot available for the initial listen.
    #[error("out of sockets")]
    OutOfSockets,
    /// Polling setup failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

enum Slot {
    Free,
    Listen,
    Conn(Conn),
}

struct Conn {
    stream: TcpStream,
    peer: Endpoint,
    /// Set once the peer is observed gone; surfaces as `CLOSE_WAIT` until
    /// the owner closes the slot.
    closing: bool,
}

/// Hosted stand-in for the hardware socket bank.
///
/// Implements both collaborator contracts: [`SocketPool`] for status and
/// reservation reads, [`NetDevice`] for accepts, sends, and reclamation.
pub struct HostDevice {
    listener: TcpListener,
    local: Endpoint,
    listen_slot: Option<SlotIndex>,
    slots: Vec<Slot>,
    /// Indexed by `slot - 1`; slot 0 is exempt from reservation.
    reserved: Vec<bool>,
    poll: Poll,
    events: Events,
}

impl HostDevice {
    /// Binds the listener and arms it on the lowest free slot.
    ///
    /// `reserve` marks slots as driver-reserved; they are excluded from
    /// allocation but still appear in status and reservation reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket count is out of range, a reservation
    /// names slot 0 or an out-of-range slot, or the listener cannot be
    /// bound.
    pub fn bind(
        endpoint: Endpoint,
        socket_count: usize,
        reserve: &[SlotIndex],
    ) -> Result<Self, DeviceError> {
        if socket_count == 0 || socket_count > MAX_SOCKETS {
            return Err(DeviceError::SlotCount(socket_count));
        }
        let mut reserved = vec![false; socket_count - 1];
        for &slot in reserve {
            if slot.index() == 0 || slot.index() >= socket_count {
                return Err(DeviceError::Reservation(slot));
            }
            reserved[slot.index() - 1] = true;
        }

        let mut listener = TcpListener::bind(endpoint.into()).map_err(DeviceError::Bind)?;
        let local = Endpoint::from(listener.local_addr().map_err(DeviceError::Bind)?);
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        let mut device = Self {
            listener,
            local,
            listen_slot: None,
            slots: (0..socket_count).map(|_| Slot::Free).collect(),
            reserved,
            poll,
            events: Events::with_capacity(8),
        };
        match device.arm() {
            Ok(_slot) => {
                info!(local = %device.local, sockets = socket_count, slot = %_slot, "device listening");
                Ok(device)
            }
            Err(_reason) => Err(DeviceError::OutOfSockets),
        }
    }

    /// Lowest-indexed free, unreserved slot.
    fn allocate(&self) -> Result<SlotIndex, ExhaustReason> {
        for (i, slot) in self.slots.iter().enumerate() {
            if matches!(slot, Slot::Free) && !self.reserved_index(i) {
                return Ok(SlotIndex::new(i as u8));
            }
        }
        let idle_reserved = self
            .slots
            .iter()
            .enumerate()
            .any(|(i, slot)| matches!(slot, Slot::Free) && self.reserved_index(i));
        if idle_reserved {
            Err(ExhaustReason::OutOfSockets)
        } else {
            Err(ExhaustReason::AllInUse)
        }
    }

    fn reserved_index(&self, i: usize) -> bool {
        i > 0 && self.reserved[i - 1]
    }

    /// Claims a slot for the listener.
    fn arm(&mut self) -> Result<SlotIndex, ExhaustReason> {
        let slot = self.allocate()?;
        self.slots[slot.index()] = Slot::Listen;
        self.listen_slot = Some(slot);
        debug!(slot = %slot, "listener armed");
        Ok(slot)
    }

    fn is_disconnect(kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::NotConnected
        )
    }
}

impl SocketPool for HostDevice {
    fn socket_count(&self) -> usize {
        self.slots.len()
    }

    fn raw_status(&self, slot: SlotIndex) -> RawStatus {
        let status = match &self.slots[slot.index()] {
            Slot::Free => SocketStatus::Closed,
            Slot::Listen => SocketStatus::Listening,
            Slot::Conn(conn) if conn.closing => SocketStatus::CloseWait,
            Slot::Conn(_) => SocketStatus::Established,
        };
        RawStatus::Code(status.code())
    }

    fn reserved(&self, slot: SlotIndex) -> bool {
        self.reserved_index(slot.index())
    }
}

impl NetDevice for HostDevice {
    fn try_accept(&mut self) -> Result<Option<Accepted>, AcceptError> {
        if self.listen_slot.is_none() {
            self.arm().map_err(AcceptError::Exhausted)?;
        }
        match self.listener.accept() {
            Ok((stream, addr)) => {
                let Some(slot) = self.listen_slot.take() else {
                    // arm() above either set the slot or returned early
                    return Err(AcceptError::Io(io::Error::new(
                        ErrorKind::NotConnected,
                        "accept without an armed listen slot",
                    )));
                };
                if let Err(_e) = stream.set_nodelay(true) {
                    trace!(slot = %slot, error = %_e, "set_nodelay failed");
                }
                let peer = Endpoint::from(addr);
                self.slots[slot.index()] = Slot::Conn(Conn {
                    stream,
                    peer,
                    closing: false,
                });
                // The connection took over the listen slot; re-arm for the
                // next one. Failure is reported by the next accept attempt.
                if let Err(_reason) = self.arm() {
                    debug!(reason = %_reason, "no slot left to re-arm listener");
                }
                Ok(Some(Accepted { slot, peer }))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(AcceptError::Io(e)),
        }
    }

    fn send(&mut self, slot: SlotIndex, payload: &[u8]) -> io::Result<()> {
        let Some(Slot::Conn(conn)) = self.slots.get_mut(slot.index()) else {
            warn!(slot = %slot, "send on empty slot, dropping payload");
            return Ok(());
        };
        match conn.stream.write(payload) {
            Ok(n) if n == payload.len() => Ok(()),
            Ok(_n) => {
                warn!(slot = %slot, sent = _n, len = payload.len(), "short write, dropping remainder");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                warn!(slot = %slot, "socket not writable, dropping payload");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {
                warn!(slot = %slot, "send interrupted, dropping payload");
                Ok(())
            }
            Err(e) if Self::is_disconnect(e.kind()) => {
                conn.closing = true;
                trace!(slot = %slot, error = %e, "peer gone during send");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn close(&mut self, slot: SlotIndex) -> io::Result<()> {
        let Some(entry) = self.slots.get_mut(slot.index()) else {
            warn!(slot = %slot, "close on unknown slot");
            return Ok(());
        };
        match std::mem::replace(entry, Slot::Free) {
            Slot::Conn(conn) => {
                // The peer may already be gone; shutdown failures carry no
                // information at this point.
                let _ = conn.stream.shutdown(Shutdown::Both);
                debug!(slot = %slot, peer = %conn.peer, "slot closed");
            }
            Slot::Listen => {
                *entry = Slot::Listen;
                warn!(slot = %slot, "close on listen slot ignored");
            }
            Slot::Free => {
                warn!(slot = %slot, "close on free slot");
            }
        }
        Ok(())
    }

    fn maintain(&mut self) -> io::Result<()> {
        let mut buf = [0u8; PROBE_LEN];
        for (_index, slot) in self.slots.iter_mut().enumerate() {
            let Slot::Conn(conn) = slot else { continue };
            if conn.closing {
                continue;
            }
            match conn.stream.read(&mut buf) {
                Ok(0) => {
                    conn.closing = true;
                    trace!(slot = _index, "peer closed");
                }
                // Inbound payload is not part of the protocol; discard it.
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if Self::is_disconnect(e.kind()) => {
                    conn.closing = true;
                    trace!(slot = _index, error = %e, "peer reset");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn listen_slot(&self) -> Option<SlotIndex> {
        self.listen_slot
    }

    fn local_endpoint(&self) -> Endpoint {
        self.local
    }

    fn idle(&mut self, timeout: Duration) {
        if let Err(e) = self.poll.poll(&mut self.events, Some(timeout)) {
            if e.kind() != ErrorKind::Interrupted {
                warn!(error = %e, "poll failed");
            }
        }
    }
}
