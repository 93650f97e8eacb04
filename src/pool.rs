//! Socket pool primitives: slot indices, protocol status codes, reservation
//! state, and the read-only view the monitor observes the pool through.
//!
//! The pool is a fixed bank of hardware sockets. Status codes are the raw
//! `SnSR` register values of the W5x chipset family; depending on chip
//! generation the driver reports them either as a bare scalar or as a
//! one-byte register block, so [`RawStatus`] carries both shapes and
//! [`PoolView`] normalizes them at the read boundary.

use std::fmt;

use thiserror::Error;

/// Largest socket bank any supported device exposes.
///
/// The W5500 generation carries 8 hardware sockets; smaller parts expose a
/// prefix of that range.
pub const MAX_SOCKETS: usize = 8;

/// Index of one socket slot in the pool.
///
/// Displays as a two-digit decimal (`03`), matching the report-line and
/// payload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SlotIndex(u8);

impl SlotIndex {
    /// Creates a slot index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < MAX_SOCKETS, "slot index out of range");
        Self(index)
    }

    /// Returns the index as a usize, for table addressing.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Raw per-slot status as reported by the device.
///
/// Older parts return the status register as a one-byte block read, newer
/// ones as a bare scalar. Both carry the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    /// Status register value as a scalar.
    Code(u8),
    /// Status register value as a single-byte block read.
    Block([u8; 1]),
}

impl RawStatus {
    /// Returns the status code regardless of reporting shape.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Code(code) => code,
            Self::Block([code]) => code,
        }
    }
}

/// Protocol state of one hardware socket (`SnSR` register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketStatus {
    Closed = 0x00,
    Init = 0x13,
    Listening = 0x14,
    SynSent = 0x15,
    SynRecv = 0x16,
    Established = 0x17,
    FinWait = 0x18,
    Closing = 0x1A,
    TimeWait = 0x1B,
    CloseWait = 0x1C,
    LastAck = 0x1D,
    Udp = 0x22,
    IpRaw = 0x32,
    MacRaw = 0x42,
    Pppoe = 0x5F,
}

impl SocketStatus {
    /// Maps a raw register code to a status, `None` if the code is unknown.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Closed),
            0x13 => Some(Self::Init),
            0x14 => Some(Self::Listening),
            0x15 => Some(Self::SynSent),
            0x16 => Some(Self::SynRecv),
            0x17 => Some(Self::Established),
            0x18 => Some(Self::FinWait),
            0x1A => Some(Self::Closing),
            0x1B => Some(Self::TimeWait),
            0x1C => Some(Self::CloseWait),
            0x1D => Some(Self::LastAck),
            0x22 => Some(Self::Udp),
            0x32 => Some(Self::IpRaw),
            0x42 => Some(Self::MacRaw),
            0x5F => Some(Self::Pppoe),
            _ => None,
        }
    }

    /// Returns the raw register code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the dashboard label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Init => "INIT",
            Self::Listening => "LISTENING",
            Self::SynSent => "SYN_SENT",
            Self::SynRecv => "SYN_RECV",
            Self::Established => "ESTABLISHED",
            Self::FinWait => "FIN_WAIT",
            Self::Closing => "CLOSING",
            Self::TimeWait => "TIME_WAIT",
            Self::CloseWait => "CLOSE_WAIT",
            Self::LastAck => "LAST_ACK",
            Self::Udp => "UDP",
            Self::IpRaw => "IPRAW",
            Self::MacRaw => "MACRAW",
            Self::Pppoe => "PPPOE",
        }
    }

    /// Whether a session on this slot is terminating and should be closed
    /// and its slot reclaimed.
    ///
    /// Only `FIN_WAIT` and `CLOSE_WAIT` qualify; `CLOSING` and `TIME_WAIT`
    /// resolve on their own without the server's involvement.
    #[must_use]
    pub const fn is_terminating(self) -> bool {
        matches!(self, Self::FinWait | Self::CloseWait)
    }
}

impl fmt::Display for SocketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reservation state of one slot, as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Available to the allocator.
    Free,
    /// Held back for driver use, excluded from allocation.
    Reserved,
    /// Slot 0: not reservable by contract, always allocator-visible.
    Unlocked,
}

/// Pool-side collaborator contract: per-slot status and reservation data.
///
/// `slot` arguments must be below [`socket_count`](Self::socket_count);
/// implementations may panic otherwise.
pub trait SocketPool {
    /// Number of slots in the bank. Fixed for the life of the device.
    fn socket_count(&self) -> usize;

    /// Raw status register for a slot.
    fn raw_status(&self, slot: SlotIndex) -> RawStatus;

    /// Whether the driver holds this slot reserved. Never consulted for
    /// slot 0.
    fn reserved(&self, slot: SlotIndex) -> bool;
}

/// Failure observing the pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The device reported a status code outside the known register set.
    /// The pool model no longer matches the hardware, so this is fatal.
    #[error("unknown socket status code {0:#04x}")]
    UnknownStatus(u8),
}

/// Read-only, normalized view over a [`SocketPool`].
///
/// All status reads go through [`status`](Self::status), which collapses the
/// two raw reporting shapes and rejects unknown codes. The view never
/// mutates the pool.
#[derive(Clone, Copy)]
pub struct PoolView<'a, P: SocketPool + ?Sized> {
    pool: &'a P,
}

impl<'a, P: SocketPool + ?Sized> PoolView<'a, P> {
    /// Wraps a pool in a read-only view.
    #[must_use]
    pub const fn new(pool: &'a P) -> Self {
        Self { pool }
    }

    /// Number of slots in the bank.
    #[must_use]
    pub fn socket_count(&self) -> usize {
        self.pool.socket_count()
    }

    /// Iterates all slot indices in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = SlotIndex> {
        (0..self.pool.socket_count()).map(|i| SlotIndex::new(i as u8))
    }

    /// Normalized protocol status of a slot.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownStatus`] if the device reports a code
    /// outside the known register set.
    pub fn status(&self, slot: SlotIndex) -> Result<SocketStatus, PoolError> {
        let code = self.pool.raw_status(slot).code();
        SocketStatus::from_code(code).ok_or(PoolError::UnknownStatus(code))
    }

    /// Reservation state of a slot. Slot 0 is always [`Reservation::Unlocked`]
    /// regardless of what the pool reports.
    #[must_use]
    pub fn reservation(&self, slot: SlotIndex) -> Reservation {
        if slot.index() == 0 {
            Reservation::Unlocked
        } else if self.pool.reserved(slot) {
            Reservation::Reserved
        } else {
            Reservation::Free
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPool {
        statuses: Vec<RawStatus>,
        reserved: Vec<bool>,
    }

    impl SocketPool for ScriptedPool {
        fn socket_count(&self) -> usize {
            self.statuses.len()
        }

        fn raw_status(&self, slot: SlotIndex) -> RawStatus {
            self.statuses[slot.index()]
        }

        fn reserved(&self, slot: SlotIndex) -> bool {
            self.reserved[slot.index()]
        }
    }

    #[test]
    fn slot_index_displays_two_digits() {
        assert_eq!(format!("{}", SlotIndex::new(0)), "00");
        assert_eq!(format!("{}", SlotIndex::new(7)), "07");
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            SocketStatus::Closed,
            SocketStatus::Init,
            SocketStatus::Listening,
            SocketStatus::SynSent,
            SocketStatus::SynRecv,
            SocketStatus::Established,
            SocketStatus::FinWait,
            SocketStatus::Closing,
            SocketStatus::TimeWait,
            SocketStatus::CloseWait,
            SocketStatus::LastAck,
            SocketStatus::Udp,
            SocketStatus::IpRaw,
            SocketStatus::MacRaw,
            SocketStatus::Pppoe,
        ] {
            assert_eq!(SocketStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(SocketStatus::from_code(0x99), None);
        assert_eq!(SocketStatus::from_code(0x01), None);
    }

    #[test]
    fn terminating_set_is_fin_wait_and_close_wait_only() {
        assert!(SocketStatus::FinWait.is_terminating());
        assert!(SocketStatus::CloseWait.is_terminating());
        assert!(!SocketStatus::Closing.is_terminating());
        assert!(!SocketStatus::TimeWait.is_terminating());
        assert!(!SocketStatus::Established.is_terminating());
        assert!(!SocketStatus::LastAck.is_terminating());
    }

    #[test]
    fn raw_status_shapes_carry_the_same_code() {
        assert_eq!(RawStatus::Code(0x17).code(), 0x17);
        assert_eq!(RawStatus::Block([0x17]).code(), 0x17);
    }

    #[test]
    fn view_normalizes_both_raw_shapes() {
        let pool = ScriptedPool {
            statuses: vec![RawStatus::Code(0x14), RawStatus::Block([0x17])],
            reserved: vec![false, false],
        };
        let view = PoolView::new(&pool);
        assert_eq!(view.status(SlotIndex::new(0)), Ok(SocketStatus::Listening));
        assert_eq!(
            view.status(SlotIndex::new(1)),
            Ok(SocketStatus::Established)
        );
    }

    #[test]
    fn view_reports_unknown_code() {
        let pool = ScriptedPool {
            statuses: vec![RawStatus::Code(0x99)],
            reserved: vec![false],
        };
        let view = PoolView::new(&pool);
        assert_eq!(
            view.status(SlotIndex::new(0)),
            Err(PoolError::UnknownStatus(0x99))
        );
    }

    #[test]
    fn slot_zero_is_always_unlocked() {
        // Even a pool that claims slot 0 is reserved gets overridden.
        let pool = ScriptedPool {
            statuses: vec![RawStatus::Code(0x00); 3],
            reserved: vec![true, true, false],
        };
        let view = PoolView::new(&pool);
        assert_eq!(view.reservation(SlotIndex::new(0)), Reservation::Unlocked);
        assert_eq!(view.reservation(SlotIndex::new(1)), Reservation::Reserved);
        assert_eq!(view.reservation(SlotIndex::new(2)), Reservation::Free);
    }

    #[test]
    fn slots_iterates_in_ascending_order() {
        let pool = ScriptedPool {
            statuses: vec![RawStatus::Code(0x00); 4],
            reserved: vec![false; 4],
        };
        let view = PoolView::new(&pool);
        let indices: Vec<usize> = view.slots().map(SlotIndex::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
