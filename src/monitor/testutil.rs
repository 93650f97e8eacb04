//! Scripted collaborators for monitor tests.

use std::collections::VecDeque;
use std::io;

use crate::net::{AcceptError, Accepted, NetDevice};
use crate::net::{Endpoint, ExhaustReason};
use crate::pool::{RawStatus, SlotIndex, SocketPool, SocketStatus};

/// Scripted device: statuses and accept outcomes are set by the test,
/// sends and closes are recorded for assertion.
pub(crate) struct FakeDevice {
    statuses: Vec<RawStatus>,
    reserved: Vec<bool>,
    accepts: VecDeque<Result<Option<Accepted>, AcceptError>>,
    pub(crate) sent: Vec<(SlotIndex, Vec<u8>)>,
    pub(crate) closed: Vec<SlotIndex>,
    listen_slot: Option<SlotIndex>,
    local: Endpoint,
}

impl FakeDevice {
    pub(crate) fn new(socket_count: usize) -> Self {
        Self {
            statuses: vec![RawStatus::Code(SocketStatus::Closed.code()); socket_count],
            reserved: vec![false; socket_count],
            accepts: VecDeque::new(),
            sent: Vec::new(),
            closed: Vec::new(),
            listen_slot: Some(SlotIndex::new(0)),
            local: Endpoint::new_v4(192, 168, 1, 200, 2231),
        }
    }

    pub(crate) fn set_status(&mut self, slot: SlotIndex, status: SocketStatus) {
        self.statuses[slot.index()] = RawStatus::Code(status.code());
    }

    pub(crate) fn set_raw(&mut self, slot: SlotIndex, raw: RawStatus) {
        self.statuses[slot.index()] = raw;
    }

    pub(crate) fn set_reserved(&mut self, slot: SlotIndex) {
        self.reserved[slot.index()] = true;
    }

    pub(crate) fn set_listen_slot(&mut self, slot: Option<SlotIndex>) {
        self.listen_slot = slot;
    }

    /// Queues a successful accept. The slot is marked established when
    /// `try_accept` pops it.
    pub(crate) fn push_accept(&mut self, slot: SlotIndex, peer: Endpoint) {
        self.accepts
            .push_back(Ok(Some(Accepted { slot, peer })));
    }

    pub(crate) fn push_exhausted(&mut self, reason: ExhaustReason) {
        self.accepts
            .push_back(Err(AcceptError::Exhausted(reason)));
    }

    pub(crate) fn push_io_error(&mut self, kind: io::ErrorKind) {
        self.accepts
            .push_back(Err(AcceptError::Io(io::Error::from(kind))));
    }

    /// Payloads sent to one slot, in order.
    pub(crate) fn sent_to(&self, slot: SlotIndex) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl SocketPool for FakeDevice {
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

impl NetDevice for FakeDevice {
    fn try_accept(&mut self) -> Result<Option<Accepted>, AcceptError> {
        match self.accepts.pop_front() {
            Some(Ok(Some(accepted))) => {
                self.set_status(accepted.slot, SocketStatus::Established);
                Ok(Some(accepted))
            }
            Some(outcome) => outcome,
            None => Ok(None),
        }
    }

    fn send(&mut self, slot: SlotIndex, payload: &[u8]) -> io::Result<()> {
        self.sent.push((slot, payload.to_vec()));
        Ok(())
    }

    fn close(&mut self, slot: SlotIndex) -> io::Result<()> {
        self.closed.push(slot);
        self.set_status(slot, SocketStatus::Closed);
        Ok(())
    }

    fn listen_slot(&self) -> Option<SlotIndex> {
        self.listen_slot
    }

    fn local_endpoint(&self) -> Endpoint {
        self.local
    }
}
