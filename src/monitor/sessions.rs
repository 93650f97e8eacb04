//! Client session bookkeeping.
//!
//! One optional [`Session`] per slot. The tracker reconciles its entries
//! against the per-tick status snapshot: terminating slots are closed and
//! reclaimed, surviving ones get the heartbeat when it is due.

use std::io;

use minstant::Instant;

use crate::net::{Endpoint, NetDevice};
use crate::pool::{SlotIndex, SocketStatus};
use crate::trace::{info, warn};

use super::wire;

/// Live connection occupying one slot.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub peer: Endpoint,
    pub connected_at: Instant,
}

/// A session whose slot was closed and returned to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reclaimed {
    pub slot: SlotIndex,
    pub peer: Endpoint,
}

/// Per-slot session table.
#[derive(Debug)]
pub struct SessionTracker {
    slots: Vec<Option<Session>>,
}

impl SessionTracker {
    #[must_use]
    pub fn new(socket_count: usize) -> Self {
        Self {
            slots: vec![None; socket_count],
        }
    }

    /// Records a new session for `slot`, stamped at `now`.
    ///
    /// A slot accepts again only after its previous session was reclaimed,
    /// so an occupied entry here means bookkeeping drifted from the device;
    /// the stale session is dropped.
    pub fn register(&mut self, slot: SlotIndex, peer: Endpoint, now: Instant) {
        let fresh = Session {
            peer,
            connected_at: now,
        };
        if let Some(_stale) = self.slots[slot.index()].replace(fresh) {
            warn!(slot = %slot, stale_peer = %_stale.peer, "session replaced without close");
        }
    }

    #[must_use]
    pub fn session(&self, slot: SlotIndex) -> Option<Session> {
        self.slots[slot.index()]
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Reconciles sessions against the tick's status snapshot.
    ///
    /// Walks `statuses` in order. A session whose slot reports a
    /// terminating status is closed on the device and reported as
    /// [`Reclaimed`]; otherwise, when `heartbeat_due` is set, the session
    /// gets one heartbeat payload carrying its elapsed connected time.
    /// Returns the reclaimed sessions and the number of heartbeats sent.
    ///
    /// # Errors
    ///
    /// Propagates device close/send failures; these are fatal to the loop.
    pub fn tick<D: NetDevice + ?Sized>(
        &mut self,
        statuses: &[(SlotIndex, SocketStatus)],
        device: &mut D,
        now: Instant,
        heartbeat_due: bool,
    ) -> io::Result<(Vec<Reclaimed>, usize)> {
        let mut reclaimed = Vec::new();
        let mut heartbeats = 0;
        for &(slot, status) in statuses {
            let Some(session) = self.slots[slot.index()] else {
                continue;
            };
            if status.is_terminating() {
                device.close(slot)?;
                self.slots[slot.index()] = None;
                info!(slot = %slot, peer = %session.peer, "session reclaimed");
                reclaimed.push(Reclaimed {
                    slot,
                    peer: session.peer,
                });
            } else if heartbeat_due {
                let elapsed = now
                    .checked_duration_since(session.connected_at)
                    .unwrap_or_default();
                device.send(slot, &wire::heartbeat(slot, elapsed))?;
                heartbeats += 1;
            }
        }
        Ok((reclaimed, heartbeats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::testutil::FakeDevice;
    use std::time::Duration;

    fn statuses(entries: &[(u8, SocketStatus)]) -> Vec<(SlotIndex, SocketStatus)> {
        entries
            .iter()
            .map(|&(slot, status)| (SlotIndex::new(slot), status))
            .collect()
    }

    #[test]
    fn terminating_session_is_closed_and_reclaimed() {
        let mut device = FakeDevice::new(4);
        let mut tracker = SessionTracker::new(4);
        let now = Instant::now();
        let peer = Endpoint::new_v4(10, 0, 0, 5, 49152);
        tracker.register(SlotIndex::new(1), peer, now);

        let snapshot = statuses(&[
            (0, SocketStatus::Listening),
            (1, SocketStatus::CloseWait),
            (2, SocketStatus::Closed),
            (3, SocketStatus::Closed),
        ]);
        let (reclaimed, heartbeats) = tracker
            .tick(&snapshot, &mut device, now + Duration::from_secs(1), true)
            .unwrap();

        assert_eq!(
            reclaimed,
            vec![Reclaimed {
                slot: SlotIndex::new(1),
                peer,
            }]
        );
        assert_eq!(heartbeats, 0);
        assert_eq!(device.closed, vec![SlotIndex::new(1)]);
        assert!(tracker.session(SlotIndex::new(1)).is_none());
        assert_eq!(tracker.live_count(), 0);
    }

    #[test]
    fn fin_wait_also_reclaims() {
        let mut device = FakeDevice::new(2);
        let mut tracker = SessionTracker::new(2);
        let now = Instant::now();
        tracker.register(SlotIndex::new(0), Endpoint::new_v4(10, 0, 0, 5, 1), now);

        let snapshot = statuses(&[(0, SocketStatus::FinWait), (1, SocketStatus::Listening)]);
        let (reclaimed, _) = tracker.tick(&snapshot, &mut device, now, false).unwrap();
        assert_eq!(reclaimed.len(), 1);
    }

    #[test]
    fn due_tick_heartbeats_every_live_session_once() {
        let mut device = FakeDevice::new(4);
        let mut tracker = SessionTracker::new(4);
        let start = Instant::now();
        tracker.register(SlotIndex::new(0), Endpoint::new_v4(10, 0, 0, 5, 1), start);
        tracker.register(SlotIndex::new(2), Endpoint::new_v4(10, 0, 0, 6, 2), start);

        let snapshot = statuses(&[
            (0, SocketStatus::Established),
            (1, SocketStatus::Listening),
            (2, SocketStatus::Established),
            (3, SocketStatus::Closed),
        ]);
        let now = start + Duration::from_millis(1500);
        let (reclaimed, heartbeats) = tracker.tick(&snapshot, &mut device, now, true).unwrap();

        assert!(reclaimed.is_empty());
        assert_eq!(heartbeats, 2);
        assert_eq!(
            device.sent_to(SlotIndex::new(0)),
            vec![b"Socket 00 [1.50s]\r\n".to_vec()]
        );
        assert_eq!(
            device.sent_to(SlotIndex::new(2)),
            vec![b"Socket 02 [1.50s]\r\n".to_vec()]
        );
        assert!(device.sent_to(SlotIndex::new(1)).is_empty());
    }

    #[test]
    fn undue_tick_sends_nothing() {
        let mut device = FakeDevice::new(2);
        let mut tracker = SessionTracker::new(2);
        let now = Instant::now();
        tracker.register(SlotIndex::new(0), Endpoint::new_v4(10, 0, 0, 5, 1), now);

        let snapshot = statuses(&[(0, SocketStatus::Established), (1, SocketStatus::Listening)]);
        let (reclaimed, heartbeats) = tracker.tick(&snapshot, &mut device, now, false).unwrap();

        assert!(reclaimed.is_empty());
        assert_eq!(heartbeats, 0);
        assert!(device.sent.is_empty());
    }

    #[test]
    fn reclaim_takes_precedence_over_the_heartbeat() {
        let mut device = FakeDevice::new(2);
        let mut tracker = SessionTracker::new(2);
        let now = Instant::now();
        tracker.register(SlotIndex::new(0), Endpoint::new_v4(10, 0, 0, 5, 1), now);

        let snapshot = statuses(&[(0, SocketStatus::CloseWait), (1, SocketStatus::Listening)]);
        let (reclaimed, heartbeats) = tracker.tick(&snapshot, &mut device, now, true).unwrap();

        assert_eq!(reclaimed.len(), 1);
        assert_eq!(heartbeats, 0);
        assert!(device.sent.is_empty());
    }

    #[test]
    fn register_replaces_a_stale_session() {
        let mut tracker = SessionTracker::new(2);
        let now = Instant::now();
        let first = Endpoint::new_v4(10, 0, 0, 5, 1);
        let second = Endpoint::new_v4(10, 0, 0, 6, 2);
        tracker.register(SlotIndex::new(0), first, now);
        tracker.register(SlotIndex::new(0), second, now);

        let session = tracker.session(SlotIndex::new(0)).unwrap();
        assert_eq!(session.peer, second);
        assert_eq!(tracker.live_count(), 1);
    }
}
