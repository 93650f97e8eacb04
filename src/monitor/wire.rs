//! Client-facing payload text.
//!
//! Payloads are plain UTF-8 lines, CRLF-terminated. Color never goes on
//! the wire; it belongs to the console side.

use std::time::Duration;

use crate::pool::SlotIndex;

/// One-shot greeting sent to a freshly accepted peer.
#[must_use]
pub fn welcome(slot: SlotIndex) -> Vec<u8> {
    format!("Connected to Socket {slot}\r\n").into_bytes()
}

/// Periodic heartbeat carrying the connection age in seconds.
#[must_use]
pub fn heartbeat(slot: SlotIndex, connected_for: Duration) -> Vec<u8> {
    format!("Socket {slot} [{:.2}s]\r\n", connected_for.as_secs_f64()).into_bytes()
}
