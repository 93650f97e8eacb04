//! Socket-pool monitor core.
//!
//! [`Monitor`] owns the device and the per-concern collaborators (accept
//! listener, session tracker, heartbeat ticker, renderer) and drives them
//! in a fixed order every tick: device housekeeping, one accept attempt,
//! session reconciliation with the optional heartbeat, then the dashboard
//! rebuild. [`Monitor::run`] wraps the tick in the serve loop, printing
//! report lines and changed snapshots through [`console`](crate::console).

pub mod listener;
pub mod render;
pub mod sessions;
pub mod ticker;
pub mod wire;

#[cfg(test)]
pub(crate) mod testutil;

use std::io;
use std::time::Duration;

use minstant::Instant;
use thiserror::Error;

use crate::console;
use crate::net::NetDevice;
use crate::pool::{PoolError, PoolView, SlotIndex, SocketPool, SocketStatus};
use crate::trace::info;

pub use listener::{AcceptEvent, Listener};
pub use render::Renderer;
pub use sessions::{Reclaimed, Session, SessionTracker};
pub use ticker::HeartbeatTicker;

/// Timing configuration for the monitor loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between heartbeat payloads to connected clients.
    ///
    /// Beats are at least this far apart. A stalled loop does not backfill
    /// missed beats when it catches up.
    ///
    /// **Default**: 2s
    pub heartbeat_interval: Duration,

    /// Loop pacing. `run` spends up to this long in [`NetDevice::idle`]
    /// after each tick.
    ///
    /// **Default**: 1ms
    pub tick_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(2),
            tick_interval: Duration::from_millis(1),
        }
    }
}

impl MonitorConfig {
    /// Builder-style setter for the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Builder-style setter for the loop pacing interval.
    #[must_use]
    pub const fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// Fatal failure of the monitor loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The pool reported a status code outside the known set.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The device failed beyond the recoverable accept conditions.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What one tick did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Accept outcome worth reporting, if any.
    pub accept: Option<AcceptEvent>,
    /// Sessions reclaimed this tick, in slot order.
    pub reclaimed: Vec<Reclaimed>,
    /// Number of heartbeat payloads sent this tick.
    pub heartbeats: usize,
    /// Whether the dashboard changed and the snapshot should be printed.
    pub rendered: bool,
}

/// The monitor loop over one device.
pub struct Monitor<D: NetDevice + SocketPool> {
    device: D,
    config: MonitorConfig,
    listener: Listener,
    sessions: SessionTracker,
    ticker: HeartbeatTicker,
    renderer: Renderer,
}

impl<D: NetDevice + SocketPool> Monitor<D> {
    /// Builds a monitor over `device`. The first heartbeat window opens at
    /// construction.
    ///
    /// # Panics
    ///
    /// Panics if `heartbeat_interval` is zero.
    #[must_use]
    pub fn new(device: D, config: MonitorConfig) -> Self {
        assert!(
            config.heartbeat_interval > Duration::ZERO,
            "heartbeat_interval must be > 0"
        );
        let socket_count = device.socket_count();
        let ticker = HeartbeatTicker::new(config.heartbeat_interval, Instant::now());
        Self {
            device,
            config,
            listener: Listener::new(),
            sessions: SessionTracker::new(socket_count),
            ticker,
            renderer: Renderer::new(),
        }
    }

    /// The owned device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable access to the owned device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The latest dashboard snapshot; empty before the first tick.
    #[must_use]
    pub fn snapshot(&self) -> &str {
        self.renderer.snapshot()
    }

    /// Runs one pass of the monitor pipeline at `now`.
    ///
    /// # Errors
    ///
    /// Device transport failures and unknown status codes are fatal and
    /// end the loop.
    pub fn tick(&mut self, now: Instant) -> Result<TickReport, MonitorError> {
        self.device.maintain()?;
        let accept = self
            .listener
            .poll(&mut self.device, &mut self.sessions, now)?;
        let heartbeat_due = self.ticker.is_due(now);
        let statuses = self.statuses()?;
        let (reclaimed, heartbeats) =
            self.sessions
                .tick(&statuses, &mut self.device, now, heartbeat_due)?;
        let rendered = self
            .renderer
            .render(&PoolView::new(&self.device), &self.sessions)?;
        Ok(TickReport {
            accept,
            reclaimed,
            heartbeats,
            rendered,
        })
    }

    /// Serves forever.
    ///
    /// Prints the listening line, then loops [`Self::tick`], printing
    /// report lines and changed snapshots and pacing each pass with
    /// [`NetDevice::idle`]. Returns only on a fatal error; the error stays
    /// visible to the caller.
    ///
    /// # Errors
    ///
    /// The first fatal device or pool failure.
    pub fn run(&mut self) -> Result<(), MonitorError> {
        info!(local = %self.device.local_endpoint(), "monitor serving");
        self.print_listen_status();
        loop {
            let report = self.tick(Instant::now())?;
            self.print_report(&report);
            self.device.idle(self.config.tick_interval);
        }
    }

    /// Status snapshot for session reconciliation, taken before the
    /// tracker borrows the device mutably.
    fn statuses(&self) -> Result<Vec<(SlotIndex, SocketStatus)>, PoolError> {
        let view = PoolView::new(&self.device);
        let mut statuses = Vec::with_capacity(view.socket_count());
        for slot in view.slots() {
            statuses.push((slot, view.status(slot)?));
        }
        Ok(statuses)
    }

    fn print_listen_status(&self) {
        if let Some(slot) = self.device.listen_slot() {
            println!(
                "{}",
                console::listening_line(slot, self.device.local_endpoint())
            );
        }
    }

    fn print_report(&self, report: &TickReport) {
        match report.accept {
            Some(AcceptEvent::Connected { slot, peer }) => {
                println!("{}", console::accepted_line(slot, peer));
                // The listen slot migrates on accept; show where it landed.
                self.print_listen_status();
            }
            Some(AcceptEvent::Exhausted(reason)) => {
                println!("{}", console::exhausted_line(reason));
            }
            None => {}
        }
        for reclaimed in &report.reclaimed {
            println!("{}", console::closed_line(reclaimed.slot, reclaimed.peer));
        }
        if report.rendered {
            println!("{}", self.renderer.snapshot());
        }
    }
}
