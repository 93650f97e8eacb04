//! Live monitor and heartbeat server for a fixed bank of hardware-style
//! TCP sockets.
//!
//! sockscope watches a socket pool shaped like the W5x-class embedded TCP
//! controllers: a handful of numbered slots with per-slot status codes, a
//! reservation bit for every slot above zero, and a listener that migrates
//! between slots as connections arrive. Connected clients get a one-shot
//! greeting and periodic heartbeats; the console gets one report line per
//! connection event and a box-drawing dashboard that is reprinted only
//! when its content changes.
//!
//! - [`pool`]: slot indices, status codes, reservations, the pool view.
//! - [`net`]: the device contract and the mio-backed host implementation.
//! - [`monitor`]: the tick pipeline and the serve loop.
//! - [`console`]: color palette, report lines, dashboard formatting.

pub mod console;
pub mod monitor;
pub mod net;
pub mod pool;

mod trace;

pub use monitor::{Monitor, MonitorConfig, MonitorError, TickReport};
pub use net::{Endpoint, HostDevice};
pub use pool::{SlotIndex, SocketStatus};
pub use trace::init_tracing;
