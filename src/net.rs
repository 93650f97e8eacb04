//! Network transport primitives.
//!
//! Provides the socket-bank abstraction the monitor runs against: the
//! [`NetDevice`] contract plus a mio-based host implementation. Endpoint
//! types are shared with whatever backend ends up behind the trait, so a
//! hardware-register implementation can slot in without touching the
//! monitor.

pub mod device;
pub mod endpoint;
pub mod host;

pub use device::{AcceptError, Accepted, ExhaustReason, NetDevice};
pub use endpoint::Endpoint;
pub use host::{DeviceError, HostDevice};
