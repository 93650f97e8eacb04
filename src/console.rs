//! Console palette and report-line formatting.
//!
//! Everything the monitor prints goes through here: the ANSI color table,
//! the status and reservation colorings the dashboard uses, the one-line
//! connection reports, and the startup banner. Formatting is separated from
//! printing so tests can assert on exact output.
//!
//! Output assumes a terminal that renders SGR color codes and the
//! box-drawing and `●` glyphs.

use std::fmt;

use crate::net::{Endpoint, ExhaustReason};
use crate::pool::{Reservation, SlotIndex, SocketStatus};

/// Base tone the dashboard resets to between colored fields. Bright white
/// rather than the SGR full reset, so the table chrome stays bright.
pub const RESET: &str = "\x1b[97m";

/// Bright foreground colors used in all console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// SGR sequence selecting this foreground color.
    #[must_use]
    pub const fn sgr(self) -> &'static str {
        match self {
            Self::Black => "\x1b[90m",
            Self::Red => "\x1b[91m",
            Self::Green => "\x1b[92m",
            Self::Yellow => "\x1b[93m",
            Self::Blue => "\x1b[94m",
            Self::Magenta => "\x1b[95m",
            Self::Cyan => "\x1b[96m",
            Self::White => "\x1b[97m",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sgr())
    }
}

/// Dashboard color for a socket status.
#[must_use]
pub const fn status_color(status: SocketStatus) -> Color {
    match status {
        SocketStatus::Closed => Color::Green,
        SocketStatus::Init | SocketStatus::TimeWait | SocketStatus::LastAck => Color::Cyan,
        SocketStatus::Listening
        | SocketStatus::Udp
        | SocketStatus::IpRaw
        | SocketStatus::MacRaw
        | SocketStatus::Pppoe => Color::Yellow,
        SocketStatus::SynSent | SocketStatus::SynRecv | SocketStatus::Established => Color::Blue,
        SocketStatus::FinWait | SocketStatus::Closing | SocketStatus::CloseWait => Color::Red,
    }
}

/// Dashboard color for a reservation state.
#[must_use]
pub const fn reservation_color(reservation: Reservation) -> Color {
    match reservation {
        Reservation::Free => Color::Green,
        Reservation::Reserved => Color::Red,
        Reservation::Unlocked => Color::White,
    }
}

/// Colorized status label, reset to the base tone, as the dashboard status
/// column shows it.
#[must_use]
pub fn status_text(status: SocketStatus) -> String {
    format!("{}{}{RESET}", status_color(status), status.label())
}

/// Colored reservation glyph. Carries no trailing reset; the dashboard
/// emits the base tone right after it.
#[must_use]
pub fn reservation_mark(reservation: Reservation) -> String {
    format!("{}●", reservation_color(reservation))
}

/// Line announcing which slot the listener currently occupies.
#[must_use]
pub fn listening_line(slot: SlotIndex, local: Endpoint) -> String {
    format!(
        "{green}* Listening for connections on {yellow}Socket {slot}{RESET}{green} @ {white}{local}{RESET}",
        green = Color::Green,
        yellow = Color::Yellow,
        white = Color::White,
    )
}

/// Line reporting an accepted connection.
#[must_use]
pub fn accepted_line(slot: SlotIndex, peer: Endpoint) -> String {
    format!(
        "{green}+ Socket {white}{slot} {green}> Connection from {white}{peer} {green}accepted{RESET}",
        green = Color::Green,
        white = Color::White,
    )
}

/// Line reporting a reclaimed connection.
#[must_use]
pub fn closed_line(slot: SlotIndex, peer: Endpoint) -> String {
    format!(
        "{red}- Socket {white}{slot} {red}> Connection to {white}{peer} {red}closed{RESET}",
        red = Color::Red,
        white = Color::White,
    )
}

/// Line reporting pool exhaustion. Printed once per exhaustion episode.
#[must_use]
pub fn exhausted_line(reason: ExhaustReason) -> String {
    format!(
        "{red}* Could not accept connection, {reason}.",
        red = Color::Red,
    )
}

/// Startup banner describing the configured pool.
#[must_use]
pub fn banner(local: Endpoint, socket_count: usize) -> String {
    format!(
        "{blue}Server..............:{white} sockscope {version}\r\n\
         {blue}Sockets.............:{white} {socket_count}\r\n\
         {blue}Reservable Sockets..:{white} {reservable} {black}(Socket #0 cannot be reserved)\r\n\
         {blue}Bind................:{white} {local}\r\n{RESET}",
        blue = Color::Blue,
        white = Color::White,
        black = Color::Black,
        version = env!("CARGO_PKG_VERSION"),
        reservable = socket_count - 1,
    )
}
