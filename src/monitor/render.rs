//! Diff-suppressed dashboard rendering.
//!
//! The renderer rebuilds the whole table every call and compares it to the
//! previous snapshot; only a changed table is worth printing. Color codes
//! are part of the snapshot string, so a color-only change (a reservation
//! glyph flipping, say) counts as a change like any other.

use crate::console::{self, Color, RESET};
use crate::pool::{PoolError, PoolView, SocketPool};

use super::sessions::SessionTracker;

const TOP_BORDER: &str = "┏━━━━┳━━━┳━━━━━━━━━━━━━┳━━━━━━━━━━━━━━━━━━━━━━━┓";
const BOTTOM_BORDER: &str = "┗━━━━┻━━━┻━━━━━━━━━━━━━┻━━━━━━━━━━━━━━━━━━━━━━━┛";

/// Peer column placeholder for a slot without a session, 21 columns wide.
const NO_PEER: &str = "         ---         ";

/// Rebuilds the dashboard each tick and suppresses unchanged output.
#[derive(Debug, Default)]
pub struct Renderer {
    last: String,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent snapshot; empty before the first render.
    #[must_use]
    pub fn snapshot(&self) -> &str {
        &self.last
    }

    /// Rebuilds the table and retains it as the new baseline if it changed.
    ///
    /// Returns `true` when the caller should print [`Self::snapshot`].
    ///
    /// # Errors
    ///
    /// An unmapped status code is an invariant violation and fatal.
    pub fn render<P: SocketPool + ?Sized>(
        &mut self,
        view: &PoolView<'_, P>,
        sessions: &SessionTracker,
    ) -> Result<bool, PoolError> {
        let current = build_table(view, sessions)?;
        if current == self.last {
            return Ok(false);
        }
        self.last = current;
        Ok(true)
    }
}

fn build_table<P: SocketPool + ?Sized>(
    view: &PoolView<'_, P>,
    sessions: &SessionTracker,
) -> Result<String, PoolError> {
    let white = Color::White;
    let mut table = format!("\r\n{white}{TOP_BORDER}{RESET}\r\n");
    for slot in view.slots() {
        let status_cell = console::status_text(view.status(slot)?);
        let mark = console::reservation_mark(view.reservation(slot));
        let (peer_color, peer_cell) = match sessions.session(slot) {
            Some(session) => (Color::Yellow, session.peer.to_string()),
            None => (Color::Black, NO_PEER.to_owned()),
        };
        // The status cell is padded with its color codes included, five
        // characters per code, so 21 padded characters leave 11 visible.
        table.push_str(&format!(
            "{white}┃ S{index}{white} ┃ {mark}{white} ┃ {status_cell:<21}{white} ┃ {peer_color}{peer_cell:<21}{white} ┃\r\n",
            index = slot.index(),
        ));
    }
    table.push_str(&format!("{white}{BOTTOM_BORDER}{RESET}\r\n"));
    Ok(table)
}
