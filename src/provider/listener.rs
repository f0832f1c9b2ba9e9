//! # Status Listener
//!
//! The status listener trait allows a client to receive updates as the
//! handshake progresses, for example to drive a progress indicator with a
//! cancel button. Only transitions applied to the current session are
//! reported; a superseded or aborted session never notifies again.

use crate::handshake::Phase;

/// `StatusListener` receives handshake phase transitions.
pub trait StatusListener {
    /// Notify the listener that session `session_id` entered `phase`.
    fn notify(&self, session_id: &str, phase: Phase);
}
