//! # Configuration
//!
//! Settings a host application can tune for the handshake. Deserializes from
//! the host's own configuration source; absent fields take their defaults.

use serde::{Deserialize, Serialize};

/// Handshake settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Identity type tag used for anonymous recipients.
    pub identity_type: String,

    /// Maximum number of interactive authentication sessions a single
    /// introduction may ask for before it is treated as failed.
    pub interactive_auth_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity_type: "email".into(),
            interactive_auth_rounds: 3,
        }
    }
}
