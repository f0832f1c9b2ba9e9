//! Session state for a single handshake.

use futures::future::AbortHandle;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::issuer::VerifiedIssuer;
use crate::provider::WebAuthSession;
use crate::recipient::Recipient;

/// Handshake phases.
///
/// ```text
/// Idle -> Identifying -> Identified -> Introducing <-> AwaitingInteractiveAuth
///                   \            \              \                  \
///                    +------------+--------------+------------------+-> Completed | Failed | Aborted
/// ```
///
/// Phases never move backwards except for the `Introducing` /
/// `AwaitingInteractiveAuth` retry loop. `Completed`, `Failed` and `Aborted`
/// are terminal.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Phase {
    /// No handshake has started.
    #[default]
    Idle,

    /// The issuer descriptor is being fetched and authenticated.
    Identifying,

    /// The issuer has been identified and verified; ready to introduce.
    Identified,

    /// The recipient is being sent to the issuer's introduction endpoint.
    Introducing,

    /// The issuer asked for interactive authentication and the holder is in
    /// the browser session.
    AwaitingInteractiveAuth,

    /// The recipient was registered with the issuer.
    Completed,

    /// The handshake was cancelled.
    Aborted,

    /// The handshake failed.
    Failed,
}

impl Phase {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_advance(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Identifying)
            | (Self::Identifying, Self::Identified)
            | (Self::Identified | Self::AwaitingInteractiveAuth, Self::Introducing)
            | (Self::Introducing, Self::AwaitingInteractiveAuth | Self::Completed) => true,
            (from, Self::Failed) => matches!(
                from,
                Self::Identifying | Self::Introducing | Self::AwaitingInteractiveAuth
            ),
            (from, Self::Aborted) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// One in-flight handshake.
#[derive(Debug)]
pub(crate) struct Session {
    pub id: String,
    pub generation: u64,
    pub phase: Phase,
    pub identification_url: Url,
    pub issuer: Option<VerifiedIssuer>,
    pub recipient: Option<Recipient>,
    pub in_flight: Option<AbortHandle>,
    pub web_auth: Option<WebAuthSession>,
}

impl Session {
    pub fn new(generation: u64, identification_url: Url) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generation,
            phase: Phase::Idle,
            identification_url,
            issuer: None,
            recipient: None,
            in_flight: None,
            web_auth: None,
        }
    }

    /// Stop whatever the session is waiting on. Returns the interactive
    /// session to dismiss, if one was showing.
    pub fn cancel_pending(&mut self) -> Option<WebAuthSession> {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.web_auth.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_only() {
        assert!(Phase::Idle.can_advance(Phase::Identifying));
        assert!(Phase::Identifying.can_advance(Phase::Identified));
        assert!(Phase::Identified.can_advance(Phase::Introducing));
        assert!(Phase::Introducing.can_advance(Phase::AwaitingInteractiveAuth));
        assert!(Phase::AwaitingInteractiveAuth.can_advance(Phase::Introducing));
        assert!(Phase::Introducing.can_advance(Phase::Completed));

        assert!(!Phase::Introducing.can_advance(Phase::Identifying));
        assert!(!Phase::Identified.can_advance(Phase::Identifying));
        assert!(!Phase::Identifying.can_advance(Phase::Completed));
        assert!(!Phase::Identified.can_advance(Phase::Failed));
    }

    #[test]
    fn terminal() {
        for phase in [Phase::Completed, Phase::Aborted, Phase::Failed] {
            assert!(phase.is_terminal());
            for next in [Phase::Identifying, Phase::Introducing, Phase::Aborted, Phase::Failed] {
                assert!(!phase.can_advance(next));
            }
        }
    }

    #[test]
    fn abort_from_any_live_phase() {
        for phase in [
            Phase::Idle,
            Phase::Identifying,
            Phase::Identified,
            Phase::Introducing,
            Phase::AwaitingInteractiveAuth,
        ] {
            assert!(phase.can_advance(Phase::Aborted));
        }
    }
}
