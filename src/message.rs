//! # Messages
//!
//! User-facing text for handshake failures. Kept apart from the protocol so a
//! host can swap in its own (localized) wording without touching the state
//! machine.

use crate::error::{Error, InvalidReason, InvalidScope};

/// Title for a failure alert.
#[must_use]
pub const fn failure_title() -> &'static str {
    "Add Issuer Failed"
}

/// Text to show the holder for `error`, or `None` when nothing should be
/// shown (the holder cancelled).
#[must_use]
pub fn failure_reason(error: &Error) -> Option<String> {
    let reason = match error {
        Error::AbortedIntroductionStep => return None,
        Error::InvalidState(_) => {
            "The app is in an invalid state. Please quit the app & relaunch. Then try again."
                .to_string()
        }
        Error::UntrustworthyIssuer => {
            "This issuer appears to have been tampered with. Please contact the issuer.".to_string()
        }
        Error::ServerErrorDuringIdentification { .. }
        | Error::ServerErrorDuringIntroduction { .. } => {
            "The server encountered an error. Please try again.".to_string()
        }
        Error::IssuerInvalid {
            scope: InvalidScope::Json,
            ..
        } => "We couldn't understand this Issuer's response. Please contact the Issuer.".to_string(),
        Error::IssuerInvalid {
            reason: InvalidReason::Missing,
            scope: InvalidScope::Property(name),
        } => format!("Issuer responded, but didn't include the \"{name}\" property"),
        Error::IssuerInvalid {
            reason: InvalidReason::Invalid,
            scope: InvalidScope::Property(name),
        } => format!("Issuer responded, but it contained an invalid property named \"{name}\""),
        Error::AuthenticationFailure => {
            "We couldn't authenticate you to the issuer. Double-check your one-time code and try again."
                .to_string()
        }
        Error::GenericError { .. } => "Adding this issuer failed. Please try again".to_string(),
    };
    Some(reason)
}
