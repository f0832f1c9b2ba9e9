//! # Handshake Errors
//!
//! The closed set of failures an issuer handshake can end with. Every failure
//! raised while identifying or introducing is converted into exactly one of
//! these kinds at the boundary of the provider call; nothing from the
//! transport escapes untagged.
//!
//! The kinds carry only the data needed to decide on a remediation. Turning a
//! kind into user-facing text is the job of the [`message`](crate::message)
//! module (or the host application), not the handshake.

use std::fmt;

use thiserror::Error;

/// Handshake failure kinds.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was called out of sequence (for example, `introduce`
    /// before a successful `identify`). This is a programming defect.
    #[error("invalid handshake state: {0}")]
    InvalidState(String),

    /// The issuer's descriptor could not be authenticated against the location
    /// it was served from. Never retried automatically.
    #[error("issuer descriptor failed authentication")]
    UntrustworthyIssuer,

    /// The handshake was cancelled, either by the holder dismissing the
    /// interactive session or by an explicit abort.
    #[error("handshake aborted")]
    AbortedIntroductionStep,

    /// The identification endpoint returned a non-success status, or could not
    /// be reached (`code` is `None`).
    #[error("server error during identification ({}): {message}", Status(.code))]
    ServerErrorDuringIdentification {
        /// HTTP status code, if a response was received.
        code: Option<u16>,
        /// Response body text or transport error description.
        message: String,
    },

    /// The introduction endpoint returned a non-success status, or could not
    /// be reached (`code` is `None`).
    #[error("server error during introduction ({}): {message}", Status(.code))]
    ServerErrorDuringIntroduction {
        /// HTTP status code, if a response was received.
        code: Option<u16>,
        /// Response body text or transport error description.
        message: String,
    },

    /// The issuer descriptor is malformed or incomplete.
    #[error("issuer descriptor has {reason} {scope}")]
    IssuerInvalid {
        /// Whether the data was absent or present but malformed.
        reason: InvalidReason,
        /// What part of the descriptor is affected.
        scope: InvalidScope,
    },

    /// The issuer rejected the holder's one-time code, or interactive
    /// authentication failed.
    #[error("authentication with the issuer failed")]
    AuthenticationFailure,

    /// Any other failure, with whatever context was available.
    #[error("handshake failed: {}", .underlying.as_ref().map_or_else(|| "unknown error".to_string(), ToString::to_string))]
    GenericError {
        /// The underlying error, if any.
        underlying: Option<anyhow::Error>,
        /// The raw response body, if any.
        raw_body: Option<Vec<u8>>,
    },
}

impl Error {
    /// Convenience constructor for a missing descriptor property.
    #[must_use]
    pub fn missing_property(name: impl Into<String>) -> Self {
        Self::IssuerInvalid {
            reason: InvalidReason::Missing,
            scope: InvalidScope::Property(name.into()),
        }
    }

    /// Convenience constructor for a malformed descriptor property.
    #[must_use]
    pub fn invalid_property(name: impl Into<String>) -> Self {
        Self::IssuerInvalid {
            reason: InvalidReason::Invalid,
            scope: InvalidScope::Property(name.into()),
        }
    }

    /// True when the error represents a user-initiated cancellation rather
    /// than a failure.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::AbortedIntroductionStep)
    }

    /// True when the error indicates a sequencing defect in the caller.
    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// True when the holder may reasonably start the handshake again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServerErrorDuringIdentification { .. }
                | Self::ServerErrorDuringIntroduction { .. }
                | Self::AuthenticationFailure
                | Self::GenericError { .. }
        )
    }
}

/// Why part of a descriptor was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// Required data is absent.
    Missing,
    /// Data is present but malformed.
    Invalid,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// The part of a descriptor a validation failure applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidScope {
    /// The response body as a whole.
    Json,
    /// A named property.
    Property(String),
}

impl fmt::Display for InvalidScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Property(name) => write!(f, "property `{name}`"),
        }
    }
}

struct Status<'a>(&'a Option<u16>);

impl fmt::Display for Status<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "status {code}"),
            None => write!(f, "no response"),
        }
    }
}
