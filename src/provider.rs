//! # Provider
//!
//! The provider traits exported by this module are used to inject the
//! functionality the handshake cannot own itself: the HTTP transport to the
//! issuer, authenticity verification, the interactive browser session and
//! status notifications.
//!
//! See individual trait documentation for specific details.

mod client;
mod listener;
mod verifier;
mod web_auth;

pub use client::{HttpResponse, IssuerClient};
pub use listener::StatusListener;
pub use verifier::Verifier;
pub use web_auth::{WebAuth, WebAuthChallenge, WebAuthOutcome, WebAuthSession};

/// The complete set of providers a [`Handshake`](crate::Handshake) needs.
pub trait HandshakeProvider:
    IssuerClient + Verifier + WebAuth + StatusListener + Clone + Send + Sync
{
}

/// A blanket implementation for `HandshakeProvider` trait so that any type
/// implementing the required super traits is considered a `HandshakeProvider`.
impl<T> HandshakeProvider for T where
    T: IssuerClient + Verifier + WebAuth + StatusListener + Clone + Send + Sync
{
}
