//! # Issuer Client
//!
//! This provider allows the handshake to talk to an issuer's identification
//! and introduction endpoints. The protocol is HTTP, but the trait keeps the
//! library transport agnostic: the host decides how requests are made.

use std::future::Future;

use url::Url;

use crate::recipient::IntroductionRequest;

/// A raw HTTP response: status code and body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response from a status code and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// The body as (lossy) UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// `IssuerClient` is the transport used to reach an issuer.
///
/// Implementations return `Err` only when no response was received (network
/// failure, DNS, TLS and the like). Any received response, whatever its
/// status, is returned as `Ok` for the handshake to classify. Dropping a
/// returned future must cancel the underlying request.
pub trait IssuerClient {
    /// HTTP GET the issuer descriptor at `url`.
    fn identification(
        &self, url: &Url,
    ) -> impl Future<Output = anyhow::Result<HttpResponse>> + Send;

    /// HTTP POST `request` as JSON to `url`. When `auth_token` is set it was
    /// obtained from an interactive authentication session and is sent as a
    /// bearer token.
    fn introduction(
        &self, url: &Url, request: &IntroductionRequest, auth_token: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<HttpResponse>> + Send;
}
