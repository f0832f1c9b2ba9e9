//! # Web Authentication Bridge
//!
//! Some issuers require the holder to log in through a browser before they
//! accept an introduction. When that happens the handshake hands a
//! [`WebAuthSession`] to the host's [`WebAuth`] provider, which shows an
//! embedded browser, watches its navigation for a completion signal and
//! reports back. The trait is the seam between the protocol and whatever UI
//! technology the host uses.

use std::future::Future;

use serde::{Deserialize, Serialize};
use url::Url;

/// Interactive authentication challenge, as returned by an issuer's
/// introduction endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WebAuthChallenge {
    /// Page the holder should be sent to.
    pub url: Url,

    /// Redirect the issuer navigates to when authentication succeeds.
    #[serde(rename = "successURL", default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<Url>,

    /// Redirect the issuer navigates to when authentication fails.
    #[serde(rename = "errorURL", default, skip_serializing_if = "Option::is_none")]
    pub error_url: Option<Url>,
}

/// A single interactive authentication session. The `id` is the handle used
/// to dismiss it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebAuthSession {
    /// Unique session handle.
    pub id: String,

    /// The challenge being answered.
    pub challenge: WebAuthChallenge,
}

impl WebAuthSession {
    pub(crate) fn new(challenge: WebAuthChallenge) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            challenge,
        }
    }

    /// Page to load in the browser.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.challenge.url
    }

    /// Interpret a navigation event in the embedded browser.
    ///
    /// Returns `Some` when `navigated` lands on the challenge's error or
    /// success redirect: same origin and the same path, ignoring a trailing
    /// `/`. An error redirect yields the `error` parameter as the failure
    /// reason; a success redirect yields the `token` parameter from its query
    /// or fragment, if any. Any other navigation returns `None` and the bridge
    /// should keep waiting.
    #[must_use]
    pub fn observe(&self, navigated: &Url) -> Option<WebAuthOutcome> {
        // The error redirect wins when both targets match.
        if let Some(error) = &self.challenge.error_url {
            if redirects_to(error, navigated) {
                let reason = parameter(navigated, "error")
                    .unwrap_or_else(|| "issuer rejected authentication".into());
                return Some(WebAuthOutcome::Failed(reason));
            }
        }
        if let Some(success) = &self.challenge.success_url {
            if redirects_to(success, navigated) {
                return Some(WebAuthOutcome::Completed {
                    token: parameter(navigated, "token"),
                });
            }
        }
        None
    }
}

/// How an interactive session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebAuthOutcome {
    /// The holder authenticated. The token, if any, is sent with the retried
    /// introduction.
    Completed {
        /// Token extracted from the completion redirect.
        token: Option<String>,
    },

    /// The holder closed the session.
    Cancelled,

    /// The issuer reported an authentication failure.
    Failed(String),
}

/// `WebAuth` presents and dismisses interactive authentication sessions.
pub trait WebAuth {
    /// Show `session` to the holder and resolve once it completes, fails or
    /// is cancelled. The handshake may drop the returned future (on abort);
    /// it always follows up with [`WebAuth::dismiss`].
    fn present(&self, session: &WebAuthSession) -> impl Future<Output = WebAuthOutcome> + Send;

    /// Close `session` if it is still showing. Must tolerate sessions that
    /// have already closed.
    fn dismiss(&self, session: &WebAuthSession);
}

fn redirects_to(target: &Url, navigated: &Url) -> bool {
    navigated.origin() == target.origin()
        && navigated.path().trim_end_matches('/') == target.path().trim_end_matches('/')
}

fn parameter(url: &Url, name: &str) -> Option<String> {
    let from_query = url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned());
    from_query.or_else(|| {
        let fragment = url.fragment()?;
        url::form_urlencoded::parse(fragment.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    })
}
