//! # Handshake
//!
//! The identify → introduce sequence for one issuer.
//!
//! A [`Handshake`] owns at most one session at a time. `identify` always
//! starts a fresh session, aborting whatever the previous one was waiting on.
//! Each session carries a generation number; results that arrive for a
//! superseded or aborted generation are dropped without touching state or
//! notifying the [`StatusListener`](crate::provider::StatusListener).
//!
//! Every provider call runs as an abortable in-flight request, so
//! [`Handshake::abort_requests`] cancels the transport (or the interactive
//! session) itself rather than ignoring its result.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; it is the single serialization point for phase transitions.

mod identify;
mod introduce;
mod session;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::abortable;
pub use session::Phase;
use tracing::instrument;
use url::Url;

use self::introduce::Reply;
use self::session::Session;
use crate::config::Config;
use crate::error::Error;
use crate::issuer::VerifiedIssuer;
use crate::provider::{HandshakeProvider, WebAuthOutcome, WebAuthSession};
use crate::recipient::{IntroductionRequest, Recipient};

/// The result of a completed handshake: the verified issuer and the recipient
/// it registered. Persisting them is the caller's responsibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Introduction {
    /// The issuer the recipient was introduced to.
    pub issuer: VerifiedIssuer,

    /// The registered recipient.
    pub recipient: Recipient,
}

/// Issuer identification and introduction state machine.
///
/// Cloning a `Handshake` yields another handle to the same session, so one
/// clone can run `identify`/`introduce` while another calls
/// `abort_requests`.
#[derive(Clone, Debug)]
pub struct Handshake<P: HandshakeProvider> {
    provider: P,
    config: Config,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    session: Option<Session>,
}

impl State {
    fn current(&mut self, generation: u64) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.generation == generation)
    }
}

impl<P: HandshakeProvider> Handshake<P> {
    /// Create a handshake using the default [`Config`].
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, Config::default())
    }

    /// Create a handshake with explicit settings.
    pub fn with_config(provider: P, config: Config) -> Self {
        Self {
            provider,
            config,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// The handshake settings.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Phase of the current session, or `Idle` if none has started.
    pub fn phase(&self) -> Phase {
        self.lock().session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    /// Identifier of the current session.
    pub fn session_id(&self) -> Option<String> {
        self.lock().session.as_ref().map(|s| s.id.clone())
    }

    /// Identification URL of the current session.
    pub fn identification_url(&self) -> Option<Url> {
        self.lock().session.as_ref().map(|s| s.identification_url.clone())
    }

    /// The verified issuer of the current session, once identification has
    /// succeeded.
    pub fn issuer(&self) -> Option<VerifiedIssuer> {
        self.lock().session.as_ref().and_then(|s| s.issuer.clone())
    }

    /// The recipient registered by the current session, once it has
    /// completed.
    pub fn recipient(&self) -> Option<Recipient> {
        self.lock().session.as_ref().and_then(|s| s.recipient.clone())
    }

    /// Fetch, validate and authenticate the issuer descriptor at
    /// `identification_url`.
    ///
    /// Starts a new session. Any session already in flight is aborted and its
    /// eventual result discarded.
    ///
    /// # Errors
    ///
    /// Returns `ServerErrorDuringIdentification` when the endpoint cannot be
    /// reached or answers with a non-2xx status, `IssuerInvalid` when the
    /// descriptor is malformed, `UntrustworthyIssuer` when it fails
    /// authentication, and `AbortedIntroductionStep` when the session is
    /// aborted or superseded before it finishes.
    #[instrument(level = "debug", skip(self))]
    pub async fn identify(&self, identification_url: &Url) -> Result<VerifiedIssuer, Error> {
        tracing::debug!("Handshake::identify");

        let generation = self.begin(identification_url);
        self.transition(generation, Phase::Identifying, |_| {})?;

        let provider = self.provider.clone();
        let url = identification_url.clone();
        let fetched =
            self.in_flight(generation, async move { identify::identify(&provider, &url).await });
        let issuer = match fetched.await? {
            Ok(issuer) => issuer,
            Err(e) => return Err(self.fail(generation, e)),
        };

        let verified = issuer.clone();
        self.transition(generation, Phase::Identified, move |s| s.issuer = Some(verified))?;
        Ok(issuer)
    }

    /// Register `recipient` with the identified issuer using the one-time
    /// code `nonce`.
    ///
    /// If the issuer requires interactive authentication, the challenge is
    /// presented through the [`WebAuth`](crate::provider::WebAuth) provider
    /// and the introduction retried with any token it yields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the current session has just completed a
    /// successful `identify`. Otherwise returns `ServerErrorDuringIntroduction`,
    /// `AuthenticationFailure` or `GenericError` as the issuer's response
    /// dictates, and `AbortedIntroductionStep` when the holder cancels the
    /// interactive session or the session is aborted.
    #[instrument(
        level = "debug",
        skip(self, recipient, nonce),
        fields(address = %recipient.public_address)
    )]
    pub async fn introduce(&self, recipient: Recipient, nonce: &str) -> Result<Introduction, Error> {
        tracing::debug!("Handshake::introduce");

        let (generation, issuer) = self.identified()?;
        self.transition(generation, Phase::Introducing, |_| {})?;

        let request = IntroductionRequest::new(&recipient, nonce);
        let mut auth_token: Option<String> = None;
        let mut rounds = 0;

        loop {
            let provider = self.provider.clone();
            let url = issuer.introduction_url.clone();
            let req = request.clone();
            let token = auth_token.clone();
            let response = self
                .in_flight(generation, async move {
                    provider.introduction(&url, &req, token.as_deref()).await
                })
                .await?;

            let reply = response
                .map_err(|e| Error::ServerErrorDuringIntroduction {
                    code: None,
                    message: e.to_string(),
                })
                .and_then(introduce::classify);
            let challenge = match reply {
                Ok(Reply::Registered) => break,
                Ok(Reply::Challenge(challenge)) => challenge,
                Err(e) => return Err(self.fail(generation, e)),
            };

            if rounds >= self.config.interactive_auth_rounds {
                tracing::error!(target: "Handshake::introduce", rounds, "too many authentication rounds");
                return Err(self.fail(generation, Error::AuthenticationFailure));
            }
            rounds += 1;

            let session = WebAuthSession::new(challenge);
            let showing = session.clone();
            self.transition(generation, Phase::AwaitingInteractiveAuth, move |s| {
                s.web_auth = Some(showing);
            })?;

            let provider = self.provider.clone();
            let presented = session.clone();
            let outcome =
                self.in_flight(generation, async move { provider.present(&presented).await }).await?;
            self.dismiss(generation);

            match outcome {
                WebAuthOutcome::Completed { token } => {
                    auth_token = token;
                    self.transition(generation, Phase::Introducing, |_| {})?;
                }
                WebAuthOutcome::Cancelled => return Err(self.cancel(generation)),
                WebAuthOutcome::Failed(reason) => {
                    tracing::error!(target: "Handshake::introduce", %reason, "interactive authentication failed");
                    return Err(self.fail(generation, Error::AuthenticationFailure));
                }
            }
        }

        let registered = recipient.clone();
        self.transition(generation, Phase::Completed, move |s| s.recipient = Some(registered))?;
        Ok(Introduction { issuer, recipient })
    }

    /// Run `identify` followed by `introduce`.
    ///
    /// # Errors
    ///
    /// Returns the first error from either step.
    pub async fn identify_and_introduce(
        &self, identification_url: &Url, recipient: Recipient, nonce: &str,
    ) -> Result<Introduction, Error> {
        self.identify(identification_url).await?;
        self.introduce(recipient, nonce).await
    }

    /// Cancel the current session.
    ///
    /// Aborts any in-flight request, dismisses any interactive session and
    /// moves the session to `Aborted`. The pending `identify` or `introduce`
    /// resolves to `AbortedIntroductionStep` without further notifications.
    /// Does nothing when there is no live session.
    pub fn abort_requests(&self) {
        let (id, web_auth) = {
            let mut state = self.lock();
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if session.phase.is_terminal() {
                return;
            }
            session.phase = Phase::Aborted;
            (session.id.clone(), session.cancel_pending())
        };

        tracing::debug!(target: "Handshake::abort_requests", session = %id, "aborted");
        if let Some(web_auth) = web_auth {
            self.provider.dismiss(&web_auth);
        }
        self.provider.notify(&id, Phase::Aborted);
    }

    // Replace any existing session with a new one and return its generation.
    fn begin(&self, identification_url: &Url) -> u64 {
        let (generation, superseded) = {
            let mut state = self.lock();
            state.generation += 1;
            let generation = state.generation;
            let superseded = state.session.take().and_then(|mut s| s.cancel_pending());
            state.session = Some(Session::new(generation, identification_url.clone()));
            drop(state);
            (generation, superseded)
        };
        if let Some(web_auth) = superseded {
            self.provider.dismiss(&web_auth);
        }
        generation
    }

    // The generation and issuer of a session that is ready to introduce.
    fn identified(&self) -> Result<(u64, VerifiedIssuer), Error> {
        let state = self.lock();
        let ready = state.session.as_ref().and_then(|s| match (s.phase, &s.issuer) {
            (Phase::Identified, Some(issuer)) => Some((s.generation, issuer.clone())),
            _ => None,
        });
        let (phase, identified) =
            state.session.as_ref().map_or((Phase::Idle, false), |s| (s.phase, s.issuer.is_some()));
        drop(state);

        ready.ok_or_else(|| {
            let reason = match phase {
                Phase::Introducing | Phase::AwaitingInteractiveAuth => {
                    "introduce called while an introduction is in progress"
                }
                Phase::Completed | Phase::Aborted | Phase::Failed if identified => {
                    "introduce called on a finished session"
                }
                _ => "introduce called before identify",
            };
            let e = Error::InvalidState(reason.into());
            tracing::error!(target: "Handshake::introduce", ?e, ?phase, "handshake defect");
            e
        })
    }

    // Run `fut` as the session's in-flight request so it can be aborted.
    async fn in_flight<F>(&self, generation: u64, fut: F) -> Result<F::Output, Error>
    where
        F: Future + Send,
    {
        let (fut, handle) = abortable(fut);
        {
            let mut state = self.lock();
            match state.current(generation) {
                Some(s) if !s.phase.is_terminal() => s.in_flight = Some(handle),
                _ => return Err(Error::AbortedIntroductionStep),
            }
        }

        let output = fut.await;

        if let Some(s) = self.lock().current(generation) {
            s.in_flight = None;
        }
        output.map_err(|_| Error::AbortedIntroductionStep)
    }

    // Apply a phase transition to the session if it is still current.
    fn transition(
        &self, generation: u64, next: Phase, update: impl FnOnce(&mut Session),
    ) -> Result<(), Error> {
        let id = {
            let mut state = self.lock();
            let Some(session) = state.current(generation) else {
                return Err(Error::AbortedIntroductionStep);
            };
            if session.phase == Phase::Aborted {
                return Err(Error::AbortedIntroductionStep);
            }
            if !session.phase.can_advance(next) {
                let e = Error::InvalidState(format!("cannot move from {:?} to {next:?}", session.phase));
                tracing::error!(target: "Handshake::transition", ?e);
                return Err(e);
            }
            update(session);
            session.phase = next;
            session.id.clone()
        };

        tracing::debug!(target: "Handshake::transition", session = %id, phase = ?next);
        self.provider.notify(&id, next);
        Ok(())
    }

    // Fail the session with `err`. A stale session is left alone and the
    // caller gets `AbortedIntroductionStep` instead.
    fn fail(&self, generation: u64, err: Error) -> Error {
        if let Err(stale) = self.transition(generation, Phase::Failed, |_| {}) {
            return stale;
        }
        tracing::error!(target: "Handshake", ?err, "handshake failed");
        err
    }

    // The holder cancelled the interactive session.
    fn cancel(&self, generation: u64) -> Error {
        match self.transition(generation, Phase::Aborted, |_| {}) {
            Ok(()) | Err(Error::AbortedIntroductionStep) => Error::AbortedIntroductionStep,
            Err(e) => e,
        }
    }

    // Close the interactive session if this generation still owns it.
    fn dismiss(&self, generation: u64) {
        let web_auth = self.lock().current(generation).and_then(|s| s.web_auth.take());
        if let Some(web_auth) = web_auth {
            self.provider.dismiss(&web_auth);
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
