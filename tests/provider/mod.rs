//! Scripted issuer for integration tests.
//!
//! Identification responses are served per URL and signed with an Ed25519
//! key; introduction responses and web authentication outcomes are queued in
//! the order they should be returned. Every call the handshake makes is
//! recorded for later inspection.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail};
use base64ct::{Base64, Encoding};
use credibil_introduce::Phase;
use credibil_introduce::issuer::IssuerDescriptor;
use credibil_introduce::provider::{
    HttpResponse, IssuerClient, StatusListener, Verifier, WebAuth, WebAuthOutcome, WebAuthSession,
};
use credibil_introduce::recipient::IntroductionRequest;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier as _};
use serde_json::{Value, json};
use tokio::sync::Notify;
use url::Url;

pub const IDENTIFICATION_URL: &str = "https://issuer.example/id";
pub const INTRODUCTION_URL: &str = "https://issuer.example/intro";
pub const PUBLIC_ADDRESS: &str = "mkwntSiQmc14H65YxwckLenxY3DsEpvFbe";
pub const NONCE: &str = "ABC123";

const SIGNING_KEY: [u8; 32] = [7; 32];

/// Parks a request until the test releases it.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until a request reaches the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked request continue.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// A reply the scripted issuer gives.
#[derive(Clone)]
pub enum Reply {
    Response(HttpResponse),
    Unreachable,
}

/// An introduction the handshake sent.
#[derive(Clone, Debug)]
pub struct Sent {
    pub request: IntroductionRequest,
    pub auth_token: Option<String>,
}

#[derive(Clone)]
pub struct Provider {
    inner: Arc<Inner>,
}

struct Inner {
    signing_key: SigningKey,
    identification: Mutex<HashMap<Url, Reply>>,
    introductions: Mutex<VecDeque<Reply>>,
    outcomes: Mutex<VecDeque<WebAuthOutcome>>,
    identification_gate: Mutex<Option<Arc<Gate>>>,
    introduction_gate: Mutex<Option<Arc<Gate>>>,
    present_gate: Mutex<Option<Arc<Gate>>>,
    phases: Mutex<Vec<(String, Phase)>>,
    sent: Mutex<Vec<Sent>>,
    presented: Mutex<Vec<WebAuthSession>>,
    dismissed: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("should lock")
}

impl Provider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                signing_key: SigningKey::from_bytes(&SIGNING_KEY),
                identification: Mutex::default(),
                introductions: Mutex::default(),
                outcomes: Mutex::default(),
                identification_gate: Mutex::default(),
                introduction_gate: Mutex::default(),
                present_gate: Mutex::default(),
                phases: Mutex::default(),
                sent: Mutex::default(),
                presented: Mutex::default(),
                dismissed: Mutex::default(),
            }),
        }
    }

    //--------------------------------------------------------------------------
    // Scripting
    //--------------------------------------------------------------------------

    /// Serve `descriptor`, signed, at `url`.
    pub fn publish(&self, url: &str, descriptor: Value) {
        let body = self.sign(descriptor);
        self.respond_identification(url, HttpResponse::new(200, body));
    }

    /// Serve an arbitrary identification response at `url`.
    pub fn respond_identification(&self, url: &str, response: HttpResponse) {
        let url = Url::parse(url).expect("should parse url");
        lock(&self.inner.identification).insert(url, Reply::Response(response));
    }

    /// Make `url` unreachable.
    pub fn unreachable(&self, url: &str) {
        let url = Url::parse(url).expect("should parse url");
        lock(&self.inner.identification).insert(url, Reply::Unreachable);
    }

    /// Queue the next introduction reply.
    pub fn respond_introduction(&self, reply: Reply) {
        lock(&self.inner.introductions).push_back(reply);
    }

    /// Queue an introduction reply asking for interactive authentication.
    pub fn challenge(&self) {
        let body = json!({
            "webAuthentication": {
                "url": "https://issuer.example/login",
                "successURL": "https://issuer.example/login/success",
                "errorURL": "https://issuer.example/login/error"
            }
        });
        self.respond_introduction(Reply::Response(HttpResponse::new(200, body.to_string())));
    }

    /// Queue the outcome of the next interactive session.
    pub fn web_auth(&self, outcome: WebAuthOutcome) {
        lock(&self.inner.outcomes).push_back(outcome);
    }

    /// Park identification requests at a gate.
    pub fn hold_identification(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *lock(&self.inner.identification_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Park introduction requests at a gate.
    pub fn hold_introduction(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *lock(&self.inner.introduction_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Park interactive sessions at a gate.
    pub fn hold_web_auth(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *lock(&self.inner.present_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Sign `descriptor` the way the issuer would: an Ed25519 signature over
    /// the JSON without its `signature` property.
    pub fn sign(&self, mut descriptor: Value) -> String {
        if let Value::Object(map) = &mut descriptor {
            map.remove("signature");
        }
        let message = serde_json::to_vec(&descriptor).expect("should serialize");
        let signature = self.inner.signing_key.sign(&message);
        descriptor["signature"] = Value::String(Base64::encode_string(&signature.to_bytes()));
        descriptor.to_string()
    }

    //--------------------------------------------------------------------------
    // Inspection
    //--------------------------------------------------------------------------

    /// Phases reported to the status listener, in order.
    pub fn phases(&self) -> Vec<Phase> {
        lock(&self.inner.phases).iter().map(|(_, phase)| *phase).collect()
    }

    /// Phases reported for session `id`.
    pub fn phases_for(&self, id: &str) -> Vec<Phase> {
        lock(&self.inner.phases).iter().filter(|(s, _)| s == id).map(|(_, p)| *p).collect()
    }

    /// Introductions sent to the issuer.
    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.inner.sent).clone()
    }

    /// Interactive sessions presented to the holder.
    pub fn presented(&self) -> Vec<WebAuthSession> {
        lock(&self.inner.presented).clone()
    }

    /// Ids of dismissed interactive sessions.
    pub fn dismissed(&self) -> Vec<String> {
        lock(&self.inner.dismissed).clone()
    }
}

/// A well-formed issuer descriptor hosted at `id`.
#[must_use]
pub fn descriptor(id: &str) -> Value {
    json!({
        "@context": ["https://w3id.org/openbadges/v2", "https://w3id.org/blockcerts/v2"],
        "type": "Profile",
        "id": id,
        "name": "Example University",
        "email": "registrar@issuer.example",
        "url": "https://issuer.example",
        "introductionURL": INTRODUCTION_URL,
        "publicKey": [
            { "id": "ecdsa-koblitz-pubkey:mkwntSiQmc14H65YxwckLenxY3DsEpvFbe", "created": "2017-06-29T22:10:29Z" }
        ],
        "revocationList": "https://issuer.example/revocations"
    })
}

impl IssuerClient for Provider {
    async fn identification(&self, url: &Url) -> anyhow::Result<HttpResponse> {
        let gate = lock(&self.inner.identification_gate).clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let reply = lock(&self.inner.identification).get(url).cloned();
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Unreachable) => bail!("could not connect to {url}"),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }

    async fn introduction(
        &self, url: &Url, request: &IntroductionRequest, auth_token: Option<&str>,
    ) -> anyhow::Result<HttpResponse> {
        assert_eq!(url.as_str(), INTRODUCTION_URL);
        lock(&self.inner.sent).push(Sent {
            request: request.clone(),
            auth_token: auth_token.map(ToString::to_string),
        });

        let gate = lock(&self.inner.introduction_gate).clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }

        let reply = lock(&self.inner.introductions).pop_front();
        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Unreachable) => bail!("could not connect to {url}"),
            None => Err(anyhow!("no introduction reply scripted")),
        }
    }
}

impl Verifier for Provider {
    async fn verify(&self, _: &IssuerDescriptor, served: &[u8]) -> anyhow::Result<bool> {
        let mut value: Value = serde_json::from_slice(served)?;
        let Some(Value::String(encoded)) = value.as_object_mut().and_then(|m| m.remove("signature"))
        else {
            bail!("descriptor is not signed");
        };
        let bytes = Base64::decode_vec(&encoded).map_err(|e| anyhow!("{e}"))?;
        let signature = Signature::from_slice(&bytes)?;
        let message = serde_json::to_vec(&value)?;

        Ok(self.inner.signing_key.verifying_key().verify(&message, &signature).is_ok())
    }
}

impl WebAuth for Provider {
    async fn present(&self, session: &WebAuthSession) -> WebAuthOutcome {
        lock(&self.inner.presented).push(session.clone());

        let gate = lock(&self.inner.present_gate).clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        lock(&self.inner.outcomes).pop_front().unwrap_or(WebAuthOutcome::Cancelled)
    }

    fn dismiss(&self, session: &WebAuthSession) {
        lock(&self.inner.dismissed).push(session.id.clone());
    }
}

impl StatusListener for Provider {
    fn notify(&self, session_id: &str, phase: Phase) {
        lock(&self.inner.phases).push((session_id.to_string(), phase));
    }
}
