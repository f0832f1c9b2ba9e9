//! # Recipient
//!
//! The holder's registration payload and the introduction request built from
//! it. Recipients are constructed fresh for each handshake attempt and are
//! never persisted by this crate.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// The local holder, as introduced to an issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Given name. Empty for anonymous registration.
    pub given_name: String,

    /// Family name. Empty for anonymous registration.
    pub family_name: String,

    /// Identity value, such as an email address.
    pub identity: String,

    /// Identity type tag, such as `email`.
    pub identity_type: String,

    /// Whether `identity` has already been hashed.
    pub is_hashed: bool,

    /// Public blockchain address, freshly derived for this issuer.
    pub public_address: String,

    /// Optional revocation address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_address: Option<String>,
}

impl Recipient {
    /// Create the anonymous recipient a wallet uses when introducing itself
    /// with a one-time code: no names, no identity, just the address.
    #[must_use]
    pub fn anonymous(public_address: impl Into<String>, config: &Config) -> Self {
        Self {
            identity_type: config.identity_type.clone(),
            public_address: public_address.into(),
            ..Self::default()
        }
    }
}

/// Body of the introduction POST.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntroductionRequest {
    /// Recipient public address.
    #[serde(rename = "bitcoinAddress")]
    pub public_address: String,

    /// Recipient given name.
    pub given_name: String,

    /// Recipient family name.
    pub family_name: String,

    /// Recipient identity value.
    pub identity: String,

    /// Recipient identity type.
    pub identity_type: String,

    /// Whether `identity` is hashed.
    pub hashed: bool,

    /// Recipient revocation address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_address: Option<String>,

    /// One-time code authorizing the introduction.
    pub nonce: String,
}

impl IntroductionRequest {
    /// Build a request for `recipient` authorized by `nonce`.
    #[must_use]
    pub fn new(recipient: &Recipient, nonce: &str) -> Self {
        Self {
            public_address: recipient.public_address.clone(),
            given_name: recipient.given_name.clone(),
            family_name: recipient.family_name.clone(),
            identity: recipient.identity.clone(),
            identity_type: recipient.identity_type.clone(),
            hashed: recipient.is_hashed,
            revocation_address: recipient.revocation_address.clone(),
            nonce: nonce.into(),
        }
    }
}
