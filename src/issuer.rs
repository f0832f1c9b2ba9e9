//! # Issuer Descriptor
//!
//! The identity an issuer publishes at its identification URL. Parsing is done
//! property by property so that a rejected descriptor reports exactly which
//! property was missing or malformed.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, InvalidReason, InvalidScope};

/// An issuer's published identity.
///
/// Only [`IssuerDescriptor::from_slice`] constructs one from the wire, so
/// every descriptor has passed property and key validation.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct IssuerDescriptor {
    /// The URL the descriptor claims to be served from.
    pub id: Url,

    /// Issuer display name.
    pub name: String,

    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issuer home page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    /// Issuer logo, usually a data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Endpoint recipients are introduced at.
    #[serde(rename = "introductionURL")]
    pub introduction_url: Url,

    /// Keys the issuer signs with.
    #[serde(rename = "publicKey")]
    pub public_keys: Vec<PublicKey>,

    /// Revocation list location.
    #[serde(rename = "revocationList", skip_serializing_if = "Option::is_none")]
    pub revocation_list: Option<Url>,
}

/// An issuer signing key and its validity window.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKey {
    /// Key identifier (for Blockcerts issuers, the key itself).
    pub id: String,

    /// When the key became valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// When the key stops being valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// When the key was revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<DateTime<Utc>>,
}

impl PublicKey {
    /// Whether the key may be used at `at`.
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        if self.created.is_some_and(|created| created > at) {
            return false;
        }
        if self.expires.is_some_and(|expires| expires <= at) {
            return false;
        }
        !self.revoked.is_some_and(|revoked| revoked <= at)
    }
}

impl IssuerDescriptor {
    /// Parse and validate a descriptor from the raw identification response
    /// body. Does not authenticate it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IssuerInvalid`] scoped to the JSON body when it is
    /// empty or unparsable, or scoped to the first property found missing or
    /// malformed.
    pub fn from_slice(body: &[u8]) -> Result<Self, Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::IssuerInvalid {
                reason: InvalidReason::Missing,
                scope: InvalidScope::Json,
            });
        }
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
            return Err(Error::IssuerInvalid {
                reason: InvalidReason::Invalid,
                scope: InvalidScope::Json,
            });
        };
        Self::from_map(&map)
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self, Error> {
        let props = Props(map);

        let descriptor = Self {
            id: props.required_url("id")?,
            name: props.required_str("name")?,
            email: props.optional_str("email")?,
            url: props.optional_url("url")?,
            image: props.optional_str("image")?,
            introduction_url: props.required_url("introductionURL")?,
            public_keys: props.public_keys("publicKey")?,
            revocation_list: props.optional_url("revocationList")?,
        };

        let now = Utc::now();
        if !descriptor.public_keys.iter().any(|key| key.is_active_at(now)) {
            return Err(Error::invalid_property("publicKey"));
        }
        Ok(descriptor)
    }
}

/// An issuer descriptor that has passed authentication.
///
/// Only identification constructs one, so holding a `VerifiedIssuer` is proof
/// that the descriptor was served from the URL it names and accepted by the
/// verifier.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct VerifiedIssuer(IssuerDescriptor);

impl VerifiedIssuer {
    pub(crate) const fn new(descriptor: IssuerDescriptor) -> Self {
        Self(descriptor)
    }

    /// Unwrap the descriptor.
    #[must_use]
    pub fn into_inner(self) -> IssuerDescriptor {
        self.0
    }
}

impl Deref for VerifiedIssuer {
    type Target = IssuerDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct Props<'a>(&'a Map<String, Value>);

impl Props<'_> {
    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    fn required_str(&self, name: &str) -> Result<String, Error> {
        self.optional_str(name)?.ok_or_else(|| Error::missing_property(name))
    }

    fn optional_str(&self, name: &str) -> Result<Option<String>, Error> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(Error::invalid_property(name)),
        }
    }

    fn required_url(&self, name: &str) -> Result<Url, Error> {
        self.optional_url(name)?.ok_or_else(|| Error::missing_property(name))
    }

    fn optional_url(&self, name: &str) -> Result<Option<Url>, Error> {
        let Some(s) = self.optional_str(name)? else {
            return Ok(None);
        };
        Url::parse(&s).map(Some).map_err(|_| Error::invalid_property(name))
    }

    fn public_keys(&self, name: &str) -> Result<Vec<PublicKey>, Error> {
        let Some(value) = self.get(name) else {
            return Err(Error::missing_property(name));
        };
        let Value::Array(entries) = value else {
            return Err(Error::invalid_property(name));
        };
        if entries.is_empty() {
            return Err(Error::missing_property(name));
        }

        entries
            .iter()
            .map(|entry| {
                let Value::Object(key) = entry else {
                    return Err(Error::invalid_property(name));
                };
                let key = Props(key);
                Ok(PublicKey {
                    id: key.required_str("id").map_err(|_| Error::invalid_property(name))?,
                    created: key.timestamp("created").map_err(|_| Error::invalid_property(name))?,
                    expires: key.timestamp("expires").map_err(|_| Error::invalid_property(name))?,
                    revoked: key.timestamp("revoked").map_err(|_| Error::invalid_property(name))?,
                })
            })
            .collect()
    }

    fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>, Error> {
        let Some(s) = self.optional_str(name)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| Error::invalid_property(name))
    }
}
