//! # Credibil Introduce
//!
//! A library for holder agents (such as a wallet) that need to establish a
//! trust relationship with a credential issuer before credentials can be
//! issued to them.
//!
//! The crate does not provide a user or service interface. That is the job of
//! an application implementer.
//!
//! # Design
//!
//! ** Handshake **
//!
//! Adding an issuer is a two step exchange. The holder first *identifies* the
//! issuer by fetching its published descriptor and authenticating it against
//! the URL it was served from. It then *introduces* itself by posting a
//! recipient payload, authorized by a one-time code, to the issuer's
//! introduction endpoint. Some issuers interrupt the introduction with an
//! interactive (browser) login.
//!
//! [`Handshake`] owns the state of that exchange. Each attempt is a session
//! with its own generation and cancellation handle, so a late response from an
//! abandoned attempt can never corrupt a newer one.
//!
//! ** Provider **
//!
//! In a similar style to the `credibil` SDKs, implementors supply 'Provider'
//! traits for whatever the library cannot own: the HTTP transport, descriptor
//! verification, the embedded browser and status notifications. See the
//! [`provider`] module.
//!
//! ** Deep Links **
//!
//! Invitations usually arrive as links. The [`deep_link`] module turns a link
//! into a command the host can act on.
//!
//! # Example
//!
//! ```rust,ignore
//! let handshake = Handshake::new(provider);
//! let recipient = Recipient::anonymous(address, handshake.config());
//! let introduction = handshake.identify_and_introduce(&url, recipient, &nonce).await?;
//! ```

pub mod config;
pub mod deep_link;
pub mod error;
pub mod handshake;
pub mod issuer;
pub mod message;
pub mod provider;
pub mod recipient;

pub use config::Config;
pub use deep_link::DeepLinkCommand;
pub use error::Error;
pub use handshake::{Handshake, Introduction, Phase};
pub use issuer::{IssuerDescriptor, VerifiedIssuer};
pub use recipient::Recipient;
