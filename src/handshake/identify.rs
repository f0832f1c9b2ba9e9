//! # Identify
//!
//! Fetch an issuer descriptor, validate it and authenticate it against the
//! URL it was served from.

use url::Url;

use crate::error::Error;
use crate::issuer::{IssuerDescriptor, VerifiedIssuer};
use crate::provider::{IssuerClient, Verifier};

/// Fetch and authenticate the descriptor at `url`.
pub(crate) async fn identify(
    provider: &(impl IssuerClient + Verifier), url: &Url,
) -> Result<VerifiedIssuer, Error> {
    let response = provider.identification(url).await.map_err(|e| {
        tracing::error!(target: "Handshake::identify", ?e);
        Error::ServerErrorDuringIdentification {
            code: None,
            message: e.to_string(),
        }
    })?;
    if !response.is_success() {
        let e = Error::ServerErrorDuringIdentification {
            code: Some(response.status),
            message: response.text(),
        };
        tracing::error!(target: "Handshake::identify", ?e);
        return Err(e);
    }

    let descriptor = IssuerDescriptor::from_slice(&response.body)?;

    // The descriptor must name the location it was fetched from.
    if descriptor.id != *url {
        tracing::warn!(
            target: "Handshake::identify",
            claimed = %descriptor.id, served = %url, "issuer hosted at a different URL"
        );
        return Err(Error::UntrustworthyIssuer);
    }

    match provider.verify(&descriptor, &response.body).await {
        Ok(true) => Ok(VerifiedIssuer::new(descriptor)),
        Ok(false) => {
            tracing::warn!(target: "Handshake::identify", issuer = %url, "issuer proof rejected");
            Err(Error::UntrustworthyIssuer)
        }
        Err(e) => {
            tracing::warn!(target: "Handshake::identify", issuer = %url, ?e, "issuer unverifiable");
            Err(Error::UntrustworthyIssuer)
        }
    }
}
