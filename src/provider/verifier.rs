//! # Verifier
//!
//! Black-box authenticity check for issuer descriptors. The handshake already
//! confirms the descriptor names the URL it was served from; the verifier
//! checks whatever proof the issuer publishes (signatures, key pinning).

use std::future::Future;

use crate::issuer::IssuerDescriptor;

/// `Verifier` decides whether a parsed descriptor is authentic.
pub trait Verifier {
    /// Return `Ok(true)` if `descriptor`, parsed from the `served` bytes, is
    /// authentic. `Ok(false)` and `Err` both reject the issuer as
    /// untrustworthy.
    fn verify(
        &self, descriptor: &IssuerDescriptor, served: &[u8],
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;
}
