//! # Deep Links
//!
//! Application links (universal links or a custom URL scheme) carry a command
//! in their fragment:
//!
//! ```text
//! #[/]<command>/<percent-encoded arg>[/<percent-encoded arg>...]
//! ```
//!
//! Recognized commands are `import-certificate/<certificate URL>` and
//! `introduce-recipient/<identification URL>/<nonce>`. A link either parses to
//! a complete [`DeepLinkCommand`] or is ignored; there is no partial dispatch.
//!
//! # Example
//!
//! ```
//! use credibil_introduce::deep_link::DeepLinkCommand;
//!
//! let link = "https://wallet.example/app#introduce-recipient/https%3A%2F%2Fissuer.example%2Fid/ABC123";
//! let Some(DeepLinkCommand::IntroduceRecipient { identification_url, nonce }) =
//!     link.parse::<DeepLinkCommand>().ok()
//! else {
//!     panic!("should parse");
//! };
//! assert_eq!(identification_url.as_str(), "https://issuer.example/id");
//! assert_eq!(nonce, "ABC123");
//! ```

use std::str::FromStr;

use url::Url;

const IMPORT_CERTIFICATE: &str = "import-certificate";
const INTRODUCE_RECIPIENT: &str = "introduce-recipient";

/// A command carried by a deep link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeepLinkCommand {
    /// Import the certificate at `certificate_url`.
    ImportCertificate {
        /// Location of the certificate.
        certificate_url: Url,
    },

    /// Identify the issuer at `identification_url` and introduce the holder
    /// with the one-time code `nonce`.
    IntroduceRecipient {
        /// The issuer's identification URL.
        identification_url: Url,
        /// The one-time code.
        nonce: String,
    },
}

impl DeepLinkCommand {
    /// Parse the command from `url`'s fragment. Returns `None` if the URL has
    /// no fragment or the fragment is not a valid command.
    #[must_use]
    pub fn parse(url: &Url) -> Option<Self> {
        Self::from_fragment(url.fragment()?)
    }

    /// Parse a command from a fragment string (without the leading `#`).
    #[must_use]
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let mut segments: Vec<&str> = fragment.split('/').collect();

        // A leading `/` produces an empty first segment; a trailing one, an
        // empty last segment.
        if segments.first() == Some(&"") {
            segments.remove(0);
        }
        if segments.len() > 1 && segments.last() == Some(&"") {
            segments.pop();
        }
        let (name, args) = segments.split_first()?;

        let command = match (*name, args) {
            (IMPORT_CERTIFICATE, [certificate_url]) => Self::ImportCertificate {
                certificate_url: decode_url(certificate_url)?,
            },
            (INTRODUCE_RECIPIENT, [identification_url, nonce]) => Self::IntroduceRecipient {
                identification_url: decode_url(identification_url)?,
                nonce: decode(nonce)?,
            },
            _ => {
                tracing::debug!(target: "DeepLinkCommand::parse", command = %name, "unrecognized deep link");
                return None;
            }
        };
        Some(command)
    }
}

impl FromStr for DeepLinkCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        Self::parse(&url).ok_or_else(|| anyhow::anyhow!("no deep link command in {s}"))
    }
}

/// Entry points a deep link can trigger. Implemented by the host application.
pub trait DeepLinkHandler {
    /// Start importing the certificate at `certificate_url`.
    fn import_certificate(&self, certificate_url: Url);

    /// Start a handshake with the issuer at `identification_url`.
    fn introduce_recipient(&self, identification_url: Url, nonce: String);
}

/// Parse `url` and invoke the matching entry point on `handler`.
///
/// Returns `true` if a command was dispatched.
pub fn dispatch(url: &Url, handler: &impl DeepLinkHandler) -> bool {
    let Some(command) = DeepLinkCommand::parse(url) else {
        return false;
    };
    tracing::debug!(target: "deep_link::dispatch", ?command);

    match command {
        DeepLinkCommand::ImportCertificate { certificate_url } => {
            handler.import_certificate(certificate_url);
        }
        DeepLinkCommand::IntroduceRecipient {
            identification_url,
            nonce,
        } => handler.introduce_recipient(identification_url, nonce),
    }
    true
}

// Percent-decode a single argument. Malformed escapes and non UTF-8 results
// are rejected, as are empty arguments.
fn decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    for (i, _) in segment.match_indices('%') {
        let escape = bytes.get(i + 1..i + 3)?;
        if !escape.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
    }
    let decoded = urlencoding::decode(segment).ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(decoded.into_owned())
}

fn decode_url(segment: &str) -> Option<Url> {
    Url::parse(&decode(segment)?).ok()
}
