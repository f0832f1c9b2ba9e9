//! # Introduce
//!
//! Classification of the issuer's reply to an introduction request.

use serde_json::Value;

use crate::error::Error;
use crate::provider::{HttpResponse, WebAuthChallenge};

/// What the issuer asked for in response to an introduction.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Reply {
    /// The recipient is registered.
    Registered,

    /// The holder must authenticate interactively before retrying.
    Challenge(WebAuthChallenge),
}

/// Turn an introduction response into a [`Reply`] or a tagged error.
pub(crate) fn classify(response: HttpResponse) -> Result<Reply, Error> {
    let has_body = !response.body.iter().all(u8::is_ascii_whitespace);
    let body = has_body.then(|| serde_json::from_slice::<Value>(&response.body));

    // A challenge may come back as a 2xx or as a 401.
    if response.is_success() || response.status == 401 {
        if let Some(Ok(Value::Object(map))) = &body {
            if let Some(challenge) = map.get("webAuthentication").filter(|v| !v.is_null()) {
                return serde_json::from_value::<WebAuthChallenge>(challenge.clone())
                    .map(Reply::Challenge)
                    .map_err(|e| Error::GenericError {
                        underlying: Some(e.into()),
                        raw_body: Some(response.body.clone()),
                    });
            }
        }
    }

    match (response.status, body) {
        (_, None | Some(Ok(_))) if response.is_success() => Ok(Reply::Registered),
        (_, Some(Err(e))) if response.is_success() => Err(Error::GenericError {
            underlying: Some(e.into()),
            raw_body: Some(response.body),
        }),
        (401 | 403, _) => Err(Error::AuthenticationFailure),
        (status, _) => Err(Error::ServerErrorDuringIntroduction {
            code: Some(status),
            message: response.text(),
        }),
    }
}
