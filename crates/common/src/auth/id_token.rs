//! ID token claim extraction
//!
//! Claims are read without signature verification: they come straight from
//! the token endpoint over TLS and are only used to label the signed-in
//! account, never for authorization decisions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use super::client::OAuthClientError;

/// Subset of OpenID Connect claims used to describe an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdTokenClaims {
    pub oid: Option<String>,
    pub sub: Option<String>,
    pub tid: Option<String>,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl IdTokenClaims {
    /// Stable account identifier: `oid.tid` when both exist, else `oid`,
    /// else `sub`.
    #[must_use]
    pub fn account_id(&self) -> Option<String> {
        match (&self.oid, &self.tid, &self.sub) {
            (Some(oid), Some(tid), _) => Some(format!("{oid}.{tid}")),
            (Some(oid), None, _) => Some(oid.clone()),
            (None, _, sub) => sub.clone(),
        }
    }

    /// Sign-in name: `preferred_username`, else `email`.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.preferred_username.as_deref().or(self.email.as_deref())
    }
}

/// Decode the payload segment of a compact JWT.
///
/// # Errors
/// Returns `OAuthClientError::ParseError` if the token is not three
/// dot-separated segments or the payload is not base64url JSON.
pub fn decode_id_token_claims(id_token: &str) -> Result<IdTokenClaims, OAuthClientError> {
    let mut parts = id_token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(OAuthClientError::ParseError("invalid ID token format".into()));
    };

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| OAuthClientError::ParseError(format!("failed to decode ID token payload: {err}")))?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|err| OAuthClientError::ParseError(format!("failed to parse ID token payload: {err}")))
}
