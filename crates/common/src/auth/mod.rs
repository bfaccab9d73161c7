//! OAuth 2.0 + PKCE primitives
//!
//! Building blocks for a public-client (no secret) authorization-code flow
//! as run by a desktop application against an OpenID Connect provider such
//! as Microsoft Entra ID.
//!
//! ```text
//! OAuthClient ──► authorization URL (PKCE S256 + state)
//!      │
//!      ├──► authorization_code grant  ──► TokenSet (+ id_token)
//!      ├──► refresh_token grant       ──► TokenSet
//!      └──► end-session URL
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `OAuthConfig`, `TokenSet`, `TokenResponse`, `OAuthError`
//! - **[`pkce`]**: verifier/challenge/state generation
//! - **[`client`]**: HTTP client for the grants above
//! - **[`id_token`]**: unverified claim extraction for account display
//! - **[`traits`]**: `OAuthClientTrait` seam for adapters and tests
//!
//! The client never persists tokens; caching is the caller's concern.

pub mod client;
pub mod id_token;
pub mod pkce;
pub mod traits;
pub mod types;

pub use client::{OAuthClient, OAuthClientError};
pub use id_token::{decode_id_token_claims, IdTokenClaims};
pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state,
    PKCEChallenge,
};
pub use traits::OAuthClientTrait;
pub use types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
