//! Caller identity.
//!
//! - Session tokens: HS256 JWTs issued by this service, carried as
//!   `Authorization: Bearer` on user-facing routes.
//! - SSO tokens: HS256 JWTs minted by the main application and exchanged
//!   once through auto-login.
//! - Trigger secret: a shared secret guarding the internal autopilot
//!   trigger endpoint.

mod jwt;

pub use jwt::{Identity, SessionClaims, SsoClaims, TokenService};

use subtle::ConstantTimeEq;
use thiserror::Error;

/// Minimum secret length accepted for signing keys.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("secret must be at least {MIN_SECRET_LEN} characters")]
    WeakSecret,

    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Constant-time comparison of a presented shared secret.
pub fn secret_matches(expected: &str, presented: Option<&str>) -> bool {
    match presented {
        Some(presented) => bool::from(expected.as_bytes().ct_eq(presented.as_bytes())),
        None => false,
    }
}
