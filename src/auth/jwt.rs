use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, MIN_SECRET_LEN};
use crate::models::User;

/// Payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Organization id, when the user belongs to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

/// Payload of an SSO auto-login token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsoClaims {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub exp: u64,
}

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct TokenService {
    session_secret: String,
    sso_secret: String,
    session_ttl_secs: u64,
}

impl TokenService {
    pub fn new(
        session_secret: String,
        sso_secret: String,
        session_ttl_secs: u64,
    ) -> Result<Self, AuthError> {
        if session_secret.len() < MIN_SECRET_LEN || sso_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret);
        }

        Ok(Self {
            session_secret,
            sso_secret,
            session_ttl_secs,
        })
    }

    pub fn issue_session(&self, user: &User) -> Result<String, AuthError> {
        let now = unix_now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            org: user.organization_id.map(|id| id.to_string()),
            iat: now,
            exp: now + self.session_ttl_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.session_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Issue(e.to_string()))
    }

    pub fn verify_session(&self, token: &str) -> Result<Identity, AuthError> {
        let claims: SessionClaims = verify(token, &self.session_secret)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".into()))?;
        let organization_id = claims
            .org
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| AuthError::InvalidToken("organization is not an id".into()))?;

        Ok(Identity {
            user_id,
            email: claims.email,
            organization_id,
        })
    }

    pub fn verify_sso(&self, token: &str) -> Result<SsoClaims, AuthError> {
        verify(token, &self.sso_secret)
    }
}

fn verify<T: serde::de::DeserializeOwned>(token: &str, secret: &str) -> Result<T, AuthError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidToken("invalid signature".into()),
            _ => AuthError::InvalidToken("token validation failed".into()),
        })
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
