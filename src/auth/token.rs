//! Signed bearer tokens — issue and verify.
//!
//! HS256 with a process-wide secret. Tokens are self-contained: the gateway
//! verifies signature and embedded expiry without touching the store.

use crate::error::ApiResult;
use crate::store::User;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token lifetime: 24 hours from issuance (seconds).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: u64,
    /// Email at issuance time.
    pub email: String,
    /// Role name at issuance time.
    pub role: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::default();
        // The embedded expiry is authoritative and exact — no leeway window.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Issue a signed token for a user. Returns the token together with the
    /// claims it encodes (callers persist the session audit row from them).
    pub fn issue(&self, user: &User) -> ApiResult<(String, Claims)> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("token encode failed: {e}"))?;
        Ok((token, claims))
    }

    /// Verify signature and embedded expiry, returning the claims.
    ///
    /// A malformed token, a bad signature, and an elapsed lifetime are
    /// indistinguishable to callers — all surface as the same `Err`.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}
