//! Signed bearer tokens.
//!
//! A token has the shape `header.claims.signature`. The header and claims are
//! JSON, and every segment is hex encoded. The signature is an HMAC-SHA256 over
//! the first two segments joined by a dot.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::PrimaryKey;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Token lifetime reaches past the representable range")]
    LifetimeOutOfRange,
}

/// What a token says about its bearer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the user
    pub sub: PrimaryKey,
    pub username: String,
    /// Issued at, in unix seconds
    pub iat: i64,
    /// Expires at, in unix seconds
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Issues and verifies tokens with a shared secret
pub struct TokenSigner {
    secret: Vec<u8>,
    lifetime: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
        }
    }

    /// Issues a token for a user, valid from `now` for the configured lifetime
    pub fn issue(
        &self,
        user_id: PrimaryKey,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), TokenError> {
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or(TokenError::LifetimeOutOfRange)?;

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        // Serializing a struct of plain fields can't fail
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let unsigned = format!("{}.{}", hex::encode(HEADER), hex::encode(payload));
        let signature = hex::encode(self.mac(&unsigned).finalize().into_bytes());

        Ok((format!("{unsigned}.{signature}"), claims))
    }

    /// Checks the signature and expiry of a token, returning its claims
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (unsigned, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (header, payload) = unsigned.split_once('.').ok_or(TokenError::Malformed)?;

        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        self.mac(unsigned)
            .verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let header = hex::decode(header).map_err(|_| TokenError::Malformed)?;
        if header != HEADER.as_bytes() {
            return Err(TokenError::Malformed);
        }

        let payload = hex::decode(payload).map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, unsigned: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(unsigned.as_bytes());
        mac
    }
}
