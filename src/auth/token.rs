use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Role;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a session token. `usertype` is the role at issuance
/// and may be stale; authorization always re-reads the stored role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: String,
    pub usertype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies signed, non-encrypted session tokens.
/// There is no revocation list: a token is valid until it expires, or forever without a TTL.
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: Option<i64>,
}

impl SessionCodec {
    pub fn new(secret: &[u8], ttl_seconds: Option<i64>) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("session secret cannot be empty".into()));
        }
        if ttl_seconds.is_some_and(|ttl| ttl <= 0) {
            return Err(Error::Config("token ttl must be positive".into()));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.required_spec_claims.clear();
        if ttl_seconds.is_some() {
            validation.set_required_spec_claims(&["exp"]);
        }
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        })
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<String> {
        let claims = SessionClaims {
            user_id: user_id.to_string(),
            usertype: role.as_str().to_string(),
            exp: self.ttl_seconds.map(|ttl| Utc::now().timestamp() + ttl),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| Error::Config(format!("failed to sign token: {e}")))
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::InvalidToken,
            })
    }
}
