use std::time::Duration;

use anyhow::Context;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::{Claims, TokenIdentity};
use crate::{config::JwtConfig, error::TokenError};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and validates signed identity tokens.
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: Uuid, email: &str) -> anyhow::Result<String>;

    fn validate(&self, token: &str) -> Result<TokenIdentity, TokenError>;
}

/// HS256 keys derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        let hours = u64::try_from(cfg.ttl_hours).unwrap_or(0);
        let ttl = Duration::from_secs(hours.saturating_mul(60 * 60));
        Self::new(cfg.secret.as_bytes(), ttl)
    }

    fn sign_at(&self, user_id: Uuid, email: &str, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .context("token expiry is out of range")?;
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    fn validation() -> Validation {
        // Pinning the algorithm rejects tokens whose header asks for anything else.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl TokenService for JwtKeys {
    fn issue(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.sign_at(user_id, email, OffsetDateTime::now_utc())
    }

    fn validate(&self, token: &str) -> Result<TokenIdentity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Self::validation()).map_err(|e| {
            let err = match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                _ => TokenError::Malformed,
            };
            warn!(reason = %err, "jwt rejected");
            err
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.into())
    }
}
