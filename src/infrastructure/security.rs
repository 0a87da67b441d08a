use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::user::{Identity, Role};

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Internal(format!("failed to hash password: {e}")))
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// JWT claims: `sub` is the user id, `role` the role at issue time. Requests
/// act with the account's current role, not this claim.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// A lifetime too large for [`Duration`] is clamped; [`TokenIssuer::issue`]
    /// then fails instead of signing a token with no usable expiry.
    pub fn new(secret: &[u8], ttl_minutes: i64) -> Self {
        let ttl = Duration::try_minutes(ttl_minutes).unwrap_or(if ttl_minutes < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        });
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, identity: Identity) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            role: identity.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .ok_or_else(|| DomainError::Internal("token lifetime is out of range".to_string()))?
                .timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, DomainError> {
        let unauthorized = || DomainError::Unauthorized("Invalid or expired token".to_string());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            log::debug!("rejected bearer token: {e}");
            unauthorized()
        })?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| unauthorized())?;
        let role = data.claims.role.parse::<Role>().map_err(|_| unauthorized())?;
        Ok(Identity { user_id, role })
    }
}
