use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{Role, User};

/// Session tokens are valid for 7 days from issuance.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Represents the claims encoded within a session JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the account's unique identifier.
    pub sub: Uuid,
    /// Role captured at issuance.
    pub role: Role,
    /// Issuance timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Mints and verifies session tokens.
///
/// The signing key is loaded once from configuration and injected at
/// construction; rotating it invalidates all outstanding tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Generates a signed token for an account, expiring in
    /// [`TOKEN_TTL_DAYS`] days.
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = chrono::Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::days(TOKEN_TTL_DAYS))
            .expect("valid timestamp");

        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token string and decodes its claims.
    ///
    /// Malformed, expired, and signature-mismatched tokens are all reported as
    /// `AppError::Unauthorized`; callers cannot distinguish them.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}
