//! Bearer credential verification.
//!
//! Two kinds of caller present a `Bearer` credential:
//!
//! ```text
//! Authorization: Bearer <credential>
//!        │
//!        ├── looks like a JWT (three dot-separated parts)
//!        │      └── HS256 signature + expiry checked → Caller::User { sub }
//!        │          (sub must equal context.user_id)
//!        │
//!        └── anything else
//!               └── argon2 check against the configured service key hash
//!                   → Caller::Service (context.user_id trusted as-is)
//! ```
//!
//! The argon2 check runs on the blocking pool.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::AuthError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// Who presented the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Internal service (chat channel worker).
    Service,
    /// End user identified by the token subject.
    User { user_id: String },
}

impl Caller {
    /// Service callers may act for any user; end users only for themselves.
    pub fn check_user(&self, user_id: &str) -> Result<(), AuthError> {
        match self {
            Caller::Service => Ok(()),
            Caller::User { user_id: sub } if sub == user_id => Ok(()),
            Caller::User { .. } => Err(AuthError::UserMismatch),
        }
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
}

impl JwtManager {
    pub fn new(secret: impl Into<String>) -> Self {
        JwtManager { secret: secret.into() }
    }

    /// Issue a token for `user_id`. The dashboard issues tokens in
    /// production; this is used by tests and local tooling.
    pub fn issue_token(&self, user_id: &str, lifetime_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime_secs)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidCredential(format!("Failed to issue token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::InvalidCredential(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Checks `Authorization` headers against the JWT secret and the service
/// key hash.
pub struct CredentialVerifier {
    jwt: JwtManager,
    service_key_hash: Option<String>,
}

impl CredentialVerifier {
    pub fn new(jwt_secret: impl Into<String>, service_key_hash: Option<String>) -> Self {
        CredentialVerifier {
            jwt: JwtManager::new(jwt_secret),
            service_key_hash,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    pub async fn verify(&self, auth_header: Option<&str>) -> Result<Caller, AuthError> {
        let token = auth_header
            .and_then(extract_bearer_token)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        if looks_like_jwt(token) {
            let claims = self.jwt.validate_token(token)?;
            return Ok(Caller::User { user_id: claims.sub });
        }

        let Some(hash) = self.service_key_hash.clone() else {
            return Err(AuthError::InvalidCredential("Unrecognized credential".to_string()));
        };
        let key = token.to_string();
        let matched = tokio::task::spawn_blocking(move || verify_service_key(&key, &hash))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Service key check did not complete");
                false
            });

        if matched {
            Ok(Caller::Service)
        } else {
            Err(AuthError::InvalidCredential("Unrecognized credential".to_string()))
        }
    }
}

fn looks_like_jwt(token: &str) -> bool {
    token.split('.').count() == 3
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Verify a service key against its hash.
fn verify_service_key(key: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(key.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash a service key for configuration (`TALLY_SERVICE_KEY_HASH`).
pub fn hash_service_key(key: &str) -> Result<String, AuthError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(key.as_bytes(), &salt)
        .map_err(|e| AuthError::InvalidCredential(format!("Failed to hash service key: {}", e)))?;

    Ok(hash.to_string())
}
