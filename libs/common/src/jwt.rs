//! JWT service for bearer credential issuance and validation
//!
//! Both services share one HS256 secret: the auth service signs tokens at
//! signup/login and the events service verifies them on every protected route.

use anyhow::Result;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use uuid::Uuid;

use crate::settings::env_or;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds (default: 1 day)
    pub expires_in: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Signing secret (required)
    /// - `JWT_EXPIRES_IN`: Token lifetime in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expires_in = env_or("JWT_EXPIRES_IN", 86_400);

        Ok(JwtConfig { secret, expires_in })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// User email at the time the token was issued
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Reasons a presented token is rejected
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token was valid but its lifetime has elapsed
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed token or wrong claims
    #[error("token invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Message returned to the caller in the 401 body
    pub fn client_message(&self) -> &'static str {
        match self {
            TokenError::Expired => "Not authorized, token expired",
            TokenError::Invalid(_) => "Not authorized, token failed",
        }
    }
}

/// 401 message when no bearer credential was presented
pub const NO_TOKEN_MESSAGE: &str = "Not authorized, no token";

/// Caller identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.user_id,
            email: claims.email,
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issue a token for a user
    pub fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = unix_now()?;

        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.config.expires_in,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }

    /// Get the token lifetime in seconds
    pub fn expires_in(&self) -> u64 {
        self.config.expires_in
    }
}

fn unix_now() -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs();
    Ok(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            expires_in: 3600,
        })
    }

    #[test]
    fn test_issue_and_validate_token() {
        let jwt = service("test-secret");
        let user_id = Uuid::new_v4();

        let token = jwt.issue_token(user_id, "host@example.com").unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "host@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_claims_use_user_id_key() {
        let claims = Claims {
            user_id: Uuid::nil(),
            email: "a@b.io".to_string(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], Uuid::nil().to_string());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let jwt = service("test-secret");
        let now = unix_now().unwrap();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "late@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(jwt.validate_token(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let issuer = service("one-secret");
        let verifier = service("another-secret");
        let token = issuer.issue_token(Uuid::new_v4(), "x@example.com").unwrap();

        assert!(matches!(
            verifier.validate_token(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let jwt = service("test-secret");
        assert!(matches!(
            jwt.validate_token("not-a-jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    #[serial]
    fn test_jwt_config_requires_secret() {
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
        assert!(JwtConfig::from_env().is_err());

        unsafe {
            std::env::set_var("JWT_SECRET", "s3cret");
            std::env::remove_var("JWT_EXPIRES_IN");
        }
        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.expires_in, 86400);
        assert!(!format!("{:?}", config).contains("s3cret"));

        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
    }
}
