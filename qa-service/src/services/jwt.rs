//! JWT issuing and validation.
//!
//! Tokens are HS256-signed with a shared secret from configuration. This
//! is deliberately thin: the platform has no refresh tokens or revocation
//! list, only short-lived access tokens handed out at login.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::User;

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Role at issue time
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl AccessTokenClaims {
    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthError(anyhow::anyhow!("Malformed subject claim")))
    }

    pub fn can_moderate(&self) -> bool {
        matches!(self.role.as_str(), "moderator" | "admin")
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Token response returned to the client at login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, AppError> {
        if config.secret.len() < 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 bytes"
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
        })
    }

    /// Issue an access token for a user.
    pub fn issue_access_token(&self, user: &User) -> Result<TokenResponse, AppError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry_minutes * 60,
        })
    }

    /// Validate a bearer token and return its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ferris".to_string(),
            email: "ferris@example.com".to_string(),
            password_hash: "x".to_string(),
            display_name: None,
            avatar_url: None,
            bio: None,
            social_links: None,
            reputation: 0,
            is_active: true,
            role: "user".to_string(),
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            access_token_expiry_minutes: 60,
        })
        .unwrap()
    }

    #[test]
    fn issued_tokens_validate_and_carry_the_subject() {
        let user = test_user();
        let jwt = service();
        let token = jwt.issue_access_token(&user).unwrap();
        let claims = jwt.validate_access_token(&token.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username, "ferris");
        assert!(!claims.can_moderate());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let jwt = service();
        assert!(jwt.validate_access_token("not.a.token").is_err());
    }

    #[test]
    fn short_secrets_are_rejected() {
        let result = JwtService::new(&JwtConfig {
            secret: "too-short".to_string(),
            access_token_expiry_minutes: 60,
        });
        assert!(result.is_err());
    }
}
