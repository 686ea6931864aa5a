//! Bearer-token authentication extractor.
//!
//! Handlers that take an [`AuthUser`] argument require a valid access
//! token; everything else stays public. This keeps route wiring flat
//! instead of splitting the router into layered sub-routers.

use crate::services::jwt::AccessTokenClaims;
use crate::startup::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

/// The authenticated caller, decoded from the `Authorization: Bearer`
/// header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub claims: AccessTokenClaims,
}

impl AuthUser {
    pub fn can_moderate(&self) -> bool {
        self.claims.can_moderate()
    }

    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }

    /// Authorization check for mutating someone's content: the owner,
    /// moderators, and admins pass.
    pub fn require_owner_or_moderator(&self, owner_id: Uuid) -> Result<(), AppError> {
        if self.user_id == owner_id || self.can_moderate() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                anyhow::anyhow!("You do not have permission to modify this resource"),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!("Admin access required")))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!("Missing or malformed Authorization header"))
            })?;

        let claims = state.jwt.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        Ok(AuthUser {
            user_id,
            username: claims.username.clone(),
            claims,
        })
    }
}
