use crate::dtos::common::MessageResponse;
use crate::dtos::users::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest,
    UpdateUserRequest, UserResponse,
};
use crate::middleware::auth::AuthUser;
use crate::models::{CreateNotification, CreateUser, UpdateUser};
use crate::services::metrics::record_notification_emitted;
use crate::services::password::{hash_password, verify_password};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .db
        .create_user(&CreateUser {
            username: request.username,
            email: request.email.to_lowercase(),
            password_hash,
            display_name: request.display_name,
            avatar_url: None,
            bio: None,
            social_links: None,
        })
        .await?;

    info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    // The identifier may be either an email or a username.
    let by_email = state
        .db
        .get_user_by_email(&request.identifier.to_lowercase())
        .await?;
    let user = match by_email {
        Some(user) => user,
        None => state
            .db
            .get_user_by_username(&request.identifier)
            .await?
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid credentials")))?,
    };

    if !user.is_active {
        return Err(AppError::Forbidden(anyhow::anyhow!("Account is deactivated")));
    }

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::AuthError(anyhow::anyhow!("Invalid credentials")));
    }

    state.db.record_login(user.id).await?;
    let token = state.jwt.issue_access_token(&user)?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: ProfileResponse::from(user),
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(ProfileResponse::from(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(UserResponse::from(user)))
}

/// Email lookup is restricted to moderators; it would otherwise leak
/// which addresses have accounts.
pub async fn get_user_by_email(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.can_moderate() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Moderator access required"
        )));
    }

    let user = state
        .db
        .get_user_by_email(&email.to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn search_users(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let query = query.trim().to_string();
    if query.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Search query cannot be empty"
        )));
    }

    let users = state.db.search_users(&query, 20).await?;
    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let user = state
        .db
        .update_user(
            auth.user_id,
            &UpdateUser {
                username: None,
                email: None,
                display_name: request.display_name,
                avatar_url: request.avatar_url,
                bio: request.bio,
                social_links: request.social_links,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(ProfileResponse::from(user)))
}

/// Profile update on another user's behalf; the owner and admins only.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if auth.user_id != user_id && !auth.is_admin() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You can only update your own profile"
        )));
    }

    request.validate()?;

    let user = state
        .db
        .update_user(
            user_id,
            &UpdateUser {
                username: None,
                email: None,
                display_name: request.display_name,
                avatar_url: request.avatar_url,
                bio: request.bio,
                social_links: request.social_links,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(ProfileResponse::from(user)))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    if !verify_password(&request.current_password, &user.password_hash)? {
        return Err(AppError::AuthError(anyhow::anyhow!(
            "Current password is incorrect"
        )));
    }

    let password_hash = hash_password(&request.new_password)?;
    state
        .db
        .update_user_password(auth.user_id, &password_hash)
        .await?;

    info!(user_id = %auth.user_id, "Password changed");

    Ok(Json(MessageResponse::new("Password updated")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if auth.user_id != user_id && !auth.is_admin() {
        return Err(AppError::Forbidden(
            anyhow::anyhow!("You can only delete your own account"),
        ));
    }

    if !state.db.delete_user(user_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }

    info!(%user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn follow_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if auth.user_id == user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "You cannot follow yourself"
        )));
    }

    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let followed = state.db.follow_user(user_id, auth.user_id).await?;

    if followed {
        state
            .db
            .create_notification(&CreateNotification::new_follower(
                user_id,
                &auth.username,
                auth.user_id,
            ))
            .await?;
        record_notification_emitted("new_follower");

        if let Err(e) = crate::services::badges::check_and_award(&state.db, user_id).await {
            warn!(error = %e, "Badge evaluation failed after follow");
        }
    }

    Ok(Json(MessageResponse::new("Following")))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Idempotent: deleting a follow that does not exist is still a success.
    state.db.unfollow_user(user_id, auth.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let followers = state.db.get_followers(user_id).await?;
    Ok(Json(sanitize(followers)))
}

pub async fn get_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let following = state.db.get_following(user_id).await?;
    Ok(Json(sanitize(following)))
}

pub async fn get_user_badges(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let badges = state.db.get_user_badges(user_id).await?;
    Ok(Json(badges))
}

fn sanitize(users: Vec<crate::models::User>) -> Vec<UserResponse> {
    users.into_iter().map(UserResponse::from).collect()
}
