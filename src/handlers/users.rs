use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::entities::UserRole;
use crate::errors::ApiError;
use crate::handlers::common::{created_response, no_content_response, success_response, validate_input};
use crate::handlers::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/create-user", post(create_user))
        .route("/update-user", patch(update_user))
        .route("/delete-user", delete(delete_user))
        .route("/users", get(list_users))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub uid: Uuid,
    #[validate(email(message = "a valid email is required"))]
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub uid: Uuid,
}

/// Admin creates a buyer-side user (identity account + portal profile).
async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let user = state
        .services
        .users
        .create_user(&payload.email, &payload.password, &payload.name, payload.role)
        .await?;

    Ok(created_response(user))
}

/// Admin updates a user's email, name and/or role.
async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let user = state
        .services
        .users
        .update_user(
            payload.uid,
            payload.email.as_deref(),
            payload.name.as_deref(),
            payload.role,
        )
        .await?;

    Ok(success_response(user))
}

/// Admin deletes a user. Deleting your own account is rejected.
async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .users
        .delete_user(admin.user.id, payload.uid)
        .await?;

    Ok(no_content_response())
}

/// All portal users, newest first.
async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.services.users.list_users().await?;
    Ok(success_response(users))
}
