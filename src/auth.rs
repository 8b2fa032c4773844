use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sea_orm::EntityTrait;

use crate::{
    entities::{user, UserRole},
    errors::ApiError,
    AppState,
};

/// Pulls the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Caller identity established from a verified bearer token.
///
/// Extraction fails with 401 when the header is missing or the identity
/// platform rejects the token. Authorization beyond "is signed in" is the
/// handler's job ([`BuyerUser`] gates the buyer side, [`AdminUser`] the
/// account-management routes).
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub uid: uuid::Uuid,
    pub name: String,
    pub email: String,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;

        let verified = state
            .identity
            .verify_token(token)
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthenticatedUser {
            uid: verified.uid,
            name: verified.name,
            email: verified.email,
        })
    }
}

/// Caller with a buyer-side portal account (role `admin` or `user`).
///
/// Token failures reject with 401; a valid token without a buyer profile row
/// (suppliers included) rejects with 403.
#[derive(Debug, Clone)]
pub struct BuyerUser {
    pub user: user::Model,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for BuyerUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authenticated = AuthenticatedUser::from_request_parts(parts, state).await?;

        let user = user::Entity::find_by_id(authenticated.uid)
            .one(state.db.as_ref())
            .await
            .map_err(|_| ApiError::InternalServerError)?
            .ok_or_else(|| ApiError::Forbidden("buyer access required".into()))?;

        if user.role == UserRole::Supplier {
            return Err(ApiError::Forbidden("buyer access required".into()));
        }

        Ok(BuyerUser { user })
    }
}

/// Caller identity that additionally holds the portal `Admin` role.
///
/// Token failures reject with 401; a valid token without an admin user row
/// rejects with 403.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: user::Model,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let authenticated = AuthenticatedUser::from_request_parts(parts, state).await?;

        let user = user::Entity::find_by_id(authenticated.uid)
            .one(state.db.as_ref())
            .await
            .map_err(|_| ApiError::InternalServerError)?
            .ok_or_else(|| ApiError::Forbidden("admin access required".into()))?;

        if user.role != UserRole::Admin {
            return Err(ApiError::Forbidden("admin access required".into()));
        }

        Ok(AdminUser { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn bearer_token_strips_scheme() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc123")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn missing_header_yields_none() {
        let request = Request::builder().body(()).unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
