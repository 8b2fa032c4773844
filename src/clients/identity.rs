use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Identity claims extracted from a verified bearer token.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
}

/// Token verification and account management on the identity platform.
///
/// The portal never stores credentials itself; accounts live upstream and the
/// local `users` / `suppliers` tables mirror them by uid.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a bearer token and returns its claims.
    ///
    /// Any upstream rejection (bad signature, expiry, malformed uid) surfaces
    /// as `ServiceError::Unauthorized`.
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, ServiceError>;

    /// Creates an account and returns its uid.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Uuid, ServiceError>;

    /// Updates an account's email and/or display name.
    async fn update_account(
        &self,
        uid: Uuid,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<(), ServiceError>;

    /// Deletes an account.
    async fn delete_account(&self, uid: Uuid) -> Result<(), ServiceError>;
}

/// `reqwest`-backed identity client.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    uid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

#[derive(Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
struct CreateAccountResponse {
    uid: String,
}

#[derive(Serialize)]
struct UpdateAccountRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self, token))]
    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, ServiceError> {
        let response = self
            .client
            .post(self.url("/v1/tokens:verify"))
            .bearer_auth(&self.api_key)
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("identity: {e}")))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ServiceError::Unauthorized("invalid token".into()));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "identity: token verification failed with status {}",
                response.status()
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("identity: {e}")))?;

        let uid = Uuid::parse_str(&body.uid)
            .map_err(|_| ServiceError::Unauthorized("malformed subject in token".into()))?;

        Ok(VerifiedToken {
            uid,
            name: body.name,
            email: body.email,
        })
    }

    #[instrument(skip(self, password))]
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Uuid, ServiceError> {
        let response = self
            .client
            .post(self.url("/v1/accounts"))
            .bearer_auth(&self.api_key)
            .json(&CreateAccountRequest {
                email,
                password,
                display_name,
            })
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("identity: {e}")))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(ServiceError::Conflict(format!(
                "an account already exists for {email}"
            )));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "identity: account creation failed with status {}",
                response.status()
            )));
        }

        let body: CreateAccountResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("identity: {e}")))?;

        Uuid::parse_str(&body.uid)
            .map_err(|_| ServiceError::ExternalServiceError("identity: malformed uid".into()))
    }

    #[instrument(skip(self))]
    async fn update_account(
        &self,
        uid: Uuid,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .patch(self.url(&format!("/v1/accounts/{uid}")))
            .bearer_auth(&self.api_key)
            .json(&UpdateAccountRequest {
                email,
                display_name,
            })
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("identity: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(format!("account {uid} not found")));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "identity: account update failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_account(&self, uid: Uuid) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/accounts/{uid}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("identity: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound(format!("account {uid} not found")));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "identity: account deletion failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
