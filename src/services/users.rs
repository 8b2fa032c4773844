use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::clients::identity::IdentityProvider;
use crate::entities::{user, UserRole};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Buyer-side user administration.
///
/// Accounts live on the identity platform; the local `users` table mirrors
/// them and carries the portal role. Every mutation goes upstream first so a
/// failed identity call never leaves a dangling mirror row.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    identity: Arc<dyn IdentityProvider>,
    event_sender: EventSender,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        identity: Arc<dyn IdentityProvider>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            identity,
            event_sender,
        }
    }

    /// Creates an identity account and its portal profile.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
    ) -> Result<user::Model, ServiceError> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "User already exists".into(),
            ));
        }

        let uid = self.identity.create_account(email, password, name).await?;
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(uid),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(%uid, "user created");
        self.event_sender
            .send(Event::UserRegistered { user_id: uid })
            .await;

        Ok(model)
    }

    /// Updates an existing user's email, name and/or role.
    #[instrument(skip(self))]
    pub async fn update_user(
        &self,
        uid: Uuid,
        email: Option<&str>,
        name: Option<&str>,
        role: Option<UserRole>,
    ) -> Result<user::Model, ServiceError> {
        let user = user::Entity::find_by_id(uid)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {uid} not found")))?;

        if email.is_some() || name.is_some() {
            self.identity.update_account(uid, email, name).await?;
        }

        let mut active: user::ActiveModel = user.into();
        if let Some(email) = email {
            active.email = Set(email.to_string());
        }
        if let Some(name) = name {
            active.name = Set(name.to_string());
        }
        if let Some(role) = role {
            active.role = Set(role);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Deletes a user, upstream account included. Self-deletion is rejected.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, actor: Uuid, uid: Uuid) -> Result<(), ServiceError> {
        if actor == uid {
            return Err(ServiceError::ValidationError(
                "cannot delete your own account".into(),
            ));
        }

        let user = user::Entity::find_by_id(uid)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {uid} not found")))?;

        self.identity.delete_account(uid).await?;
        user.delete(self.db.as_ref()).await?;

        info!(%uid, "user deleted");
        Ok(())
    }

    /// Lists all portal users, newest first.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }
}
