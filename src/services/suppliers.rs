use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::clients::identity::IdentityProvider;
use crate::entities::{supplier, SupplierType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Everything needed to onboard a supplier.
#[derive(Debug, Clone)]
pub struct CreateSupplierInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub vendor_id: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub supplier_type: SupplierType,
    pub msme_status: String,
}

/// Profile fields a supplier (or admin) may change after onboarding.
#[derive(Debug, Clone, Default)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub msme_status: Option<String>,
}

/// Supplier onboarding and profile management, mirroring identity accounts
/// the same way [`crate::services::UserService`] does for buyers.
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
    identity: Arc<dyn IdentityProvider>,
    event_sender: EventSender,
}

impl SupplierService {
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

    /// Onboards a supplier: identity account first, then the profile row.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        let existing = supplier::Entity::find()
            .filter(supplier::Column::Email.eq(input.email.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Supplier already exists".into(),
            ));
        }

        let uid = self
            .identity
            .create_account(&input.email, &input.password, &input.name)
            .await?;
        let now = Utc::now();

        let model = supplier::ActiveModel {
            id: Set(uid),
            email: Set(input.email),
            name: Set(input.name),
            vendor_id: Set(input.vendor_id),
            phone: Set(input.phone),
            country: Set(input.country),
            location: Set(input.location),
            category: Set(input.category),
            sub_category: Set(input.sub_category),
            supplier_type: Set(input.supplier_type),
            msme_status: Set(input.msme_status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(%uid, "supplier created");
        self.event_sender
            .send(Event::SupplierRegistered { supplier_id: uid })
            .await;

        Ok(model)
    }

    /// Fetches a supplier profile by identity uid.
    #[instrument(skip(self))]
    pub async fn get_supplier(&self, uid: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(uid)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {uid} not found")))
    }

    /// Fetches supplier profiles for a set of ids. Missing ids are skipped.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<supplier::Model>, ServiceError> {
        Ok(supplier::Entity::find()
            .filter(supplier::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await?)
    }

    /// Updates a supplier profile; name changes propagate upstream.
    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        uid: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        let supplier = self.get_supplier(uid).await?;

        if let Some(name) = input.name.as_deref() {
            self.identity.update_account(uid, None, Some(name)).await?;
        }

        let mut active: supplier::ActiveModel = supplier.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(country) = input.country {
            active.country = Set(Some(country));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(sub_category) = input.sub_category {
            active.sub_category = Set(Some(sub_category));
        }
        if let Some(msme_status) = input.msme_status {
            active.msme_status = Set(msme_status);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Deletes a supplier, upstream account included. Self-deletion rejected.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, actor: Uuid, uid: Uuid) -> Result<(), ServiceError> {
        if actor == uid {
            return Err(ServiceError::ValidationError(
                "cannot delete your own account".into(),
            ));
        }

        let supplier = self.get_supplier(uid).await?;

        self.identity.delete_account(uid).await?;
        supplier.delete(self.db.as_ref()).await?;

        info!(%uid, "supplier deleted");
        Ok(())
    }
}
