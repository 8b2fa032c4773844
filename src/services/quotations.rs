use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{rfq, rfq_counter, rfq_invitation, rfq_part, RfqStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// A part row on a new or updated RFQ.
#[derive(Debug, Clone)]
pub struct NewRfqPart {
    pub part_no: String,
    pub part_description: String,
    pub draw_revision: String,
    pub order_type: rfq_part::OrderType,
    pub quantity: i32,
}

/// Everything needed to open an RFQ.
#[derive(Debug, Clone)]
pub struct CreateRfqInput {
    pub project_name: String,
    pub submission_date: DateTime<Utc>,
    pub comments: String,
    pub drawing_file_name: Option<String>,
    pub parts: Vec<NewRfqPart>,
    pub supplier_ids: Vec<Uuid>,
}

/// An RFQ together with its parts and invited suppliers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqDetail {
    #[serde(flatten)]
    pub rfq: rfq::Model,
    pub parts: Vec<rfq_part::Model>,
    pub invitations: Vec<rfq_invitation::Model>,
}

/// Month prefix for RFQ numbers, e.g. `RFQ-2503` for March 2025.
pub fn month_prefix(now: DateTime<Utc>) -> String {
    format!("RFQ-{:02}{:02}", now.year() % 100, now.month())
}

/// Formats a full RFQ number. The sequence is zero-padded to three digits and
/// widens past 999 instead of truncating.
pub fn format_rfq_number(prefix: &str, sequence: i32) -> String {
    format!("{prefix}-{sequence:03}")
}

/// RFQ lifecycle: creation with transactional numbering, part updates and the
/// buyer side of the re-quote flow.
#[derive(Clone)]
pub struct QuotationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl QuotationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an RFQ with its parts and supplier invitations.
    ///
    /// Numbering reads and bumps the monthly counter inside a serializable
    /// transaction, so concurrent creations never share a sequence.
    #[instrument(skip(self, input), fields(project = %input.project_name))]
    pub async fn create_rfq(
        &self,
        created_by: Uuid,
        input: CreateRfqInput,
    ) -> Result<RfqDetail, ServiceError> {
        if input.parts.is_empty() {
            return Err(ServiceError::ValidationError(
                "an RFQ needs at least one part".into(),
            ));
        }
        if input.supplier_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "an RFQ needs at least one invited supplier".into(),
            ));
        }

        let now = Utc::now();
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await?;

        let prefix = month_prefix(now);
        let sequence = match rfq_counter::Entity::find_by_id(prefix.clone())
            .one(&txn)
            .await?
        {
            Some(counter) => {
                let next = counter.sequence + 1;
                let mut active: rfq_counter::ActiveModel = counter.into();
                active.sequence = Set(next);
                active.updated_at = Set(now);
                active.update(&txn).await?;
                next
            }
            None => {
                rfq_counter::ActiveModel {
                    prefix: Set(prefix.clone()),
                    sequence: Set(1),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?;
                1
            }
        };

        let rfq_number = format_rfq_number(&prefix, sequence);
        let rfq_id = Uuid::new_v4();

        rfq::ActiveModel {
            id: Set(rfq_id),
            rfq_number: Set(rfq_number.clone()),
            sequence: Set(sequence),
            project_name: Set(input.project_name),
            submission_date: Set(input.submission_date),
            status: Set(RfqStatus::Pending),
            created_by: Set(created_by),
            comments: Set(input.comments),
            drawing_file_name: Set(input.drawing_file_name),
            requote_requested: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let part_models: Vec<rfq_part::ActiveModel> = input
            .parts
            .into_iter()
            .map(|p| rfq_part::ActiveModel {
                id: Set(Uuid::new_v4()),
                rfq_id: Set(rfq_id),
                part_no: Set(p.part_no),
                part_description: Set(p.part_description),
                draw_revision: Set(p.draw_revision),
                order_type: Set(p.order_type),
                quantity: Set(p.quantity),
            })
            .collect();
        rfq_part::Entity::insert_many(part_models).exec(&txn).await?;

        let invitation_models: Vec<rfq_invitation::ActiveModel> = input
            .supplier_ids
            .into_iter()
            .map(|supplier_id| rfq_invitation::ActiveModel {
                rfq_id: Set(rfq_id),
                supplier_id: Set(supplier_id),
                requote_requested: Set(false),
                created_at: Set(now),
            })
            .collect();
        rfq_invitation::Entity::insert_many(invitation_models)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(%rfq_id, %rfq_number, "created rfq");
        self.event_sender
            .send(Event::RfqCreated {
                rfq_id,
                rfq_number,
            })
            .await;

        self.get_rfq(rfq_id).await
    }

    /// Fetches one RFQ with parts and invitations.
    #[instrument(skip(self))]
    pub async fn get_rfq(&self, rfq_id: Uuid) -> Result<RfqDetail, ServiceError> {
        let rfq = rfq::Entity::find_by_id(rfq_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFQ {rfq_id} not found")))?;

        let parts = rfq_part::Entity::find()
            .filter(rfq_part::Column::RfqId.eq(rfq_id))
            .order_by_asc(rfq_part::Column::PartNo)
            .all(self.db.as_ref())
            .await?;

        let invitations = rfq_invitation::Entity::find()
            .filter(rfq_invitation::Column::RfqId.eq(rfq_id))
            .all(self.db.as_ref())
            .await?;

        Ok(RfqDetail {
            rfq,
            parts,
            invitations,
        })
    }

    /// Lists RFQs (newest first), optionally filtered by status.
    ///
    /// Callers that need the expiry guarantee run the sweep first; this
    /// method only reads.
    #[instrument(skip(self))]
    pub async fn list_rfqs(
        &self,
        status: Option<RfqStatus>,
    ) -> Result<Vec<RfqDetail>, ServiceError> {
        let mut query = rfq::Entity::find().order_by_desc(rfq::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(rfq::Column::Status.eq(status));
        }
        let rfqs = query.all(self.db.as_ref()).await?;

        let ids: Vec<Uuid> = rfqs.iter().map(|r| r.id).collect();

        let mut parts_by_rfq: HashMap<Uuid, Vec<rfq_part::Model>> = HashMap::new();
        for part in rfq_part::Entity::find()
            .filter(rfq_part::Column::RfqId.is_in(ids.clone()))
            .all(self.db.as_ref())
            .await?
        {
            parts_by_rfq.entry(part.rfq_id).or_default().push(part);
        }

        let mut invitations_by_rfq: HashMap<Uuid, Vec<rfq_invitation::Model>> = HashMap::new();
        for invitation in rfq_invitation::Entity::find()
            .filter(rfq_invitation::Column::RfqId.is_in(ids))
            .all(self.db.as_ref())
            .await?
        {
            invitations_by_rfq
                .entry(invitation.rfq_id)
                .or_default()
                .push(invitation);
        }

        Ok(rfqs
            .into_iter()
            .map(|rfq| {
                let parts = parts_by_rfq.remove(&rfq.id).unwrap_or_default();
                let invitations = invitations_by_rfq.remove(&rfq.id).unwrap_or_default();
                RfqDetail {
                    rfq,
                    parts,
                    invitations,
                }
            })
            .collect())
    }

    /// Replaces the part list of a pending RFQ.
    #[instrument(skip(self, parts))]
    pub async fn update_parts(
        &self,
        rfq_id: Uuid,
        parts: Vec<NewRfqPart>,
    ) -> Result<RfqDetail, ServiceError> {
        if parts.is_empty() {
            return Err(ServiceError::ValidationError(
                "an RFQ needs at least one part".into(),
            ));
        }

        let rfq = rfq::Entity::find_by_id(rfq_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFQ {rfq_id} not found")))?;

        if rfq.status != RfqStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot edit parts of an RFQ in status {}",
                rfq.status.as_str()
            )));
        }

        let txn = self.db.begin().await?;

        rfq_part::Entity::delete_many()
            .filter(rfq_part::Column::RfqId.eq(rfq_id))
            .exec(&txn)
            .await?;

        let part_models: Vec<rfq_part::ActiveModel> = parts
            .into_iter()
            .map(|p| rfq_part::ActiveModel {
                id: Set(Uuid::new_v4()),
                rfq_id: Set(rfq_id),
                part_no: Set(p.part_no),
                part_description: Set(p.part_description),
                draw_revision: Set(p.draw_revision),
                order_type: Set(p.order_type),
                quantity: Set(p.quantity),
            })
            .collect();
        rfq_part::Entity::insert_many(part_models).exec(&txn).await?;

        let mut active: rfq::ActiveModel = rfq.into();
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send(Event::RfqPartsUpdated { rfq_id })
            .await;

        self.get_rfq(rfq_id).await
    }

    /// Buyer asks the named suppliers for a re-quote.
    ///
    /// Idempotent: already-flagged invitations are left alone. Suppliers not
    /// invited to the RFQ are a validation error.
    #[instrument(skip(self))]
    pub async fn request_requote(
        &self,
        rfq_id: Uuid,
        supplier_ids: Vec<Uuid>,
    ) -> Result<(), ServiceError> {
        if supplier_ids.is_empty() {
            return Err(ServiceError::ValidationError(
                "no suppliers named for re-quote".into(),
            ));
        }

        let rfq = rfq::Entity::find_by_id(rfq_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFQ {rfq_id} not found")))?;

        if rfq.status == RfqStatus::Expired {
            return Err(ServiceError::InvalidOperation(
                "cannot request a re-quote on an expired RFQ".into(),
            ));
        }

        let invitations = rfq_invitation::Entity::find()
            .filter(rfq_invitation::Column::RfqId.eq(rfq_id))
            .filter(rfq_invitation::Column::SupplierId.is_in(supplier_ids.clone()))
            .all(self.db.as_ref())
            .await?;

        if invitations.len() != supplier_ids.len() {
            return Err(ServiceError::ValidationError(
                "one or more suppliers are not invited to this RFQ".into(),
            ));
        }

        let txn = self.db.begin().await?;

        for invitation in invitations {
            if invitation.requote_requested {
                continue;
            }
            let mut active: rfq_invitation::ActiveModel = invitation.into();
            active.requote_requested = Set(true);
            active.update(&txn).await?;
        }

        if !rfq.requote_requested {
            let mut active: rfq::ActiveModel = rfq.into();
            active.requote_requested = Set(true);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send(Event::RequoteRequested {
                rfq_id,
                supplier_ids,
            })
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn march_2025_prefix() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        assert_eq!(month_prefix(now), "RFQ-2503");
    }

    #[test]
    fn first_numbers_of_a_month() {
        assert_eq!(format_rfq_number("RFQ-2503", 1), "RFQ-2503-001");
        assert_eq!(format_rfq_number("RFQ-2503", 2), "RFQ-2503-002");
    }

    #[test]
    fn sequence_widens_past_999() {
        assert_eq!(format_rfq_number("RFQ-2503", 999), "RFQ-2503-999");
        assert_eq!(format_rfq_number("RFQ-2503", 1000), "RFQ-2503-1000");
    }

    #[test]
    fn december_prefix_is_two_digit_month() {
        let now = Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(month_prefix(now), "RFQ-2612");
    }

    #[test]
    fn january_prefix_is_zero_padded() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap();
        assert_eq!(month_prefix(now), "RFQ-2601");
    }
}
