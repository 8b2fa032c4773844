use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{
    reply_revision, revision_part, rfq, rfq_invitation, supplier, supplier_reply, ReplyStatus,
    RfqStatus, SupplierType,
};
use crate::entities::rfq_part::OrderType;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Commercial terms attached to every revision.
#[derive(Debug, Clone)]
pub struct TermsInput {
    pub payment_terms: String,
    pub delivery_terms: String,
    pub freight_terms: String,
    pub remarks: String,
}

/// Quoted costs for one part, as entered by the supplier.
///
/// OEM suppliers enter `unit_rate` directly; regular suppliers enter the cost
/// breakdown and the unit rate is derived from it.
#[derive(Debug, Clone)]
pub struct QuotePartInput {
    pub part_no: String,
    pub part_description: String,
    pub quantity: i32,
    pub order_type: OrderType,
    pub unit_rate: Option<Decimal>,
    pub material_cost: Option<Decimal>,
    pub process_cost: Option<Decimal>,
    pub overhead_cost: Option<Decimal>,
    pub packing_cost: Option<Decimal>,
    pub tool_cost: Option<Decimal>,
    pub tool_lead_time: Option<i32>,
    pub tool_cavity: Option<i32>,
    pub tool_life: Option<i32>,
    pub sample_lead_time: i32,
    pub production_lead_time: i32,
}

/// A supplier's first quotation against an RFQ.
#[derive(Debug, Clone)]
pub struct NewReplyInput {
    pub rfq_id: Uuid,
    pub currency: String,
    pub terms: TermsInput,
    pub parts: Vec<QuotePartInput>,
    pub cost_breakup_url: Option<String>,
    pub drawing_url: Option<String>,
}

/// A re-quote appended to an existing reply.
#[derive(Debug, Clone)]
pub struct RequoteInput {
    pub terms: TermsInput,
    pub parts: Vec<QuotePartInput>,
    pub cost_breakup_url: Option<String>,
    pub drawing_url: Option<String>,
}

/// One revision with its part snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionDetail {
    #[serde(flatten)]
    pub revision: reply_revision::Model,
    pub parts: Vec<revision_part::Model>,
}

/// A reply header with its full revision history, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyDetail {
    #[serde(flatten)]
    pub reply: supplier_reply::Model,
    pub revisions: Vec<RevisionDetail>,
}

/// Derives (unit_rate, total_cost) for a quoted part.
///
/// OEM quotes must carry an explicit unit rate; regular quotes must carry a
/// cost breakdown, summed into the unit rate. Total is quantity × unit rate.
pub fn compute_pricing(
    supplier_type: SupplierType,
    part: &QuotePartInput,
) -> Result<(Decimal, Decimal), ServiceError> {
    let unit_rate = match supplier_type {
        SupplierType::Oem => part.unit_rate.ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "unit rate is required for part {}",
                part.part_no
            ))
        })?,
        SupplierType::Regular => {
            if part.material_cost.is_none()
                && part.process_cost.is_none()
                && part.overhead_cost.is_none()
                && part.packing_cost.is_none()
            {
                return Err(ServiceError::ValidationError(format!(
                    "cost breakdown is required for part {}",
                    part.part_no
                )));
            }
            part.material_cost.unwrap_or(Decimal::ZERO)
                + part.process_cost.unwrap_or(Decimal::ZERO)
                + part.overhead_cost.unwrap_or(Decimal::ZERO)
                + part.packing_cost.unwrap_or(Decimal::ZERO)
        }
    };

    if part.quantity <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "quantity must be positive for part {}",
            part.part_no
        )));
    }

    let total = unit_rate * Decimal::from(part.quantity);
    Ok((unit_rate, total))
}

/// Change flags for one part against its predecessor in the prior revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartChanges {
    pub unit_rate: bool,
    pub material_cost: bool,
    pub process_cost: bool,
    pub overhead_cost: bool,
    pub packing_cost: bool,
    pub lead_time: bool,
}

/// Field-by-field inequality against the same part (by part_no) in the
/// immediately preceding revision. A part with no predecessor has no changes.
pub fn part_changes(
    prev: Option<&revision_part::Model>,
    unit_rate: Decimal,
    part: &QuotePartInput,
) -> PartChanges {
    let Some(prev) = prev else {
        return PartChanges::default();
    };
    PartChanges {
        unit_rate: unit_rate != prev.unit_rate,
        material_cost: part.material_cost != prev.material_cost,
        process_cost: part.process_cost != prev.process_cost,
        overhead_cost: part.overhead_cost != prev.overhead_cost,
        packing_cost: part.packing_cost != prev.packing_cost,
        lead_time: part.sample_lead_time != prev.sample_lead_time
            || part.production_lead_time != prev.production_lead_time,
    }
}

/// Per-terms change flags against the prior revision.
pub fn terms_changes(prev: &reply_revision::Model, terms: &TermsInput) -> (bool, bool, bool) {
    (
        terms.payment_terms != prev.payment_terms,
        terms.delivery_terms != prev.delivery_terms,
        terms.freight_terms != prev.freight_terms,
    )
}

/// Supplier quotations: first submission and the append-only re-quote log.
#[derive(Clone)]
pub struct ReplyService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ReplyService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Submits a supplier's first quotation for an RFQ.
    ///
    /// The caller must be invited to the RFQ and may reply at most once; the
    /// second attempt is a conflict. Creates the reply header plus revision 0.
    #[instrument(skip(self, input), fields(rfq_id = %input.rfq_id, supplier_id = %supplier.id))]
    pub async fn submit_reply(
        &self,
        supplier: &supplier::Model,
        input: NewReplyInput,
    ) -> Result<ReplyDetail, ServiceError> {
        if input.parts.is_empty() {
            return Err(ServiceError::ValidationError(
                "a quotation needs at least one part".into(),
            ));
        }

        let rfq = rfq::Entity::find_by_id(input.rfq_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFQ {} not found", input.rfq_id)))?;

        if rfq.status != RfqStatus::Pending {
            return Err(ServiceError::InvalidOperation(format!(
                "RFQ {} is no longer open for quotations",
                rfq.rfq_number
            )));
        }

        rfq_invitation::Entity::find_by_id((rfq.id, supplier.id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::Forbidden("supplier is not invited to this RFQ".into())
            })?;

        let now = Utc::now();
        let reply_id = Uuid::new_v4();
        let revision_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        supplier_reply::ActiveModel {
            id: Set(reply_id),
            rfq_id: Set(rfq.id),
            rfq_number: Set(rfq.rfq_number.clone()),
            supplier_id: Set(supplier.id),
            supplier_name: Set(supplier.name.clone()),
            supplier_type: Set(supplier.supplier_type),
            msme_status: Set(supplier.msme_status.clone()),
            currency: Set(input.currency),
            status: Set(ReplyStatus::Submitted),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            // The (rfq_id, supplier_id) unique index is the one uniqueness
            // constraint this insert can trip; relying on it instead of a
            // pre-query keeps the 409 correct under concurrent submissions.
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
                "supplier has already replied to RFQ {}",
                rfq.rfq_number
            )),
            _ => ServiceError::from(e),
        })?;

        reply_revision::ActiveModel {
            id: Set(revision_id),
            reply_id: Set(reply_id),
            revision_number: Set(0),
            payment_terms: Set(input.terms.payment_terms),
            delivery_terms: Set(input.terms.delivery_terms),
            freight_terms: Set(input.terms.freight_terms),
            remarks: Set(input.terms.remarks),
            payment_terms_changed: Set(false),
            delivery_terms_changed: Set(false),
            freight_terms_changed: Set(false),
            cost_breakup_url: Set(input.cost_breakup_url),
            drawing_url: Set(input.drawing_url),
            submitted_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let part_models = build_revision_parts(
            revision_id,
            supplier.supplier_type,
            &input.parts,
            &HashMap::new(),
        )?;
        revision_part::Entity::insert_many(part_models)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(%reply_id, rfq_number = %rfq.rfq_number, "reply submitted");
        self.event_sender
            .send(Event::ReplySubmitted {
                reply_id,
                rfq_id: rfq.id,
                supplier_id: supplier.id,
            })
            .await;

        self.get_reply(reply_id).await
    }

    /// Appends a re-quote revision to an existing reply.
    ///
    /// Allowed only after the buyer has flagged this supplier's invitation for
    /// re-quote; the flag is cleared on success. Change flags are computed
    /// against the immediately preceding revision.
    #[instrument(skip(self, input), fields(reply_id = %reply_id, supplier_id = %supplier.id))]
    pub async fn submit_requote(
        &self,
        supplier: &supplier::Model,
        reply_id: Uuid,
        input: RequoteInput,
    ) -> Result<ReplyDetail, ServiceError> {
        if input.parts.is_empty() {
            return Err(ServiceError::ValidationError(
                "a re-quote needs at least one part".into(),
            ));
        }

        let reply = supplier_reply::Entity::find_by_id(reply_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("reply {reply_id} not found")))?;

        if reply.supplier_id != supplier.id {
            return Err(ServiceError::Forbidden(
                "reply belongs to a different supplier".into(),
            ));
        }

        if !reply.status.can_transition_to(ReplyStatus::RequoteSubmitted) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot re-quote a reply in status {}",
                reply.status.as_str()
            )));
        }

        let invitation = rfq_invitation::Entity::find_by_id((reply.rfq_id, supplier.id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::Forbidden("supplier is not invited to this RFQ".into())
            })?;
        if !invitation.requote_requested {
            return Err(ServiceError::InvalidOperation(
                "no re-quote has been requested for this supplier".into(),
            ));
        }

        let prev_revision = reply_revision::Entity::find()
            .filter(reply_revision::Column::ReplyId.eq(reply_id))
            .order_by_desc(reply_revision::Column::RevisionNumber)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("reply {reply_id} has no revisions"))
            })?;

        let prev_parts: HashMap<String, revision_part::Model> = revision_part::Entity::find()
            .filter(revision_part::Column::RevisionId.eq(prev_revision.id))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|p| (p.part_no.clone(), p))
            .collect();

        let now = Utc::now();
        let revision_id = Uuid::new_v4();
        let revision_number = prev_revision.revision_number + 1;
        let (payment_changed, delivery_changed, freight_changed) =
            terms_changes(&prev_revision, &input.terms);

        let txn = self.db.begin().await?;

        reply_revision::ActiveModel {
            id: Set(revision_id),
            reply_id: Set(reply_id),
            revision_number: Set(revision_number),
            payment_terms: Set(input.terms.payment_terms),
            delivery_terms: Set(input.terms.delivery_terms),
            freight_terms: Set(input.terms.freight_terms),
            remarks: Set(input.terms.remarks),
            payment_terms_changed: Set(payment_changed),
            delivery_terms_changed: Set(delivery_changed),
            freight_terms_changed: Set(freight_changed),
            cost_breakup_url: Set(input.cost_breakup_url),
            drawing_url: Set(input.drawing_url),
            submitted_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let part_models = build_revision_parts(
            revision_id,
            reply.supplier_type,
            &input.parts,
            &prev_parts,
        )?;
        revision_part::Entity::insert_many(part_models)
            .exec(&txn)
            .await?;

        let old_status = reply.status;
        let mut active: supplier_reply::ActiveModel = reply.into();
        active.status = Set(ReplyStatus::RequoteSubmitted);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        let mut invitation_active: rfq_invitation::ActiveModel = invitation.into();
        invitation_active.requote_requested = Set(false);
        invitation_active.update(&txn).await?;

        txn.commit().await?;

        info!(%reply_id, revision_number, "re-quote submitted");
        self.event_sender
            .send(Event::RequoteSubmitted {
                reply_id,
                revision_number,
            })
            .await;
        if old_status != ReplyStatus::RequoteSubmitted {
            self.event_sender
                .send(Event::ReplyStatusChanged {
                    reply_id,
                    old_status: old_status.as_str().to_string(),
                    new_status: ReplyStatus::RequoteSubmitted.as_str().to_string(),
                })
                .await;
        }

        self.get_reply(reply_id).await
    }

    /// Fetches one reply with its full revision history.
    #[instrument(skip(self))]
    pub async fn get_reply(&self, reply_id: Uuid) -> Result<ReplyDetail, ServiceError> {
        let reply = supplier_reply::Entity::find_by_id(reply_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("reply {reply_id} not found")))?;

        let mut details = self.load_revisions(vec![reply]).await?;
        details
            .pop()
            .ok_or_else(|| ServiceError::InternalError("reply vanished during load".into()))
    }

    /// Lists all replies to an RFQ with their revision histories.
    #[instrument(skip(self))]
    pub async fn list_replies(&self, rfq_id: Uuid) -> Result<Vec<ReplyDetail>, ServiceError> {
        rfq::Entity::find_by_id(rfq_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RFQ {rfq_id} not found")))?;

        let replies = supplier_reply::Entity::find()
            .filter(supplier_reply::Column::RfqId.eq(rfq_id))
            .order_by_asc(supplier_reply::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        self.load_revisions(replies).await
    }

    async fn load_revisions(
        &self,
        replies: Vec<supplier_reply::Model>,
    ) -> Result<Vec<ReplyDetail>, ServiceError> {
        let reply_ids: Vec<Uuid> = replies.iter().map(|r| r.id).collect();

        let revisions = reply_revision::Entity::find()
            .filter(reply_revision::Column::ReplyId.is_in(reply_ids))
            .order_by_asc(reply_revision::Column::RevisionNumber)
            .all(self.db.as_ref())
            .await?;

        let revision_ids: Vec<Uuid> = revisions.iter().map(|r| r.id).collect();
        let mut parts_by_revision: HashMap<Uuid, Vec<revision_part::Model>> = HashMap::new();
        for part in revision_part::Entity::find()
            .filter(revision_part::Column::RevisionId.is_in(revision_ids))
            .all(self.db.as_ref())
            .await?
        {
            parts_by_revision
                .entry(part.revision_id)
                .or_default()
                .push(part);
        }

        let mut revisions_by_reply: HashMap<Uuid, Vec<RevisionDetail>> = HashMap::new();
        for revision in revisions {
            let parts = parts_by_revision.remove(&revision.id).unwrap_or_default();
            revisions_by_reply
                .entry(revision.reply_id)
                .or_default()
                .push(RevisionDetail { revision, parts });
        }

        Ok(replies
            .into_iter()
            .map(|reply| {
                let revisions = revisions_by_reply.remove(&reply.id).unwrap_or_default();
                ReplyDetail { reply, revisions }
            })
            .collect())
    }
}

/// Builds the stored part snapshots for one revision, computing pricing and
/// change flags against the prior revision's parts (empty map for revision 0).
fn build_revision_parts(
    revision_id: Uuid,
    supplier_type: SupplierType,
    parts: &[QuotePartInput],
    prev_parts: &HashMap<String, revision_part::Model>,
) -> Result<Vec<revision_part::ActiveModel>, ServiceError> {
    parts
        .iter()
        .map(|part| {
            let (unit_rate, total_cost) = compute_pricing(supplier_type, part)?;
            let changes = part_changes(prev_parts.get(&part.part_no), unit_rate, part);

            Ok(revision_part::ActiveModel {
                id: Set(Uuid::new_v4()),
                revision_id: Set(revision_id),
                part_no: Set(part.part_no.clone()),
                part_description: Set(part.part_description.clone()),
                quantity: Set(part.quantity),
                order_type: Set(part.order_type),
                unit_rate: Set(unit_rate),
                material_cost: Set(part.material_cost),
                process_cost: Set(part.process_cost),
                overhead_cost: Set(part.overhead_cost),
                packing_cost: Set(part.packing_cost),
                tool_cost: Set(part.tool_cost),
                tool_lead_time: Set(part.tool_lead_time),
                tool_cavity: Set(part.tool_cavity),
                tool_life: Set(part.tool_life),
                sample_lead_time: Set(part.sample_lead_time),
                production_lead_time: Set(part.production_lead_time),
                total_cost: Set(total_cost),
                unit_rate_changed: Set(changes.unit_rate),
                material_cost_changed: Set(changes.material_cost),
                process_cost_changed: Set(changes.process_cost),
                overhead_cost_changed: Set(changes.overhead_cost),
                packing_cost_changed: Set(changes.packing_cost),
                lead_time_changed: Set(changes.lead_time),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn part_input(part_no: &str) -> QuotePartInput {
        QuotePartInput {
            part_no: part_no.to_string(),
            part_description: "Bracket".to_string(),
            quantity: 100,
            order_type: OrderType::Annual,
            unit_rate: None,
            material_cost: Some(dec!(10.00)),
            process_cost: Some(dec!(5.00)),
            overhead_cost: Some(dec!(2.50)),
            packing_cost: Some(dec!(0.50)),
            tool_cost: None,
            tool_lead_time: None,
            tool_cavity: None,
            tool_life: None,
            sample_lead_time: 14,
            production_lead_time: 30,
        }
    }

    fn stored_part(part_no: &str, unit_rate: Decimal) -> revision_part::Model {
        revision_part::Model {
            id: Uuid::new_v4(),
            revision_id: Uuid::new_v4(),
            part_no: part_no.to_string(),
            part_description: "Bracket".to_string(),
            quantity: 100,
            order_type: OrderType::Annual,
            unit_rate,
            material_cost: Some(dec!(10.00)),
            process_cost: Some(dec!(5.00)),
            overhead_cost: Some(dec!(2.50)),
            packing_cost: Some(dec!(0.50)),
            tool_cost: None,
            tool_lead_time: None,
            tool_cavity: None,
            tool_life: None,
            sample_lead_time: 14,
            production_lead_time: 30,
            total_cost: unit_rate * dec!(100),
            unit_rate_changed: false,
            material_cost_changed: false,
            process_cost_changed: false,
            overhead_cost_changed: false,
            packing_cost_changed: false,
            lead_time_changed: false,
        }
    }

    #[test]
    fn regular_supplier_unit_rate_is_the_breakdown_sum() {
        let part = part_input("P-100");
        let (unit_rate, total) = compute_pricing(SupplierType::Regular, &part).unwrap();
        assert_eq!(unit_rate, dec!(18.00));
        assert_eq!(total, dec!(1800.00));
    }

    #[test]
    fn oem_supplier_enters_unit_rate_directly() {
        let mut part = part_input("P-100");
        part.unit_rate = Some(dec!(21.75));
        part.material_cost = None;
        part.process_cost = None;
        part.overhead_cost = None;
        part.packing_cost = None;
        let (unit_rate, total) = compute_pricing(SupplierType::Oem, &part).unwrap();
        assert_eq!(unit_rate, dec!(21.75));
        assert_eq!(total, dec!(2175.00));
    }

    #[test]
    fn oem_without_unit_rate_is_rejected() {
        let mut part = part_input("P-100");
        part.unit_rate = None;
        assert!(matches!(
            compute_pricing(SupplierType::Oem, &part),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn regular_without_breakdown_is_rejected() {
        let mut part = part_input("P-100");
        part.material_cost = None;
        part.process_cost = None;
        part.overhead_cost = None;
        part.packing_cost = None;
        assert!(matches!(
            compute_pricing(SupplierType::Regular, &part),
            Err(ServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn unchanged_requote_has_no_flags() {
        let prev = stored_part("P-100", dec!(18.00));
        let next = part_input("P-100");
        let changes = part_changes(Some(&prev), dec!(18.00), &next);
        assert_eq!(changes, PartChanges::default());
    }

    #[test]
    fn changed_fields_flag_exactly_what_differs() {
        let prev = stored_part("P-100", dec!(18.00));
        let mut next = part_input("P-100");
        next.material_cost = Some(dec!(11.00));
        next.production_lead_time = 45;
        // material bump flows into the derived unit rate
        let changes = part_changes(Some(&prev), dec!(19.00), &next);
        assert!(changes.unit_rate);
        assert!(changes.material_cost);
        assert!(!changes.process_cost);
        assert!(!changes.overhead_cost);
        assert!(!changes.packing_cost);
        assert!(changes.lead_time);
    }

    #[test]
    fn new_part_in_a_requote_has_no_flags() {
        let next = part_input("P-200");
        let changes = part_changes(None, dec!(18.00), &next);
        assert_eq!(changes, PartChanges::default());
    }

    #[test]
    fn terms_diff_flags_each_field_independently() {
        let prev = reply_revision::Model {
            id: Uuid::new_v4(),
            reply_id: Uuid::new_v4(),
            revision_number: 0,
            payment_terms: "Net 45".to_string(),
            delivery_terms: "DAP".to_string(),
            freight_terms: "Included".to_string(),
            remarks: String::new(),
            payment_terms_changed: false,
            delivery_terms_changed: false,
            freight_terms_changed: false,
            cost_breakup_url: None,
            drawing_url: None,
            submitted_at: Utc::now(),
        };
        let terms = TermsInput {
            payment_terms: "Net 60".to_string(),
            delivery_terms: "DAP".to_string(),
            freight_terms: "Extra".to_string(),
            remarks: "revised".to_string(),
        };
        assert_eq!(terms_changes(&prev, &terms), (true, false, true));
    }
}
