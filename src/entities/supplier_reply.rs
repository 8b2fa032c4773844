use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::supplier::SupplierType;

/// Status of a supplier's reply to an RFQ.
///
/// Transitions are validated through [`ReplyStatus::can_transition_to`].
/// Appending a re-quote revision always drives the reply to
/// `RequoteSubmitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "requote_submitted")]
    RequoteSubmitted,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ReplyStatus {
    /// Explicit transition table. Same-status transitions are no-ops.
    pub fn can_transition_to(self, next: ReplyStatus) -> bool {
        matches!(
            (self, next),
            (ReplyStatus::Submitted, ReplyStatus::RequoteSubmitted)
                | (ReplyStatus::Submitted, ReplyStatus::Accepted)
                | (ReplyStatus::Submitted, ReplyStatus::Rejected)
                | (ReplyStatus::RequoteSubmitted, ReplyStatus::Accepted)
                | (ReplyStatus::RequoteSubmitted, ReplyStatus::Rejected)
        ) || self == next
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReplyStatus::Submitted => "submitted",
            ReplyStatus::RequoteSubmitted => "requote_submitted",
            ReplyStatus::Accepted => "accepted",
            ReplyStatus::Rejected => "rejected",
        }
    }
}

/// Header row for one supplier's quotation against an RFQ.
///
/// At most one reply exists per (rfq, supplier); the unique index in the
/// schema enforces it. The actual cost data lives in the append-only
/// revision log (`reply_revisions` / `revision_parts`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supplier_replies")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rfq_id: Uuid,
    /// Denormalized for display and report rows.
    pub rfq_number: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub supplier_type: SupplierType,
    pub msme_status: String,
    pub currency: String,
    pub status: ReplyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rfq::Entity",
        from = "Column::RfqId",
        to = "super::rfq::Column::Id"
    )]
    Rfq,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::reply_revision::Entity")]
    ReplyRevisions,
}

impl Related<super::rfq::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rfq.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::reply_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReplyRevisions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_reply_can_be_requoted_or_decided() {
        assert!(ReplyStatus::Submitted.can_transition_to(ReplyStatus::RequoteSubmitted));
        assert!(ReplyStatus::Submitted.can_transition_to(ReplyStatus::Accepted));
        assert!(ReplyStatus::Submitted.can_transition_to(ReplyStatus::Rejected));
    }

    #[test]
    fn repeated_requotes_are_allowed() {
        assert!(ReplyStatus::RequoteSubmitted.can_transition_to(ReplyStatus::RequoteSubmitted));
    }

    #[test]
    fn decisions_are_terminal() {
        assert!(!ReplyStatus::Accepted.can_transition_to(ReplyStatus::Submitted));
        assert!(!ReplyStatus::Rejected.can_transition_to(ReplyStatus::RequoteSubmitted));
    }
}
