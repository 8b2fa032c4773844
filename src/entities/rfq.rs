use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an RFQ.
///
/// Transitions are validated through [`RfqStatus::can_transition_to`]; no other
/// code path may flip the column. `Completed` is part of the portal's status
/// vocabulary but no flow currently drives an RFQ there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl RfqStatus {
    /// Explicit transition table. Same-status transitions are no-ops.
    pub fn can_transition_to(self, next: RfqStatus) -> bool {
        matches!(
            (self, next),
            (RfqStatus::Pending, RfqStatus::Expired) | (RfqStatus::Pending, RfqStatus::Completed)
        ) || self == next
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RfqStatus::Pending => "pending",
            RfqStatus::Expired => "expired",
            RfqStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rfqs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rfq_number: String,
    /// Sequence issued by the monthly counter; kept for audit.
    pub sequence: i32,
    pub project_name: String,
    /// Supplier submission deadline.
    pub submission_date: DateTime<Utc>,
    pub status: RfqStatus,
    pub created_by: Uuid,
    pub comments: String,
    pub drawing_file_name: Option<String>,
    /// True once any supplier has been asked to re-quote.
    pub requote_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rfq_part::Entity")]
    RfqParts,
    #[sea_orm(has_many = "super::rfq_invitation::Entity")]
    RfqInvitations,
    #[sea_orm(has_many = "super::supplier_reply::Entity")]
    SupplierReplies,
}

impl Related<super::rfq_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RfqParts.def()
    }
}

impl Related<super::rfq_invitation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RfqInvitations.def()
    }
}

impl Related<super::supplier_reply::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierReplies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_expire_or_complete() {
        assert!(RfqStatus::Pending.can_transition_to(RfqStatus::Expired));
        assert!(RfqStatus::Pending.can_transition_to(RfqStatus::Completed));
    }

    #[test]
    fn expired_is_terminal() {
        assert!(!RfqStatus::Expired.can_transition_to(RfqStatus::Pending));
        assert!(!RfqStatus::Expired.can_transition_to(RfqStatus::Completed));
    }

    #[test]
    fn same_status_is_a_noop() {
        assert!(RfqStatus::Expired.can_transition_to(RfqStatus::Expired));
        assert!(RfqStatus::Pending.can_transition_to(RfqStatus::Pending));
    }
}
