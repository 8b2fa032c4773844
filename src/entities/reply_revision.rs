use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One entry in a reply's append-only revision log.
///
/// Revision 0 is the supplier's original submission; revisions 1..N are
/// buyer-requested re-quotes. Each revision carries the full terms snapshot
/// plus change flags computed against the immediately preceding revision.
/// Rows are never updated or deleted, which doubles as an audit history.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reply_revisions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reply_id: Uuid,
    pub revision_number: i32,
    pub payment_terms: String,
    pub delivery_terms: String,
    pub freight_terms: String,
    pub remarks: String,
    /// Terms diff vs the prior revision; all false on revision 0.
    pub payment_terms_changed: bool,
    pub delivery_terms_changed: bool,
    pub freight_terms_changed: bool,
    pub cost_breakup_url: Option<String>,
    pub drawing_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier_reply::Entity",
        from = "Column::ReplyId",
        to = "super::supplier_reply::Column::Id"
    )]
    SupplierReply,
    #[sea_orm(has_many = "super::revision_part::Entity")]
    RevisionParts,
}

impl Related<super::supplier_reply::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplierReply.def()
    }
}

impl Related<super::revision_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RevisionParts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
