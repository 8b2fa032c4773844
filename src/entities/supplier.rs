use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Commercial classification of a supplier.
///
/// OEM suppliers quote a flat unit rate; regular suppliers quote a cost
/// breakdown (material, process, overheads, packing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SupplierType {
    #[sea_orm(string_value = "regular")]
    #[serde(rename = "Regular")]
    Regular,
    #[sea_orm(string_value = "oem")]
    #[serde(rename = "OEM")]
    Oem,
}

impl SupplierType {
    pub fn label(self) -> &'static str {
        match self {
            SupplierType::Regular => "Regular",
            SupplierType::Oem => "OEM",
        }
    }
}

/// Supplier profile mirroring the identity-provider account.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Identity-provider account id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub vendor_id: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub supplier_type: SupplierType,
    /// "MSME" or "Not MSME"; drives default payment terms on quotes.
    pub msme_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rfq_invitation::Entity")]
    RfqInvitations,
    #[sea_orm(has_many = "super::supplier_reply::Entity")]
    SupplierReplies,
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
