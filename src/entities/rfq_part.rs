use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How the buyer intends to order the part.
///
/// Wire names match the portal's established vocabulary (`oneTime`,
/// `annual`, `proto-sample`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum OrderType {
    #[sea_orm(string_value = "one_time")]
    #[serde(rename = "oneTime")]
    OneTime,
    #[sea_orm(string_value = "annual")]
    #[serde(rename = "annual")]
    Annual,
    #[sea_orm(string_value = "proto_sample")]
    #[serde(rename = "proto-sample")]
    ProtoSample,
}

impl OrderType {
    pub fn label(self) -> &'static str {
        match self {
            OrderType::OneTime => "oneTime",
            OrderType::Annual => "annual",
            OrderType::ProtoSample => "proto-sample",
        }
    }
}

/// One line item on an RFQ parts list.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rfq_parts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub part_no: String,
    pub part_description: String,
    pub draw_revision: String,
    pub order_type: OrderType,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rfq::Entity",
        from = "Column::RfqId",
        to = "super::rfq::Column::Id"
    )]
    Rfq,
}

impl Related<super::rfq::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rfq.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
