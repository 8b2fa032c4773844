use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::rfq_part::OrderType;

/// Full cost snapshot for one part in one reply revision.
///
/// Change flags compare this snapshot to the same part (matched by
/// `part_no`) in the preceding revision; all false on revision 0 or when the
/// part did not appear before.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "revision_parts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub revision_id: Uuid,
    pub part_no: String,
    pub part_description: String,
    pub quantity: i32,
    pub order_type: OrderType,
    /// OEM suppliers enter this directly; for regular suppliers it is the sum
    /// of the cost breakdown.
    pub unit_rate: Decimal,
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
    pub total_cost: Decimal,
    pub unit_rate_changed: bool,
    pub material_cost_changed: bool,
    pub process_cost_changed: bool,
    pub overhead_cost_changed: bool,
    pub packing_cost_changed: bool,
    pub lead_time_changed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reply_revision::Entity",
        from = "Column::RevisionId",
        to = "super::reply_revision::Column::Id"
    )]
    ReplyRevision,
}

impl Related<super::reply_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReplyRevision.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Human-readable summary of the change flags, as shown in the quotes
    /// export ("Price, Material, Lead Time").
    pub fn changes_summary(&self) -> String {
        let mut changes = Vec::new();
        if self.unit_rate_changed {
            changes.push("Price");
        }
        if self.material_cost_changed {
            changes.push("Material");
        }
        if self.process_cost_changed {
            changes.push("Process");
        }
        if self.overhead_cost_changed {
            changes.push("Overhead");
        }
        if self.packing_cost_changed {
            changes.push("Packing");
        }
        if self.lead_time_changed {
            changes.push("Lead Time");
        }
        if changes.is_empty() {
            "N/A".to_string()
        } else {
            changes.join(", ")
        }
    }
}
