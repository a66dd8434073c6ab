use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::building;

/// Derived per-building, per-month financial snapshot written by the
/// dashboard aggregator. Strictly a cache: recomputed from the ledgers and
/// upserted on the (building_id, year, month) unique key, never hand-edited
/// and never read back into the aggregation itself.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monthly_balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub building_id: i32,
    pub year: i32,
    pub month: i32,
    /// Net balance carried from prior periods (credit minus debt).
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub carry_forward: Decimal,
    /// Sum of apartment debts carried from prior periods.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub previous_obligations: Decimal,
    /// Sum of the period's allocated shares.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub current_obligations: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub payments_received: Decimal,
    /// previous + current - payments_received.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_obligations: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "building::Entity",
        from = "Column::BuildingId",
        to = "building::Column::Id",
        on_delete = "Cascade"
    )]
    Building,
}

impl Related<building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
