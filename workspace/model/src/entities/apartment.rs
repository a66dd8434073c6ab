use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::building;

/// An apartment within a building, carrying the per-mille ownership shares
/// used to weight common-expense allocation.
///
/// Participation mills for a building's apartments are expected to sum to the
/// building's `mills_basis` (1000). Null mills means the apartment takes no
/// part in mills-weighted distribution but still shares equal-split costs.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "apartments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub building_id: i32,
    /// Door number or label, unique within the building.
    pub number: String,
    pub owner_name: String,
    /// Resident tenant, if different from the owner.
    pub tenant_name: Option<String>,
    /// Ownership share in mills (0..=1000).
    pub participation_mills: Option<i32>,
    /// Separate mills basis for heating costs.
    pub heating_mills: Option<i32>,
    /// Running balance, maintained as payments are recorded.
    /// Positive means credit, negative means owed.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", default_value = "0")]
    pub current_balance: Decimal,
    /// Balance snapshot taken when the apartment entered the system.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", default_value = "0")]
    pub previous_balance: Decimal,
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
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
