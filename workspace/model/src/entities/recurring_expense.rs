use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::building;
use super::expense::{DistributionType, ExpenseCategory, PayerResponsibility};

/// Template for an expense that recurs monthly (elevator service, cleaning,
/// management fee). Generation inserts concrete expense rows per period;
/// the unique triple on the expense table keeps generation idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub building_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub distribution_type: DistributionType,
    pub payer_responsibility: PayerResponsibility,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))", nullable)]
    pub split_ratio: Option<Decimal>,
    /// Day of month the generated expense is dated at, clamped to the
    /// month's length.
    pub day_of_month: i32,
    /// First period the template applies to.
    pub start_date: NaiveDate,
    /// Last period the template applies to. If null, it repeats indefinitely.
    pub end_date: Option<NaiveDate>,
    #[sea_orm(default_value = "true")]
    pub active: bool,
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
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
}

impl Related<building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
