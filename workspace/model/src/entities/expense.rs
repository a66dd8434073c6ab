use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{building, recurring_expense};

/// How an expense is split across the building's apartments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DistributionType {
    /// Every apartment owes the same share.
    #[sea_orm(string_value = "EqualShare")]
    EqualShare,
    /// Shares weighted by participation mills.
    #[sea_orm(string_value = "ByMills")]
    ByMills,
    /// Shares weighted by heating mills.
    #[sea_orm(string_value = "ByHeatingMills")]
    ByHeatingMills,
}

/// Who is liable for an apartment's share of the expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum PayerResponsibility {
    #[sea_orm(string_value = "Owner")]
    Owner,
    #[sea_orm(string_value = "Tenant")]
    Tenant,
    /// Split between owner and tenant by `split_ratio` (owner fraction),
    /// 50/50 when the ratio is unset.
    #[sea_orm(string_value = "Split")]
    Split,
}

/// Expense category, used for dashboard breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ExpenseCategory {
    #[sea_orm(string_value = "General")]
    General,
    #[sea_orm(string_value = "Heating")]
    Heating,
    #[sea_orm(string_value = "Elevator")]
    Elevator,
    #[sea_orm(string_value = "Cleaning")]
    Cleaning,
    #[sea_orm(string_value = "Maintenance")]
    Maintenance,
    #[sea_orm(string_value = "ReserveFund")]
    ReserveFund,
    #[sea_orm(string_value = "Management")]
    Management,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// A cost incurred by the building as a whole, distributed to apartments by
/// the chosen method at read time. Amounts are money at 2 decimal places.
///
/// Rows produced by recurring-expense generation carry the
/// (recurring_expense_id, period_year, period_month) triple; a unique index
/// on the triple makes generation idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub building_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub distribution_type: DistributionType,
    pub payer_responsibility: PayerResponsibility,
    /// Owner fraction when responsibility is Split. 0..=1.
    #[sea_orm(column_type = "Decimal(Some((5, 4)))", nullable)]
    pub split_ratio: Option<Decimal>,
    /// Free-form reference to a maintenance project or external record.
    pub project_ref: Option<String>,
    /// Provenance of the row (who created it, generation metadata).
    #[sea_orm(column_type = "Json", nullable)]
    pub audit_trail: Option<Json>,
    /// Set when this row was generated from a recurring template.
    pub recurring_expense_id: Option<i32>,
    pub period_year: Option<i32>,
    pub period_month: Option<i32>,
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
    #[sea_orm(
        belongs_to = "recurring_expense::Entity",
        from = "Column::RecurringExpenseId",
        to = "recurring_expense::Column::Id",
        on_delete = "SetNull"
    )]
    RecurringExpense,
}

impl Related<building::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<recurring_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
