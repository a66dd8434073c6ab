use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A managed residential building. Owns apartments, expenses and the
/// per-month balance snapshots derived from them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    /// Basis the apartments' participation mills are expected to sum to.
    /// Conventionally 1000 (per-mille ownership shares).
    #[sea_orm(default_value = "1000")]
    pub mills_basis: i32,
    /// Savings target for the reserve fund, if one is being collected.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub reserve_fund_goal: Option<Decimal>,
    /// Number of months the reserve fund is collected over.
    pub reserve_fund_months: Option<i32>,
    pub reserve_fund_start: Option<NaiveDate>,
    /// Flat management fee charged per apartment per month.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub management_fee_per_apartment: Option<Decimal>,
    /// First date the financial ledgers are considered authoritative.
    pub financial_start: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::apartment::Entity")]
    Apartment,
    #[sea_orm(has_many = "super::expense::Entity")]
    Expense,
    #[sea_orm(has_many = "super::recurring_expense::Entity")]
    RecurringExpense,
    #[sea_orm(has_many = "super::monthly_balance::Entity")]
    MonthlyBalance,
}

impl Related<super::apartment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Apartment.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl Related<super::recurring_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringExpense.def()
    }
}

impl Related<super::monthly_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MonthlyBalance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
