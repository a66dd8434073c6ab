//! Shared helpers for compute tests: in-memory model builders and a seeded
//! sqlite database.

use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use model::entities::expense::{DistributionType, ExpenseCategory, PayerResponsibility};
use model::entities::payment::{PaymentMethod, PayerType};
use model::entities::{apartment, building, expense, payment};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::str::FromStr;

/// Builds an apartment model without touching a database.
pub fn test_apartment(id: i32, participation_mills: Option<i32>) -> apartment::Model {
    apartment::Model {
        id,
        building_id: 1,
        number: format!("A{}", id),
        owner_name: format!("Owner {}", id),
        tenant_name: None,
        participation_mills,
        heating_mills: None,
        current_balance: Decimal::ZERO,
        previous_balance: Decimal::ZERO,
    }
}

/// Builds an expense model without touching a database.
pub fn test_expense(id: i32, amount: &str, distribution_type: DistributionType) -> expense::Model {
    expense::Model {
        id,
        building_id: 1,
        title: format!("Expense {}", id),
        amount: Decimal::from_str(amount).unwrap(),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        category: ExpenseCategory::General,
        distribution_type,
        payer_responsibility: PayerResponsibility::Owner,
        split_ratio: None,
        project_ref: None,
        audit_trail: None,
        recurring_expense_id: None,
        period_year: None,
        period_month: None,
    }
}

/// Creates an in-memory sqlite database with the schema applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Seeds a building with one apartment per entry in `mills` and returns the
/// building with its apartments in insertion order.
pub async fn seed_building(
    db: &DatabaseConnection,
    mills: &[Option<i32>],
) -> (building::Model, Vec<apartment::Model>) {
    let building = building::ActiveModel {
        name: Set("Test Building".to_string()),
        mills_basis: Set(1000),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert building");

    let mut apartments = Vec::new();
    for (i, m) in mills.iter().enumerate() {
        let apartment = apartment::ActiveModel {
            building_id: Set(building.id),
            number: Set(format!("A{}", i + 1)),
            owner_name: Set(format!("Owner {}", i + 1)),
            participation_mills: Set(*m),
            current_balance: Set(Decimal::ZERO),
            previous_balance: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to insert apartment");
        apartments.push(apartment);
    }

    (building, apartments)
}

/// Inserts a payment for the apartment on the given date.
pub async fn seed_payment(
    db: &DatabaseConnection,
    apartment_id: i32,
    amount: &str,
    date: NaiveDate,
) -> payment::Model {
    payment::ActiveModel {
        apartment_id: Set(apartment_id),
        amount: Set(Decimal::from_str(amount).unwrap()),
        date: Set(date),
        method: Set(PaymentMethod::Cash),
        payer_type: Set(PayerType::Owner),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert payment")
}

/// Inserts an expense for the building on the given date.
pub async fn seed_expense(
    db: &DatabaseConnection,
    building_id: i32,
    amount: &str,
    date: NaiveDate,
    distribution_type: DistributionType,
) -> expense::Model {
    expense::ActiveModel {
        building_id: Set(building_id),
        title: Set("Seeded expense".to_string()),
        amount: Set(Decimal::from_str(amount).unwrap()),
        date: Set(date),
        category: Set(ExpenseCategory::General),
        distribution_type: Set(distribution_type),
        payer_responsibility: Set(PayerResponsibility::Owner),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert expense")
}
