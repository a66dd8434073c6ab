use chrono::NaiveDate;
use common::GenerationOutcome;
use model::entities::{building, expense, recurring_expense};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument};

use crate::error::{ComputeError, Result};
use crate::period::{days_in_month, month_bounds};

/// Materializes the building's active recurring templates into expense rows
/// for one period.
///
/// Each generated row carries the (template, year, month) triple; the unique
/// index on the triple makes a rerun for the same period a logged no-op, so
/// the periodic job needs no coordination.
#[instrument(skip(db))]
pub async fn generate_for_period(
    db: &DatabaseConnection,
    building_id: i32,
    year: i32,
    month: u32,
) -> Result<GenerationOutcome> {
    let building = building::Entity::find_by_id(building_id)
        .one(db)
        .await?
        .ok_or(ComputeError::BuildingNotFound(building_id))?;

    let (start, end) = month_bounds(year, month)?;

    let templates = recurring_expense::Entity::find()
        .filter(recurring_expense::Column::BuildingId.eq(building.id))
        .filter(recurring_expense::Column::Active.eq(true))
        .filter(recurring_expense::Column::StartDate.lte(end))
        .filter(
            Condition::any()
                .add(recurring_expense::Column::EndDate.is_null())
                .add(recurring_expense::Column::EndDate.gte(start)),
        )
        .order_by_asc(recurring_expense::Column::Id)
        .all(db)
        .await?;

    debug!(
        "Generating expenses for building {} period {}-{:02}: {} active template(s)",
        building.id,
        year,
        month,
        templates.len()
    );

    let mut created = 0;
    let mut skipped = 0;
    for template in templates {
        let day = template.day_of_month.clamp(1, days_in_month(year, month)? as i32) as u32;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ComputeError::Date(format!("invalid date {}-{}-{}", year, month, day)))?;

        let audit = serde_json::json!({
            "source": "recurring",
            "recurring_expense_id": template.id,
            "period": format!("{:04}-{:02}", year, month),
        });

        let row = expense::ActiveModel {
            building_id: Set(building.id),
            title: Set(template.title.clone()),
            amount: Set(template.amount),
            date: Set(date),
            category: Set(template.category),
            distribution_type: Set(template.distribution_type),
            payer_responsibility: Set(template.payer_responsibility),
            split_ratio: Set(template.split_ratio),
            audit_trail: Set(Some(audit)),
            recurring_expense_id: Set(Some(template.id)),
            period_year: Set(Some(year)),
            period_month: Set(Some(month as i32)),
            ..Default::default()
        };

        let insert = expense::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    expense::Column::RecurringExpenseId,
                    expense::Column::PeriodYear,
                    expense::Column::PeriodMonth,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(db)
            .await;

        match insert {
            Ok(_) => created += 1,
            Err(DbErr::RecordNotInserted) => {
                info!(
                    "Expense for template {} period {}-{:02} already exists, skipping",
                    template.id, year, month
                );
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(GenerationOutcome {
        building_id: building.id,
        created,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_building, setup_test_db};
    use model::entities::expense::{DistributionType, ExpenseCategory, PayerResponsibility};
    use rust_decimal::Decimal;
    use sea_orm::ActiveModelTrait;
    use std::str::FromStr;

    async fn seed_template(
        db: &DatabaseConnection,
        building_id: i32,
        day_of_month: i32,
        start: NaiveDate,
        end: Option<NaiveDate>,
        active: bool,
    ) -> recurring_expense::Model {
        recurring_expense::ActiveModel {
            building_id: Set(building_id),
            title: Set("Cleaning".to_string()),
            amount: Set(Decimal::from_str("45.00").unwrap()),
            category: Set(ExpenseCategory::Cleaning),
            distribution_type: Set(DistributionType::ByMills),
            payer_responsibility: Set(PayerResponsibility::Tenant),
            day_of_month: Set(day_of_month),
            start_date: Set(start),
            end_date: Set(end),
            active: Set(active),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_generation_creates_expense_rows() {
        let db = setup_test_db().await;
        let (building, _) = seed_building(&db, &[Some(1000)]).await;
        let template = seed_template(
            &db,
            building.id,
            5,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            true,
        )
        .await;

        let outcome = generate_for_period(&db, building.id, 2024, 3).await.unwrap();
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 0);

        let rows = expense::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(rows[0].recurring_expense_id, Some(template.id));
        assert_eq!(rows[0].period_year, Some(2024));
        assert_eq!(rows[0].period_month, Some(3));
    }

    #[tokio::test]
    async fn test_generation_is_idempotent() {
        let db = setup_test_db().await;
        let (building, _) = seed_building(&db, &[Some(1000)]).await;
        seed_template(
            &db,
            building.id,
            1,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            true,
        )
        .await;

        let first = generate_for_period(&db, building.id, 2024, 2).await.unwrap();
        assert_eq!(first.created, 1);

        let second = generate_for_period(&db, building.id, 2024, 2).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 1);

        let rows = expense::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_day_of_month_clamped_to_month_length() {
        let db = setup_test_db().await;
        let (building, _) = seed_building(&db, &[Some(1000)]).await;
        seed_template(
            &db,
            building.id,
            31,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            true,
        )
        .await;

        generate_for_period(&db, building.id, 2024, 2).await.unwrap();

        let rows = expense::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[tokio::test]
    async fn test_inactive_and_out_of_window_templates_skipped() {
        let db = setup_test_db().await;
        let (building, _) = seed_building(&db, &[Some(1000)]).await;

        // Inactive template.
        seed_template(
            &db,
            building.id,
            1,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            false,
        )
        .await;
        // Template whose window ended before the period.
        seed_template(
            &db,
            building.id,
            1,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            Some(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()),
            true,
        )
        .await;
        // Template starting after the period.
        seed_template(
            &db,
            building.id,
            1,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            None,
            true,
        )
        .await;

        let outcome = generate_for_period(&db, building.id, 2024, 2).await.unwrap();
        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.skipped, 0);
        assert!(expense::Entity::find().all(&db).await.unwrap().is_empty());
    }
}
