use std::collections::HashMap;

use common::{ApartmentBalance, MonthlyDashboard, Period};
use model::entities::{apartment, building, expense, monthly_balance, payment};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, instrument};

use crate::allocation::allocate_expenses;
use crate::error::{ComputeError, Result};
use crate::period::month_bounds;

/// Builds the per-building monthly summary and refreshes its cached
/// MonthlyBalance row.
///
/// Prior-period obligations are recomputed live from the expense and payment
/// ledgers; the stored snapshot is write-only from this aggregator's point
/// of view. The building-level figures are sums over the apartment rows, so
/// the two views reconcile exactly.
#[instrument(skip(db))]
pub async fn build_dashboard(
    db: &DatabaseConnection,
    building_id: i32,
    year: i32,
    month: u32,
) -> Result<MonthlyDashboard> {
    let building = building::Entity::find_by_id(building_id)
        .one(db)
        .await?
        .ok_or(ComputeError::BuildingNotFound(building_id))?;

    let (start, end) = month_bounds(year, month)?;
    let period = Period::new(year, month);

    let apartments = apartment::Entity::find()
        .filter(apartment::Column::BuildingId.eq(building.id))
        .order_by_asc(apartment::Column::Id)
        .all(db)
        .await?;

    let current_expenses = expense::Entity::find()
        .filter(
            Condition::all()
                .add(expense::Column::BuildingId.eq(building.id))
                .add(expense::Column::Date.gte(start))
                .add(expense::Column::Date.lte(end)),
        )
        .all(db)
        .await?;
    let prior_expenses = expense::Entity::find()
        .filter(
            Condition::all()
                .add(expense::Column::BuildingId.eq(building.id))
                .add(expense::Column::Date.lt(start)),
        )
        .all(db)
        .await?;

    let current = allocate_expenses(building.id, period, &apartments, &current_expenses)?;
    let prior = allocate_expenses(building.id, period, &apartments, &prior_expenses)?;

    let apartment_ids: Vec<i32> = apartments.iter().map(|a| a.id).collect();
    let payments = payment::Entity::find()
        .filter(payment::Column::ApartmentId.is_in(apartment_ids))
        .filter(payment::Column::Date.lte(end))
        .all(db)
        .await?;

    let mut paid_before: HashMap<i32, Decimal> = HashMap::new();
    let mut paid_in_period: HashMap<i32, Decimal> = HashMap::new();
    for p in &payments {
        if p.date < start {
            *paid_before.entry(p.apartment_id).or_insert(Decimal::ZERO) += p.amount;
        } else {
            *paid_in_period.entry(p.apartment_id).or_insert(Decimal::ZERO) += p.amount;
        }
    }

    let share_for = |result: &common::AllocationResult, apartment_id: i32| {
        result
            .shares
            .iter()
            .find(|s| s.apartment_id == apartment_id)
            .map(|s| s.amount)
            .unwrap_or(Decimal::ZERO)
    };

    let mut rows = Vec::with_capacity(apartments.len());
    let mut carry_forward = Decimal::ZERO;
    let mut previous_obligations = Decimal::ZERO;
    let mut current_obligations = Decimal::ZERO;
    let mut payments_received = Decimal::ZERO;

    for apt in &apartments {
        let owed_before = share_for(&prior, apt.id);
        let paid_prior = paid_before.get(&apt.id).copied().unwrap_or(Decimal::ZERO);
        // Signed net carried balance; only the debt side counts as an
        // outstanding obligation.
        let prior_net = paid_prior - owed_before;
        let previous_debt = if prior_net < Decimal::ZERO {
            -prior_net
        } else {
            Decimal::ZERO
        };

        let current_obligation = share_for(&current, apt.id);
        let paid = paid_in_period.get(&apt.id).copied().unwrap_or(Decimal::ZERO);
        let balance_due = previous_debt + current_obligation - paid;

        carry_forward += prior_net;
        previous_obligations += previous_debt;
        current_obligations += current_obligation;
        payments_received += paid;

        rows.push(ApartmentBalance {
            apartment_id: apt.id,
            apartment_number: apt.number.clone(),
            previous_debt,
            current_obligation,
            payments: paid,
            balance_due,
        });
    }

    let total_obligations = previous_obligations + current_obligations - payments_received;

    let dashboard = MonthlyDashboard {
        building_id: building.id,
        period,
        carry_forward,
        previous_obligations,
        current_obligations,
        payments_received,
        total_obligations,
        apartments: rows,
    };

    debug!(
        "Dashboard for building {} period {}: previous={} current={} payments={} total={}",
        building.id,
        period,
        dashboard.previous_obligations,
        dashboard.current_obligations,
        dashboard.payments_received,
        dashboard.total_obligations
    );

    upsert_snapshot(db, &dashboard).await?;

    Ok(dashboard)
}

/// Writes the derived MonthlyBalance row for the dashboard's period.
/// Idempotent upsert keyed on (building_id, year, month).
async fn upsert_snapshot(db: &DatabaseConnection, dashboard: &MonthlyDashboard) -> Result<()> {
    let snapshot = monthly_balance::ActiveModel {
        building_id: Set(dashboard.building_id),
        year: Set(dashboard.period.year),
        month: Set(dashboard.period.month as i32),
        carry_forward: Set(dashboard.carry_forward),
        previous_obligations: Set(dashboard.previous_obligations),
        current_obligations: Set(dashboard.current_obligations),
        payments_received: Set(dashboard.payments_received),
        total_obligations: Set(dashboard.total_obligations),
        ..Default::default()
    };

    monthly_balance::Entity::insert(snapshot)
        .on_conflict(
            OnConflict::columns([
                monthly_balance::Column::BuildingId,
                monthly_balance::Column::Year,
                monthly_balance::Column::Month,
            ])
            .update_columns([
                monthly_balance::Column::CarryForward,
                monthly_balance::Column::PreviousObligations,
                monthly_balance::Column::CurrentObligations,
                monthly_balance::Column::PaymentsReceived,
                monthly_balance::Column::TotalObligations,
            ])
            .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_building, seed_expense, seed_payment, setup_test_db};
    use chrono::NaiveDate;
    use model::entities::expense::DistributionType;

    #[tokio::test]
    async fn test_dashboard_reconciles_with_apartment_rows() {
        let db = setup_test_db().await;
        let (building, apartments) =
            seed_building(&db, &[Some(500), Some(300), Some(200)]).await;

        let date = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        seed_expense(&db, building.id, "100.00", date, DistributionType::ByMills).await;
        seed_payment(&db, apartments[0].id, "30.00", date).await;

        let dashboard = build_dashboard(&db, building.id, 2024, 2).await.unwrap();

        assert!(dashboard.reconciles());
        assert_eq!(dashboard.current_obligations, Decimal::new(10000, 2));
        assert_eq!(dashboard.payments_received, Decimal::new(3000, 2));
        assert_eq!(dashboard.previous_obligations, Decimal::ZERO);
        assert_eq!(dashboard.total_obligations, Decimal::new(7000, 2));
    }

    #[tokio::test]
    async fn test_previous_obligations_recomputed_from_ledger() {
        let db = setup_test_db().await;
        let (building, apartments) =
            seed_building(&db, &[Some(500), Some(300), Some(200)]).await;

        // January expense, partially paid by apartment 1 only.
        let january = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        seed_expense(&db, building.id, "100.00", january, DistributionType::ByMills).await;
        seed_payment(&db, apartments[0].id, "50.00", january).await;

        let dashboard = build_dashboard(&db, building.id, 2024, 2).await.unwrap();

        // Apartment 1 settled its 50.00; apartments 2 and 3 carry 30 + 20.
        assert_eq!(dashboard.previous_obligations, Decimal::new(5000, 2));
        assert_eq!(dashboard.current_obligations, Decimal::ZERO);
        assert_eq!(dashboard.carry_forward, Decimal::new(-5000, 2));

        let row = dashboard
            .apartments
            .iter()
            .find(|a| a.apartment_id == apartments[0].id)
            .unwrap();
        assert_eq!(row.previous_debt, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_overpayment_carries_as_credit_not_obligation() {
        let db = setup_test_db().await;
        let (building, apartments) = seed_building(&db, &[Some(1000)]).await;

        let january = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        seed_expense(&db, building.id, "40.00", january, DistributionType::ByMills).await;
        seed_payment(&db, apartments[0].id, "100.00", january).await;

        let dashboard = build_dashboard(&db, building.id, 2024, 2).await.unwrap();

        assert_eq!(dashboard.previous_obligations, Decimal::ZERO);
        assert_eq!(dashboard.carry_forward, Decimal::new(6000, 2));
    }

    #[tokio::test]
    async fn test_snapshot_upsert_is_idempotent() {
        let db = setup_test_db().await;
        let (building, _) = seed_building(&db, &[Some(600), Some(400)]).await;

        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        seed_expense(&db, building.id, "80.00", date, DistributionType::ByMills).await;

        build_dashboard(&db, building.id, 2024, 3).await.unwrap();
        // Second run must update, not duplicate, the snapshot row.
        seed_expense(&db, building.id, "20.00", date, DistributionType::ByMills).await;
        build_dashboard(&db, building.id, 2024, 3).await.unwrap();

        let snapshots = monthly_balance::Entity::find().all(&db).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].current_obligations, Decimal::new(10000, 2));
    }

    #[tokio::test]
    async fn test_missing_building_is_not_found() {
        let db = setup_test_db().await;
        let err = build_dashboard(&db, 999, 2024, 1).await.unwrap_err();
        assert!(matches!(err, ComputeError::BuildingNotFound(999)));
    }
}
