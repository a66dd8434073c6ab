use std::cmp::Reverse;
use std::collections::BTreeMap;

use common::{AllocationResult, ApartmentShare, Period};
use model::entities::expense::{DistributionType, PayerResponsibility};
use model::entities::{apartment, building, expense};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveEnum, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};
use crate::period::month_bounds;

/// Money is tracked at 2 decimal places, rounded half-up.
pub const MONEY_DP: u32 = 2;

/// Rounds a decimal to money precision using round-half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes each apartment's share of the building's expenses for a period.
///
/// Loads the apartments and the expenses dated within the month, then runs
/// the pure [`allocate_expenses`] pass. Read-only.
#[instrument(skip(db))]
pub async fn allocate_for_period(
    db: &DatabaseConnection,
    building_id: i32,
    year: i32,
    month: u32,
) -> Result<AllocationResult> {
    let building = building::Entity::find_by_id(building_id)
        .one(db)
        .await?
        .ok_or(ComputeError::BuildingNotFound(building_id))?;

    let (start, end) = month_bounds(year, month)?;

    let apartments = apartment::Entity::find()
        .filter(apartment::Column::BuildingId.eq(building.id))
        .order_by_asc(apartment::Column::Id)
        .all(db)
        .await?;

    let expenses = expense::Entity::find()
        .filter(
            Condition::all()
                .add(expense::Column::BuildingId.eq(building.id))
                .add(expense::Column::Date.gte(start))
                .add(expense::Column::Date.lte(end)),
        )
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await?;

    debug!(
        "Allocating {} expenses across {} apartments for building {} period {}-{:02}",
        expenses.len(),
        apartments.len(),
        building.id,
        year,
        month
    );

    allocate_expenses(building.id, Period::new(year, month), &apartments, &expenses)
}

/// Pure allocation pass: distributes each expense across the apartments and
/// folds the results into per-apartment share records.
///
/// Invariant: the sum of the returned shares equals the sum of the rounded
/// expense amounts exactly; rounding residuals are settled per expense (see
/// [`settle_residual`]).
pub fn allocate_expenses(
    building_id: i32,
    period: Period,
    apartments: &[apartment::Model],
    expenses: &[expense::Model],
) -> Result<AllocationResult> {
    let mut shares: BTreeMap<i32, ApartmentShare> = apartments
        .iter()
        .map(|a| {
            (
                a.id,
                ApartmentShare::new(a.id, a.number.clone(), a.participation_mills),
            )
        })
        .collect();

    let mut total = Decimal::ZERO;
    for exp in expenses {
        let parts = distribute(exp, apartments)?;
        let category = exp.category.to_value();
        for (apt, part) in parts {
            let (owner, tenant) = split_by_responsibility(exp, apt, part);
            if let Some(entry) = shares.get_mut(&apt.id) {
                entry.amount += part;
                entry.owner_amount += owner;
                entry.tenant_amount += tenant;
                *entry
                    .by_category
                    .entry(category.clone())
                    .or_insert(Decimal::ZERO) += part;
                total += part;
            }
        }
    }

    Ok(AllocationResult {
        building_id,
        period,
        expense_count: expenses.len(),
        total,
        shares: shares.into_values().collect(),
    })
}

/// Distributes one expense across the apartments by its distribution type.
///
/// Equal-share includes every apartment; mills-weighted distribution skips
/// apartments with null mills. An empty participant set or a zero mills sum
/// is a data-integrity error, never a division by zero.
fn distribute<'a>(
    exp: &expense::Model,
    apartments: &'a [apartment::Model],
) -> Result<Vec<(&'a apartment::Model, Decimal)>> {
    let amount = round_money(exp.amount);
    match exp.distribution_type {
        DistributionType::EqualShare => {
            if apartments.is_empty() {
                return Err(ComputeError::DataIntegrity(format!(
                    "expense {} cannot be split: building {} has no apartments",
                    exp.id, exp.building_id
                )));
            }
            let per = round_money(amount / Decimal::from(apartments.len() as i64));
            let mut parts: Vec<(&apartment::Model, Decimal)> =
                apartments.iter().map(|a| (a, per)).collect();
            settle_residual(amount, &mut parts);
            Ok(parts)
        }
        DistributionType::ByMills => {
            distribute_by_mills(exp, amount, apartments, |a| a.participation_mills)
        }
        DistributionType::ByHeatingMills => {
            distribute_by_mills(exp, amount, apartments, |a| a.heating_mills)
        }
    }
}

fn distribute_by_mills<'a>(
    exp: &expense::Model,
    amount: Decimal,
    apartments: &'a [apartment::Model],
    mills_of: impl Fn(&apartment::Model) -> Option<i32>,
) -> Result<Vec<(&'a apartment::Model, Decimal)>> {
    let participants: Vec<(&apartment::Model, i32)> = apartments
        .iter()
        .filter_map(|a| mills_of(a).map(|m| (a, m)))
        .collect();

    let mills_total: i64 = participants.iter().map(|(_, m)| i64::from(*m)).sum();
    if participants.is_empty() || mills_total <= 0 {
        return Err(ComputeError::DataIntegrity(format!(
            "expense {} cannot be distributed: building {} mills sum to {}",
            exp.id, exp.building_id, mills_total
        )));
    }

    let basis = Decimal::from(mills_total);
    let mut parts: Vec<(&apartment::Model, Decimal)> = participants
        .into_iter()
        .map(|(a, m)| (a, round_money(amount * Decimal::from(m) / basis)))
        .collect();
    settle_residual(amount, &mut parts);
    Ok(parts)
}

/// Assigns the cents left over from per-share rounding so the shares sum
/// back to the expense amount exactly. The residual goes to the
/// largest-mills participant; ties break toward the lowest apartment id.
fn settle_residual(amount: Decimal, parts: &mut [(&apartment::Model, Decimal)]) {
    let allocated: Decimal = parts.iter().map(|(_, v)| *v).sum();
    let residual = amount - allocated;
    if residual.is_zero() {
        return;
    }
    if let Some(slot) = parts
        .iter_mut()
        .max_by_key(|(a, _)| (a.participation_mills.unwrap_or(0), Reverse(a.id)))
    {
        slot.1 += residual;
    }
}

/// Splits an apartment's share between owner and tenant according to the
/// expense's payer responsibility. The tenant portion falls back to the
/// owner when the apartment has no tenant.
fn split_by_responsibility(
    exp: &expense::Model,
    apartment: &apartment::Model,
    share: Decimal,
) -> (Decimal, Decimal) {
    match exp.payer_responsibility {
        PayerResponsibility::Owner => (share, Decimal::ZERO),
        PayerResponsibility::Tenant => {
            if apartment.tenant_name.is_some() {
                (Decimal::ZERO, share)
            } else {
                (share, Decimal::ZERO)
            }
        }
        PayerResponsibility::Split => {
            if apartment.tenant_name.is_none() {
                return (share, Decimal::ZERO);
            }
            // split_ratio is the owner fraction; unset means 50/50
            let ratio = exp.split_ratio.unwrap_or_else(|| Decimal::new(5, 1));
            let owner = round_money(share * ratio);
            (owner, share - owner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_apartment, test_expense};
    use model::entities::expense::{DistributionType, ExpenseCategory, PayerResponsibility};

    fn share_of(result: &AllocationResult, apartment_id: i32) -> Decimal {
        result
            .shares
            .iter()
            .find(|s| s.apartment_id == apartment_id)
            .map(|s| s.amount)
            .unwrap()
    }

    #[test]
    fn test_by_mills_500_300_200() {
        let apartments = vec![
            test_apartment(1, Some(500)),
            test_apartment(2, Some(300)),
            test_apartment(3, Some(200)),
        ];
        let expenses = vec![test_expense(1, "100.00", DistributionType::ByMills)];

        let result =
            allocate_expenses(1, Period::new(2024, 1), &apartments, &expenses).unwrap();

        assert_eq!(share_of(&result, 1), Decimal::new(5000, 2));
        assert_eq!(share_of(&result, 2), Decimal::new(3000, 2));
        assert_eq!(share_of(&result, 3), Decimal::new(2000, 2));
        assert_eq!(result.total, Decimal::new(10000, 2));
    }

    #[test]
    fn test_equal_share_remainder_goes_to_largest_mills() {
        let apartments = vec![
            test_apartment(1, Some(200)),
            test_apartment(2, Some(500)),
            test_apartment(3, Some(300)),
        ];
        let expenses = vec![test_expense(1, "100.00", DistributionType::EqualShare)];

        let result =
            allocate_expenses(1, Period::new(2024, 1), &apartments, &expenses).unwrap();

        // 100.00 / 3 rounds to 33.33; the leftover cent lands on apartment 2.
        assert_eq!(share_of(&result, 1), Decimal::new(3333, 2));
        assert_eq!(share_of(&result, 2), Decimal::new(3334, 2));
        assert_eq!(share_of(&result, 3), Decimal::new(3333, 2));
        assert_eq!(result.share_sum(), Decimal::new(10000, 2));
    }

    #[test]
    fn test_by_mills_residual_tie_breaks_to_lowest_id() {
        let apartments = vec![
            test_apartment(1, Some(1)),
            test_apartment(2, Some(1)),
            test_apartment(3, Some(1)),
        ];
        let expenses = vec![test_expense(1, "1.00", DistributionType::ByMills)];

        let result =
            allocate_expenses(1, Period::new(2024, 1), &apartments, &expenses).unwrap();

        assert_eq!(share_of(&result, 1), Decimal::new(34, 2));
        assert_eq!(share_of(&result, 2), Decimal::new(33, 2));
        assert_eq!(share_of(&result, 3), Decimal::new(33, 2));
        assert_eq!(result.share_sum(), Decimal::new(100, 2));
    }

    #[test]
    fn test_zero_mills_is_data_integrity_error() {
        let apartments = vec![test_apartment(1, Some(0)), test_apartment(2, Some(0))];
        let expenses = vec![test_expense(1, "50.00", DistributionType::ByMills)];

        let err = allocate_expenses(1, Period::new(2024, 1), &apartments, &expenses).unwrap_err();
        assert!(matches!(err, ComputeError::DataIntegrity(_)));
    }

    #[test]
    fn test_no_apartments_is_data_integrity_error() {
        let expenses = vec![test_expense(1, "50.00", DistributionType::EqualShare)];
        let err = allocate_expenses(1, Period::new(2024, 1), &[], &expenses).unwrap_err();
        assert!(matches!(err, ComputeError::DataIntegrity(_)));
    }

    #[test]
    fn test_null_mills_excluded_from_mills_but_included_in_equal_share() {
        let apartments = vec![
            test_apartment(1, Some(600)),
            test_apartment(2, Some(400)),
            test_apartment(3, None),
        ];
        let by_mills = vec![test_expense(1, "100.00", DistributionType::ByMills)];
        let equal = vec![test_expense(2, "90.00", DistributionType::EqualShare)];

        let result =
            allocate_expenses(1, Period::new(2024, 1), &apartments, &by_mills).unwrap();
        assert_eq!(share_of(&result, 1), Decimal::new(6000, 2));
        assert_eq!(share_of(&result, 2), Decimal::new(4000, 2));
        assert_eq!(share_of(&result, 3), Decimal::ZERO);

        let result = allocate_expenses(1, Period::new(2024, 1), &apartments, &equal).unwrap();
        assert_eq!(share_of(&result, 3), Decimal::new(3000, 2));
    }

    #[test]
    fn test_heating_mills_distribution() {
        let mut a1 = test_apartment(1, Some(500));
        a1.heating_mills = Some(700);
        let mut a2 = test_apartment(2, Some(500));
        a2.heating_mills = Some(300);
        let apartments = vec![a1, a2];

        let mut exp = test_expense(1, "200.00", DistributionType::ByHeatingMills);
        exp.category = ExpenseCategory::Heating;

        let result =
            allocate_expenses(1, Period::new(2024, 1), &apartments, &[exp]).unwrap();
        assert_eq!(share_of(&result, 1), Decimal::new(14000, 2));
        assert_eq!(share_of(&result, 2), Decimal::new(6000, 2));
    }

    #[test]
    fn test_owner_responsibility_all_to_owner() {
        let mut apt = test_apartment(1, Some(1000));
        apt.tenant_name = Some("Tenant".to_string());
        let mut exp = test_expense(1, "80.00", DistributionType::ByMills);
        exp.payer_responsibility = PayerResponsibility::Owner;

        let result =
            allocate_expenses(1, Period::new(2024, 1), &[apt], &[exp]).unwrap();
        let share = &result.shares[0];
        assert_eq!(share.owner_amount, Decimal::new(8000, 2));
        assert_eq!(share.tenant_amount, Decimal::ZERO);
    }

    #[test]
    fn test_split_responsibility_default_50_50() {
        let mut apt = test_apartment(1, Some(1000));
        apt.tenant_name = Some("Tenant".to_string());
        let mut exp = test_expense(1, "75.01", DistributionType::ByMills);
        exp.payer_responsibility = PayerResponsibility::Split;

        let result =
            allocate_expenses(1, Period::new(2024, 1), &[apt], &[exp]).unwrap();
        let share = &result.shares[0];
        // 75.01 * 0.5 = 37.505 rounds half-up to 37.51 for the owner
        assert_eq!(share.owner_amount, Decimal::new(3751, 2));
        assert_eq!(share.tenant_amount, Decimal::new(3750, 2));
        assert_eq!(share.owner_amount + share.tenant_amount, share.amount);
    }

    #[test]
    fn test_split_with_explicit_ratio() {
        let mut apt = test_apartment(1, Some(1000));
        apt.tenant_name = Some("Tenant".to_string());
        let mut exp = test_expense(1, "100.00", DistributionType::ByMills);
        exp.payer_responsibility = PayerResponsibility::Split;
        exp.split_ratio = Some(Decimal::new(7, 1)); // owner pays 70%

        let result =
            allocate_expenses(1, Period::new(2024, 1), &[apt], &[exp]).unwrap();
        let share = &result.shares[0];
        assert_eq!(share.owner_amount, Decimal::new(7000, 2));
        assert_eq!(share.tenant_amount, Decimal::new(3000, 2));
    }

    #[test]
    fn test_tenant_portion_falls_back_to_owner_without_tenant() {
        let apt = test_apartment(1, Some(1000)); // no tenant
        let mut exp = test_expense(1, "60.00", DistributionType::ByMills);
        exp.payer_responsibility = PayerResponsibility::Tenant;

        let result =
            allocate_expenses(1, Period::new(2024, 1), &[apt], &[exp]).unwrap();
        let share = &result.shares[0];
        assert_eq!(share.owner_amount, Decimal::new(6000, 2));
        assert_eq!(share.tenant_amount, Decimal::ZERO);
    }

    #[test]
    fn test_category_breakdown_accumulates() {
        let apartments = vec![test_apartment(1, Some(1000))];
        let mut heating = test_expense(1, "40.00", DistributionType::ByMills);
        heating.category = ExpenseCategory::Heating;
        let mut elevator = test_expense(2, "10.00", DistributionType::ByMills);
        elevator.category = ExpenseCategory::Elevator;
        let mut heating2 = test_expense(3, "5.00", DistributionType::ByMills);
        heating2.category = ExpenseCategory::Heating;

        let result = allocate_expenses(
            1,
            Period::new(2024, 1),
            &apartments,
            &[heating, elevator, heating2],
        )
        .unwrap();
        let share = &result.shares[0];
        assert_eq!(share.by_category["Heating"], Decimal::new(4500, 2));
        assert_eq!(share.by_category["Elevator"], Decimal::new(1000, 2));
        assert_eq!(share.amount, Decimal::new(5500, 2));
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2)); // 12.345 -> 12.35
        assert_eq!(round_money(Decimal::new(12344, 3)), Decimal::new(1234, 2)); // 12.344 -> 12.34
    }

    #[tokio::test]
    async fn test_allocate_for_period_filters_by_date() {
        use crate::testing::{seed_building, seed_expense, setup_test_db};
        use chrono::NaiveDate;

        let db = setup_test_db().await;
        let (building, apartments) = seed_building(&db, &[Some(600), Some(400)]).await;

        let in_period = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let out_of_period = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        seed_expense(&db, building.id, "100.00", in_period, DistributionType::ByMills).await;
        seed_expense(&db, building.id, "999.00", out_of_period, DistributionType::ByMills).await;

        let result = allocate_for_period(&db, building.id, 2024, 3).await.unwrap();
        assert_eq!(result.expense_count, 1);
        assert_eq!(result.total, Decimal::new(10000, 2));
        assert_eq!(share_of(&result, apartments[0].id), Decimal::new(6000, 2));
    }

    #[tokio::test]
    async fn test_allocate_for_missing_building_is_not_found() {
        use crate::testing::setup_test_db;

        let db = setup_test_db().await;
        let err = allocate_for_period(&db, 42, 2024, 1).await.unwrap_err();
        assert!(matches!(err, ComputeError::BuildingNotFound(42)));
    }
}
