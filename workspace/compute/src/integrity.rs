use std::cmp::Reverse;
use std::collections::BTreeMap;

use common::{IntegrityIssue, IntegrityReport, IssueCode};
use model::entities::{apartment, building, expense, payment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{info, instrument, warn};

use crate::error::{ComputeError, Result};

/// Largest mills deviation the auto-fix is allowed to absorb. Bigger gaps
/// point at genuinely wrong data and need manual correction.
const MAX_AUTO_FIX_MILLS: i64 = 10;

/// Verifies the financial invariants of one building and optionally applies
/// known-safe corrections.
///
/// Checks: participation mills summing to the building's basis, orphaned
/// payment rows, duplicate recurring-generated expenses. `success` reflects
/// the state as found; auto-fix is idempotent, so a second run on the same
/// data reports success with no further fixes.
#[instrument(skip(db))]
pub async fn check_building(
    db: &DatabaseConnection,
    building_id: i32,
    auto_fix: bool,
) -> Result<IntegrityReport> {
    let building = building::Entity::find_by_id(building_id)
        .one(db)
        .await?
        .ok_or(ComputeError::BuildingNotFound(building_id))?;

    let apartments = apartment::Entity::find()
        .filter(apartment::Column::BuildingId.eq(building.id))
        .order_by_asc(apartment::Column::Id)
        .all(db)
        .await?;

    let mut issues = Vec::new();
    let mut fixes_applied = Vec::new();

    check_mills_sum(db, &building, &apartments, auto_fix, &mut issues, &mut fixes_applied)
        .await?;
    check_orphaned_payments(db, &mut issues).await?;
    check_duplicate_generated(db, building.id, auto_fix, &mut issues, &mut fixes_applied)
        .await?;

    let success = issues.is_empty();
    if !success {
        warn!(
            "Integrity check for building {} found {} issue(s), applied {} fix(es)",
            building.id,
            issues.len(),
            fixes_applied.len()
        );
    }

    Ok(IntegrityReport {
        building_id: building.id,
        success,
        issues,
        fixes_applied,
    })
}

async fn check_mills_sum(
    db: &DatabaseConnection,
    building: &building::Model,
    apartments: &[apartment::Model],
    auto_fix: bool,
    issues: &mut Vec<IntegrityIssue>,
    fixes_applied: &mut Vec<String>,
) -> Result<()> {
    for apt in apartments.iter().filter(|a| a.participation_mills.is_none()) {
        issues.push(
            IntegrityIssue::new(
                IssueCode::NullMills,
                format!(
                    "apartment {} has no participation mills and is skipped by mills-weighted distribution",
                    apt.number
                ),
            )
            .for_apartment(apt.id),
        );
    }

    let with_mills: Vec<(&apartment::Model, i32)> = apartments
        .iter()
        .filter_map(|a| a.participation_mills.map(|m| (a, m)))
        .collect();
    if with_mills.is_empty() {
        return Ok(());
    }

    let sum: i64 = with_mills.iter().map(|(_, m)| i64::from(*m)).sum();
    let basis = i64::from(building.mills_basis);
    if sum == basis {
        return Ok(());
    }

    issues.push(IntegrityIssue::new(
        IssueCode::MillsSum,
        format!(
            "participation mills sum to {} (expected {})",
            sum, basis
        ),
    ));

    let delta = basis - sum;
    if auto_fix && delta.abs() <= MAX_AUTO_FIX_MILLS {
        // The largest-mills apartment absorbs the shortfall; ties break
        // toward the lowest apartment id.
        if let Some((apt, mills)) = with_mills
            .iter()
            .max_by_key(|(a, m)| (*m, Reverse(a.id)))
            .copied()
        {
            let corrected = mills + delta as i32;
            let mut active: apartment::ActiveModel = apt.clone().into();
            active.participation_mills = Set(Some(corrected));
            active.update(db).await?;

            info!(
                "Auto-fixed mills for apartment {}: {} -> {}",
                apt.number, mills, corrected
            );
            fixes_applied.push(format!(
                "apartment {} mills adjusted from {} to {}",
                apt.number, mills, corrected
            ));
        }
    }

    Ok(())
}

async fn check_orphaned_payments(
    db: &DatabaseConnection,
    issues: &mut Vec<IntegrityIssue>,
) -> Result<()> {
    // Payments are money records; orphans are reported, never auto-deleted.
    let rows = payment::Entity::find()
        .find_also_related(apartment::Entity)
        .all(db)
        .await?;

    for (p, apt) in rows {
        if apt.is_none() {
            issues.push(
                IntegrityIssue::new(
                    IssueCode::OrphanedPayment,
                    format!("payment {} references a missing apartment {}", p.id, p.apartment_id),
                )
                .for_payment(p.id),
            );
        }
    }

    Ok(())
}

async fn check_duplicate_generated(
    db: &DatabaseConnection,
    building_id: i32,
    auto_fix: bool,
    issues: &mut Vec<IntegrityIssue>,
    fixes_applied: &mut Vec<String>,
) -> Result<()> {
    let generated = expense::Entity::find()
        .filter(expense::Column::BuildingId.eq(building_id))
        .filter(expense::Column::RecurringExpenseId.is_not_null())
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await?;

    let mut by_period: BTreeMap<(i32, i32, i32), Vec<expense::Model>> = BTreeMap::new();
    for exp in generated {
        if let (Some(rid), Some(year), Some(month)) =
            (exp.recurring_expense_id, exp.period_year, exp.period_month)
        {
            by_period.entry((rid, year, month)).or_default().push(exp);
        }
    }

    for ((rid, year, month), rows) in by_period {
        if rows.len() < 2 {
            continue;
        }
        // Keep the earliest row, flag (and in auto-fix mode delete) the rest.
        for extra in &rows[1..] {
            issues.push(
                IntegrityIssue::new(
                    IssueCode::DuplicateGeneratedExpense,
                    format!(
                        "duplicate generated expense for template {} period {}-{:02}",
                        rid, year, month
                    ),
                )
                .for_expense(extra.id),
            );
            if auto_fix {
                let id = extra.id;
                extra.clone().delete(db).await?;
                info!(
                    "Auto-fixed duplicate generated expense {} for template {} period {}-{:02}",
                    id, rid, year, month
                );
                fixes_applied.push(format!("removed duplicate generated expense {}", id));
            }
        }
    }

    Ok(())
}
