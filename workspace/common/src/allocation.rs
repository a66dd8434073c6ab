use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::Period;

/// One apartment's computed share of a period's common expenses.
///
/// `amount` is the full share; `owner_amount` and `tenant_amount` split it by
/// the expenses' payer responsibility and always sum back to `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApartmentShare {
    pub apartment_id: i32,
    pub apartment_number: String,
    /// Participation mills the share was weighted by, if any.
    pub participation_mills: Option<i32>,
    /// Total owed for the period.
    pub amount: Decimal,
    /// Portion owed by the owner.
    pub owner_amount: Decimal,
    /// Portion owed by the resident tenant.
    pub tenant_amount: Decimal,
    /// Share broken down by expense category.
    pub by_category: BTreeMap<String, Decimal>,
}

impl ApartmentShare {
    pub fn new(apartment_id: i32, apartment_number: String, participation_mills: Option<i32>) -> Self {
        Self {
            apartment_id,
            apartment_number,
            participation_mills,
            amount: Decimal::ZERO,
            owner_amount: Decimal::ZERO,
            tenant_amount: Decimal::ZERO,
            by_category: BTreeMap::new(),
        }
    }
}

/// Result of allocating a building's expenses for one period.
/// Invariant: `total` equals both the sum of the allocated expense amounts
/// and the sum of the per-apartment shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AllocationResult {
    pub building_id: i32,
    pub period: Period,
    /// Number of expenses that were allocated.
    pub expense_count: usize,
    /// Sum of all apartment shares.
    pub total: Decimal,
    pub shares: Vec<ApartmentShare>,
}

impl AllocationResult {
    /// Sum of the per-apartment shares, recomputed from the rows.
    pub fn share_sum(&self) -> Decimal {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_sum_matches_total() {
        let mut a = ApartmentShare::new(1, "A1".to_string(), Some(600));
        a.amount = Decimal::new(6000, 2);
        let mut b = ApartmentShare::new(2, "A2".to_string(), Some(400));
        b.amount = Decimal::new(4000, 2);

        let result = AllocationResult {
            building_id: 1,
            period: Period::new(2024, 1),
            expense_count: 1,
            total: Decimal::new(10000, 2),
            shares: vec![a, b],
        };
        assert_eq!(result.share_sum(), result.total);
    }
}
