use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Period;

/// One apartment's row in the monthly dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApartmentBalance {
    pub apartment_id: i32,
    pub apartment_number: String,
    /// Debt carried from prior periods (>= 0).
    pub previous_debt: Decimal,
    /// Share of the current period's expenses.
    pub current_obligation: Decimal,
    /// Payments received within the period.
    pub payments: Decimal,
    /// previous_debt + current_obligation - payments.
    pub balance_due: Decimal,
}

/// Per-building, per-month financial summary.
///
/// The building-level figures are sums over the apartment rows, so the two
/// views reconcile exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyDashboard {
    pub building_id: i32,
    pub period: Period,
    /// Net balance carried from prior periods (credit minus debt, signed).
    pub carry_forward: Decimal,
    /// Sum of apartment debts carried from prior periods.
    pub previous_obligations: Decimal,
    /// Sum of the period's allocated shares.
    pub current_obligations: Decimal,
    /// Payments received within the period.
    pub payments_received: Decimal,
    /// previous_obligations + current_obligations - payments_received.
    pub total_obligations: Decimal,
    pub apartments: Vec<ApartmentBalance>,
}

impl MonthlyDashboard {
    /// Checks that the building-level figures equal the sums over the
    /// apartment rows. Divergence is a correctness bug in the aggregator.
    pub fn reconciles(&self) -> bool {
        let prev: Decimal = self.apartments.iter().map(|a| a.previous_debt).sum();
        let current: Decimal = self.apartments.iter().map(|a| a.current_obligation).sum();
        let payments: Decimal = self.apartments.iter().map(|a| a.payments).sum();
        prev == self.previous_obligations
            && current == self.current_obligations
            && payments == self.payments_received
    }
}
