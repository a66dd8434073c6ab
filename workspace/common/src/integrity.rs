use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kinds of invariant violations the integrity checker reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Participation mills do not sum to the building's basis.
    MillsSum,
    /// Apartment has no participation mills and is skipped by mills-weighted
    /// distribution.
    NullMills,
    /// Payment row whose apartment no longer exists.
    OrphanedPayment,
    /// More than one generated expense for the same (template, period).
    DuplicateGeneratedExpense,
}

/// One detected invariant violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntegrityIssue {
    pub code: IssueCode,
    pub message: String,
    pub apartment_id: Option<i32>,
    pub expense_id: Option<i32>,
    pub payment_id: Option<i32>,
}

impl IntegrityIssue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            apartment_id: None,
            expense_id: None,
            payment_id: None,
        }
    }

    pub fn for_apartment(mut self, apartment_id: i32) -> Self {
        self.apartment_id = Some(apartment_id);
        self
    }

    pub fn for_expense(mut self, expense_id: i32) -> Self {
        self.expense_id = Some(expense_id);
        self
    }

    pub fn for_payment(mut self, payment_id: i32) -> Self {
        self.payment_id = Some(payment_id);
        self
    }
}

/// Outcome of an integrity check over one building.
///
/// `success` reflects the state as found; `fixes_applied` lists corrections
/// made in auto-fix mode. A second auto-fix run on the same data reports
/// success with no further fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntegrityReport {
    pub building_id: i32,
    pub success: bool,
    pub issues: Vec<IntegrityIssue>,
    pub fixes_applied: Vec<String>,
}

/// Outcome of a recurring-expense generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationOutcome {
    pub building_id: i32,
    /// Expense rows inserted by this run.
    pub created: usize,
    /// Templates skipped because the period's row already existed.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_builder() {
        let issue = IntegrityIssue::new(IssueCode::MillsSum, "mills sum to 990, expected 1000")
            .for_apartment(7);
        assert_eq!(issue.code, IssueCode::MillsSum);
        assert_eq!(issue.apartment_id, Some(7));
        assert_eq!(issue.expense_id, None);
    }

    #[test]
    fn test_issue_code_serialization() {
        let json = serde_json::to_string(&IssueCode::DuplicateGeneratedExpense).unwrap();
        assert_eq!(json, "\"DUPLICATE_GENERATED_EXPENSE\"");
    }
}
