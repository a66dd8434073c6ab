use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A billing period: one calendar month of one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Period {
    /// Calendar year (e.g. 2024)
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_display() {
        assert_eq!(Period::new(2024, 3).to_string(), "2024-03");
        assert_eq!(Period::new(2024, 12).to_string(), "2024-12");
    }

    #[test]
    fn test_period_serde_round_trip() {
        let period = Period::new(2024, 6);
        let json = serde_json::to_string(&period).unwrap();
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }
}
