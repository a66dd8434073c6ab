//! Common transport-layer types shared between the compute crate and the
//! HTTP API. These structs are the response payload shapes for allocation,
//! dashboard and integrity endpoints, so API consumers can deserialize them
//! without depending on the ORM entities.

mod allocation;
mod dashboard;
mod integrity;
mod period;

pub use allocation::{AllocationResult, ApartmentShare};
pub use dashboard::{ApartmentBalance, MonthlyDashboard};
pub use integrity::{GenerationOutcome, IntegrityIssue, IntegrityReport, IssueCode};
pub use period::Period;
