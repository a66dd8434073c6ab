use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// An invariant of the financial data is violated (mills not summing,
    /// zero divisor). Surfaced to the caller, never silently swallowed.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Referenced building does not exist
    #[error("Building {0} not found")]
    BuildingNotFound(i32),

    /// Error from date operations
    #[error("Date error: {0}")]
    Date(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
