pub mod allocations;
pub mod apartments;
pub mod buildings;
pub mod dashboard;
pub mod expenses;
pub mod health;
pub mod integrity;
pub mod payments;
pub mod recurring_expenses;
pub mod webhooks;
