pub mod apartment;
pub mod building;
pub mod expense;
pub mod monthly_balance;
pub mod payment;
pub mod recurring_expense;
pub mod webhook_event;
