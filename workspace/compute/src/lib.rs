pub mod allocation;
pub mod dashboard;
pub mod error;
pub mod integrity;
pub mod period;
pub mod recurring;

#[cfg(test)]
pub(crate) mod testing;
