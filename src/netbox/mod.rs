pub mod client;
pub mod diff;
pub mod reconcile;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{ApiError, NetBoxClient};
pub use reconcile::{Outcome, Reconciler};
