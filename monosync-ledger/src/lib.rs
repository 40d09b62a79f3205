//! monosync-ledger: Actual Budget ledger store (via actual-http-api)

pub mod client;
pub mod types;

pub use client::{ActualClient, HISTORY_START};
pub use types::{ActualCategory, ActualTransaction, ImportResult};
