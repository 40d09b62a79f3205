//! monosync-ingest: Monobank statement source.

pub mod client;
pub mod types;

pub use client::{MONOBANK_API_BASE, MonobankClient};
pub use types::{AccountItem, ClientInfoResponse, StatementItem};
