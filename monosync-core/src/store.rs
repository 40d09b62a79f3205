//! Ledger Store: the budgeting side of the sync.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Category, LedgerTransaction};
use crate::source::BoxError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger request failed")]
    Transport(#[source] BoxError),

    #[error("ledger returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode ledger response")]
    Decode(#[source] BoxError),

    #[error("ledger rejected the import: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
}

/// Filter + order + limit over an account's ledger transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub account: String,
    pub imported_id_prefix: Option<String>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl TransactionQuery {
    pub fn account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            imported_id_prefix: None,
            order: SortOrder::DateDesc,
            limit: None,
        }
    }

    pub fn imported_with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.imported_id_prefix = Some(prefix.into());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, txn: &LedgerTransaction) -> bool {
        if txn.account != self.account {
            return false;
        }
        match &self.imported_id_prefix {
            Some(prefix) => txn
                .imported_id
                .as_deref()
                .is_some_and(|id| id.starts_with(prefix.as_str())),
            None => true,
        }
    }

    /// Apply the query to an in-memory list. The sort is stable, so records
    /// sharing a date keep their incoming order.
    pub fn apply(&self, txns: impl IntoIterator<Item = LedgerTransaction>) -> Vec<LedgerTransaction> {
        let mut out: Vec<_> = txns.into_iter().filter(|t| self.matches(t)).collect();
        match self.order {
            SortOrder::DateDesc => out.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::DateAsc => out.sort_by(|a, b| a.date.cmp(&b.date)),
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

/// What the ledger did with an import batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn query_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<LedgerTransaction>, StoreError>;

    async fn categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Insert a batch into `account`. Records whose imported id already
    /// exists are expected to be skipped by the store.
    async fn import_transactions(
        &self,
        account: &str,
        transactions: &[LedgerTransaction],
    ) -> Result<ImportReport, StoreError>;
}
