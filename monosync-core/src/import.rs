//! Incremental statement import for one account pair.
//!
//! 1. Look up the newest `mono|` record in the ledger (the cursor).
//! 2. Walk the statement newest-first in 31-day windows.
//! 3. Stop at the cursor; everything before it is new.
//! 4. On a first import, add an opening balance entry.
//! 5. Hand the batch to the ledger in one call.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::model::{ImportCursor, LedgerTransaction, RemoteTransaction, imported_id_prefix};
use crate::period::LookbackPeriod;
use crate::source::{StatementSource, retry_rate_limited};
use crate::store::{ImportReport, LedgerStore, SortOrder, TransactionQuery};
use crate::window::{StatementWindows, Window, fetch_start};

/// Pause after a rate-limit response before repeating the same request.
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);
pub const STARTING_BALANCE_PAYEE: &str = "Starting Balance";
pub const STARTING_BALANCES_CATEGORY: &str = "Starting Balances";
/// Category id used when the ledger has no "Starting Balances" category.
pub const DEFAULT_STARTING_BALANCES_CATEGORY_ID: &str = "506e8d9d-7ed0-4397-84e4-07a9185dc6b2";

/// Per-run settings, built once by the caller and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub lookback: LookbackPeriod,
    pub rate_limit_backoff: Duration,
    pub starting_balance_payee: String,
    pub starting_balance_category: String,
    pub default_starting_balance_category_id: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            lookback: LookbackPeriod::months(6),
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
            starting_balance_payee: STARTING_BALANCE_PAYEE.to_string(),
            starting_balance_category: STARTING_BALANCES_CATEGORY.to_string(),
            default_starting_balance_category_id: DEFAULT_STARTING_BALANCES_CATEGORY_ID.to_string(),
        }
    }
}

/// Remote account id -> ledger account id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPair {
    pub remote_account: String,
    pub ledger_account: String,
}

impl AccountPair {
    pub fn new(remote_account: impl Into<String>, ledger_account: impl Into<String>) -> Self {
        Self {
            remote_account: remote_account.into(),
            ledger_account: ledger_account.into(),
        }
    }
}

/// Result of walking the statement windows.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    /// New ledger records, newest first
    pub transactions: Vec<LedgerTransaction>,
    pub cursor_found: bool,
    /// Last remote record seen before stopping or running out of windows
    pub oldest: Option<RemoteTransaction>,
    pub windows_fetched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub from: DateTime<Utc>,
    pub windows_fetched: usize,
    pub cursor_found: bool,
    /// Records handed to the ledger, starting balance included
    pub submitted: usize,
    pub starting_balance: Option<i64>,
    /// `None` when nothing was submitted
    pub report: Option<ImportReport>,
}

/// Reorder a statement page newest-first if the provider did not.
/// Returns `true` when the page had to be reordered.
pub fn order_newest_first(page: &mut [RemoteTransaction]) -> bool {
    let in_order = page.windows(2).all(|p| p[0].time >= p[1].time);
    if !in_order {
        // stable: equal timestamps keep the provider's order
        page.sort_by(|a, b| b.time.cmp(&a.time));
    }
    !in_order
}

pub struct Importer<'a, S: ?Sized, L: ?Sized> {
    source: &'a S,
    store: &'a L,
    settings: &'a ImportSettings,
}

impl<'a, S, L> Importer<'a, S, L>
where
    S: StatementSource + ?Sized,
    L: LedgerStore + ?Sized,
{
    pub fn new(source: &'a S, store: &'a L, settings: &'a ImportSettings) -> Self {
        Self {
            source,
            store,
            settings,
        }
    }

    pub async fn run(&self, pair: &AccountPair, now: DateTime<Utc>) -> Result<ImportSummary> {
        info!(
            remote = %pair.remote_account,
            ledger = %pair.ledger_account,
            "importing transactions"
        );

        let cursor = self.find_cursor(&pair.ledger_account).await?;
        match &cursor {
            Some(c) => info!(date = %c.date, imported_id = %c.imported_id, "last imported transaction"),
            None => info!("no previously imported transactions"),
        }

        let boundary = self.settings.lookback.boundary(now);
        let from = fetch_start(boundary, cursor.as_ref().map(|c| c.date));
        info!(
            lookback = %self.settings.lookback,
            boundary = %boundary.date_naive(),
            from = %from.date_naive(),
            "planned fetch range"
        );

        let windows = StatementWindows::new(from, now);
        let mut collected = self.collect(pair, cursor.as_ref(), windows).await?;

        let mut starting_balance = None;
        if !collected.cursor_found {
            if let Some(oldest) = &collected.oldest {
                info!("cursor not reached, adding starting balance");
                let entry = self.starting_balance(&pair.ledger_account, oldest).await?;
                starting_balance = Some(entry.amount);
                collected.transactions.push(entry);
            }
        }

        let report = self.submit(&pair.ledger_account, &collected.transactions).await?;

        Ok(ImportSummary {
            from,
            windows_fetched: collected.windows_fetched,
            cursor_found: collected.cursor_found,
            submitted: collected.transactions.len(),
            starting_balance,
            report,
        })
    }

    /// Newest ledger record of `ledger_account` carrying our imported-id namespace.
    ///
    /// Ledger dates are whole days. When several imported records share the
    /// newest day, the first one the store lists becomes the cursor; records
    /// newer than it on that day are fetched again and left to the store's
    /// imported-id dedup.
    pub async fn find_cursor(&self, ledger_account: &str) -> Result<Option<ImportCursor>> {
        let query = TransactionQuery::account(ledger_account)
            .imported_with_prefix(imported_id_prefix())
            .order(SortOrder::DateDesc)
            .limit(1);
        let rows = self
            .store
            .query_transactions(&query)
            .await
            .with_context(|| format!("querying last imported transaction of {ledger_account}"))?;
        Ok(rows.first().and_then(ImportCursor::from_ledger))
    }

    /// One statement page, repeating the identical request while rate limited.
    pub async fn fetch_window(
        &self,
        remote_account: &str,
        window: &Window,
    ) -> Result<Vec<RemoteTransaction>> {
        let (from, to) = window.unix_bounds();
        debug!(from = %window.start, to = %window.end, "fetching statement window");
        let source = self.source;
        retry_rate_limited(self.settings.rate_limit_backoff, "statement", move || {
            source.statement(remote_account, from, to)
        })
        .await
        .with_context(|| format!("fetching statement of {remote_account} for {from}..{to}"))
    }

    /// Walk `windows` newest-first, mapping records until the cursor shows up.
    pub async fn collect(
        &self,
        pair: &AccountPair,
        cursor: Option<&ImportCursor>,
        windows: impl IntoIterator<Item = Window>,
    ) -> Result<Collected> {
        let mut out = Collected::default();
        let mut seen = HashSet::new();

        'windows: for window in windows {
            let mut page = self.fetch_window(&pair.remote_account, &window).await?;
            out.windows_fetched += 1;
            info!(
                count = page.len(),
                from = %window.start,
                to = %window.end,
                "retrieved transactions"
            );

            if order_newest_first(&mut page) {
                warn!(
                    from = %window.start,
                    to = %window.end,
                    "statement page was not newest-first, reordered by time"
                );
            }

            for txn in page {
                let imported_id = txn.imported_id();
                if cursor.is_some_and(|c| c.imported_id == imported_id) {
                    info!(%imported_id, "found last imported transaction, stopping");
                    out.cursor_found = true;
                    out.oldest = Some(txn);
                    break 'windows;
                }
                // adjacent windows share their boundary second
                if seen.insert(imported_id) {
                    out.transactions.push(txn.to_ledger(&pair.ledger_account));
                }
                out.oldest = Some(txn);
            }
        }

        Ok(out)
    }

    /// Opening balance entry dated on the oldest fetched record.
    pub async fn starting_balance(
        &self,
        ledger_account: &str,
        oldest: &RemoteTransaction,
    ) -> Result<LedgerTransaction> {
        let category = self.starting_balance_category().await?;
        Ok(LedgerTransaction {
            account: ledger_account.to_string(),
            amount: oldest.opening_balance(),
            date: oldest.date(),
            payee_name: self.settings.starting_balance_payee.clone(),
            notes: None,
            // left empty so it never becomes the cursor
            imported_id: None,
            category: Some(category),
        })
    }

    async fn starting_balance_category(&self) -> Result<String> {
        let categories = self
            .store
            .categories()
            .await
            .context("loading ledger categories")?;
        let wanted = &self.settings.starting_balance_category;
        Ok(categories
            .into_iter()
            .find(|c| &c.name == wanted)
            .map(|c| c.id)
            .unwrap_or_else(|| self.settings.default_starting_balance_category_id.clone()))
    }

    /// Single batch insert. Nothing is sent for an empty batch.
    pub async fn submit(
        &self,
        ledger_account: &str,
        transactions: &[LedgerTransaction],
    ) -> Result<Option<ImportReport>> {
        if transactions.is_empty() {
            info!(ledger = %ledger_account, "no new transactions to import");
            return Ok(None);
        }

        info!(ledger = %ledger_account, count = transactions.len(), "importing transactions to ledger");
        let report = self
            .store
            .import_transactions(ledger_account, transactions)
            .await
            .with_context(|| format!("importing {} transactions into {ledger_account}", transactions.len()))?;
        info!(added = report.added, updated = report.updated, "ledger import finished");
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str, time: i64) -> RemoteTransaction {
        RemoteTransaction {
            id: id.to_string(),
            time,
            description: id.to_uppercase(),
            mcc: 4829,
            original_mcc: None,
            hold: false,
            amount: -100,
            operation_amount: -100,
            currency_code: 980,
            commission_rate: 0,
            cashback_amount: 0,
            balance: 10_000,
            comment: None,
        }
    }

    #[test]
    fn test_order_newest_first_leaves_sorted_pages_alone() {
        let mut page = vec![remote("a", 30), remote("b", 20), remote("c", 20), remote("d", 10)];
        assert!(!order_newest_first(&mut page));
        let ids: Vec<_> = page.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_order_newest_first_fixes_reversed_pages() {
        let mut page = vec![remote("old", 10), remote("mid", 20), remote("mid2", 20), remote("new", 30)];
        assert!(order_newest_first(&mut page));
        let ids: Vec<_> = page.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "mid2", "old"]);
    }

    #[test]
    fn test_default_settings() {
        let s = ImportSettings::default();
        assert_eq!(s.rate_limit_backoff, Duration::from_secs(60));
        assert_eq!(s.lookback.to_string(), "P6M");
        assert_eq!(s.starting_balance_category, "Starting Balances");
    }
}
