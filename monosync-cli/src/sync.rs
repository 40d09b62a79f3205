//! Runs the importer for every configured account pair.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use monosync_core::{
    AccountPair, ClientInfo, ImportSettings, ImportSummary, Importer, LedgerStore,
    StatementSource, retry_rate_limited,
};

/// Per-pair results of one `sync` run.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub imported: Vec<(AccountPair, ImportSummary)>,
    pub skipped: Vec<AccountPair>,
    pub failed: Vec<(AccountPair, anyhow::Error)>,
}

/// Fetch client info and log each remote account.
pub async fn list_accounts<S>(source: &S, backoff: Duration) -> Result<ClientInfo>
where
    S: StatementSource + ?Sized,
{
    let info = retry_rate_limited(backoff, "client-info", || source.client_info())
        .await
        .context("fetching Monobank client info")?;

    info!(client = %info.name, accounts = info.accounts.len(), "monobank client");
    for account in &info.accounts {
        info!(
            id = %account.id,
            card = %account.display_name(),
            currency = %account.currency(),
            kind = %account.kind,
            "monobank account"
        );
    }
    Ok(info)
}

pub async fn run_sync<S, L>(
    source: &S,
    store: &L,
    pairs: &[AccountPair],
    settings: &ImportSettings,
    now: DateTime<Utc>,
) -> Result<SyncOutcome>
where
    S: StatementSource + ?Sized,
    L: LedgerStore + ?Sized,
{
    let info = list_accounts(source, settings.rate_limit_backoff).await?;

    let mut outcome = SyncOutcome::default();
    if pairs.is_empty() {
        info!(
            "no account pairs configured; set ACCOUNT_IDS=monoId:actualId[,monoId:actualId] \
             using the ids listed above"
        );
        return Ok(outcome);
    }

    let importer = Importer::new(source, store, settings);
    for pair in pairs {
        if info.account(&pair.remote_account).is_none() {
            warn!(remote = %pair.remote_account, "account not found in Monobank client info, skipping");
            outcome.skipped.push(pair.clone());
            continue;
        }

        match importer.run(pair, now).await {
            Ok(summary) => {
                info!(
                    remote = %pair.remote_account,
                    ledger = %pair.ledger_account,
                    submitted = summary.submitted,
                    windows = summary.windows_fetched,
                    "account synced"
                );
                outcome.imported.push((pair.clone(), summary));
            }
            Err(e) => {
                error!(
                    remote = %pair.remote_account,
                    ledger = %pair.ledger_account,
                    error = %format!("{e:#}"),
                    "account sync failed"
                );
                outcome.failed.push((pair.clone(), e));
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use monosync_core::{
        Category, ImportReport, LedgerTransaction, RemoteAccount, RemoteTransaction,
        SourceError, StoreError, TransactionQuery,
    };
    use std::sync::Mutex;

    struct Bank {
        accounts: Vec<&'static str>,
        broken: &'static str,
    }

    fn txn(id: &str, time: i64) -> RemoteTransaction {
        RemoteTransaction {
            id: id.to_string(),
            time,
            description: format!("shop {id}"),
            mcc: 5411,
            original_mcc: None,
            hold: false,
            amount: -100,
            operation_amount: -100,
            currency_code: 980,
            commission_rate: 0,
            cashback_amount: 0,
            balance: 5000,
            comment: None,
        }
    }

    #[async_trait]
    impl StatementSource for Bank {
        async fn client_info(&self) -> Result<ClientInfo, SourceError> {
            Ok(ClientInfo {
                client_id: "c".to_string(),
                name: "Test".to_string(),
                accounts: self
                    .accounts
                    .iter()
                    .map(|id| RemoteAccount {
                        id: id.to_string(),
                        masked_pan: vec![format!("4444****{id}")],
                        currency_code: 980,
                        balance: 5000,
                        kind: "black".to_string(),
                        iban: None,
                    })
                    .collect(),
            })
        }

        async fn statement(
            &self,
            account_id: &str,
            from: i64,
            to: i64,
        ) -> Result<Vec<RemoteTransaction>, SourceError> {
            if account_id == self.broken {
                return Err(SourceError::Status {
                    status: 401,
                    body: "Unknown 'X-Token'".to_string(),
                });
            }
            let t = 1_774_958_400; // 2026-03-31T12:00:00Z
            Ok(if (from..=to).contains(&t) {
                vec![txn(&format!("{account_id}-1"), t)]
            } else {
                Vec::new()
            })
        }
    }

    #[derive(Default)]
    struct Ledger {
        batches: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl LedgerStore for Ledger {
        async fn query_transactions(
            &self,
            _query: &TransactionQuery,
        ) -> Result<Vec<LedgerTransaction>, StoreError> {
            Ok(Vec::new())
        }

        async fn categories(&self) -> Result<Vec<Category>, StoreError> {
            Ok(Vec::new())
        }

        async fn import_transactions(
            &self,
            account: &str,
            transactions: &[LedgerTransaction],
        ) -> Result<ImportReport, StoreError> {
            self.batches
                .lock()
                .unwrap()
                .push((account.to_string(), transactions.len()));
            Ok(ImportReport {
                added: transactions.len(),
                updated: 0,
            })
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 31, 18, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_no_pairs_lists_accounts_only() {
        let bank = Bank {
            accounts: vec!["m1"],
            broken: "",
        };
        let ledger = Ledger::default();

        let outcome = run_sync(&bank, &ledger, &[], &ImportSettings::default(), now())
            .await
            .unwrap();
        assert!(outcome.imported.is_empty());
        assert!(ledger.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_is_skipped() {
        let bank = Bank {
            accounts: vec!["m1"],
            broken: "",
        };
        let ledger = Ledger::default();
        let pairs = [AccountPair::new("gone", "a0"), AccountPair::new("m1", "a1")];

        let outcome = run_sync(&bank, &ledger, &pairs, &ImportSettings::default(), now())
            .await
            .unwrap();
        assert_eq!(outcome.skipped, vec![AccountPair::new("gone", "a0")]);
        assert_eq!(outcome.imported.len(), 1);
        // one statement line plus the opening balance
        assert_eq!(*ledger.batches.lock().unwrap(), vec![("a1".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_failing_pair_does_not_stop_the_rest() {
        let bank = Bank {
            accounts: vec!["m1", "m2"],
            broken: "m1",
        };
        let ledger = Ledger::default();
        let pairs = [AccountPair::new("m1", "a1"), AccountPair::new("m2", "a2")];

        let outcome = run_sync(&bank, &ledger, &pairs, &ImportSettings::default(), now())
            .await
            .unwrap();
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, AccountPair::new("m1", "a1"));
        assert_eq!(outcome.imported.len(), 1);
        assert_eq!(outcome.imported[0].0, AccountPair::new("m2", "a2"));
        assert_eq!(*ledger.batches.lock().unwrap(), vec![("a2".to_string(), 2)]);
    }
}
