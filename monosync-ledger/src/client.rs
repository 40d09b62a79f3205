//! Actual Budget ledger over actual-http-api.
//!
//! Endpoints used (all under `/v1/budgets/{sync_id}`):
//! - `GET  /accounts/{account}/transactions?since_date=...`
//! - `GET  /categories`
//! - `POST /accounts/{account}/transactions/import`
//!
//! The transactions endpoint has no imported-id filter, so queries are
//! fetched per account and filtered/sorted/limited locally.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use monosync_core::{
    Category, ImportReport, LedgerStore, LedgerTransaction, StoreError, TransactionQuery,
};

use crate::types::{ActualCategory, ActualTransaction, Envelope, ImportRequest, ImportResult};

/// Earliest date requested when scanning an account's history.
pub const HISTORY_START: &str = "1970-01-01";

pub struct ActualClient {
    base_url: String,
    api_key: SecretString,
    sync_id: String,
    budget_password: Option<SecretString>,
    client: Client,
}

impl ActualClient {
    pub fn new(base_url: impl Into<String>, api_key: SecretString, sync_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            sync_id: sync_id.into(),
            budget_password: None,
            client: Client::new(),
        }
    }

    /// Password for end-to-end encrypted budgets.
    pub fn with_budget_password(mut self, password: Option<SecretString>) -> Self {
        self.budget_password = password;
        self
    }

    fn budget_url(&self, path: &str) -> String {
        format!("{}/v1/budgets/{}{}", self.base_url, self.sync_id, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("x-api-key", self.api_key.expose_secret());
        match &self.budget_password {
            Some(p) => req.header("budget-encryption-password", p.expose_secret()),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, StoreError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| StoreError::Transport(Box::new(e)))?;
        let resp = check_status(resp).await?;
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(Box::new(e)))?;
        Ok(envelope.data)
    }
}

async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_else(|e| {
        tracing::debug!(error = %e, status = status.as_u16(), "failed to read error body");
        String::new()
    });
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl LedgerStore for ActualClient {
    async fn query_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<LedgerTransaction>, StoreError> {
        let url = self.budget_url(&format!("/accounts/{}/transactions", query.account));
        let req = self.client.get(url).query(&[("since_date", HISTORY_START)]);
        let rows: Vec<ActualTransaction> = self.send(req).await?;
        tracing::debug!(account = %query.account, rows = rows.len(), "ledger transactions loaded");
        Ok(query.apply(rows.into_iter().map(LedgerTransaction::from)))
    }

    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let req = self.client.get(self.budget_url("/categories"));
        let rows: Vec<ActualCategory> = self.send(req).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn import_transactions(
        &self,
        account: &str,
        transactions: &[LedgerTransaction],
    ) -> Result<ImportReport, StoreError> {
        let url = self.budget_url(&format!("/accounts/{account}/transactions/import"));
        let req = self.client.post(url).json(&ImportRequest { transactions });
        let result: ImportResult = self.send(req).await?;

        let errors = result.error_messages();
        if !errors.is_empty() {
            return Err(StoreError::Rejected(errors));
        }
        Ok(ImportReport {
            added: result.added.len(),
            updated: result.updated.len(),
        })
    }
}
