//! HTTP client for the Monobank personal API.
//!
//! Personal tokens are limited to one statement request per 60 seconds per
//! account; the API answers 429 beyond that. Rate limiting is surfaced as
//! [`SourceError::RateLimited`] and retried by the caller.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use monosync_core::{ClientInfo, RemoteTransaction, SourceError, StatementSource};

use crate::types::{ClientInfoResponse, ErrorBody, StatementItem};

pub const MONOBANK_API_BASE: &str = "https://api.monobank.ua";

pub struct MonobankClient {
    token: SecretString,
    base_url: String,
    client: Client,
}

impl MonobankClient {
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            base_url: MONOBANK_API_BASE.to_string(),
            client: Client::new(),
        }
    }

    /// Override API base URL (useful for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header("X-Token", self.token.expose_secret())
            .send()
            .await
            .map_err(|e| SourceError::Transport(Box::new(e)))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, status = status.as_u16(), "failed to read error body");
                String::new()
            });
            let body = serde_json::from_str::<ErrorBody>(&txt)
                .map(|e| e.error_description)
                .unwrap_or(txt);
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| SourceError::Decode(Box::new(e)))
    }
}

#[async_trait]
impl StatementSource for MonobankClient {
    async fn client_info(&self) -> Result<ClientInfo, SourceError> {
        let resp: ClientInfoResponse = self.get("/personal/client-info").await?;
        Ok(resp.into())
    }

    async fn statement(
        &self,
        account_id: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<RemoteTransaction>, SourceError> {
        let path = format!("/personal/statement/{account_id}/{from}/{to}");
        let items: Vec<StatementItem> = self.get(&path).await?;
        tracing::debug!(account = account_id, from, to, count = items.len(), "statement page");
        Ok(items.into_iter().map(Into::into).collect())
    }
}
