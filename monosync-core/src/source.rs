//! Statement Source: the bank side of the sync.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::model::{ClientInfo, RemoteTransaction};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The provider asked us to slow down (HTTP 429). Retry after a pause.
    #[error("statement source rate limit exceeded")]
    RateLimited,

    #[error("statement source request failed")]
    Transport(#[source] BoxError),

    #[error("statement source returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode statement source response")]
    Decode(#[source] BoxError),
}

impl SourceError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited)
    }
}

#[async_trait]
pub trait StatementSource: Send + Sync {
    /// Client profile with every account the token can see.
    async fn client_info(&self) -> Result<ClientInfo, SourceError>;

    /// Transactions of `account_id` between two unix timestamps (inclusive),
    /// newest first. The range must not exceed 31 days.
    async fn statement(
        &self,
        account_id: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<RemoteTransaction>, SourceError>;
}

/// Run `op` until it returns something other than [`SourceError::RateLimited`],
/// sleeping `backoff` between attempts. There is no attempt limit.
pub async fn retry_rate_limited<T, F, Fut>(
    backoff: Duration,
    what: &str,
    mut op: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 1_u32;
    loop {
        match op().await {
            Err(SourceError::RateLimited) => {
                tracing::warn!(
                    request = what,
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    "rate limit exceeded, waiting before retry"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
