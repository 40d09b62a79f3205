use anyhow::{Context, Result, bail};
use clap::Args;
use secrecy::SecretString;
use std::time::Duration;

use monosync_core::{AccountPair, DEFAULT_LOOKBACK, ImportSettings, LookbackPeriod};
use monosync_ingest::MONOBANK_API_BASE;

/// Connection and import options; every flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Monobank personal API token
    #[arg(long, env = "MONO_TOKEN", hide_env_values = true, global = true)]
    pub mono_token: Option<String>,

    /// Monobank API base URL
    #[arg(long, env = "MONO_BASE_URL", default_value = MONOBANK_API_BASE, global = true)]
    pub mono_base_url: String,

    /// actual-http-api base URL
    #[arg(long, env = "ACTUAL_SERVER_URL", global = true)]
    pub actual_url: Option<String>,

    /// actual-http-api key
    #[arg(long, env = "ACTUAL_API_KEY", hide_env_values = true, global = true)]
    pub actual_api_key: Option<String>,

    /// Sync id of the budget to import into
    #[arg(long, env = "ACTUAL_SYNC_ID", global = true)]
    pub actual_sync_id: Option<String>,

    /// Password of an end-to-end encrypted budget
    #[arg(long, env = "ACTUAL_BUDGET_PASSWORD", hide_env_values = true, global = true)]
    pub actual_budget_password: Option<String>,

    /// Account pairs: monoId:actualId[,monoId:actualId...]
    #[arg(long, env = "ACCOUNT_IDS", default_value = "", global = true)]
    pub account_ids: String,

    /// How far back to look on every run (ISO-8601 duration)
    #[arg(long, env = "LOOKBACK_PERIOD", default_value = DEFAULT_LOOKBACK, global = true)]
    pub lookback: String,

    /// Seconds to wait after a Monobank rate-limit response
    #[arg(long, default_value_t = 60, global = true)]
    pub rate_limit_backoff_secs: u64,
}

#[derive(Debug)]
pub struct MonoConfig {
    pub token: SecretString,
    pub base_url: String,
}

impl MonoConfig {
    pub fn from_args(args: &ConfigArgs) -> Result<Self> {
        Ok(Self {
            token: SecretString::new(required(&args.mono_token, "MONO_TOKEN")?),
            base_url: args.mono_base_url.clone(),
        })
    }
}

#[derive(Debug)]
pub struct ActualConfig {
    pub url: String,
    pub api_key: SecretString,
    pub sync_id: String,
    pub budget_password: Option<SecretString>,
}

/// Everything a `sync` run needs, validated up front.
#[derive(Debug)]
pub struct SyncConfig {
    pub mono: MonoConfig,
    pub actual: ActualConfig,
    pub pairs: Vec<AccountPair>,
    pub settings: ImportSettings,
}

impl SyncConfig {
    pub fn from_args(args: &ConfigArgs) -> Result<Self> {
        let mono = MonoConfig::from_args(args)?;
        let actual = ActualConfig {
            url: required(&args.actual_url, "ACTUAL_SERVER_URL")?,
            api_key: SecretString::new(required(&args.actual_api_key, "ACTUAL_API_KEY")?),
            sync_id: required(&args.actual_sync_id, "ACTUAL_SYNC_ID")?,
            budget_password: args
                .actual_budget_password
                .clone()
                .filter(|p| !p.is_empty())
                .map(SecretString::new),
        };
        let pairs = parse_account_pairs(&args.account_ids)?;
        let lookback: LookbackPeriod = args
            .lookback
            .parse()
            .with_context(|| format!("invalid LOOKBACK_PERIOD {:?}", args.lookback))?;

        let settings = ImportSettings {
            lookback,
            rate_limit_backoff: Duration::from_secs(args.rate_limit_backoff_secs),
            ..ImportSettings::default()
        };

        Ok(Self {
            mono,
            actual,
            pairs,
            settings,
        })
    }
}

fn required(value: &Option<String>, env: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!("{env} is not set (pass the flag or set the environment variable)"),
    }
}

/// Parse `monoId:actualId` pairs separated by commas. Blank entries are ignored.
pub fn parse_account_pairs(raw: &str) -> Result<Vec<AccountPair>> {
    let mut pairs = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.split(':');
        let (Some(remote), Some(ledger), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("invalid account pair {entry:?}, expected monoId:actualId");
        };
        let (remote, ledger) = (remote.trim(), ledger.trim());
        if remote.is_empty() || ledger.is_empty() {
            bail!("invalid account pair {entry:?}, both ids are required");
        }
        pairs.push(AccountPair::new(remote, ledger));
    }
    Ok(pairs)
}
