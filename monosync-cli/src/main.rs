use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use monosync_ingest::MonobankClient;
use monosync_ledger::ActualClient;

mod config;
mod sync;

use config::{ConfigArgs, MonoConfig, SyncConfig};

#[derive(Parser, Debug)]
#[command(
    name = "monosync",
    version,
    about = "Import Monobank statements into Actual Budget"
)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List Monobank accounts, then import every configured account pair (default)
    Sync,

    /// List Monobank accounts and their ids
    Accounts,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Command::Sync) {
        Command::Sync => sync_all(&cli.config).await,
        Command::Accounts => print_accounts(&cli.config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn monobank(cfg: MonoConfig) -> MonobankClient {
    MonobankClient::new(cfg.token).with_base_url(cfg.base_url)
}

async fn sync_all(args: &ConfigArgs) -> Result<()> {
    let SyncConfig {
        mono,
        actual,
        pairs,
        settings,
    } = SyncConfig::from_args(args)?;
    let source = monobank(mono);
    let store = ActualClient::new(actual.url, actual.api_key, actual.sync_id)
        .with_budget_password(actual.budget_password);

    let outcome = sync::run_sync(&source, &store, &pairs, &settings, Utc::now()).await?;
    info!(
        imported = outcome.imported.len(),
        skipped = outcome.skipped.len(),
        failed = outcome.failed.len(),
        "sync finished"
    );

    if !outcome.failed.is_empty() {
        let names: Vec<String> = outcome
            .failed
            .iter()
            .map(|(pair, _)| format!("{}:{}", pair.remote_account, pair.ledger_account))
            .collect();
        bail!("{} account pair(s) failed: {}", names.len(), names.join(", "));
    }
    Ok(())
}

async fn print_accounts(args: &ConfigArgs) -> Result<()> {
    let cfg = MonoConfig::from_args(args)?;
    let backoff = std::time::Duration::from_secs(args.rate_limit_backoff_secs);
    let info = sync::list_accounts(&monobank(cfg), backoff).await?;

    println!("{} ({} accounts)\n", info.name, info.accounts.len());
    for account in &info.accounts {
        println!(
            "{:<24} {:<4} {:>14}  {}",
            account.display_name(),
            account.currency(),
            account.formatted_balance(),
            account.id
        );
    }
    Ok(())
}
