use clap::Parser;
use ledger_core::application::engine::TransferEngine;
use ledger_core::application::query::QueryService;
use ledger_core::domain::account::AccountId;
use ledger_core::domain::ports::LedgerStoreRef;
use ledger_core::error::Result as LedgerResult;
use ledger_core::infrastructure::in_memory::InMemoryLedger;
use ledger_core::interfaces::commands::{Command, CommandReader, TransferCommand};
use ledger_core::interfaces::csv::AccountWriter;
use ledger_core::interfaces::requests::TransferRequest;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command file (JSON lines: open_account / transfer records)
    input: PathBuf,

    /// Path to a persistent database. If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = open_store(cli.db_path)?;
    let engine = TransferEngine::new(Arc::clone(&store));
    let query = QueryService::new(Arc::clone(&store));

    // Command files address accounts by public number; map them back to
    // internal ids, including accounts recovered from a persistent store.
    let mut numbers: HashMap<u32, AccountId> = HashMap::new();
    for account in query.accounts().await.into_diagnostic()? {
        numbers.insert(account.number.value(), account.id);
    }

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(BufReader::new(file));
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = run_command(&engine, &mut numbers, command).await {
                    tracing::warn!(error = %e, retryable = e.retryable(), "command failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable command");
            }
        }
    }

    let totals = query.totals().await.into_diagnostic()?;
    tracing::info!(
        accounts = totals.account_count,
        transactions = totals.transaction_count,
        total_balance = %totals.total_balance,
        "ledger processed"
    );

    let accounts = query.accounts().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreRef> {
    use ledger_core::infrastructure::rocksdb::RocksDbLedger;
    Ok(match db_path {
        Some(path) => Arc::new(RocksDbLedger::open(path).into_diagnostic()?),
        None => Arc::new(InMemoryLedger::new()),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<LedgerStoreRef> {
    if db_path.is_some() {
        miette::bail!("this build has no persistent storage; rebuild with --features storage-rocksdb");
    }
    Ok(Arc::new(InMemoryLedger::new()))
}

async fn run_command(
    engine: &TransferEngine,
    numbers: &mut HashMap<u32, AccountId>,
    command: Command,
) -> LedgerResult<()> {
    match command {
        Command::OpenAccount(req) => {
            let account = engine
                .open_account(req.holder(), req.account_number()?, req.opening_balance()?)
                .await?;
            numbers.insert(account.number.value(), account.id);
            Ok(())
        }
        Command::Transfer(TransferCommand {
            sender,
            receiver,
            amount,
        }) => {
            let (Some(&sender_id), Some(&receiver_id)) =
                (numbers.get(&sender), numbers.get(&receiver))
            else {
                tracing::warn!(sender, receiver, "transfer names an unknown account number");
                return Ok(());
            };
            let request = TransferRequest {
                sender_id,
                receiver_id,
                amount,
            };
            engine
                .transfer(request.sender_id, request.receiver_id, request.amount()?)
                .await?;
            Ok(())
        }
    }
}
