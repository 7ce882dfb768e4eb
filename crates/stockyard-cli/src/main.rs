mod report;
mod worksheet;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use stockyard_memstore::InMemoryPurchaseStore;
use stockyard_platform::{PgPurchaseStore, ServiceConfig, connect_database, ensure_schema};
use stockyard_worksheet::{PurchaseDocument, SaveReport};
use tracing::{info, warn};

use crate::report::Report;
use crate::worksheet::Worksheet;

#[derive(Parser, Debug)]
#[command(
    name = "stockyard",
    version,
    about = "Replay a livestock purchase worksheet and compute landed costs"
)]
struct Cli {
    /// Worksheet JSON with the header, classifications and operations
    worksheet: PathBuf,

    /// Persist the reconciled document
    #[arg(long)]
    save: bool,

    /// Save into a throwaway in-memory store instead of Postgres
    #[arg(long, requires = "save")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "stockyard=info".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::from_env()?;
    let worksheet = Worksheet::from_path(&cli.worksheet)?;
    let mut document = worksheet.replay(config.settings)?;
    info!(
        nota = %document.header().nota,
        mode = %document.mode(),
        lines = document.len(),
        "worksheet replayed"
    );

    let outcome = if cli.save {
        Some(save(&mut document, &config, cli.dry_run).await)
    } else {
        None
    };
    let saved = outcome
        .as_ref()
        .and_then(|result| result.as_ref().ok().cloned());

    let report = Report::new(&document, saved);
    for issue in &report.issues {
        warn!(kind = ?issue.kind, item = ?issue.item, "{}", issue.message);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    match outcome {
        Some(Err(err)) => Err(err),
        _ => Ok(()),
    }
}

async fn save(
    document: &mut PurchaseDocument,
    config: &ServiceConfig,
    dry_run: bool,
) -> Result<SaveReport> {
    if dry_run {
        let store = InMemoryPurchaseStore::new();
        return Ok(document.save(&store).await?);
    }

    let pool = connect_database(config.require_database_url()?).await?;
    ensure_schema(&pool).await?;
    let store = PgPurchaseStore::new(pool);
    Ok(document.save(&store).await?)
}
