//! Importer - load one experiment directory into the database

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bioserver_common::logging::{init_logging, LogConfig, LogLevel};
use bioserver_ingest::{
    store::run_migrations, ImportConfig, ImportPipeline, ImportStats, MemoryStore, PgImportScope,
};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "importer")]
#[command(author, version, about = "Import an experiment folder, containing taxa, containing species parquet files")]
struct Cli {
    /// Experiment directory
    experiment_dir: PathBuf,

    /// Experiment name (defaults to the directory's base name)
    #[arg(short, long)]
    name: Option<String>,

    /// Tile rows per bulk insert
    #[arg(short, long, env = "PSERVER_IMPORT_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Fail if a species id is already recorded under a different taxon
    #[arg(long)]
    strict_taxa: bool,

    /// Validate the directory against an in-memory store without writing
    #[arg(long)]
    dry_run: bool,

    /// Do not apply pending migrations
    #[arg(long)]
    skip_migrations: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("importer")
        .filter_directives("sqlx=warn")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging configuration: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    match run(cli).await {
        Ok(stats) => {
            println!("{}", stats.summary());
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("Error importing experiment: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ImportStats> {
    let mut config = ImportConfig::from_env()?
        .with_strict_taxa(cli.strict_taxa)
        .with_dry_run(cli.dry_run)
        .with_migrations(!cli.skip_migrations);
    if let Some(batch_size) = cli.batch_size {
        config = config.with_batch_size(batch_size);
    }
    config.validate()?;

    if !cli.experiment_dir.is_dir() {
        anyhow::bail!("{} is not a directory", cli.experiment_dir.display());
    }

    let pipeline = ImportPipeline::new(&config);
    info!("Ready to import data from {}", cli.experiment_dir.display());

    if config.dry_run {
        warn!("Dry run: nothing will be written to the database");
        let store = MemoryStore::new();
        let stats = pipeline
            .run(store.begin(), &cli.experiment_dir, cli.name.as_deref())
            .await?;
        return Ok(stats);
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("No database configured")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to DB")?;

    info!("Database connection established");

    if config.run_migrations {
        run_migrations(&pool).await.context("Failed to migrate DB")?;
        info!("Database migrations completed");
    }

    let scope = PgImportScope::begin(&pool).await?;
    let stats = pipeline
        .run(scope, &cli.experiment_dir, cli.name.as_deref())
        .await?;

    pool.close().await;
    Ok(stats)
}
