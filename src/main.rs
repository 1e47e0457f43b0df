use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recs_pipeline::{
    db::{create_pool, MemoryStore, PgStore},
    pipeline::{self, RunOptions},
    routes::{create_router, AppState},
    sources::{HttpSource, LocalDirSource, RawSource},
    Config,
};

#[derive(Parser)]
#[command(name = "recs-pipeline")]
#[command(about = "Daily advertiser product recommendations: batch pipeline and read API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute and store the recommendations of one run date
    Run {
        /// Run date (YYYY-MM-DD); rows are stamped with it and replace that day
        #[arg(long)]
        date: NaiveDate,

        /// Compute and report without writing to the database
        #[arg(long)]
        skip_store: bool,
    },
    /// Serve stored recommendations over HTTP
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Run { date, skip_store } => run_pipeline(&config, date, skip_store).await,
        Command::Serve => serve(&config).await,
        Command::Migrate => {
            let store = connect_store(&config).await?;
            store.close().await;
            Ok(())
        }
    }
}

fn build_source(config: &Config) -> Box<dyn RawSource> {
    match &config.source_url {
        Some(url) => Box::new(HttpSource::new(url.clone())),
        None => Box::new(LocalDirSource::new(config.source_dir.clone())),
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<PgStore> {
    let pool = create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    let store = PgStore::new(pool);
    store.migrate().await?;
    Ok(store)
}

async fn run_pipeline(config: &Config, date: NaiveDate, skip_store: bool) -> anyhow::Result<()> {
    let source = build_source(config);
    let options = RunOptions {
        artifacts_dir: config.artifacts_dir.clone(),
        skip_store,
    };

    let report = if skip_store {
        pipeline::run(source.as_ref(), &MemoryStore::new(), date, &options).await?
    } else {
        let store = connect_store(config).await?;
        let result = pipeline::run(source.as_ref(), &store, date, &options).await;
        store.close().await;
        result?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let store = connect_store(config).await?;
    let state = Arc::new(AppState::new(Arc::new(store.clone()), config.history_days));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!(addr = %config.bind_addr(), "Serving recommendations");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    store.close().await;
    Ok(())
}
