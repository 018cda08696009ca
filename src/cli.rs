use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::data::loader::load_csv;
use crate::data::shelter::AnimalShelter;
use crate::data::store::{DocumentStore, MemoryStore, MongoStore, StoreError};
use crate::server;

#[derive(Debug, Parser)]
#[command(name = "shelterdash", version, about = "Animal shelter outcomes dashboard")]
pub struct Cli {
    /// YAML settings file; `SHELTER_*` environment variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the dashboard.
    Serve {
        /// Serve rows loaded from this CSV into an in-process store instead of MongoDB.
        #[arg(long, value_name = "CSV")]
        memory: Option<PathBuf>,
    },
    /// Replace the shelter collection with the rows of a CSV file.
    Load { path: PathBuf },
    /// Ping the store and print one sample record.
    Check,
}

pub fn parse_command(args: &[String]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match parse_command(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start async runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(async move {
        match cli.command {
            Command::Serve { memory } => handle_serve(&config, memory.as_deref()).await,
            Command::Load { path } => handle_load(&config, &path).await,
            Command::Check => handle_check(&config).await,
        }
    })
}

async fn connect_mongo(config: &AppConfig) -> Result<MongoStore, StoreError> {
    MongoStore::connect(
        &config.store.uri,
        &config.store.database,
        &config.store.collection,
    )
    .await
}

async fn handle_serve(config: &AppConfig, memory_csv: Option<&Path>) -> i32 {
    let store: Arc<dyn DocumentStore> = match memory_csv {
        Some(path) => {
            let store = MemoryStore::new();
            if let Err(err) = load_csv(&store, path).await {
                error!("failed to seed in-memory store: {err}");
                return 1;
            }
            Arc::new(store)
        }
        None => match connect_mongo(config).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                error!("{err}");
                return 1;
            }
        },
    };

    match server::run_server(config, store).await {
        Ok(()) => 0,
        Err(err) => {
            error!("server error: {err}");
            1
        }
    }
}

async fn handle_load(config: &AppConfig, path: &Path) -> i32 {
    let store = match connect_mongo(config).await {
        Ok(store) => store,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };

    let code = match store.ping().await {
        Err(err) => {
            error!("an error occurred: {err}");
            1
        }
        Ok(()) => match load_csv(&store, path).await {
            Ok(report) => {
                println!(
                    "load complete: rows={}, documents={}, source='{}'",
                    report.rows, report.documents_after_load, report.source_path
                );
                0
            }
            Err(err) => {
                error!("an error occurred: {err}");
                1
            }
        },
    };
    store.close().await;
    code
}

async fn handle_check(config: &AppConfig) -> i32 {
    let store: Arc<dyn DocumentStore> = match connect_mongo(config).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };
    let shelter = match AnimalShelter::connect(store).await {
        Ok(shelter) => shelter,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };

    let code = match shelter.count().await {
        Ok(count) => {
            info!(count, "documents in collection");
            match shelter.sample().await {
                Some(record) => {
                    println!("Successfully connected and read from the store!");
                    match serde_json::to_string_pretty(&record) {
                        Ok(payload) => println!("{payload}"),
                        Err(err) => error!("failed to serialize sample record: {err}"),
                    }
                }
                None => println!("Connected to the store but no records found."),
            }
            0
        }
        Err(err) => {
            error!("{err}");
            1
        }
    };
    shelter.close().await;
    code
}
