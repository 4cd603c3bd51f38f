//! docsearch
//!
//! Stores texts as embedding vectors in Milvus and answers similarity
//! queries over them. Each run performs one action and prints its report
//! as JSON on stdout; logs go to stderr.

use std::sync::Arc;

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::Environment;
use domain_documents::{InMemoryStore, MilvusSettings, MilvusStore, VectorStore};
use eyre::{Result, WrapErr};
use tracing::info;

mod cli;
mod corpus;
mod runner;

use cli::{Backend, Cli};
use runner::{run, Report};

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let settings = cli.settings()?;

    info!(
        action = %cli.action,
        backend = ?cli.backend,
        collection = %settings.collection_name,
        "Starting docsearch"
    );

    let report = match cli.backend {
        Backend::Milvus => {
            let store = MilvusStore::new(&settings).wrap_err("Failed to build Milvus client")?;
            execute(Arc::new(store), settings, &cli).await?
        }
        Backend::Memory => execute(Arc::new(InMemoryStore::new()), settings, &cli).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Connect, run the action, and disconnect whether or not it succeeded
async fn execute<S: VectorStore>(
    store: Arc<S>,
    settings: MilvusSettings,
    cli: &Cli,
) -> Result<Report> {
    store
        .connect()
        .await
        .wrap_err_with(|| format!("Failed to connect to {}", settings.endpoint()))?;

    let result = run(store.clone(), settings, cli).await;
    store.disconnect().await;
    result
}
