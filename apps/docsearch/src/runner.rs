//! Executes one action against a connected store

use std::sync::Arc;

use domain_documents::{
    Action, CollectionManager, CollectionStats, Document, DocumentStore, HashingVectorizer,
    HttpEmbedder, IngestService, MilvusSettings, SearchResult, SearchService, VectorStore,
    Vectorizer,
};
use eyre::{Result, WrapErr};
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, Embedder};
use crate::corpus::sample_texts;

/// What an action produced, printed as JSON on stdout
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Report {
    Insert {
        collection: String,
        inserted: usize,
    },
    Search {
        collection: String,
        query: String,
        results: Vec<SearchResult>,
    },
    Both {
        collection: String,
        inserted: usize,
        query: String,
        results: Vec<SearchResult>,
    },
    Delete {
        collection: String,
        deleted: usize,
    },
    Update {
        collection: String,
        old_id: i64,
        new_id: i64,
    },
    Get {
        collection: String,
        id: i64,
        found: bool,
        document: Option<Document>,
    },
    Stats(CollectionStats),
    ListCollections {
        collections: Vec<String>,
    },
    DropCollection {
        collection: String,
    },
    Clear {
        collection: String,
        deleted: usize,
    },
}

async fn build_vectorizer(
    kind: Embedder,
    settings: &MilvusSettings,
) -> Result<Arc<dyn Vectorizer>> {
    let vectorizer: Arc<dyn Vectorizer> = match kind {
        Embedder::Http => Arc::new(
            HttpEmbedder::from_env()
                .await
                .wrap_err("Failed to set up the embedding model")?,
        ),
        Embedder::Hashing => Arc::new(HashingVectorizer::new(settings.dimension)?),
    };
    info!(dimension = vectorizer.dimension(), "Vectorizer ready");
    Ok(vectorizer)
}

/// Run `cli.action`. The store must already be connected.
pub async fn run<S: VectorStore>(
    store: Arc<S>,
    mut settings: MilvusSettings,
    cli: &Cli,
) -> Result<Report> {
    let action = cli.action;

    // Only text-handling actions pay for loading a model
    let vectorizer = if action.needs_vectorizer() {
        let vectorizer = build_vectorizer(cli.embedder(), &settings).await?;
        settings.dimension = vectorizer.dimension();
        Some(vectorizer)
    } else {
        None
    };

    let collections = CollectionManager::new(store.clone(), settings.clone());
    let name = settings.collection_name.clone();

    if !action.needs_collection() {
        return match action {
            Action::ListCollections => Ok(Report::ListCollections {
                collections: collections.list().await?,
            }),
            _ => {
                collections.drop_collection(&name).await?;
                Ok(Report::DropCollection { collection: name })
            }
        };
    }

    collections.provision_default().await?;
    let documents = Arc::new(DocumentStore::new(store, settings));
    let mut ingest = IngestService::new(documents.clone());
    if let Some(vectorizer) = &vectorizer {
        ingest = ingest.with_vectorizer(vectorizer.clone());
    }
    let search =
        |vectorizer: Arc<dyn Vectorizer>| SearchService::new(documents.clone(), vectorizer);

    let report = match (action, vectorizer) {
        (Action::Insert, Some(_)) => Report::Insert {
            inserted: ingest.insert_texts(&insert_texts(cli)).await?,
            collection: name,
        },
        (Action::Search, Some(vectorizer)) => Report::Search {
            results: search(vectorizer).search(&cli.query, cli.top_k).await?,
            query: cli.query.clone(),
            collection: name,
        },
        (Action::Both, Some(vectorizer)) => {
            let inserted = ingest.insert_texts(&insert_texts(cli)).await?;
            let results = search(vectorizer).search(&cli.query, cli.top_k).await?;
            Report::Both {
                collection: name,
                inserted,
                query: cli.query.clone(),
                results,
            }
        }
        (Action::Update, Some(_)) => {
            let old_id = cli.require_doc_id()?;
            let text = cli
                .text
                .first()
                .ok_or_else(|| eyre::eyre!("update needs --text"))?;
            let new_id = ingest.update_text(old_id, text).await?;
            Report::Update {
                collection: name,
                old_id,
                new_id,
            }
        }
        (Action::Delete, _) => Report::Delete {
            deleted: ingest.delete_by_ids(&cli.delete_ids()?).await?,
            collection: name,
        },
        (Action::Get, _) => {
            let id = cli.require_doc_id()?;
            let document = ingest.get_by_id(id).await?;
            if document.is_none() {
                info!(id, "Document is absent");
            }
            Report::Get {
                collection: name,
                id,
                found: document.is_some(),
                document,
            }
        }
        (Action::Stats, _) => Report::Stats(documents.stats().await?),
        (Action::Clear, _) => Report::Clear {
            deleted: collections.clear(&name).await?,
            collection: name,
        },
        (other, _) => return Err(eyre::eyre!("Action '{}' cannot run here", other)),
    };

    Ok(report)
}

fn insert_texts(cli: &Cli) -> Vec<String> {
    if cli.text.is_empty() {
        sample_texts()
    } else {
        cli.text.clone()
    }
}
