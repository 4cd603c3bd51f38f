//! Documents Domain Library
//!
//! Stores short texts together with their embedding vectors in a Milvus
//! collection and answers "which stored texts are most similar to this one"
//! queries.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  ┌────────────────┐
//! │ SearchService  │  │ IngestService  │  ← text in, encode, delegate
//! └───────┬────────┘  └───────┬────────┘
//!         │                   │
//! ┌───────▼───────────────────▼──┐   ┌──────────────────┐
//! │        DocumentStore         │   │    Vectorizer    │
//! │ (validation, row operations) │   │     (trait)      │
//! └───────────────┬──────────────┘   └────────┬─────────┘
//!                 │                           │
//! ┌───────────────▼──────────────┐   ┌────────▼─────────┐
//! │     VectorStore (trait)      │   │   HttpEmbedder   │
//! │ MilvusStore | InMemoryStore  │   │ HashingVectorizer│
//! └──────────────────────────────┘   └──────────────────┘
//! ```
//!
//! `CollectionManager` sits next to `DocumentStore` and owns the collection
//! lifecycle: provision, drop, clear and list.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use core_config::FromEnv;
//! use domain_documents::{
//!     CollectionManager, DocumentStore, HttpEmbedder, IngestService, MilvusSettings,
//!     MilvusStore, SearchService, VectorStore, Vectorizer,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder: Arc<dyn Vectorizer> = Arc::new(HttpEmbedder::from_env().await?);
//! let settings = MilvusSettings::from_env()?.with_dimension(embedder.dimension());
//!
//! let store = Arc::new(MilvusStore::new(&settings)?);
//! store.connect().await?;
//!
//! CollectionManager::new(store.clone(), settings.clone())
//!     .provision_default()
//!     .await?;
//!
//! let documents = Arc::new(DocumentStore::new(store.clone(), settings));
//! IngestService::new(documents.clone())
//!     .with_vectorizer(embedder.clone())
//!     .insert_texts(&["Milvus is a vector database".to_string()])
//!     .await?;
//!
//! let results = SearchService::new(documents, embedder)
//!     .search("vector database", Some(3))
//!     .await?;
//! store.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod collections;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod milvus;
pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use collections::CollectionManager;
pub use config::MilvusSettings;
pub use documents::DocumentStore;
pub use embedding::{encode_text, EmbeddingConfig, HashingVectorizer, HttpEmbedder, Vectorizer};
pub use error::{DocumentError, DocumentResult};
pub use memory::InMemoryStore;
pub use milvus::{MilvusConnection, MilvusStore};
pub use models::{
    Action, CollectionHandle, CollectionStats, Document, IdFilter, IndexType, MetricType,
    NewDocument, SearchHit, SearchResult,
};
pub use services::{IngestService, SearchService};
pub use store::VectorStore;
