use std::sync::Arc;

use tracing::instrument;

use crate::documents::DocumentStore;
use crate::embedding::{encode_text, Vectorizer};
use crate::error::{DocumentError, DocumentResult};
use crate::models::Document;
use crate::store::VectorStore;

/// Encodes texts and writes them to the document store
pub struct IngestService<S: VectorStore> {
    documents: Arc<DocumentStore<S>>,
    vectorizer: Option<Arc<dyn Vectorizer>>,
}

impl<S: VectorStore> IngestService<S> {
    /// A service for reads and deletes only
    pub fn new(documents: Arc<DocumentStore<S>>) -> Self {
        Self {
            documents,
            vectorizer: None,
        }
    }

    pub fn with_vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    fn vectorizer(&self) -> DocumentResult<&dyn Vectorizer> {
        self.vectorizer
            .as_deref()
            .ok_or_else(|| DocumentError::Config("No vectorizer configured".to_string()))
    }

    /// Encode and insert `texts`, returning how many were submitted
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn insert_texts(&self, texts: &[String]) -> DocumentResult<usize> {
        let vectors = self.vectorizer()?.encode(texts).await?;
        self.documents.insert(texts, vectors).await
    }

    /// Re-encode `text` and replace document `id`. Returns the id it is now
    /// stored under.
    #[instrument(skip(self, text))]
    pub async fn update_text(&self, id: i64, text: &str) -> DocumentResult<i64> {
        let vector = encode_text(self.vectorizer()?, text).await?;
        self.documents.update(id, text, vector).await
    }

    #[instrument(skip(self))]
    pub async fn delete_by_ids(&self, ids: &[i64]) -> DocumentResult<usize> {
        match ids {
            [id] => self.documents.delete_by_id(*id).await.map(|_| 1),
            _ => self.documents.delete_by_ids(ids).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> DocumentResult<Option<Document>> {
        self.documents.get_by_id(id).await
    }
}
