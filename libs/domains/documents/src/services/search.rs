use std::sync::Arc;

use tracing::instrument;

use crate::documents::DocumentStore;
use crate::embedding::{encode_text, Vectorizer};
use crate::error::DocumentResult;
use crate::models::SearchResult;
use crate::store::VectorStore;

/// Text-in, ranked-documents-out similarity search
pub struct SearchService<S: VectorStore> {
    documents: Arc<DocumentStore<S>>,
    vectorizer: Arc<dyn Vectorizer>,
}

impl<S: VectorStore> SearchService<S> {
    pub fn new(documents: Arc<DocumentStore<S>>, vectorizer: Arc<dyn Vectorizer>) -> Self {
        Self {
            documents,
            vectorizer,
        }
    }

    /// Top `top_k` matches for `query` in store order, closest first.
    /// Uses the configured default when `top_k` is `None`.
    #[instrument(skip(self), fields(collection = %self.documents.collection_name()))]
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<u32>,
    ) -> DocumentResult<Vec<SearchResult>> {
        let top_k = top_k.unwrap_or(self.documents.settings().top_k_default);
        let vector = encode_text(self.vectorizer.as_ref(), query).await?;
        let hits = self.documents.search(vector, top_k).await?;

        Ok(hits.into_iter().map(SearchResult::from_hit).collect())
    }
}
