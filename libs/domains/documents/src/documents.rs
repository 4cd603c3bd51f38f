use std::sync::Arc;

use tracing::{debug, info};

use crate::config::MilvusSettings;
use crate::error::{DocumentError, DocumentResult};
use crate::milvus::MAX_QUERY_WINDOW;
use crate::models::{CollectionStats, Document, IdFilter, NewDocument, SearchHit};
use crate::store::VectorStore;

/// Row-level operations on one provisioned collection
///
/// Every operation first checks that the collection exists and fails with
/// [`DocumentError::CollectionNotFound`] otherwise. Input validation runs
/// before any store call, so a rejected request leaves the store untouched.
pub struct DocumentStore<S: VectorStore> {
    store: Arc<S>,
    settings: MilvusSettings,
    collection: String,
}

impl<S: VectorStore> DocumentStore<S> {
    pub fn new(store: Arc<S>, settings: MilvusSettings) -> Self {
        let collection = settings.collection_name.clone();
        Self {
            store,
            settings,
            collection,
        }
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn settings(&self) -> &MilvusSettings {
        &self.settings
    }

    pub fn dimension(&self) -> usize {
        self.settings.dimension
    }

    // ===== Validation =====

    fn validate_vector(&self, vector: &[f32]) -> DocumentResult<()> {
        if vector.len() != self.settings.dimension {
            return Err(DocumentError::Validation(format!(
                "Vector dimension {} does not match configured dimension {}",
                vector.len(),
                self.settings.dimension
            )));
        }
        Ok(())
    }

    fn validate_text(&self, text: &str) -> DocumentResult<()> {
        if text.len() > self.settings.max_length {
            return Err(DocumentError::Validation(format!(
                "Text of {} bytes exceeds max_length {}",
                text.len(),
                self.settings.max_length
            )));
        }
        Ok(())
    }

    fn validate_batch(&self, texts: &[String], vectors: &[Vec<f32>]) -> DocumentResult<()> {
        if texts.len() != vectors.len() {
            return Err(DocumentError::Validation(format!(
                "Got {} texts but {} vectors",
                texts.len(),
                vectors.len()
            )));
        }
        for text in texts {
            self.validate_text(text)?;
        }
        for vector in vectors {
            self.validate_vector(vector)?;
        }
        Ok(())
    }

    fn validate_id(id: i64) -> DocumentResult<()> {
        if id < 0 {
            return Err(DocumentError::Validation(format!(
                "Document ids must not be negative, got {}",
                id
            )));
        }
        Ok(())
    }

    async fn ensure_collection(&self) -> DocumentResult<()> {
        if self.store.has_collection(&self.collection).await? {
            Ok(())
        } else {
            Err(DocumentError::CollectionNotFound(self.collection.clone()))
        }
    }

    async fn ensure_loaded(&self) -> DocumentResult<()> {
        self.ensure_collection().await?;
        self.store.load_collection(&self.collection).await
    }

    // ===== Writes =====

    /// Insert documents under store-assigned ids and return how many were
    /// submitted
    pub async fn insert(&self, texts: &[String], vectors: Vec<Vec<f32>>) -> DocumentResult<usize> {
        self.insert_returning_ids(texts, vectors)
            .await
            .map(|ids| ids.len())
    }

    /// Like [`insert`](Self::insert) but returns the assigned ids in input
    /// order
    pub async fn insert_returning_ids(
        &self,
        texts: &[String],
        vectors: Vec<Vec<f32>>,
    ) -> DocumentResult<Vec<i64>> {
        if !self.settings.auto_id {
            return Err(DocumentError::Validation(
                "Collection uses explicit ids, call insert_with_ids".to_string(),
            ));
        }
        self.validate_batch(texts, &vectors)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_collection().await?;

        let rows = texts
            .iter()
            .zip(vectors)
            .map(|(text, vector)| NewDocument::new(text.clone(), vector))
            .collect();
        let ids = self.store.insert(&self.collection, rows).await?;
        self.store.flush(&self.collection).await?;

        info!(collection = %self.collection, count = ids.len(), "Inserted documents");
        Ok(ids)
    }

    /// Write documents under caller-chosen ids. Rows already stored under
    /// one of the ids are replaced.
    pub async fn insert_with_ids(
        &self,
        ids: &[i64],
        texts: &[String],
        vectors: Vec<Vec<f32>>,
    ) -> DocumentResult<usize> {
        if self.settings.auto_id {
            return Err(DocumentError::Validation(
                "Collection assigns ids itself, call insert".to_string(),
            ));
        }
        if ids.len() != texts.len() {
            return Err(DocumentError::Validation(format!(
                "Got {} ids but {} texts",
                ids.len(),
                texts.len()
            )));
        }
        for id in ids {
            Self::validate_id(*id)?;
        }
        self.validate_batch(texts, &vectors)?;
        if texts.is_empty() {
            return Ok(0);
        }
        self.ensure_collection().await?;

        let rows = ids
            .iter()
            .zip(texts)
            .zip(vectors)
            .map(|((id, text), vector)| NewDocument::new(text.clone(), vector).with_id(*id))
            .collect();
        let written = self.store.upsert(&self.collection, rows).await?;
        self.store.flush(&self.collection).await?;

        info!(collection = %self.collection, count = written.len(), "Wrote documents");
        Ok(written.len())
    }

    pub async fn delete_by_id(&self, id: i64) -> DocumentResult<()> {
        self.ensure_collection().await?;
        self.store.delete(&self.collection, &IdFilter::Eq(id)).await?;
        self.store.flush(&self.collection).await?;
        info!(collection = %self.collection, id, "Deleted document");
        Ok(())
    }

    /// Delete every listed id; absent ids are ignored. Returns how many ids
    /// were submitted.
    pub async fn delete_by_ids(&self, ids: &[i64]) -> DocumentResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.ensure_collection().await?;
        self.store
            .delete(&self.collection, &IdFilter::In(ids.to_vec()))
            .await?;
        self.store.flush(&self.collection).await?;
        info!(collection = %self.collection, count = ids.len(), "Deleted documents");
        Ok(ids.len())
    }

    /// Replace the document stored under `id`.
    ///
    /// This deletes the old row and inserts a new one, so readers may briefly
    /// see neither. Under store-assigned ids the new row gets a fresh id,
    /// which is returned; otherwise the row keeps `id`.
    pub async fn update(&self, id: i64, text: &str, vector: Vec<f32>) -> DocumentResult<i64> {
        self.validate_text(text)?;
        self.validate_vector(&vector)?;
        if !self.settings.auto_id {
            Self::validate_id(id)?;
        }

        if self.get_by_id(id).await?.is_none() {
            return Err(DocumentError::DocumentNotFound(id));
        }

        self.store.delete(&self.collection, &IdFilter::Eq(id)).await?;
        self.store.flush(&self.collection).await?;

        let mut row = NewDocument::new(text, vector);
        if !self.settings.auto_id {
            row = row.with_id(id);
        }
        let new_id = self
            .store
            .insert(&self.collection, vec![row])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentError::Store("Insert returned no id".to_string()))?;
        self.store.flush(&self.collection).await?;

        info!(collection = %self.collection, old_id = id, new_id, "Updated document");
        Ok(new_id)
    }

    // ===== Reads =====

    pub async fn get_by_id(&self, id: i64) -> DocumentResult<Option<Document>> {
        self.ensure_loaded().await?;
        let docs = self.store.query(&self.collection, &IdFilter::Eq(id)).await?;
        debug!(collection = %self.collection, id, found = !docs.is_empty(), "Fetched document");
        Ok(docs.into_iter().next())
    }

    /// Documents for the ids that exist; missing ids are skipped
    pub async fn get_by_ids(&self, ids: &[i64]) -> DocumentResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_loaded().await?;

        // One query per window so no id falls past the engine's result limit
        let mut docs = Vec::new();
        for chunk in ids.chunks(MAX_QUERY_WINDOW) {
            let found = self
                .store
                .query(&self.collection, &IdFilter::In(chunk.to_vec()))
                .await?;
            docs.extend(found);
        }
        Ok(docs)
    }

    /// Nearest neighbours of `vector`, closest first, with `text` projected
    pub async fn search(&self, vector: Vec<f32>, top_k: u32) -> DocumentResult<Vec<SearchHit>> {
        self.validate_vector(&vector)?;
        self.ensure_loaded().await?;
        let hits = self
            .store
            .search(&self.collection, vector, &self.settings.search_params(), top_k)
            .await?;
        debug!(collection = %self.collection, top_k, hits = hits.len(), "Searched collection");
        Ok(hits)
    }

    /// Row count as reported by the engine, which may lag recent writes
    pub async fn stats(&self) -> DocumentResult<CollectionStats> {
        self.ensure_loaded().await?;
        let row_count = self.store.row_count(&self.collection).await?;
        Ok(CollectionStats {
            collection_name: self.collection.clone(),
            row_count,
        })
    }
}
