use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::MilvusSettings;
use crate::error::{DocumentError, DocumentResult};
use crate::milvus::MAX_QUERY_WINDOW;
use crate::models::{CollectionHandle, IdFilter};
use crate::store::VectorStore;

/// Creates, drops, empties and lists document collections
pub struct CollectionManager<S: VectorStore> {
    store: Arc<S>,
    settings: MilvusSettings,
}

/// Store rejections during schema or index creation are provisioning errors
fn as_provision(err: DocumentError) -> DocumentError {
    match err {
        DocumentError::Store(msg) => DocumentError::Provision(msg),
        other => other,
    }
}

impl<S: VectorStore> CollectionManager<S> {
    pub fn new(store: Arc<S>, settings: MilvusSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &MilvusSettings {
        &self.settings
    }

    /// Ensure `name` exists with the document schema and a vector index.
    ///
    /// An existing collection is returned as is. Its stored dimension is
    /// not compared with `dimension`.
    pub async fn provision(
        &self,
        name: &str,
        dimension: usize,
    ) -> DocumentResult<CollectionHandle> {
        if dimension == 0 {
            return Err(DocumentError::Validation(
                "Vector dimension must be positive".to_string(),
            ));
        }

        if self.store.has_collection(name).await? {
            warn!(
                collection = %name,
                dimension,
                "Reusing existing collection; its dimension is not verified"
            );
            return Ok(CollectionHandle {
                name: name.to_string(),
                dimension,
                created: false,
            });
        }

        let schema = self.settings.document_schema(name, dimension);
        self.store
            .create_collection(&schema)
            .await
            .map_err(as_provision)?;
        debug!(collection = %name, "Collection created, building index");

        self.store
            .create_index(name, &self.settings.vector_field, &self.settings.index_params())
            .await
            .map_err(as_provision)?;

        info!(
            collection = %name,
            dimension,
            metric = %self.settings.metric_type,
            index = %self.settings.index_type,
            "Provisioned collection"
        );
        Ok(CollectionHandle {
            name: name.to_string(),
            dimension,
            created: true,
        })
    }

    /// Provision the configured collection at the configured dimension
    pub async fn provision_default(&self) -> DocumentResult<CollectionHandle> {
        self.provision(&self.settings.collection_name, self.settings.dimension)
            .await
    }

    pub async fn exists(&self, name: &str) -> DocumentResult<bool> {
        self.store.has_collection(name).await
    }

    async fn require(&self, name: &str) -> DocumentResult<()> {
        if self.store.has_collection(name).await? {
            Ok(())
        } else {
            Err(DocumentError::CollectionNotFound(name.to_string()))
        }
    }

    /// Irreversibly remove `name` with all its rows
    pub async fn drop_collection(&self, name: &str) -> DocumentResult<()> {
        self.require(name).await?;
        self.store.drop_collection(name).await?;
        info!(collection = %name, "Dropped collection");
        Ok(())
    }

    /// Delete every row of `name` but keep its schema and index.
    ///
    /// Returns the number of distinct ids deleted. A re-query may still
    /// see rows deleted by an earlier window; those are not counted again.
    pub async fn clear(&self, name: &str) -> DocumentResult<usize> {
        self.require(name).await?;
        self.store.load_collection(name).await?;

        let mut deleted = HashSet::new();
        loop {
            let ids = self
                .store
                .query_ids(name, &IdFilter::All, MAX_QUERY_WINDOW)
                .await?;
            let batch = ids.len();
            let fresh: Vec<i64> = ids.into_iter().filter(|id| !deleted.contains(id)).collect();
            if fresh.is_empty() {
                break;
            }

            deleted.extend(fresh.iter().copied());
            let fresh_count = fresh.len();
            self.store.delete(name, &IdFilter::In(fresh)).await?;
            self.store.flush(name).await?;
            debug!(collection = %name, batch = fresh_count, "Deleted batch");

            if batch < MAX_QUERY_WINDOW {
                break;
            }
        }

        info!(collection = %name, deleted = deleted.len(), "Cleared collection");
        Ok(deleted.len())
    }

    pub async fn list(&self) -> DocumentResult<Vec<String>> {
        self.store.list_collections().await
    }
}
