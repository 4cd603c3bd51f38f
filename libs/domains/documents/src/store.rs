use async_trait::async_trait;

use crate::error::DocumentResult;
use crate::models::{
    CollectionSchema, Document, IdFilter, IndexParams, NewDocument, SearchHit, SearchParams,
};

/// Operations the document layer needs from a vector search engine.
///
/// The engine owns durability, indexing and distance computation. Callers in
/// this crate only ever pass collection names they have just checked with
/// [`VectorStore::has_collection`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    // ===== Connection =====

    /// Verify the engine is reachable. Calling it again is a no-op.
    async fn connect(&self) -> DocumentResult<()>;

    /// Release the connection. Never fails; problems are logged.
    async fn disconnect(&self);

    // ===== Collections =====

    async fn has_collection(&self, name: &str) -> DocumentResult<bool>;

    async fn create_collection(&self, schema: &CollectionSchema) -> DocumentResult<()>;

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        params: &IndexParams,
    ) -> DocumentResult<()>;

    async fn list_collections(&self) -> DocumentResult<Vec<String>>;

    async fn drop_collection(&self, name: &str) -> DocumentResult<()>;

    /// Make the collection available for query and search
    async fn load_collection(&self, name: &str) -> DocumentResult<()>;

    /// Persist buffered writes so they become visible to reads
    async fn flush(&self, name: &str) -> DocumentResult<()>;

    /// Entity count as reported by the engine; may lag just-flushed writes
    async fn row_count(&self, name: &str) -> DocumentResult<u64>;

    // ===== Rows =====

    /// Insert rows in one call and return their primary keys in input order
    async fn insert(&self, collection: &str, rows: Vec<NewDocument>) -> DocumentResult<Vec<i64>>;

    /// Insert or replace rows by primary key. Only valid with caller ids.
    async fn upsert(&self, collection: &str, rows: Vec<NewDocument>) -> DocumentResult<Vec<i64>>;

    async fn delete(&self, collection: &str, filter: &IdFilter) -> DocumentResult<()>;

    /// Full rows matching `filter`
    async fn query(&self, collection: &str, filter: &IdFilter) -> DocumentResult<Vec<Document>>;

    /// Primary keys matching `filter`, at most `limit` of them
    async fn query_ids(
        &self,
        collection: &str,
        filter: &IdFilter,
        limit: usize,
    ) -> DocumentResult<Vec<i64>>;

    /// Approximate nearest neighbours of `vector`, closest first
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        params: &SearchParams,
        limit: u32,
    ) -> DocumentResult<Vec<SearchHit>>;
}
