//! In-process vector store
//!
//! Exact brute-force search over rows held in memory. It mirrors the parts
//! of Milvus behaviour the document layer relies on: collections must be
//! loaded before they are read, `row_count` only sees flushed rows and the
//! schema dimension is enforced on every write and search.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{DocumentError, DocumentResult};
use crate::models::{
    CollectionSchema, Document, IdFilter, IndexParams, MetricType, NewDocument, SearchHit,
    SearchParams,
};
use crate::store::VectorStore;

#[derive(Debug, Clone)]
struct StoredRow {
    text: String,
    vector: Vec<f32>,
    flushed: bool,
}

#[derive(Debug)]
struct MemCollection {
    schema: CollectionSchema,
    dimension: usize,
    max_length: usize,
    rows: BTreeMap<i64, StoredRow>,
    next_id: i64,
    index: Option<IndexParams>,
    loaded: bool,
}

impl MemCollection {
    fn new(schema: CollectionSchema) -> DocumentResult<Self> {
        let (_, dimension) = schema.vector_field().ok_or_else(|| {
            DocumentError::Store(format!("Schema '{}' has no vector field", schema.name))
        })?;
        let max_length = schema.text_field().map(|(_, len)| len).unwrap_or(usize::MAX);
        if schema.primary_field().is_none() {
            return Err(DocumentError::Store(format!(
                "Schema '{}' has no primary field",
                schema.name
            )));
        }

        Ok(Self {
            dimension,
            max_length,
            schema,
            rows: BTreeMap::new(),
            next_id: 1,
            index: None,
            loaded: false,
        })
    }

    fn check_row(&self, row: &NewDocument) -> DocumentResult<()> {
        if row.vector.len() != self.dimension {
            return Err(DocumentError::Store(format!(
                "Vector dimension {} does not match collection dimension {}",
                row.vector.len(),
                self.dimension
            )));
        }
        if row.text.len() > self.max_length {
            return Err(DocumentError::Store(format!(
                "Text of {} bytes exceeds max_length {}",
                row.text.len(),
                self.max_length
            )));
        }
        Ok(())
    }

    fn ensure_loaded(&self) -> DocumentResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(DocumentError::Store(format!(
                "Collection '{}' is not loaded",
                self.schema.name
            )))
        }
    }

    fn put(&mut self, id: i64, row: NewDocument) {
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.rows.insert(
            id,
            StoredRow {
                text: row.text,
                vector: row.vector,
                flushed: false,
            },
        );
    }
}

/// Exact in-memory [`VectorStore`] for tests and offline runs
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
    connected: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_connected(&self) -> DocumentResult<()> {
        if self.connected.load(AtomicOrdering::Acquire) {
            Ok(())
        } else {
            Err(DocumentError::Connection(
                "Not connected, call connect first".to_string(),
            ))
        }
    }

    fn missing(name: &str) -> DocumentError {
        DocumentError::Store(format!("Collection '{}' not found", name))
    }

    fn read<T>(
        &self,
        name: &str,
        f: impl FnOnce(&MemCollection) -> DocumentResult<T>,
    ) -> DocumentResult<T> {
        self.check_connected()?;
        let collections = self.collections.read();
        let collection = collections.get(name).ok_or_else(|| Self::missing(name))?;
        f(collection)
    }

    fn write<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut MemCollection) -> DocumentResult<T>,
    ) -> DocumentResult<T> {
        self.check_connected()?;
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| Self::missing(name))?;
        f(collection)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Raw distance as Milvus reports it for `metric`
fn distance(metric: MetricType, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        MetricType::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
        MetricType::Ip => dot(a, b),
        MetricType::Cosine => {
            let norm = dot(a, a).sqrt() * dot(b, b).sqrt();
            if norm == 0.0 {
                0.0
            } else {
                dot(a, b) / norm
            }
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn connect(&self) -> DocumentResult<()> {
        if !self.connected.swap(true, AtomicOrdering::AcqRel) {
            tracing::debug!("In-memory store connected");
        }
        Ok(())
    }

    async fn disconnect(&self) {
        if self.connected.swap(false, AtomicOrdering::AcqRel) {
            tracing::debug!("In-memory store disconnected");
        }
    }

    async fn has_collection(&self, name: &str) -> DocumentResult<bool> {
        self.check_connected()?;
        Ok(self.collections.read().contains_key(name))
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> DocumentResult<()> {
        self.check_connected()?;
        let mut collections = self.collections.write();
        if collections.contains_key(&schema.name) {
            return Err(DocumentError::Store(format!(
                "Collection '{}' already exists",
                schema.name
            )));
        }
        collections.insert(schema.name.clone(), MemCollection::new(schema.clone())?);
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        params: &IndexParams,
    ) -> DocumentResult<()> {
        self.write(collection, |c| {
            match c.schema.vector_field() {
                Some((name, _)) if name == field => {}
                _ => {
                    return Err(DocumentError::Store(format!(
                        "'{}' is not a vector field of '{}'",
                        field, collection
                    )))
                }
            }
            c.index = Some(params.clone());
            Ok(())
        })
    }

    async fn list_collections(&self) -> DocumentResult<Vec<String>> {
        self.check_connected()?;
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> DocumentResult<()> {
        self.check_connected()?;
        self.collections.write().remove(name);
        Ok(())
    }

    async fn load_collection(&self, name: &str) -> DocumentResult<()> {
        self.write(name, |c| {
            if c.index.is_none() {
                return Err(DocumentError::Store(format!(
                    "Collection '{}' has no index to load",
                    name
                )));
            }
            c.loaded = true;
            Ok(())
        })
    }

    async fn flush(&self, name: &str) -> DocumentResult<()> {
        self.write(name, |c| {
            c.rows.values_mut().for_each(|row| row.flushed = true);
            Ok(())
        })
    }

    async fn row_count(&self, name: &str) -> DocumentResult<u64> {
        self.read(name, |c| {
            Ok(c.rows.values().filter(|row| row.flushed).count() as u64)
        })
    }

    async fn insert(&self, collection: &str, rows: Vec<NewDocument>) -> DocumentResult<Vec<i64>> {
        self.write(collection, |c| {
            for row in &rows {
                c.check_row(row)?;
                match (c.schema.auto_id, row.id) {
                    (true, Some(_)) => {
                        return Err(DocumentError::Store(
                            "Primary key is auto-assigned, rows must not carry ids".to_string(),
                        ))
                    }
                    (false, None) => {
                        return Err(DocumentError::Store(
                            "Every row needs a primary key".to_string(),
                        ))
                    }
                    _ => {}
                }
            }

            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id = row.id.unwrap_or(c.next_id);
                c.put(id, row);
                ids.push(id);
            }
            Ok(ids)
        })
    }

    async fn upsert(&self, collection: &str, rows: Vec<NewDocument>) -> DocumentResult<Vec<i64>> {
        self.write(collection, |c| {
            if c.schema.auto_id {
                return Err(DocumentError::Store(
                    "Upsert needs caller-assigned primary keys".to_string(),
                ));
            }
            for row in &rows {
                c.check_row(row)?;
            }

            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id = row.id.ok_or_else(|| {
                    DocumentError::Store("Every row needs a primary key".to_string())
                })?;
                c.put(id, row);
                ids.push(id);
            }
            Ok(ids)
        })
    }

    async fn delete(&self, collection: &str, filter: &IdFilter) -> DocumentResult<()> {
        self.write(collection, |c| {
            c.rows.retain(|id, _| !filter.matches(*id));
            Ok(())
        })
    }

    async fn query(&self, collection: &str, filter: &IdFilter) -> DocumentResult<Vec<Document>> {
        self.read(collection, |c| {
            c.ensure_loaded()?;
            Ok(c.rows
                .iter()
                .filter(|(id, _)| filter.matches(**id))
                .map(|(id, row)| Document {
                    id: *id,
                    text: row.text.clone(),
                    vector: row.vector.clone(),
                })
                .collect())
        })
    }

    async fn query_ids(
        &self,
        collection: &str,
        filter: &IdFilter,
        limit: usize,
    ) -> DocumentResult<Vec<i64>> {
        self.read(collection, |c| {
            c.ensure_loaded()?;
            Ok(c.rows
                .keys()
                .copied()
                .filter(|id| filter.matches(*id))
                .take(limit)
                .collect())
        })
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        params: &SearchParams,
        limit: u32,
    ) -> DocumentResult<Vec<SearchHit>> {
        self.read(collection, |c| {
            c.ensure_loaded()?;
            if limit == 0 {
                return Err(DocumentError::Store("Search limit must be positive".to_string()));
            }
            if vector.len() != c.dimension {
                return Err(DocumentError::Store(format!(
                    "Query dimension {} does not match collection dimension {}",
                    vector.len(),
                    c.dimension
                )));
            }

            let metric = params.metric_type;
            let mut hits: Vec<SearchHit> = c
                .rows
                .iter()
                .map(|(id, row)| SearchHit {
                    id: *id,
                    text: row.text.clone(),
                    distance: distance(metric, &vector, &row.vector),
                })
                .collect();

            // Closest first, ties broken by ascending id
            hits.sort_by(|a, b| {
                let by_distance = if metric.smaller_is_closer() {
                    a.distance.partial_cmp(&b.distance)
                } else {
                    b.distance.partial_cmp(&a.distance)
                };
                by_distance
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            hits.truncate(limit as usize);
            Ok(hits)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MilvusSettings;

    async fn ready_store(settings: &MilvusSettings) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.connect().await.unwrap();
        let schema = settings.document_schema("docs", 3);
        store.create_collection(&schema).await.unwrap();
        store
            .create_index("docs", "embedding", &settings.index_params())
            .await
            .unwrap();
        store.load_collection("docs").await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let store = InMemoryStore::new();
        let err = store.list_collections().await.unwrap_err();
        assert!(matches!(err, DocumentError::Connection(_)));
    }

    #[tokio::test]
    async fn test_auto_ids_are_assigned_in_order() {
        let store = ready_store(&MilvusSettings::default()).await;
        let ids = store
            .insert(
                "docs",
                vec![
                    NewDocument::new("a", vec![1.0, 0.0, 0.0]),
                    NewDocument::new("b", vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_row_count_sees_flushed_rows_only() {
        let store = ready_store(&MilvusSettings::default()).await;
        store
            .insert("docs", vec![NewDocument::new("a", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.row_count("docs").await.unwrap(), 0);
        store.flush("docs").await.unwrap();
        assert_eq!(store.row_count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_wrong_dimension() {
        let store = ready_store(&MilvusSettings::default()).await;
        let err = store
            .insert("docs", vec![NewDocument::new("a", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Store(_)));
        assert!(store.query_ids("docs", &IdFilter::All, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_orders_by_l2_distance() {
        let settings = MilvusSettings::default();
        let store = ready_store(&settings).await;
        store
            .insert(
                "docs",
                vec![
                    NewDocument::new("x", vec![1.0, 0.0, 0.0]),
                    NewDocument::new("y", vec![0.0, 1.0, 0.0]),
                    NewDocument::new("xy", vec![0.7, 0.7, 0.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store
            .search("docs", vec![1.0, 0.0, 0.0], &settings.search_params(), 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "x");
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].text, "xy");
    }

    #[tokio::test]
    async fn test_search_orders_by_inner_product() {
        let settings = MilvusSettings::default().with_metric(MetricType::Ip);
        let store = ready_store(&settings).await;
        store
            .insert(
                "docs",
                vec![
                    NewDocument::new("small", vec![0.1, 0.0, 0.0]),
                    NewDocument::new("large", vec![2.0, 0.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store
            .search("docs", vec![1.0, 0.0, 0.0], &settings.search_params(), 5)
            .await
            .unwrap();
        assert_eq!(hits[0].text, "large");
    }

    #[tokio::test]
    async fn test_search_rejects_zero_limit() {
        let settings = MilvusSettings::default();
        let store = ready_store(&settings).await;
        let err = store
            .search("docs", vec![1.0, 0.0, 0.0], &settings.search_params(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Store(_)));
    }

    #[tokio::test]
    async fn test_reads_require_load() {
        let settings = MilvusSettings::default();
        let store = InMemoryStore::new();
        store.connect().await.unwrap();
        store
            .create_collection(&settings.document_schema("docs", 3))
            .await
            .unwrap();

        assert!(store.query("docs", &IdFilter::All).await.is_err());
        assert!(store.load_collection("docs").await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let settings = MilvusSettings::default().with_auto_id(false);
        let store = ready_store(&settings).await;
        store
            .insert("docs", vec![NewDocument::new("old", vec![1.0, 0.0, 0.0]).with_id(7)])
            .await
            .unwrap();
        store
            .upsert("docs", vec![NewDocument::new("new", vec![0.0, 1.0, 0.0]).with_id(7)])
            .await
            .unwrap();

        let docs = store.query("docs", &IdFilter::Eq(7)).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "new");
    }

    #[tokio::test]
    async fn test_delete_by_filter() {
        let store = ready_store(&MilvusSettings::default()).await;
        let ids = store
            .insert(
                "docs",
                vec![
                    NewDocument::new("a", vec![1.0, 0.0, 0.0]),
                    NewDocument::new("b", vec![0.0, 1.0, 0.0]),
                    NewDocument::new("c", vec![0.0, 0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        store
            .delete("docs", &IdFilter::In(vec![ids[0], ids[2]]))
            .await
            .unwrap();
        let left = store.query_ids("docs", &IdFilter::All, 10).await.unwrap();
        assert_eq!(left, vec![ids[1]]);
    }

    #[test]
    fn test_cosine_distance() {
        assert!((distance(MetricType::Cosine, &[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(distance(MetricType::Cosine, &[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(distance(MetricType::Cosine, &[0.0, 0.0], &[0.0, 1.0]), 0.0);
    }
}
