//! End-to-end document scenarios against the in-memory store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain_documents::{
    CollectionManager, DocumentError, DocumentResult, DocumentStore, HashingVectorizer,
    InMemoryStore, IngestService, MilvusSettings, SearchService, VectorStore, Vectorizer,
};
use test_utils::TestDataBuilder;
use test_utils::assertions::{assert_some, assert_vectors_close};

/// Maps known texts to fixed vectors
struct TableVectorizer {
    dimension: usize,
    table: HashMap<String, Vec<f32>>,
}

impl TableVectorizer {
    fn new(dimension: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            dimension,
            table: entries
                .iter()
                .map(|(text, vector)| (text.to_string(), vector.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl Vectorizer for TableVectorizer {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> DocumentResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| {
                self.table
                    .get(text)
                    .cloned()
                    .ok_or_else(|| DocumentError::Embedding(format!("unknown text '{}'", text)))
            })
            .collect()
    }
}

struct Fixture {
    store: Arc<InMemoryStore>,
    collections: CollectionManager<InMemoryStore>,
    documents: Arc<DocumentStore<InMemoryStore>>,
    name: String,
}

async fn fixture(test_name: &str, settings: MilvusSettings) -> Fixture {
    let name = TestDataBuilder::from_test_name(test_name).collection_name("docs");
    let settings = settings.with_collection_name(&name);

    let store = Arc::new(InMemoryStore::new());
    store.connect().await.unwrap();

    let collections = CollectionManager::new(store.clone(), settings.clone());
    collections.provision_default().await.unwrap();
    let documents = Arc::new(DocumentStore::new(store.clone(), settings));

    Fixture {
        store,
        collections,
        documents,
        name,
    }
}

fn dim3() -> MilvusSettings {
    MilvusSettings::default().with_dimension(3)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_insert_then_search_nearest() {
    let fx = fixture("test_insert_then_search_nearest", dim3()).await;
    let vectorizer: Arc<dyn Vectorizer> = Arc::new(TableVectorizer::new(
        3,
        &[
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.0, 1.0, 0.0]),
            ("like a", vec![1.0, 0.0, 0.0]),
        ],
    ));

    let ingest = IngestService::new(fx.documents.clone()).with_vectorizer(vectorizer.clone());
    assert_eq!(ingest.insert_texts(&strings(&["a", "b"])).await.unwrap(), 2);

    let results = SearchService::new(fx.documents.clone(), vectorizer)
        .search("like a", Some(1))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "a");
    assert_eq!(results[0].distance, 0.0);
    assert_eq!(results[0].score, 1.0);
}

#[tokio::test]
async fn test_absent_document() {
    let fx = fixture("test_absent_document", dim3()).await;

    assert!(fx.documents.get_by_id(999).await.unwrap().is_none());

    let err = fx
        .documents
        .update(999, "x", vec![0.0, 0.0, 1.0])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::DocumentNotFound(999)));
}

#[tokio::test]
async fn test_clear_keeps_collection() {
    let fx = fixture("test_clear_keeps_collection", dim3()).await;
    let builder = TestDataBuilder::from_test_name("test_clear_keeps_collection");

    let texts = builder.texts(5);
    let vectors = (0..5).map(|i| builder.unit_vector(3, i)).collect();
    assert_eq!(fx.documents.insert(&texts, vectors).await.unwrap(), 5);

    assert_eq!(fx.collections.clear(&fx.name).await.unwrap(), 5);
    assert_eq!(fx.documents.stats().await.unwrap().row_count, 0);
    assert!(fx.collections.list().await.unwrap().contains(&fx.name));

    // A cleared collection still accepts writes
    fx.documents
        .insert(&strings(&["again"]), vec![vec![1.0, 1.0, 1.0]])
        .await
        .unwrap();
    assert_eq!(fx.documents.stats().await.unwrap().row_count, 1);
}

#[tokio::test]
async fn test_clear_empty_collection() {
    let fx = fixture("test_clear_empty_collection", dim3()).await;
    assert_eq!(fx.collections.clear(&fx.name).await.unwrap(), 0);
}

#[tokio::test]
async fn test_provision_is_idempotent() {
    let fx = fixture("test_provision_is_idempotent", dim3()).await;

    let again = fx.collections.provision(&fx.name, 3).await.unwrap();
    assert!(!again.created);

    let names = fx.collections.list().await.unwrap();
    assert_eq!(names.iter().filter(|n| **n == fx.name).count(), 1);
}

#[tokio::test]
async fn test_row_count_grows_by_inserted() {
    let fx = fixture("test_row_count_grows_by_inserted", dim3()).await;
    let before = fx.documents.stats().await.unwrap().row_count;

    let texts = strings(&["one", "two", "three"]);
    let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];
    let inserted = fx.documents.insert(&texts, vectors).await.unwrap();

    let after = fx.documents.stats().await.unwrap().row_count;
    assert!(after >= before + inserted as u64);
}

#[tokio::test]
async fn test_update_moves_document_to_fresh_id() {
    let fx = fixture("test_update_moves_document_to_fresh_id", dim3()).await;

    let ids = fx
        .documents
        .insert_returning_ids(&strings(&["old"]), vec![vec![1.0, 0.0, 0.0]])
        .await
        .unwrap();
    let old_id = ids[0];

    let new_id = fx
        .documents
        .update(old_id, "new", vec![0.0, 1.0, 0.0])
        .await
        .unwrap();

    assert_ne!(new_id, old_id);
    assert!(fx.documents.get_by_id(old_id).await.unwrap().is_none());

    let doc = assert_some(fx.documents.get_by_id(new_id).await.unwrap(), "updated doc");
    assert_eq!(doc.text, "new");
    assert_vectors_close(&doc.vector, &[0.0, 1.0, 0.0], 1e-6, "updated vector");
}

#[tokio::test]
async fn test_update_keeps_explicit_id() {
    let fx = fixture(
        "test_update_keeps_explicit_id",
        dim3().with_auto_id(false),
    )
    .await;

    fx.documents
        .insert_with_ids(&[42], &strings(&["old"]), vec![vec![1.0, 0.0, 0.0]])
        .await
        .unwrap();

    let id = fx
        .documents
        .update(42, "new", vec![0.0, 0.0, 1.0])
        .await
        .unwrap();
    assert_eq!(id, 42);

    let doc = assert_some(fx.documents.get_by_id(42).await.unwrap(), "doc 42");
    assert_eq!(doc.text, "new");
}

#[tokio::test]
async fn test_batch_delete_is_idempotent() {
    let fx = fixture("test_batch_delete_is_idempotent", dim3()).await;
    let ids = fx
        .documents
        .insert_returning_ids(
            &strings(&["x", "y", "z"]),
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .await
        .unwrap();

    assert_eq!(fx.documents.delete_by_ids(&ids).await.unwrap(), 3);
    assert_eq!(fx.documents.delete_by_ids(&ids).await.unwrap(), 3);
    assert!(fx.documents.get_by_ids(&ids).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_by_ids_skips_missing() {
    let fx = fixture("test_get_by_ids_skips_missing", dim3()).await;
    let ids = fx
        .documents
        .insert_returning_ids(
            &strings(&["p", "q"]),
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
        )
        .await
        .unwrap();

    let docs = fx
        .documents
        .get_by_ids(&[ids[0], 10_000, ids[1]])
        .await
        .unwrap();
    let mut texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
    texts.sort();
    assert_eq!(texts, ["p", "q"]);
}

#[tokio::test]
async fn test_dropped_collection_is_not_found() {
    let fx = fixture("test_dropped_collection_is_not_found", dim3()).await;

    fx.collections.drop_collection(&fx.name).await.unwrap();
    assert!(!fx.collections.exists(&fx.name).await.unwrap());

    let err = fx
        .documents
        .insert(&strings(&["late"]), vec![vec![1.0, 0.0, 0.0]])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::CollectionNotFound(ref name) if *name == fx.name));
    assert!(fx.documents.stats().await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_hashing_vectorizer_ranks_shared_words_first() {
    let vectorizer = Arc::new(HashingVectorizer::new(128).unwrap());
    let settings = MilvusSettings::default().with_dimension(vectorizer.dimension());
    let fx = fixture("test_hashing_vectorizer_ranks_shared_words_first", settings).await;

    let ingest = IngestService::new(fx.documents.clone()).with_vectorizer(vectorizer.clone());
    ingest
        .insert_texts(&strings(&[
            "Milvus is an open source vector database",
            "Bread is baked from flour and water",
            "The river flows into the sea",
        ]))
        .await
        .unwrap();

    let results = SearchService::new(fx.documents.clone(), vectorizer)
        .search("open source vector database", Some(3))
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].text.starts_with("Milvus"));
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn test_disconnected_store_refuses_calls() {
    let fx = fixture("test_disconnected_store_refuses_calls", dim3()).await;
    fx.store.disconnect().await;

    let err = fx.collections.list().await.unwrap_err();
    assert!(matches!(err, DocumentError::Connection(_)));
}
