use async_trait::async_trait;
use serde_json::json;

use super::connection::MilvusConnection;
use super::wire::{
    collect_ids, row_to_document, row_to_hit, row_to_id, CollectionRef, CollectionStatsData,
    CreateCollectionRequest, CreateIndexRequest, DeleteRequest, FieldNames, HasCollection,
    InsertData, InsertRequest, QueryRequest, Row, SearchRequest, UpsertData,
};
use crate::config::MilvusSettings;
use crate::error::{DocumentError, DocumentResult};
use crate::models::{
    CollectionSchema, Document, IdFilter, IndexParams, NewDocument, SearchHit, SearchParams,
};
use crate::store::VectorStore;

/// Largest result window a single Milvus query may return
pub const MAX_QUERY_WINDOW: usize = 16_384;

mod paths {
    pub const HAS: &str = "/v2/vectordb/collections/has";
    pub const CREATE: &str = "/v2/vectordb/collections/create";
    pub const LIST: &str = "/v2/vectordb/collections/list";
    pub const DROP: &str = "/v2/vectordb/collections/drop";
    pub const LOAD: &str = "/v2/vectordb/collections/load";
    pub const FLUSH: &str = "/v2/vectordb/collections/flush";
    pub const STATS: &str = "/v2/vectordb/collections/get_stats";
    pub const CREATE_INDEX: &str = "/v2/vectordb/indexes/create";
    pub const INSERT: &str = "/v2/vectordb/entities/insert";
    pub const UPSERT: &str = "/v2/vectordb/entities/upsert";
    pub const DELETE: &str = "/v2/vectordb/entities/delete";
    pub const QUERY: &str = "/v2/vectordb/entities/query";
    pub const SEARCH: &str = "/v2/vectordb/entities/search";
}

/// Milvus-backed implementation of [`VectorStore`] over the RESTful API v2
#[derive(Debug)]
pub struct MilvusStore {
    conn: MilvusConnection,
    fields: FieldNames,
}

impl MilvusStore {
    pub fn new(settings: &MilvusSettings) -> DocumentResult<Self> {
        Ok(Self {
            conn: MilvusConnection::new(settings)?,
            fields: FieldNames {
                id: settings.id_field.clone(),
                text: settings.text_field.clone(),
                vector: settings.vector_field.clone(),
            },
        })
    }

    pub fn connection(&self) -> &MilvusConnection {
        &self.conn
    }

    fn window(filter: &IdFilter) -> usize {
        match filter {
            IdFilter::Eq(_) => 1,
            IdFilter::In(ids) => ids.len().clamp(1, MAX_QUERY_WINDOW),
            IdFilter::All => MAX_QUERY_WINDOW,
        }
    }

    async fn query_rows(
        &self,
        collection: &str,
        filter: &IdFilter,
        output_fields: Vec<&str>,
        limit: usize,
    ) -> DocumentResult<Vec<Row>> {
        let request = QueryRequest {
            collection_name: collection,
            filter: filter.to_expr(&self.fields.id),
            output_fields,
            limit: limit.min(MAX_QUERY_WINDOW),
        };
        let rows: Option<Vec<Row>> = self.conn.post(paths::QUERY, &request).await?;
        Ok(rows.unwrap_or_default())
    }
}

#[async_trait]
impl VectorStore for MilvusStore {
    async fn connect(&self) -> DocumentResult<()> {
        self.conn.connect().await
    }

    async fn disconnect(&self) {
        self.conn.disconnect();
    }

    async fn has_collection(&self, name: &str) -> DocumentResult<bool> {
        let data: HasCollection = self
            .conn
            .call(paths::HAS, &CollectionRef { collection_name: name })
            .await?;
        Ok(data.has)
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> DocumentResult<()> {
        self.conn
            .execute(paths::CREATE, &CreateCollectionRequest::from_schema(schema))
            .await
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        params: &IndexParams,
    ) -> DocumentResult<()> {
        self.conn
            .execute(
                paths::CREATE_INDEX,
                &CreateIndexRequest::new(collection, field, params),
            )
            .await
    }

    async fn list_collections(&self) -> DocumentResult<Vec<String>> {
        let names: Option<Vec<String>> = self.conn.post(paths::LIST, &json!({})).await?;
        Ok(names.unwrap_or_default())
    }

    async fn drop_collection(&self, name: &str) -> DocumentResult<()> {
        self.conn
            .execute(paths::DROP, &CollectionRef { collection_name: name })
            .await
    }

    async fn load_collection(&self, name: &str) -> DocumentResult<()> {
        self.conn
            .execute(paths::LOAD, &CollectionRef { collection_name: name })
            .await
    }

    async fn flush(&self, name: &str) -> DocumentResult<()> {
        self.conn
            .execute(paths::FLUSH, &CollectionRef { collection_name: name })
            .await
    }

    async fn row_count(&self, name: &str) -> DocumentResult<u64> {
        let stats: CollectionStatsData = self
            .conn
            .call(paths::STATS, &CollectionRef { collection_name: name })
            .await?;
        Ok(stats.row_count)
    }

    async fn insert(&self, collection: &str, rows: Vec<NewDocument>) -> DocumentResult<Vec<i64>> {
        let expected = rows.len();
        let request = InsertRequest::new(collection, rows, &self.fields);
        let data: InsertData = self.conn.call(paths::INSERT, &request).await?;
        let ids = collect_ids(data.insert_ids)?;

        if ids.len() != expected {
            return Err(DocumentError::Store(format!(
                "Insert returned {} ids for {} rows",
                ids.len(),
                expected
            )));
        }
        Ok(ids)
    }

    async fn upsert(&self, collection: &str, rows: Vec<NewDocument>) -> DocumentResult<Vec<i64>> {
        if rows.iter().any(|row| row.id.is_none()) {
            return Err(DocumentError::Validation(
                "Upsert requires an explicit id on every row".to_string(),
            ));
        }
        let fallback: Vec<i64> = rows.iter().filter_map(|row| row.id).collect();
        let request = InsertRequest::new(collection, rows, &self.fields);
        let data: Option<UpsertData> = self.conn.post(paths::UPSERT, &request).await?;

        match data {
            Some(data) if !data.upsert_ids.is_empty() => collect_ids(data.upsert_ids),
            _ => Ok(fallback),
        }
    }

    async fn delete(&self, collection: &str, filter: &IdFilter) -> DocumentResult<()> {
        let request = DeleteRequest {
            collection_name: collection,
            filter: filter.to_expr(&self.fields.id),
        };
        self.conn.execute(paths::DELETE, &request).await
    }

    async fn query(&self, collection: &str, filter: &IdFilter) -> DocumentResult<Vec<Document>> {
        let output_fields = vec![
            self.fields.id.as_str(),
            self.fields.text.as_str(),
            self.fields.vector.as_str(),
        ];
        let rows = self
            .query_rows(collection, filter, output_fields, Self::window(filter))
            .await?;
        rows.iter()
            .map(|row| row_to_document(row, &self.fields))
            .collect()
    }

    async fn query_ids(
        &self,
        collection: &str,
        filter: &IdFilter,
        limit: usize,
    ) -> DocumentResult<Vec<i64>> {
        let rows = self
            .query_rows(collection, filter, vec![self.fields.id.as_str()], limit)
            .await?;
        rows.iter().map(|row| row_to_id(row, &self.fields)).collect()
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        params: &SearchParams,
        limit: u32,
    ) -> DocumentResult<Vec<SearchHit>> {
        let request = SearchRequest {
            collection_name: collection,
            data: vec![vector],
            anns_field: &self.fields.vector,
            limit,
            output_fields: vec![self.fields.text.as_str()],
            search_params: params.into(),
        };
        let rows: Option<Vec<Row>> = self.conn.post(paths::SEARCH, &request).await?;
        rows.unwrap_or_default()
            .iter()
            .map(|row| row_to_hit(row, &self.fields))
            .collect()
    }
}
