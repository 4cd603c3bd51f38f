//! Request and response bodies of the Milvus RESTful API v2

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentError, DocumentResult};
use crate::models::{
    CollectionSchema, Document, FieldType, IndexParams, MetricType, NewDocument, SearchHit,
    SearchParams, SearchTuning,
};

/// Every response is wrapped as `{"code": 0, "data": ..., "message": ...}`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_result(self, path: &str) -> DocumentResult<Option<T>> {
        if self.code != 0 {
            return Err(DocumentError::Store(format!(
                "{} failed (code {}): {}",
                path,
                self.code,
                self.message.unwrap_or_default()
            )));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRef<'a> {
    pub collection_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct HasCollection {
    pub has: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatsData {
    #[serde(deserialize_with = "de_u64_lenient")]
    pub row_count: u64,
}

// ===== Collection creation =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest<'a> {
    pub collection_name: &'a str,
    pub description: &'a str,
    pub schema: SchemaBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaBody<'a> {
    pub auto_id: bool,
    pub enable_dynamic_field: bool,
    pub fields: Vec<FieldBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBody<'a> {
    pub field_name: &'a str,
    pub data_type: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_primary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type_params: Option<Value>,
}

impl<'a> CreateCollectionRequest<'a> {
    pub fn from_schema(schema: &'a CollectionSchema) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                let (data_type, element_type_params) = match field.field_type {
                    FieldType::Int64 => ("Int64", None),
                    FieldType::VarChar { max_length } => (
                        "VarChar",
                        Some(serde_json::json!({ "max_length": max_length })),
                    ),
                    FieldType::FloatVector { dim } => {
                        ("FloatVector", Some(serde_json::json!({ "dim": dim })))
                    }
                };
                FieldBody {
                    field_name: &field.name,
                    data_type,
                    is_primary: field.is_primary,
                    element_type_params,
                }
            })
            .collect();

        Self {
            collection_name: &schema.name,
            description: &schema.description,
            schema: SchemaBody {
                auto_id: schema.auto_id,
                enable_dynamic_field: false,
                fields,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexRequest<'a> {
    pub collection_name: &'a str,
    pub index_params: Vec<IndexBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBody<'a> {
    pub field_name: &'a str,
    pub index_name: String,
    pub metric_type: String,
    pub index_type: String,
    pub params: Value,
}

impl<'a> CreateIndexRequest<'a> {
    pub fn new(collection_name: &'a str, field_name: &'a str, params: &IndexParams) -> Self {
        Self {
            collection_name,
            index_params: vec![IndexBody {
                field_name,
                index_name: format!("{}_idx", field_name),
                metric_type: params.metric_type.to_string(),
                index_type: params.index_type.to_string(),
                params: serde_json::json!({ "nlist": params.params.nlist }),
            }],
        }
    }
}

// ===== Rows =====

/// Names of the three document fields on the wire
#[derive(Debug, Clone)]
pub struct FieldNames {
    pub id: String,
    pub text: String,
    pub vector: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest<'a> {
    pub collection_name: &'a str,
    pub data: Vec<Map<String, Value>>,
}

impl<'a> InsertRequest<'a> {
    pub fn new(collection_name: &'a str, rows: Vec<NewDocument>, fields: &FieldNames) -> Self {
        let data = rows
            .into_iter()
            .map(|row| {
                let mut map = Map::new();
                if let Some(id) = row.id {
                    map.insert(fields.id.clone(), Value::from(id));
                }
                map.insert(fields.text.clone(), Value::from(row.text));
                map.insert(fields.vector.clone(), Value::from(row.vector));
                map
            })
            .collect();
        Self {
            collection_name,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertData {
    #[serde(default)]
    pub insert_ids: Vec<RawId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertData {
    #[serde(default)]
    pub upsert_ids: Vec<RawId>,
}

/// Int64 keys come back as JSON numbers or, to survive JavaScript clients,
/// as strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Num(i64),
    Str(String),
}

impl RawId {
    pub fn into_i64(self) -> DocumentResult<i64> {
        match self {
            RawId::Num(n) => Ok(n),
            RawId::Str(s) => s
                .parse()
                .map_err(|_| DocumentError::Store(format!("Invalid primary key '{}'", s))),
        }
    }
}

pub fn collect_ids(ids: Vec<RawId>) -> DocumentResult<Vec<i64>> {
    ids.into_iter().map(RawId::into_i64).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest<'a> {
    pub collection_name: &'a str,
    pub filter: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub collection_name: &'a str,
    pub filter: String,
    pub output_fields: Vec<&'a str>,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub collection_name: &'a str,
    pub data: Vec<Vec<f32>>,
    pub anns_field: &'a str,
    pub limit: u32,
    pub output_fields: Vec<&'a str>,
    pub search_params: SearchParamsBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParamsBody {
    pub metric_type: MetricType,
    pub params: SearchTuning,
}

impl From<&SearchParams> for SearchParamsBody {
    fn from(params: &SearchParams) -> Self {
        Self {
            metric_type: params.metric_type,
            params: params.params,
        }
    }
}

pub type Row = Map<String, Value>;

fn field<'r>(row: &'r Row, name: &str) -> DocumentResult<&'r Value> {
    row.get(name)
        .ok_or_else(|| DocumentError::Store(format!("Response row is missing '{}'", name)))
}

fn value_to_id(value: &Value) -> DocumentResult<i64> {
    let raw: RawId = serde_json::from_value(value.clone())?;
    raw.into_i64()
}

pub fn row_to_id(row: &Row, fields: &FieldNames) -> DocumentResult<i64> {
    value_to_id(field(row, &fields.id)?)
}

pub fn row_to_document(row: &Row, fields: &FieldNames) -> DocumentResult<Document> {
    let id = row_to_id(row, fields)?;
    let text = field(row, &fields.text)?
        .as_str()
        .ok_or_else(|| DocumentError::Store(format!("'{}' is not a string", fields.text)))?
        .to_string();
    let vector: Vec<f32> = serde_json::from_value(field(row, &fields.vector)?.clone())?;
    Ok(Document { id, text, vector })
}

/// Search hits carry the primary key and `distance` next to the projected
/// output fields
pub fn row_to_hit(row: &Row, fields: &FieldNames) -> DocumentResult<SearchHit> {
    let id = value_to_id(field(row, &fields.id)?)?;
    let distance = field(row, "distance")?
        .as_f64()
        .ok_or_else(|| DocumentError::Store("'distance' is not a number".to_string()))?
        as f32;
    let text = row
        .get(&fields.text)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(SearchHit { id, text, distance })
}

fn de_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Num(u64),
        Str(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Num(n) => Ok(n),
        Count::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
