use core_config::{env_flag, env_optional, env_or_default, env_parse, ConfigError, FromEnv};

use crate::models::{
    CollectionSchema, FieldSchema, IndexBuildParams, IndexParams, IndexType, MetricType,
    SearchParams, SearchTuning,
};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 19530;
pub const DEFAULT_COLLECTION: &str = "document_collection";
pub const DEFAULT_DIMENSION: usize = 384;
pub const DEFAULT_MAX_LENGTH: usize = 5000;
pub const DEFAULT_NLIST: u32 = 128;
pub const DEFAULT_NPROBE: u32 = 10;
pub const DEFAULT_TOP_K: u32 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection and schema settings for the Milvus-backed document store
///
/// Construct with [`MilvusSettings::default`] or load from `MILVUS_*`
/// environment variables through [`FromEnv`]. Once handed to a client the
/// settings are not mutated.
///
/// # Example
///
/// ```ignore
/// use core_config::FromEnv;
/// use domain_documents::MilvusSettings;
///
/// let settings = MilvusSettings::from_env()?.with_collection_name("articles");
/// assert_eq!(settings.endpoint(), "http://localhost:19530");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MilvusSettings {
    pub host: String,
    pub port: u16,
    pub collection_name: String,
    pub dimension: usize,
    /// Maximum `text` length in bytes
    pub max_length: usize,
    pub metric_type: MetricType,
    pub index_type: IndexType,
    pub index_nlist: u32,
    pub search_nprobe: u32,
    pub top_k_default: u32,
    /// Store-assigned primary keys
    pub auto_id: bool,
    /// Bearer token, `user:password` or an API key
    pub token: Option<String>,
    pub timeout_secs: u64,

    pub id_field: String,
    pub text_field: String,
    pub vector_field: String,
}

impl Default for MilvusSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            collection_name: DEFAULT_COLLECTION.to_string(),
            dimension: DEFAULT_DIMENSION,
            max_length: DEFAULT_MAX_LENGTH,
            metric_type: MetricType::L2,
            index_type: IndexType::IvfFlat,
            index_nlist: DEFAULT_NLIST,
            search_nprobe: DEFAULT_NPROBE,
            top_k_default: DEFAULT_TOP_K,
            auto_id: true,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            id_field: "id".to_string(),
            text_field: "text".to_string(),
            vector_field: "embedding".to_string(),
        }
    }
}

impl FromEnv for MilvusSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: env_or_default("MILVUS_HOST", DEFAULT_HOST),
            port: env_parse("MILVUS_PORT", DEFAULT_PORT)?,
            collection_name: env_or_default("MILVUS_COLLECTION", DEFAULT_COLLECTION),
            dimension: env_parse("MILVUS_DIMENSION", DEFAULT_DIMENSION)?,
            max_length: env_parse("MILVUS_MAX_LENGTH", DEFAULT_MAX_LENGTH)?,
            metric_type: env_parse("MILVUS_METRIC", MetricType::L2)?,
            index_type: env_parse("MILVUS_INDEX_TYPE", IndexType::IvfFlat)?,
            index_nlist: env_parse("MILVUS_INDEX_NLIST", DEFAULT_NLIST)?,
            search_nprobe: env_parse("MILVUS_SEARCH_NPROBE", DEFAULT_NPROBE)?,
            top_k_default: env_parse("MILVUS_TOPK", DEFAULT_TOP_K)?,
            auto_id: env_flag("MILVUS_AUTO_ID", true),
            token: env_optional("MILVUS_TOKEN"),
            timeout_secs: env_parse("MILVUS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            ..defaults
        })
    }
}

impl MilvusSettings {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_metric(mut self, metric: MetricType) -> Self {
        self.metric_type = metric;
        self
    }

    pub fn with_auto_id(mut self, auto_id: bool) -> Self {
        self.auto_id = auto_id;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base URL of the Milvus REST endpoint
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn index_params(&self) -> IndexParams {
        IndexParams {
            metric_type: self.metric_type,
            index_type: self.index_type,
            params: IndexBuildParams {
                nlist: self.index_nlist,
            },
        }
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            metric_type: self.metric_type,
            params: SearchTuning {
                nprobe: self.search_nprobe,
            },
        }
    }

    /// The fixed three-field document schema for `name`
    pub fn document_schema(&self, name: &str, dimension: usize) -> CollectionSchema {
        CollectionSchema {
            name: name.to_string(),
            description: "Document similarity search".to_string(),
            auto_id: self.auto_id,
            fields: vec![
                FieldSchema::primary_int64(&self.id_field),
                FieldSchema::varchar(&self.text_field, self.max_length),
                FieldSchema::float_vector(&self.vector_field, dimension),
            ],
        }
    }
}
