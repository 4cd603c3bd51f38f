use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Distance metric used both for building the index and ranking hits
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum MetricType {
    /// Squared Euclidean distance, smaller is closer
    #[default]
    #[serde(rename = "L2")]
    #[strum(serialize = "L2")]
    L2,
    /// Inner product, larger is closer
    #[serde(rename = "IP")]
    #[strum(serialize = "IP")]
    Ip,
    /// Cosine similarity, larger is closer
    #[serde(rename = "COSINE")]
    #[strum(serialize = "COSINE")]
    Cosine,
}

impl MetricType {
    /// Whether a smaller raw distance means a closer match
    pub fn smaller_is_closer(&self) -> bool {
        matches!(self, MetricType::L2)
    }
}

/// Index type built on the vector field
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IndexType {
    Flat,
    #[default]
    IvfFlat,
    IvfSq8,
    IvfPq,
    Hnsw,
    #[serde(rename = "AUTOINDEX")]
    #[strum(serialize = "AUTOINDEX")]
    AutoIndex,
}

/// Index-build parameters: `{metric_type, index_type, params: {nlist}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexParams {
    pub metric_type: MetricType,
    pub index_type: IndexType,
    pub params: IndexBuildParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBuildParams {
    pub nlist: u32,
}

/// Search-time parameters: `{metric_type, params: {nprobe}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub metric_type: MetricType,
    pub params: SearchTuning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTuning {
    pub nprobe: u32,
}

/// Column type of a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int64,
    VarChar { max_length: usize },
    FloatVector { dim: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    pub is_primary: bool,
}

impl FieldSchema {
    pub fn primary_int64(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Int64,
            is_primary: true,
        }
    }

    pub fn varchar(name: impl Into<String>, max_length: usize) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::VarChar { max_length },
            is_primary: false,
        }
    }

    pub fn float_vector(name: impl Into<String>, dim: usize) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::FloatVector { dim },
            is_primary: false,
        }
    }
}

/// Schema of a document collection: `id`, `text`, vector, in that order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: String,
    pub description: String,
    pub auto_id: bool,
    pub fields: Vec<FieldSchema>,
}

impl CollectionSchema {
    pub fn primary_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.is_primary)
    }

    pub fn vector_field(&self) -> Option<(&str, usize)> {
        self.fields.iter().find_map(|f| match f.field_type {
            FieldType::FloatVector { dim } => Some((f.name.as_str(), dim)),
            _ => None,
        })
    }

    pub fn text_field(&self) -> Option<(&str, usize)> {
        self.fields.iter().find_map(|f| match f.field_type {
            FieldType::VarChar { max_length } => Some((f.name.as_str(), max_length)),
            _ => None,
        })
    }
}

/// Returned by provisioning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionHandle {
    pub name: String,
    /// Dimension requested by the caller. For a reused collection this is
    /// not checked against the stored schema.
    pub dimension: usize,
    /// False when the collection already existed
    pub created: bool,
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A row about to be written. `id` is `None` when the store assigns ids.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub id: Option<i64>,
    pub text: String,
    pub vector: Vec<f32>,
}

impl NewDocument {
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: None,
            text: text.into(),
            vector,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Predicate over the primary key field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    Eq(i64),
    In(Vec<i64>),
    /// Every row; ids are never negative
    All,
}

impl IdFilter {
    /// Render as a Milvus boolean expression over `field`
    pub fn to_expr(&self, field: &str) -> String {
        match self {
            IdFilter::Eq(id) => format!("{} == {}", field, id),
            IdFilter::In(ids) => {
                let joined = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{} in [{}]", field, joined)
            }
            IdFilter::All => format!("{} >= 0", field),
        }
    }

    pub fn matches(&self, id: i64) -> bool {
        match self {
            IdFilter::Eq(target) => *target == id,
            IdFilter::In(ids) => ids.contains(&id),
            IdFilter::All => id >= 0,
        }
    }
}

/// A raw nearest-neighbour hit as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub text: String,
    pub distance: f32,
}

/// A ranked search match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub text: String,
    pub distance: f32,
    pub score: f32,
}

impl SearchResult {
    pub fn from_hit(hit: SearchHit) -> Self {
        Self {
            score: score_from_distance(hit.distance),
            id: hit.id,
            text: hit.text,
            distance: hit.distance,
        }
    }
}

/// `1 / (1 + distance)`: strictly decreasing in distance, `1.0` at zero.
pub fn score_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection_name: String,
    pub row_count: u64,
}

/// Operations exposed to a command front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Action {
    Insert,
    Search,
    Both,
    Delete,
    Update,
    Get,
    Stats,
    ListCollections,
    DropCollection,
    Clear,
}

impl Action {
    /// Whether the action turns text into vectors
    pub fn needs_vectorizer(&self) -> bool {
        matches!(
            self,
            Action::Insert | Action::Search | Action::Both | Action::Update
        )
    }

    /// Whether the action operates on the configured collection, which is
    /// provisioned first
    pub fn needs_collection(&self) -> bool {
        !matches!(self, Action::ListCollections | Action::DropCollection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_metric_parse_and_display() {
        assert_eq!(MetricType::from_str("l2").unwrap(), MetricType::L2);
        assert_eq!(MetricType::from_str("Cosine").unwrap(), MetricType::Cosine);
        assert_eq!(MetricType::Ip.to_string(), "IP");
        assert!(MetricType::from_str("HAMMING").is_err());
    }

    #[test]
    fn test_index_type_parse_and_display() {
        assert_eq!(IndexType::from_str("ivf_flat").unwrap(), IndexType::IvfFlat);
        assert_eq!(IndexType::from_str("AUTOINDEX").unwrap(), IndexType::AutoIndex);
        assert_eq!(IndexType::IvfSq8.to_string(), "IVF_SQ8");
        assert_eq!(
            serde_json::to_value(IndexType::IvfFlat).unwrap(),
            serde_json::json!("IVF_FLAT")
        );
    }

    #[test]
    fn test_id_filter_expressions() {
        assert_eq!(IdFilter::Eq(7).to_expr("id"), "id == 7");
        assert_eq!(IdFilter::In(vec![1, 2, 3]).to_expr("id"), "id in [1,2,3]");
        assert_eq!(IdFilter::All.to_expr("pk"), "pk >= 0");
    }

    #[test]
    fn test_id_filter_matches() {
        assert!(IdFilter::Eq(3).matches(3));
        assert!(!IdFilter::Eq(3).matches(4));
        assert!(IdFilter::In(vec![1, 5]).matches(5));
        assert!(!IdFilter::In(vec![]).matches(0));
        assert!(IdFilter::All.matches(0));
    }

    #[test]
    fn test_score_at_zero_distance() {
        assert_eq!(score_from_distance(0.0), 1.0);
        let result = SearchResult::from_hit(SearchHit {
            id: 1,
            text: "a".into(),
            distance: 1.0,
        });
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::from_str("list-collections").unwrap(), Action::ListCollections);
        assert_eq!(Action::from_str("BOTH").unwrap(), Action::Both);
        assert_eq!(Action::DropCollection.to_string(), "drop-collection");
        assert!(Action::from_str("upsert").is_err());
    }

    #[test]
    fn test_action_capabilities() {
        let with_model = [Action::Insert, Action::Search, Action::Both, Action::Update];
        for action in with_model {
            assert!(action.needs_vectorizer(), "{} should encode text", action);
        }
        let without_model = [
            Action::Delete,
            Action::Get,
            Action::Stats,
            Action::ListCollections,
            Action::DropCollection,
            Action::Clear,
        ];
        for action in without_model {
            assert!(!action.needs_vectorizer(), "{} should not encode", action);
        }
        assert!(!Action::ListCollections.needs_collection());
        assert!(!Action::DropCollection.needs_collection());
        assert!(Action::Clear.needs_collection());
        assert!(Action::Get.needs_collection());
    }

    #[test]
    fn test_schema_accessors() {
        let schema = CollectionSchema {
            name: "docs".into(),
            description: String::new(),
            auto_id: true,
            fields: vec![
                FieldSchema::primary_int64("id"),
                FieldSchema::varchar("text", 100),
                FieldSchema::float_vector("embedding", 3),
            ],
        };
        assert_eq!(schema.primary_field().unwrap().name, "id");
        assert_eq!(schema.text_field(), Some(("text", 100)));
        assert_eq!(schema.vector_field(), Some(("embedding", 3)));
    }

    proptest! {
        #[test]
        fn prop_score_strictly_decreasing(d1 in 0.0f32..1.0e4, delta in 1.0e-2f32..1.0e3) {
            let d2 = d1 + delta;
            prop_assert!(score_from_distance(d1) > score_from_distance(d2));
        }

        #[test]
        fn prop_score_in_unit_interval(d in 0.0f32..1.0e6) {
            let score = score_from_distance(d);
            prop_assert!(score > 0.0 && score <= 1.0);
        }
    }
}
