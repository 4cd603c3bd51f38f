use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Collection '{0}' does not exist, provision it first")]
    CollectionNotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Provisioning failed: {0}")]
    Provision(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

impl DocumentError {
    /// Both missing collections and missing documents count as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DocumentError::CollectionNotFound(_) | DocumentError::DocumentNotFound(_)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DocumentError::Validation(_))
    }
}

impl From<reqwest::Error> for DocumentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            DocumentError::Connection(err.to_string())
        } else {
            DocumentError::Store(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Store(format!("JSON error: {}", err))
    }
}

impl From<ConfigError> for DocumentError {
    fn from(err: ConfigError) -> Self {
        DocumentError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds() {
        assert!(DocumentError::CollectionNotFound("docs".into()).is_not_found());
        assert!(DocumentError::DocumentNotFound(999).is_not_found());
        assert!(!DocumentError::Validation("bad".into()).is_not_found());
        assert!(!DocumentError::Store("boom".into()).is_not_found());
    }

    #[test]
    fn test_collection_not_found_message() {
        let err = DocumentError::CollectionNotFound("docs".into());
        assert_eq!(
            err.to_string(),
            "Collection 'docs' does not exist, provision it first"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: DocumentError = ConfigError::MissingEnvVar("MILVUS_HOST".into()).into();
        assert!(matches!(err, DocumentError::Config(msg) if msg.contains("MILVUS_HOST")));
    }
}
