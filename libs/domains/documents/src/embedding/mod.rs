mod hashing;
mod http;
mod provider;

pub use hashing::HashingVectorizer;
pub use http::{EmbeddingConfig, HttpEmbedder, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL};
#[cfg(test)]
pub use provider::MockVectorizer;
pub use provider::{encode_text, Vectorizer};
