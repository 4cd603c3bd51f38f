/// Inserted when `--action insert` or `both` is given no `--text`
pub const SAMPLE_DOCUMENTS: &[&str] = &[
    "A vector database stores embeddings and finds the nearest ones to a query vector.",
    "Milvus is an open source vector database built for similarity search at scale.",
    "Sentence embeddings map text with similar meaning to nearby points in space.",
    "An IVF index partitions vectors into clusters and only probes the closest few.",
    "Euclidean distance measures how far apart two vectors are in a straight line.",
    "Cosine similarity compares the direction of two vectors and ignores their length.",
    "Semantic search returns documents that match the meaning of a query, not just its words.",
    "Rust gives systems programmers memory safety without a garbage collector.",
    "Tokio is an asynchronous runtime for writing network applications in Rust.",
    "Fresh bread needs flour, water, salt and a long, slow rise.",
];

pub fn sample_texts() -> Vec<String> {
    SAMPLE_DOCUMENTS.iter().map(|s| s.to_string()).collect()
}
