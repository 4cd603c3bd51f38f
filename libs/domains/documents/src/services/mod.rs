mod ingest;
mod search;

pub use ingest::IngestService;
pub use search::SearchService;
