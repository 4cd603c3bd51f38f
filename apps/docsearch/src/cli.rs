//! Command-line surface

use clap::{Parser, ValueEnum};
use core_config::FromEnv;
use domain_documents::{Action, MilvusSettings};
use eyre::{Result, WrapErr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Milvus server over its REST API
    Milvus,
    /// Process-local store, nothing persists
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Embedder {
    /// OpenAI-compatible embeddings server (EMBEDDING_* variables)
    Http,
    /// Offline bag-of-words hashing
    Hashing,
}

#[derive(Debug, Parser)]
#[command(name = "docsearch")]
#[command(about = "Store texts as vectors in Milvus and search them by similarity")]
pub struct Cli {
    /// insert, search, both, delete, update, get, stats, list-collections,
    /// drop-collection or clear
    #[arg(short, long, default_value_t = Action::Both)]
    pub action: Action,

    /// Milvus host (overrides MILVUS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Milvus port (overrides MILVUS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Collection to operate on (overrides MILVUS_COLLECTION)
    #[arg(short, long)]
    pub collection_name: Option<String>,

    /// Search query
    #[arg(short, long, default_value = "What is a vector database?")]
    pub query: String,

    /// Number of results (overrides MILVUS_TOPK)
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// Document id for get, update and delete
    #[arg(long)]
    pub doc_id: Option<i64>,

    /// Comma-separated document ids for delete
    #[arg(long)]
    pub doc_ids: Option<String>,

    /// Text to insert (repeatable) or the replacement text for update.
    /// Insert falls back to a built-in sample corpus.
    #[arg(short, long)]
    pub text: Vec<String>,

    #[arg(long, value_enum, default_value_t = Backend::Milvus)]
    pub backend: Backend,

    /// Defaults to http for milvus and hashing for memory
    #[arg(long, value_enum)]
    pub embedder: Option<Embedder>,
}

impl Cli {
    /// Environment settings with command-line overrides applied
    pub fn settings(&self) -> Result<MilvusSettings> {
        let mut settings = MilvusSettings::from_env().wrap_err("Invalid MILVUS_* settings")?;
        if let Some(host) = &self.host {
            settings = settings.with_host(host);
        }
        if let Some(port) = self.port {
            settings = settings.with_port(port);
        }
        if let Some(name) = &self.collection_name {
            settings = settings.with_collection_name(name);
        }
        if let Some(top_k) = self.top_k {
            settings.top_k_default = top_k;
        }
        Ok(settings)
    }

    pub fn embedder(&self) -> Embedder {
        self.embedder.unwrap_or(match self.backend {
            Backend::Milvus => Embedder::Http,
            Backend::Memory => Embedder::Hashing,
        })
    }

    /// Ids to delete: `--doc-ids` when given, else `--doc-id`
    pub fn delete_ids(&self) -> Result<Vec<i64>> {
        match (&self.doc_ids, self.doc_id) {
            (Some(raw), _) => parse_doc_ids(raw),
            (None, Some(id)) => Ok(vec![id]),
            (None, None) => Err(eyre::eyre!("delete needs --doc-id or --doc-ids")),
        }
    }

    pub fn require_doc_id(&self) -> Result<i64> {
        self.doc_id
            .ok_or_else(|| eyre::eyre!("{} needs --doc-id", self.action))
    }
}

/// Parse `"1, 2,3"` into ids. Blank entries are skipped.
pub fn parse_doc_ids(raw: &str) -> Result<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .wrap_err_with(|| format!("Invalid document id '{}'", part))
        })
        .collect::<Result<Vec<_>>>()?;

    if ids.is_empty() {
        return Err(eyre::eyre!("--doc-ids contains no ids"));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_doc_ids() {
        assert_eq!(parse_doc_ids("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_doc_ids(" 7 , ,9 ").unwrap(), vec![7, 9]);
        assert!(parse_doc_ids("1,two").is_err());
        assert!(parse_doc_ids(" , ").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["docsearch"]);
        assert_eq!(cli.action, Action::Both);
        assert_eq!(cli.backend, Backend::Milvus);
        assert_eq!(cli.embedder(), Embedder::Http);
        assert!(cli.text.is_empty());
    }

    #[test]
    fn test_action_and_repeated_text() {
        let cli = Cli::parse_from([
            "docsearch",
            "--action",
            "insert",
            "--text",
            "first",
            "--text",
            "second",
            "--backend",
            "memory",
        ]);
        assert_eq!(cli.action, Action::Insert);
        assert_eq!(cli.text, ["first", "second"]);
        assert_eq!(cli.embedder(), Embedder::Hashing);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Cli::try_parse_from(["docsearch", "--action", "upsert"]).is_err());
    }

    #[test]
    fn test_delete_ids_prefers_list() {
        let cli = Cli::parse_from(["docsearch", "--doc-id", "1", "--doc-ids", "4,5"]);
        assert_eq!(cli.delete_ids().unwrap(), vec![4, 5]);

        let cli = Cli::parse_from(["docsearch", "--doc-id", "1"]);
        assert_eq!(cli.delete_ids().unwrap(), vec![1]);

        let cli = Cli::parse_from(["docsearch"]);
        assert!(cli.delete_ids().is_err());
    }

    #[test]
    fn test_flags_override_environment() {
        temp_env::with_vars(
            [("MILVUS_HOST", Some("from-env")), ("MILVUS_COLLECTION", Some("env_docs"))],
            || {
                let cli = Cli::parse_from([
                    "docsearch",
                    "--host",
                    "from-flag",
                    "--port",
                    "29530",
                    "--top-k",
                    "9",
                ]);
                let settings = cli.settings().unwrap();
                assert_eq!(settings.host, "from-flag");
                assert_eq!(settings.port, 29530);
                assert_eq!(settings.collection_name, "env_docs");
                assert_eq!(settings.top_k_default, 9);
            },
        );
    }
}
