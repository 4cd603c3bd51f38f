use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::wire::Envelope;
use crate::config::MilvusSettings;
use crate::error::{DocumentError, DocumentResult};

const LIST_COLLECTIONS: &str = "/v2/vectordb/collections/list";

/// An explicit handle to one Milvus server
///
/// The REST API is stateless, so "connected" means the server answered a
/// probe request. Every call made before [`MilvusConnection::connect`]
/// succeeds is refused with a connection error.
pub struct MilvusConnection {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    connected: AtomicBool,
}

impl MilvusConnection {
    pub fn new(settings: &MilvusSettings) -> DocumentResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| DocumentError::Connection(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: settings.endpoint(),
            token: settings.token.clone(),
            connected: AtomicBool::new(false),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Probe the server. A second call on a live handle does nothing.
    pub async fn connect(&self) -> DocumentResult<()> {
        if self.is_connected() {
            tracing::debug!(endpoint = %self.endpoint, "Already connected to Milvus");
            return Ok(());
        }

        self.send::<_, Value>(LIST_COLLECTIONS, &serde_json::json!({}))
            .await
            .map_err(|e| {
                DocumentError::Connection(format!(
                    "Cannot reach Milvus at {}: {}",
                    self.endpoint, e
                ))
            })?;

        self.connected.store(true, Ordering::Release);
        tracing::info!(endpoint = %self.endpoint, "Connected to Milvus");
        Ok(())
    }

    /// Mark the handle closed. Safe to call any number of times.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::info!(endpoint = %self.endpoint, "Disconnected from Milvus");
        } else {
            tracing::debug!(endpoint = %self.endpoint, "Disconnect on a closed handle");
        }
    }

    /// POST `body` to `path` and unwrap the response envelope
    pub async fn post<B, T>(&self, path: &str, body: &B) -> DocumentResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !self.is_connected() {
            return Err(DocumentError::Connection(
                "Not connected to Milvus, call connect first".to_string(),
            ));
        }
        self.send(path, body).await
    }

    /// Like [`post`](Self::post) but the response must carry `data`
    pub async fn call<B, T>(&self, path: &str, body: &B) -> DocumentResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body)
            .await?
            .ok_or_else(|| DocumentError::Store(format!("{} returned no data", path)))
    }

    /// Like [`post`](Self::post) for requests whose response data is ignored
    pub async fn execute<B>(&self, path: &str, body: &B) -> DocumentResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.post::<B, Value>(path, body).await.map(|_| ())
    }

    async fn send<B, T>(&self, path: &str, body: &B) -> DocumentResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);
        tracing::trace!(%url, "Milvus request");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DocumentError::Store(format!(
                "Milvus API error ({}): {}",
                status, text
            )));
        }

        let envelope: Envelope<T> = response.json().await?;
        envelope.into_result(path)
    }
}

impl std::fmt::Debug for MilvusConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MilvusConnection")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.token.is_some())
            .field("connected", &self.is_connected())
            .finish()
    }
}
