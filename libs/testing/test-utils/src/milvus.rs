//! Milvus test infrastructure
//!
//! Provides a `TestMilvus` helper that runs Milvus standalone with embedded
//! etcd and local storage in a single container.

use std::time::{Duration, Instant};

use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const MILVUS_IMAGE: &str = "milvusdb/milvus";
const MILVUS_TAG: &str = "v2.5.4";
const MILVUS_PORT: u16 = 19530;
const STARTUP_TIMEOUT: Duration = Duration::from_secs(180);

const EMBED_ETCD_CONFIG: &str = "\
listen-client-urls: http://0.0.0.0:2379
advertise-client-urls: http://0.0.0.0:2379
quota-backend-bytes: 4294967296
auto-compaction-mode: revision
auto-compaction-retention: '1000'
";

/// Test Milvus wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestMilvus;
///
/// # async fn example() {
/// let milvus = TestMilvus::new().await;
/// let (host, port) = (milvus.host(), milvus.port());
/// // Point MilvusSettings at host:port
/// # }
/// ```
pub struct TestMilvus {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    port: u16,
    pub endpoint: String,
}

impl TestMilvus {
    /// Start Milvus and wait until its REST API answers
    pub async fn new() -> Self {
        let container = GenericImage::new(MILVUS_IMAGE, MILVUS_TAG)
            .with_exposed_port(MILVUS_PORT.tcp())
            .with_env_var("ETCD_USE_EMBED", "true")
            .with_env_var("ETCD_DATA_DIR", "/var/lib/milvus/etcd")
            .with_env_var("ETCD_CONFIG_PATH", "/milvus/configs/embedEtcd.yaml")
            .with_env_var("COMMON_STORAGETYPE", "local")
            .with_copy_to(
                "/milvus/configs/embedEtcd.yaml",
                EMBED_ETCD_CONFIG.as_bytes().to_vec(),
            )
            .with_cmd(["milvus", "run", "standalone"])
            .start()
            .await
            .expect("Failed to start Milvus container");

        let port = container
            .get_host_port_ipv4(MILVUS_PORT)
            .await
            .expect("Failed to get Milvus port");

        let endpoint = format!("http://127.0.0.1:{}", port);
        wait_until_ready(&endpoint).await;

        tracing::info!(port, "Test Milvus ready ({}:{})", MILVUS_IMAGE, MILVUS_TAG);

        Self {
            container,
            port,
            endpoint,
        }
    }

    pub fn host(&self) -> &str {
        "127.0.0.1"
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// Milvus accepts TCP connections well before its coordinators are up, so
// poll a real request until it succeeds.
async fn wait_until_ready(endpoint: &str) {
    let client = reqwest::Client::new();
    let url = format!("{}/v2/vectordb/collections/list", endpoint);
    let started = Instant::now();

    loop {
        let ready = match client.post(&url).json(&serde_json::json!({})).send().await {
            Ok(response) => response
                .json::<serde_json::Value>()
                .await
                .map(|body| body["code"] == 0)
                .unwrap_or(false),
            Err(_) => false,
        };
        if ready {
            return;
        }
        if started.elapsed() > STARTUP_TIMEOUT {
            panic!("Milvus did not become ready within {:?}", STARTUP_TIMEOUT);
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}

// Container is automatically cleaned up when TestMilvus is dropped
impl Drop for TestMilvus {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Milvus container");
    }
}
