//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use iac_dashboard::config::AppConfig;
use iac_dashboard::http::HttpServer;
use iac_dashboard::infra::{CloudInventory, UnavailableInventory};
use iac_dashboard::lifecycle::Shutdown;
use iac_dashboard::voting::{InMemoryPollStore, VoteService};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A server running on an ephemeral port. Shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[allow(dead_code)]
pub async fn start_server(config: AppConfig) -> TestServer {
    start_server_with(config, Arc::new(UnavailableInventory), None).await
}

/// Start a server with an explicit inventory and optional pre-built store.
pub async fn start_server_with(
    config: AppConfig,
    inventory: Arc<dyn CloudInventory>,
    store: Option<InMemoryPollStore>,
) -> TestServer {
    let store = store.unwrap_or_else(|| InMemoryPollStore::new(None));
    let votes = VoteService::new(Arc::new(store));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config, inventory, votes);
    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    TestServer {
        addr,
        config_updates,
        shutdown,
    }
}

/// A client that never reuses connections across test servers.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
