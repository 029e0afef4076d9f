//! Shared harness for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;

use redis_rest_gateway::api::AppState;
use redis_rest_gateway::config::{AppConfig, BackendKind};
use redis_rest_gateway::error::BackendResult;
use redis_rest_gateway::lifecycle::{Gateway, LifecycleState, ServeError};
use redis_rest_gateway::service::{IdGenerator, IdSource, MetricsRegistry, MetricsSnapshot};
use redis_rest_gateway::storage::{KvBackend, MemoryBackend};

/// Memory backend that delays writes and can check the listener while closing.
pub struct StallingBackend {
    pub inner: MemoryBackend,
    pub write_delay: Duration,
    pub write_started: Notify,
    listener_addr: Option<SocketAddr>,
    listener_open_at_close: AtomicBool,
}

impl StallingBackend {
    pub fn new(write_delay: Duration) -> Self {
        Self {
            inner: MemoryBackend::new(),
            write_delay,
            write_started: Notify::new(),
            listener_addr: None,
            listener_open_at_close: AtomicBool::new(false),
        }
    }

    /// Try connecting to `addr` when `close` is called.
    pub fn checking_listener(mut self, addr: SocketAddr) -> Self {
        self.listener_addr = Some(addr);
        self
    }

    pub fn listener_open_at_close(&self) -> bool {
        self.listener_open_at_close.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvBackend for StallingBackend {
    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.write_started.notify_one();
        tokio::time::sleep(self.write_delay).await;
        self.inner.set(key, value).await
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> BackendResult<u64> {
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> BackendResult<()> {
        self.inner.health_check().await
    }

    async fn close(&self) -> BackendResult<()> {
        if let Some(addr) = self.listener_addr {
            let open = TcpStream::connect(addr).await.is_ok();
            self.listener_open_at_close.store(open, Ordering::SeqCst);
        }
        self.inner.close().await
    }

    fn backend_name(&self) -> &'static str {
        "stalling"
    }
}

/// Gateway running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub metrics: Arc<MetricsRegistry>,
    pub lifecycle: tokio::sync::watch::Receiver<LifecycleState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<MetricsSnapshot, ServeError>>>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind = "127.0.0.1:0".to_string();
    config.backend.kind = BackendKind::Memory;
    config.observability.log_level = "warn".to_string();
    config
}

impl TestServer {
    pub async fn start(backend: Arc<dyn KvBackend>) -> Self {
        Self::start_with(backend, test_config(), Duration::from_secs(5)).await
    }

    pub async fn start_with(
        backend: Arc<dyn KvBackend>,
        config: AppConfig,
        grace_period: Duration,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        Self::start_on(listener, backend, config, grace_period)
    }

    /// Start with a caller-supplied identifier source.
    pub async fn start_with_ids(backend: Arc<dyn KvBackend>, ids: Arc<dyn IdSource>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        Self::launch(listener, backend, ids, test_config(), Duration::from_secs(5))
    }

    pub fn start_on(
        listener: TcpListener,
        backend: Arc<dyn KvBackend>,
        config: AppConfig,
        grace_period: Duration,
    ) -> Self {
        let ids: Arc<dyn IdSource> =
            Arc::new(IdGenerator::from_config(&config.generator).expect("generator"));
        Self::launch(listener, backend, ids, config, grace_period)
    }

    fn launch(
        listener: TcpListener,
        backend: Arc<dyn KvBackend>,
        ids: Arc<dyn IdSource>,
        config: AppConfig,
        grace_period: Duration,
    ) -> Self {
        let addr = listener.local_addr().expect("Failed to get local addr");

        let metrics = Arc::new(MetricsRegistry::new());
        let state = AppState::from_parts(Arc::new(config), backend, ids, Arc::clone(&metrics));

        let gateway = Gateway::new(state).with_grace_period(grace_period);
        let lifecycle = gateway.subscribe();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(gateway.serve(listener, async move {
            let _ = rx.await;
        }));

        Self {
            addr,
            client: Client::new(),
            metrics,
            lifecycle,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> Response {
        self.client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Trigger shutdown without waiting for it to finish.
    pub fn trigger_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Trigger shutdown and wait for the final snapshot.
    pub async fn shutdown(mut self) -> MetricsSnapshot {
        self.trigger_shutdown();
        self.join().await
    }

    /// Wait for the serve task to finish.
    pub async fn join(&mut self) -> MetricsSnapshot {
        let handle = self.handle.take().expect("already joined");
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("shutdown timed out")
            .expect("serve task panicked")
            .expect("serve failed")
    }
}
