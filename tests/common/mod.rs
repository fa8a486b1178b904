//! Shared test fixture: a local HTTP server whose routes the test can swap
//! at runtime, to simulate manifest changes and fetch failures.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use deckd::storage::{KvStore, MemoryKv};

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    delay_ms: u64,
}

#[derive(Clone, Default)]
struct Routes(Arc<Mutex<HashMap<String, Route>>>);

pub struct ManifestServer {
    pub addr: SocketAddr,
    routes: Routes,
}

impl ManifestServer {
    pub async fn spawn() -> Self {
        let routes = Routes::default();
        let app = Router::new().fallback(handler).with_state(routes.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, routes }
    }

    /// Serve `body` with `status` at `path`.
    pub fn set(&self, path: &str, status: u16, body: &str) {
        self.set_delayed(path, status, body, 0);
    }

    /// Same, but the response is held back for `delay_ms` first.
    pub fn set_delayed(&self, path: &str, status: u16, body: &str, delay_ms: u64) {
        self.routes.0.lock().unwrap().insert(
            path.to_string(),
            Route {
                status,
                body: body.to_string(),
                delay_ms,
            },
        );
    }

    /// Drop a route so subsequent fetches 404.
    pub fn unset(&self, path: &str) {
        self.routes.0.lock().unwrap().remove(path);
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// In-memory store whose writes can be flipped to fail, for exercising the
/// persistence-failure paths (reads keep working either way).
#[derive(Default)]
pub struct FlakyKv {
    inner: MemoryKv,
    fail_writes: AtomicBool,
}

impl FlakyKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvStore for FlakyKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("kv set failed for key '{key}': disk full");
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("kv remove failed for key '{key}': disk full");
        }
        self.inner.remove(key).await
    }
}

async fn handler(State(routes): State<Routes>, uri: Uri) -> impl IntoResponse {
    let route = routes.0.lock().unwrap().get(uri.path()).cloned();
    match route {
        Some(route) => {
            if route.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(route.delay_ms)).await;
            }
            let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::OK);
            (status, route.body)
        }
        None => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}
