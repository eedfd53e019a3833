//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ui_control_plane::clock::{system_clock, SharedClock};
use ui_control_plane::config::ServiceConfig;
use ui_control_plane::http::HttpServer;
use ui_control_plane::lifecycle::{bootstrap_with_clock, Shutdown};
use ui_control_plane::serving::ConfigService;

/// A control plane running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub service: Arc<ConfigService>,
    pub config_updates: mpsc::UnboundedSender<ServiceConfig>,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("server unreachable")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("server unreachable")
    }

    pub async fn create(&self, doc: &Value) -> reqwest::Response {
        self.post("/admin/documents", doc).await
    }

    pub async fn publish(&self, version: &str, environment: &str) -> reqwest::Response {
        self.post(
            &format!("/admin/environments/{environment}/publish"),
            &json!({ "version": version, "activated_by": "tests" }),
        )
        .await
    }

    pub async fn rollback(&self, environment: &str, target: Option<&str>) -> reqwest::Response {
        self.post(
            &format!("/admin/environments/{environment}/rollback"),
            &json!({ "target_version": target, "activated_by": "tests" }),
        )
        .await
    }

    /// Version served to clients, or the error code.
    pub async fn current_version(&self, environment: &str) -> Result<String, String> {
        let res = self.get(&format!("/v1/config/{environment}")).await;
        let ok = res.status().is_success();
        let body: Value = res.json().await.expect("JSON body");
        if ok {
            Ok(body["version"].as_str().unwrap_or_default().to_string())
        } else {
            Err(body["error"].as_str().unwrap_or_default().to_string())
        }
    }

    /// Trigger shutdown and wait for the server to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
    }
}

pub async fn start_server(config: ServiceConfig) -> TestServer {
    start_server_with_clock(config, system_clock()).await
}

pub async fn start_server_with_clock(config: ServiceConfig, clock: SharedClock) -> TestServer {
    let service = bootstrap_with_clock(&config, clock).expect("bootstrap");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, service.clone());
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let server = TestServer {
        addr,
        service,
        config_updates,
        client,
        shutdown,
        handle,
    };
    wait_until_ready(&server).await;
    server
}

async fn wait_until_ready(server: &TestServer) {
    for _ in 0..50 {
        if let Ok(res) = server.client.get(server.url("/health")).send().await {
            if res.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not become ready");
}

/// A document that passes validation.
pub fn valid_document(version: &str) -> Value {
    json!({
        "version": version,
        "tokens": {
            "colors": { "primary": "#FF6B6B", "background": "#0F0F10", "text": "#FAFAFA" },
            "spacing": { "xs": 4, "sm": 8, "md": 16, "lg": 24 },
            "radii": { "sm": 6, "md": 12, "pill": 999 },
            "typography": { "scale": { "body": { "size": 16, "lineHeight": 22, "weight": "400" } } },
            "motion": {
                "duration": { "fast": 150, "base": 250 },
                "easing": { "standard": [0.2, 0, 0, 1] }
            },
            "shadow": { "1": { "radius": 4, "offset": [0, 2], "opacity": 0.12 } },
            "palette": { "gradients": { "sunset": ["#FF6B6B", "#FFD93D"] } }
        },
        "microInteractions": {
            "guards": { "respectReducedMotion": true, "lowEndDevicePolicy": "simplify" },
            "pressFeedback": { "enabled": true, "scale": 0.97 }
        },
        "components": { "button": { "variant": "primary", "size": "md" } },
        "screens": { "Home": { "header": "compact", "sections": ["stories", "feed"] } },
        "featureFlags": {
            "stories": true,
            "chat": { "enabled": true, "percentage": 25 }
        },
        "meta": { "author": "tests", "changelog": "initial" }
    })
}

/// Valid apart from the missing `key`.
pub fn document_without(version: &str, key: &str) -> Value {
    let mut doc = valid_document(version);
    if let Some(object) = doc.as_object_mut() {
        object.remove(key);
    }
    doc
}
