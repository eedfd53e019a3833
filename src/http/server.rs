//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with client and admin routes
//! - Wire up middleware (request id, tracing, timeout, body limit, metrics)
//! - Run background tasks (preview sweeper, config reload)
//! - Serve until the shutdown signal, then write the final snapshot

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Request},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::ServiceConfig;
use crate::http::client::{get_current_config, get_preview_config, health};
use crate::http::middleware::track_metrics;
use crate::http::request::make_request_span;
use crate::preview::PreviewSweeper;
use crate::serving::ConfigService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConfigService>,
    /// Latest accepted settings; replaced whole on reload.
    pub settings: Arc<ArcSwap<ServiceConfig>>,
}

/// HTTP server for the control plane.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, service: Arc<ConfigService>) -> Self {
        let state = AppState {
            service,
            settings: Arc::new(ArcSwap::from_pointee(config.clone())),
        };
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let client = Router::new()
            .route("/health", get(health))
            .route("/v1/config/{environment}", get(get_current_config))
            .route("/v1/preview/{code}", get(get_preview_config))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache"),
            ))
            .with_state(state.clone());

        client
            .merge(setup_admin_router(state))
            .route_layer(middleware::from_fn(track_metrics))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| make_request_span(req)))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(DefaultBodyLimit::disable())
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    // Innermost: its 408 needs a response body with a default.
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Settings arriving on `config_updates` are applied to the running
    /// service. Listener address, timeout and body limit only change on
    /// restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = PreviewSweeper::new(self.state.service.previews().clone());
        tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => {
                        let Some(new_config) = update else { break };
                        if new_config.listener != state.settings.load().listener {
                            tracing::warn!("Listener changes take effect after restart");
                        }
                        state.service.apply_config(&new_config);
                        state.settings.store(Arc::new(new_config));
                        tracing::info!("Configuration reloaded");
                    }
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if self.config.storage.save_on_shutdown {
            let service = self.state.service.clone();
            match tokio::task::spawn_blocking(move || service.persist()).await {
                Ok(Ok(())) => tracing::info!("Final snapshot written"),
                Ok(Err(e)) => tracing::error!(error = %e, "Failed to write final snapshot"),
                Err(e) => tracing::error!(error = %e, "Final snapshot task failed"),
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}
