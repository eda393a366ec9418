//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, body limit, security hooks)
//! - Apply configuration reloads to the live guard
//! - Run the optional rate-limit and CSRF token sweepers
//! - Bind server to listener and shut down gracefully

use arc_swap::ArcSwap;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GuardConfig;
use crate::guard::rate_limit::now_ms;
use crate::guard::{CsrfTokenStore, InMemoryCsrfStore, InputGuard};
use crate::http::handlers;
use crate::security::{
    csrf::csrf_protection_middleware, headers::security_headers_middleware,
    rate_limit::rate_limit_middleware, xss::xss_protection_middleware,
};

/// Configuration and guard that are swapped together on reload.
pub struct GuardInner {
    pub config: GuardConfig,
    pub guard: InputGuard,
}

/// Application state injected into handlers and hooks.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<GuardInner>>,
    pub csrf_store: Arc<dyn CsrfTokenStore>,
}

impl AppState {
    pub fn new(config: GuardConfig) -> Self {
        let guard = InputGuard::new(&config);
        Self::with_parts(config, guard, Arc::new(InMemoryCsrfStore::new()))
    }

    pub fn with_parts(config: GuardConfig, guard: InputGuard, csrf_store: Arc<dyn CsrfTokenStore>) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(GuardInner { config, guard })),
            csrf_store,
        }
    }

    /// Swap in a new configuration. Rate-limit counters carry over.
    pub fn reload(&self, config: GuardConfig) {
        let guard = self.inner.load().guard.reconfigured(&config);
        self.inner.store(Arc::new(GuardInner { config, guard }));
        tracing::info!("Configuration reloaded");
    }
}

/// HTTP server for the input guard.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_state(AppState::new(config))
    }

    pub fn with_state(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let (timeout_secs, max_body_size) = {
            let inner = state.inner.load();
            (inner.config.server.request_timeout_secs, inner.config.server.max_body_size)
        };

        let tools = Router::new()
            .route("/api/validate", post(handlers::validate))
            .route("/api/sanitize/markup", post(handlers::sanitize_markup))
            .route("/api/sanitize/json", post(handlers::sanitize_json))
            .route("/api/files/check", post(handlers::check_file))
            .route("/api/csrf-token", get(handlers::issue_csrf_token));

        let forms = Router::new()
            .route("/api/submit", post(handlers::submit))
            .layer(from_fn_with_state(state.clone(), xss_protection_middleware))
            .layer(from_fn_with_state(state.clone(), csrf_protection_middleware));

        Router::new()
            .route("/health", get(handlers::health))
            .merge(tools)
            .merge(forms)
            .with_state(state.clone())
            .layer(RequestBodyLimitLayer::new(max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(timeout_secs)))
            .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
            .layer(from_fn_with_state(state, security_headers_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Configs received on `config_updates` are applied live.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GuardConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload_state.reload(config);
            }
        });

        let (rate_limit_sweep, csrf_sweep) = {
            let inner = self.state.inner.load();
            (
                inner.config.rate_limit.sweep_interval_secs,
                inner.config.csrf.sweep_interval_secs,
            )
        };
        if let Some(secs) = rate_limit_sweep {
            let state = self.state.clone();
            spawn_sweeper("rate_limit", Duration::from_secs(secs), shutdown.resubscribe(), move || {
                state.inner.load().guard.limiter().sweep_expired()
            });
        }
        if let Some(secs) = csrf_sweep {
            let state = self.state.clone();
            spawn_sweeper("csrf", Duration::from_secs(secs), shutdown.resubscribe(), move || {
                let max_age_ms = state.inner.load().config.csrf.session_max_age_secs.saturating_mul(1000);
                state.csrf_store.sweep(now_ms().saturating_sub(max_age_ms))
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Run `sweep` every `every` until shutdown.
fn spawn_sweeper<F>(store: &'static str, every: Duration, mut shutdown: broadcast::Receiver<()>, sweep: F)
where
    F: Fn() -> usize + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = sweep();
                    tracing::debug!(store, removed, "Swept expired records");
                }
                _ = shutdown.recv() => break,
            }
        }
    });
}
