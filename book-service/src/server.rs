//! HTTP server with graceful shutdown

use axum::Router;
use http::StatusCode;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    middleware::{request_id_layer, request_id_propagation_layer, sensitive_headers_layer},
};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the server with the given router until SIGINT or SIGTERM
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let app = with_middleware(app, &self.config);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        tracing::info!(
            catch_panic = middleware.catch_panic,
            compression = middleware.compression,
            cors_mode = %middleware.cors_mode,
            body_limit_mb = middleware.body_limit_mb,
            timeout_secs = self.config.service.timeout_secs,
            "Middleware configuration"
        );
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Wrap `app` in the configured middleware stack
///
/// Layers added later run first on the way in.
pub fn with_middleware(app: Router, config: &Config) -> Router {
    let middleware = &config.middleware;
    let body_limit = middleware.body_limit_mb * 1024 * 1024;

    let mut app = app;
    if let Some(cors) = build_cors_layer(&middleware.cors_mode) {
        app = app.layer(cors);
    }
    if middleware.compression {
        app = app.layer(CompressionLayer::new());
    }

    let app = app
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.service.timeout(),
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(sensitive_headers_layer())
        .layer(request_id_propagation_layer())
        .layer(request_id_layer());

    if middleware.catch_panic {
        app.layer(CatchPanicLayer::new())
    } else {
        app
    }
}

/// Build CORS layer for the configured mode; `None` when disabled
fn build_cors_layer(mode: &str) -> Option<CorsLayer> {
    match mode {
        "permissive" => {
            tracing::debug!("Enabling permissive CORS");
            Some(CorsLayer::permissive())
        }
        "restrictive" => {
            tracing::debug!("Enabling restrictive CORS (default deny)");
            Some(CorsLayer::new())
        }
        "disabled" => {
            tracing::debug!("CORS disabled");
            None
        }
        other => {
            tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", other);
            Some(CorsLayer::permissive())
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}
