pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::schedule::UpdateTrigger;
use crate::verification::VerificationService;
use handlers::health::health_check;
use handlers::update::trigger_update;
use handlers::verify::verify_signature;

/// Upper bound for a multipart upload (document plus signature).
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub verification: Arc<VerificationService>,
    pub updates: UpdateTrigger,
}

pub struct Server {
    router: Router,
    listener: TcpListener,
}

impl Server {
    /// Binds the listener; port 0 picks a free port.
    pub async fn new(state: AppState, config: &ServerConfig) -> Result<Self> {
        let trace_layer =
            TraceLayer::new_for_http().make_span_with(|request: &'_ axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("request", method = %request.method(), uri)
            });

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/verify", post(verify_signature))
            .route("/update/do-scheduled-update", post(trigger_update))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(cors_layer)
            .layer(trace_layer)
            .with_state(state);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .wrap_err_with(|| format!("Failed to bind {addr}"))?;

        Ok(Self { router, listener })
    }

    pub fn port(&self) -> Result<u16> {
        Ok(self
            .listener
            .local_addr()
            .wrap_err("Failed to read local address")?
            .port())
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router)
            .await
            .wrap_err("Server failed")
    }
}
