//! HTTP server for the streaming chat endpoint
//!
//! Per request: validate → sanitize → normalize → map safety policy →
//! start provider stream → relay text chunks as a `text/plain` body.

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{Response, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use futures::StreamExt;
use futures::stream;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::conversation::Normalizer;
use crate::error::{RelayError, Result};
use crate::provider::{ContentGenerator, GenerateContentRequest};
use crate::relay::Relay;
use crate::request::ChatRequest;
use crate::safety::resolve_safety_settings;

use super::error::ProxyError;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Relay configuration
    pub config: Config,
    /// Provider used for generation
    pub generator: Arc<dyn ContentGenerator>,
    /// Conversation builder carrying the persona preamble
    pub normalizer: Normalizer,
}

impl AppState {
    pub fn new(config: Config, generator: Arc<dyn ContentGenerator>) -> Self {
        let normalizer = Normalizer::new(config.persona.active_preamble());
        Self {
            config,
            generator,
            normalizer,
        }
    }
}

/// The relay server
pub struct RelayServer {
    config: Config,
    generator: Arc<dyn ContentGenerator>,
}

impl RelayServer {
    /// Create a new server with the given configuration and provider
    pub fn new(config: Config, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { config, generator }
    }

    /// Start the server and listen for requests
    pub async fn serve(&self) -> Result<()> {
        let route = &self.config.server.route;
        if !route.starts_with('/') {
            return Err(RelayError::Config(format!(
                "Route '{route}' must start with '/'"
            )));
        }

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| RelayError::Config(format!("Invalid listen address: {e}")))?;

        let state = Arc::new(AppState::new(self.config.clone(), self.generator.clone()));
        let app = create_router(state);

        info!("Starting relay server on {addr}");
        info!(
            "Chat endpoint: POST {} (provider: {}, model: {})",
            route,
            self.generator.name(),
            self.config.provider.model
        );
        if self.config.persona.active_preamble().is_some() {
            info!("Persona preamble: enabled");
        } else {
            info!("Persona preamble: disabled");
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Config(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Relay server shut down gracefully");
        Ok(())
    }
}

/// Create the router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    let route = state.config.server.route.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route(&route, post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint - returns JSON status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Streaming chat endpoint
async fn chat_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response<Body> {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    match handle_chat(&state, &body).instrument(span).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn handle_chat(state: &AppState, body: &[u8]) -> std::result::Result<Response<Body>, ProxyError> {
    let mut request = ChatRequest::from_slice(body)?;
    request.sanitize();

    let safety_settings = resolve_safety_settings(request.safety_settings.as_ref())?;
    let contents = state.normalizer.normalize(&request.messages);
    debug!(
        messages = request.messages.len(),
        turns = contents.len(),
        parts = contents.part_count(),
        "Conversation normalized"
    );

    // Counting is informational only; its failure never blocks generation.
    if state.config.provider.count_tokens {
        match state.generator.count_tokens(&contents).await {
            Ok(total_tokens) => info!(total_tokens, "Counted prompt tokens"),
            Err(e) => warn!(
                error_type = e.category(),
                error_message = %e,
                "Token count failed, continuing"
            ),
        }
    }

    let generate = GenerateContentRequest {
        contents,
        safety_settings,
        generation_config: request.general_settings.into(),
    };

    let chunks = state.generator.stream_generate(&generate).await?;
    let mut relay = Relay::new(chunks);

    // A failure before the first forwarded unit still gets a proper status.
    let body = match relay.next().await {
        Some(Err(e)) => return Err(e.into()),
        Some(Ok(first)) => Body::from_stream(stream::once(async move { Ok(first) }).chain(relay)),
        None => Body::empty(),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {e}")))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
