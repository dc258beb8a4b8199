//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, the body
//! size limit and the global rate limit.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use ldm_core::config::{LdmConfig, ServerConfig};
use ldm_core::error::LdmError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Build the CORS layer from the server config.
///
/// An empty origin list allows any origin. Unparseable origins are skipped.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origin = if server.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    let mut allowed_headers = vec![header::CONTENT_TYPE, header::ACCEPT];
    match server.user_id_header.parse::<HeaderName>() {
        Ok(name) => allowed_headers.push(name),
        Err(e) => tracing::warn!(
            header = %server.user_id_header,
            error = %e,
            "User id header is not a valid header name"
        ),
    }

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers)
        .expose_headers(Any)
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = cors_layer(server);
    let limiter = RateLimiter::new(server.rate_limit_per_sec);
    let body_limit = server.body_limit_bytes;

    let chat_routes = Router::new()
        .route("/model-chat", post(handlers::model_chat))
        .route("/model-chat/reset", post(handlers::reset_chat))
        .route("/model-chat/history", get(handlers::chat_history))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(chat_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Runs until Ctrl-C.
pub async fn start_server(config: &LdmConfig, state: AppState) -> Result<(), LdmError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LdmError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LdmError::Api(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
