//! HTTP & Realtime API
//!
//! Thin transport layer over the session core:
//! - `GET /merchant-data` - current merchant record as JSON, token ensured
//! - `GET /merchant-dashboard` - HTML view with the connect token and transfers
//! - `GET /ws` - realtime channel (see [`ws`])
//! - `GET /api/health` - health check
//! - `GET /api/stats` - relay statistics

pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Host, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::MerchLinkError;
use crate::identity::IdentityResolver;
use crate::session::{
    connect_url, ensure_token, ExpiryScheduler, MerchantRecord, PresenceRegistry,
    SharedMerchantStore, TokenEncoder, TransferRelay,
};

/// Combined application state for all endpoints
pub struct AppState {
    pub store: SharedMerchantStore,
    pub presence: PresenceRegistry,
    pub relay: TransferRelay,
    pub resolver: Arc<dyn IdentityResolver>,
    pub encoder: Arc<dyn TokenEncoder>,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    /// Wire up the session components around a store
    pub fn new(
        store: SharedMerchantStore,
        resolver: Arc<dyn IdentityResolver>,
        encoder: Arc<dyn TokenEncoder>,
        expiry_delay: Duration,
    ) -> SharedAppState {
        let presence = PresenceRegistry::new();
        let expiry = ExpiryScheduler::new(store.clone(), expiry_delay);
        let relay = TransferRelay::new(store.clone(), presence.clone(), expiry);

        Arc::new(Self {
            store,
            presence,
            relay,
            resolver,
            encoder,
        })
    }
}

/// Create the application router
pub fn create_router(state: SharedAppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/merchant-data", get(handle_merchant_data))
        .route("/merchant-dashboard", get(handle_merchant_dashboard))
        .route("/ws", get(ws::ws_handler))
        .route("/api/health", get(handle_health))
        .route("/api/stats", get(handle_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Load the current merchant's record with a token valid for this request
///
/// The connect URL embeds the request's scheme and host so the scanned code
/// points customers back at the address the merchant is actually reachable
/// on.
async fn current_record(
    state: &AppState,
    headers: &HeaderMap,
    host: &str,
) -> Result<MerchantRecord, MerchLinkError> {
    let identity = state.resolver.resolve();
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    let mut store = state.store.write().await;
    let mut record = store.get(&identity)?;

    let url = connect_url(scheme, host, &identity);
    let changed = ensure_token(&mut record, &identity, || url, state.encoder.as_ref())?;
    if changed {
        store.save(&identity, record.clone())?;
    }

    Ok(record)
}

/// GET /merchant-data
async fn handle_merchant_data(
    State(state): State<SharedAppState>,
    Host(host): Host,
    headers: HeaderMap,
) -> impl IntoResponse {
    match current_record(&state, &headers, &host).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to generate merchant data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "failed to generate merchant data"})),
            )
                .into_response()
        }
    }
}

/// GET /merchant-dashboard
async fn handle_merchant_dashboard(
    State(state): State<SharedAppState>,
    Host(host): Host,
    headers: HeaderMap,
) -> impl IntoResponse {
    match current_record(&state, &headers, &host).await {
        Ok(record) => (StatusCode::OK, Html(render_dashboard(&record))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render merchant dashboard");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Error generating dashboard</h1>".to_string()),
            )
                .into_response()
        }
    }
}

/// GET /api/health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "merchlink",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /api/stats
async fn handle_stats(State(state): State<SharedAppState>) -> impl IntoResponse {
    Json(state.relay.stats().await)
}

fn render_dashboard(record: &MerchantRecord) -> String {
    let token_img = match &record.token {
        Some(token) => format!(
            r#"<img id="connect-code" src="{}" alt="connect code">"#,
            escape_html(token)
        ),
        None => "<p>No connect code available</p>".to_string(),
    };

    let transfers = if record.transfers.is_empty() {
        "<li>No transfers yet</li>".to_string()
    } else {
        record
            .transfers
            .iter()
            .map(|t| {
                format!(
                    "<li>{} <small>{}</small></li>",
                    escape_html(&t.file_name),
                    t.timestamp.to_rfc3339()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Merchant Dashboard</title></head>\n<body>\n\
         <h1>Merchant Dashboard</h1>\n{}\n<h2>Received Files</h2>\n<ul>\n{}\n</ul>\n\
         </body>\n</html>",
        token_img, transfers
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
