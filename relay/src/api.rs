//! # REST API
//!
//! Builds the axum router that exposes the relay's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                    |
//! |--------|-------------------------------|--------------------------------|
//! | GET    | `/health`                     | Liveness probe                 |
//! | GET    | `/status`                     | Relay status summary           |
//! | POST   | `/relay`                      | Submit a signed intent         |
//! | GET    | `/accounts/:id`               | Account state                  |
//! | GET    | `/accounts/:id/transactions`  | Account transaction history    |

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use flux_protocol::ledger::LedgerStore;
use flux_protocol::money;
use flux_protocol::relay::{RelayError, RelayRequest, RelayService};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The relay's reported version string.
    pub version: String,
    /// Process start instant, for uptime reporting.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// The transport-agnostic relay pipeline.
    pub service: RelayService,
    /// Direct ledger handle for read endpoints.
    pub ledger: Arc<LedgerStore>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/relay", post(relay_handler))
        .route("/accounts/:id", get(account_handler))
        .route("/accounts/:id/transactions", get(transactions_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Relay software version.
    pub version: String,
    /// Seconds since process start.
    pub uptime_seconds: i64,
    /// Number of materialized ledger accounts.
    pub accounts: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /accounts/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: String,
    /// Balance in display units, e.g. `"50.00"`.
    pub balance: String,
    /// Balance in micros.
    pub balance_micros: u64,
    /// Number of recorded transactions.
    pub tx_count: u64,
}

/// One entry in the `GET /accounts/:id/transactions` listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    pub id: String,
    pub tx_type: String,
    pub status: String,
    pub amount: Option<String>,
    pub amount_micros: Option<u64>,
    pub created_at: String,
    pub metadata: serde_json::Value,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Maps pipeline rejections to HTTP status codes.
fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::MissingField(_) | RelayError::Parse(_) => StatusCode::BAD_REQUEST,
        RelayError::MalformedInput(_) | RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
        RelayError::Expired(_) => StatusCode::GONE,
        RelayError::Replayed { .. } => StatusCode::CONFLICT,
        RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the relay is alive.
///
/// Liveness probe for orchestrators. Intentionally does not touch the
/// ledger — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns relay status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        uptime_seconds: (chrono::Utc::now() - state.started_at).num_seconds(),
        accounts: state.ledger.account_count(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /relay` — runs a signed intent through the relay pipeline.
///
/// Success returns the credit receipt; failures map to status codes via
/// [`status_for`] with a `{ success: false, error }` body. Every outcome
/// is recorded in the metrics registry.
async fn relay_handler(
    State(state): State<AppState>,
    Json(request): Json<RelayRequest>,
) -> impl IntoResponse {
    state.metrics.relay_requests_total.inc();
    let timer = state.metrics.relay_latency_seconds.start_timer();

    let result = state.service.process(request);
    timer.observe_duration();

    match result {
        Ok(response) => {
            state.metrics.credits_total.inc();
            state
                .metrics
                .credited_micros_total
                .inc_by(response.transaction.amount_micros);
            state.metrics.accounts.set(state.ledger.account_count() as i64);
            (StatusCode::OK, Json(serde_json::to_value(response).unwrap())).into_response()
        }
        Err(err) => {
            state
                .metrics
                .relay_rejections_total
                .with_label_values(&[err.reason()])
                .inc();
            let body = ErrorResponse::new(err.to_string());
            (
                status_for(&err),
                Json(serde_json::to_value(body).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /accounts/:id` — returns account state.
///
/// Returns 404 for accounts that have never been credited.
async fn account_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.ledger.get_account(&id) {
        Ok(Some(account)) => {
            let resp = AccountResponse {
                account_id: account.account_id,
                balance: money::display_from_micros(account.balance_micros),
                balance_micros: account.balance_micros,
                tx_count: account.tx_count,
            };
            (StatusCode::OK, Json(serde_json::to_value(resp).unwrap())).into_response()
        }
        Ok(None) => {
            let err = ErrorResponse::new(format!("account not found: {}", id));
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(account = %id, error = %e, "account lookup failed");
            let err = ErrorResponse::new("ledger error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

/// `GET /accounts/:id/transactions` — returns the account's transaction
/// history, oldest first. An unknown account yields an empty list.
async fn transactions_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.ledger.transactions_for(&id) {
        Ok(records) => {
            let entries: Vec<TransactionEntry> = records
                .into_iter()
                .map(|r| TransactionEntry {
                    id: r.id,
                    tx_type: serde_json::to_value(r.tx_type)
                        .ok()
                        .and_then(|v| v.as_str().map(String::from))
                        .unwrap_or_default(),
                    status: serde_json::to_value(r.status)
                        .ok()
                        .and_then(|v| v.as_str().map(String::from))
                        .unwrap_or_default(),
                    amount: r.amount_micros.map(money::display_from_micros),
                    amount_micros: r.amount_micros,
                    created_at: r.created_at.to_rfc3339(),
                    metadata: serde_json::to_value(r.metadata).unwrap_or_default(),
                })
                .collect();
            (StatusCode::OK, Json(serde_json::to_value(entries).unwrap())).into_response()
        }
        Err(e) => {
            tracing::error!(account = %id, error = %e, "transaction listing failed");
            let err = ErrorResponse::new("ledger error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::to_value(err).unwrap()),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
