use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::cashier::{DepositWatcher, GatewayAdapter, WithdrawalGate, GATEWAY_ADDRESS_PREFIX};
use crate::models::{WithdrawalRequest, WithdrawalState};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub watcher: Arc<DepositWatcher>,
    pub gateway: Arc<GatewayAdapter>,
    pub gate: Arc<WithdrawalGate>,
    /// Currency scanned when the node notify hook fires
    pub default_currency: String,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/hooks/gateway", post(gateway_hook))
        .route("/hooks/node", get(node_hook))
        .route("/admin/rescan", post(rescan_address))
        .route("/admin/withdrawals/pending", get(pending_withdrawals))
        .route("/admin/withdrawals/:id/approve", post(approve_withdrawal))
        .route("/admin/withdrawals/:id/reject", post(reject_withdrawal))
        .route("/withdrawals", post(submit_withdrawal))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Payment-gateway webhook. Always answers 200 "OK" — garbage payloads are
/// logged and dropped inside the adapter, and an error response would only
/// provoke sender retry storms.
async fn gateway_hook(State(state): State<AppState>, body: Bytes) -> &'static str {
    state.gateway.handle_webhook(&body).await;
    "OK"
}

/// Node notify hook (`walletnotify=curl ...`). Kicks off a full scan of the
/// default currency in the background and returns immediately.
async fn node_hook(State(state): State<AppState>) -> &'static str {
    let watcher = state.watcher.clone();
    let currency = state.default_currency.clone();
    tokio::spawn(async move {
        if let Err(e) = watcher.scan_currency(&currency).await {
            warn!(currency, error = %e, "node-notify scan failed");
        }
    });
    "OK"
}

/// Administrative single-address rescan; routes on the gateway namespace
async fn rescan_address(
    State(state): State<AppState>,
    Json(req): Json<RescanRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(bill_id) = req.address.strip_prefix(GATEWAY_ADDRESS_PREFIX) {
        state.gateway.rescan_bill(bill_id).await?;
    } else {
        state.watcher.rescan_address(&req.address).await?;
    }
    Ok(Json(json!({ "status": "ok", "address": req.address })))
}

/// Submit a withdrawal request
async fn submit_withdrawal(
    State(state): State<AppState>,
    Json(req): Json<SubmitWithdrawalRequest>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    if req.amount <= 0 {
        return Err(ApiError::BadRequest(
            "withdrawal amount must be positive".to_string(),
        ));
    }
    let request = WithdrawalRequest::new(&req.username, &req.ticker, &req.address, req.amount);
    let result = state.gate.submit(request).await?;
    Ok(Json(WithdrawalResponse::from(result)))
}

/// Withdrawals awaiting manual review
async fn pending_withdrawals(
    State(state): State<AppState>,
) -> Json<Vec<WithdrawalResponse>> {
    Json(
        state
            .gate
            .pending()
            .into_iter()
            .map(WithdrawalResponse::from)
            .collect(),
    )
}

async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let result = state.gate.approve(id).await?;
    Ok(Json(WithdrawalResponse::from(result)))
}

async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let result = state.gate.reject(id)?;
    Ok(Json(WithdrawalResponse::from(result)))
}

// ===== Request/Response Types =====

#[derive(Deserialize)]
struct RescanRequest {
    address: String,
}

#[derive(Deserialize)]
struct SubmitWithdrawalRequest {
    username: String,
    ticker: String,
    address: String,
    amount: i64,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct WithdrawalResponse {
    id: Uuid,
    state: WithdrawalState,
    txid: Option<String>,
}

impl From<WithdrawalRequest> for WithdrawalResponse {
    fn from(request: WithdrawalRequest) -> Self {
        Self {
            id: request.id,
            state: request.state,
            txid: request.txid,
        }
    }
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    Internal(anyhow::Error),
    BadRequest(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                warn!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
