//! # REST API
//!
//! Builds the axum router that exposes the ledger over HTTP. All handlers
//! share [`AppState`] through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                            | Description                      |
//! |--------|---------------------------------|----------------------------------|
//! | GET    | `/health`                       | Liveness probe                   |
//! | GET    | `/status`                       | Token parameters and supply      |
//! | GET    | `/accounts/:address`            | Balances and staking timers      |
//! | GET    | `/allowances/:owner/:spender`   | Remaining allowance              |
//! | POST   | `/operations`                   | Apply one operation              |
//!
//! ## Applying operations
//!
//! `POST /operations` takes `{ "caller": "...", "operation": { ... } }`.
//! Writers are serialized by the state lock. Each operation runs against a
//! clone of the live token; the clone is committed to disk and only then
//! swapped in, so a storage failure never leaves memory ahead of disk.
//!
//! Rejections come back as `{ error, kind, retryable }` with status 403 for
//! `not_owner` and 422 for every other ledger error.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use regalium_contracts::{LedgerError, Operation, Outcome, RegaliumToken};
use regalium_protocol::crypto::snapshot_digest;
use regalium_protocol::storage::LedgerDb;
use regalium_protocol::{Address, Amount, Timestamp};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state for every request handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The live ledger.
    pub token: Arc<RwLock<RegaliumToken>>,
    /// Snapshot and journal storage.
    pub db: Arc<LedgerDb>,
    pub metrics: SharedMetrics,
}

/// One line of the operation journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub caller: Address,
    pub operation: Operation,
    pub outcome: Outcome,
    pub applied_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the API [`Router`] with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/accounts/:address", get(account_handler))
        .route("/allowances/:owner/:spender", get(allowance_handler))
        .route("/operations", post(operation_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /operations`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Identity the operation is performed as.
    pub caller: Address,
    pub operation: Operation,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
    pub total_supply: Amount,
    pub reserve_balance: Amount,
    pub presale_end_time: Timestamp,
    pub presale_open: bool,
    pub presale_rate: u64,
    pub buyback_rate: u64,
    pub buyback_enabled: bool,
    pub stake_cooldown_secs: u64,
    pub mining_difficulty: u64,
    pub mining_reward: Amount,
    pub accounts: usize,
    /// Operations committed since genesis.
    pub operations: u64,
    /// BLAKE3 fingerprint of the persisted snapshot.
    pub snapshot_digest: Option<String>,
    pub timestamp: String,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    pub liquid: Amount,
    pub locked: Amount,
    pub in_game: Amount,
    pub last_stake_action: Option<Timestamp>,
    pub last_stake_change: Option<Timestamp>,
    /// Seconds before this account may stake or unstake again.
    pub cooldown_remaining_secs: i64,
}

/// Response payload for `GET /allowances/:owner/:spender`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    pub allowance: Amount,
}

/// Error body for every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable kind.
    pub kind: String,
    /// Whether resubmitting (with different input) can succeed.
    pub retryable: bool,
}

impl ErrorResponse {
    fn from_ledger(err: &LedgerError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            retryable: err.is_retryable(),
        }
    }
}

fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::NotOwner { .. } => StatusCode::FORBIDDEN,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — liveness probe.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — token parameters, supply and persistence summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    let token = state.token.read().await;

    let operations = state.db.operation_count().unwrap_or_else(|e| {
        tracing::warn!("failed to read operation count: {}", e);
        0
    });
    let digest = match state.db.snapshot_bytes() {
        Ok(bytes) => bytes.map(|b| snapshot_digest(&b)),
        Err(e) => {
            tracing::warn!("failed to read snapshot: {}", e);
            None
        }
    };

    Json(StatusResponse {
        version: state.version.clone(),
        name: token.name().to_string(),
        symbol: token.symbol().to_string(),
        decimals: token.decimals(),
        owner: token.owner().clone(),
        total_supply: token.total_supply(),
        reserve_balance: token.reserve_balance(),
        presale_end_time: token.presale_end_time(),
        presale_open: token.is_presale_open(now),
        presale_rate: token.presale_rate(),
        buyback_rate: token.buyback_rate(),
        buyback_enabled: token.buyback_enabled(),
        stake_cooldown_secs: token.stake_cooldown_secs(),
        mining_difficulty: token.mining_difficulty(),
        mining_reward: token.mining_reward(),
        accounts: token.ledger().account_count(),
        operations,
        snapshot_digest: digest,
        timestamp: now.to_rfc3339(),
    })
}

/// `GET /accounts/:address` — zeroed for addresses the ledger has never seen.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let address = Address::new(address);
    let token = state.token.read().await;
    let account = token.account(&address).cloned().unwrap_or_default();
    let cooldown_remaining_secs = token.remaining_cooldown(&address, Utc::now());
    drop(token);

    Json(AccountResponse {
        address,
        liquid: account.liquid,
        locked: account.locked,
        in_game: account.in_game,
        last_stake_action: account.last_stake_action,
        last_stake_change: account.last_stake_change,
        cooldown_remaining_secs,
    })
}

/// `GET /allowances/:owner/:spender`
async fn allowance_handler(
    Path((owner, spender)): Path<(String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let owner = Address::new(owner);
    let spender = Address::new(spender);
    let allowance = state.token.read().await.allowance(&owner, &spender);

    Json(AllowanceResponse {
        owner,
        spender,
        allowance,
    })
}

/// `POST /operations` — apply, persist, then publish one operation.
async fn operation_handler(
    State(state): State<AppState>,
    Json(req): Json<OperationRequest>,
) -> Response {
    let timer = state.metrics.operation_latency_seconds.start_timer();
    let now = Utc::now();
    let name = req.operation.name();

    let mut live = state.token.write().await;
    let mut next = live.clone();

    let outcome = match next.apply(&req.caller, &req.operation, now) {
        Ok(outcome) => outcome,
        Err(err) => {
            timer.stop_and_discard();
            state
                .metrics
                .operations_rejected_total
                .with_label_values(&[err.kind()])
                .inc();
            if req.operation.is_owner_only() {
                tracing::warn!(caller = %req.caller, operation = name, error = %err, "owner operation rejected");
            } else {
                tracing::debug!(caller = %req.caller, operation = name, error = %err, "operation rejected");
            }
            return (status_for(&err), Json(ErrorResponse::from_ledger(&err))).into_response();
        }
    };

    let entry = JournalEntry {
        caller: req.caller,
        operation: req.operation,
        outcome: outcome.clone(),
        applied_at: now,
    };
    let seq = match state.db.commit(&next, &entry) {
        Ok(seq) => seq,
        Err(e) => {
            timer.stop_and_discard();
            tracing::error!(operation = name, "failed to persist operation: {}", e);
            let body = ErrorResponse {
                error: format!("storage failure: {}", e),
                kind: "storage".into(),
                retryable: true,
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    *live = next;
    state.metrics.observe(&live);
    drop(live);

    state
        .metrics
        .operations_applied_total
        .with_label_values(&[name])
        .inc();
    timer.observe_duration();
    tracing::info!(seq, caller = %entry.caller, operation = name, "operation committed");

    (StatusCode::OK, Json(outcome)).into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use http_body_util::BodyExt;
    use regalium_contracts::{Payout, TokenConfig};
    use tower::ServiceExt;

    const OWNER: &str = "0xowner";

    /// Token with a presale that is still open and a small supply.
    fn test_config() -> TokenConfig {
        TokenConfig {
            initial_supply: 1_000_000,
            presale_end_time: Utc::now() + Duration::days(365),
            ..TokenConfig::default()
        }
    }

    fn test_app_state() -> AppState {
        let db = Arc::new(LedgerDb::open_temporary().expect("temp db"));
        let token = RegaliumToken::deploy(Address::from(OWNER), &test_config());
        db.put_genesis(&token).expect("genesis");
        let metrics = Arc::new(crate::metrics::LedgerMetrics::new().expect("metrics"));
        metrics.observe(&token);

        AppState {
            version: "0.1.0-test".into(),
            token: Arc::new(RwLock::new(token)),
            db,
            metrics,
        }
    }

    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Raw JSON bodies: amounts may not fit in `serde_json::Value`.
    async fn post_operation(router: &Router, body: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri("/operations")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_token_parameters() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.symbol, "RGLM");
        assert_eq!(resp.owner, Address::from(OWNER));
        assert_eq!(resp.total_supply, 1_000_000);
        assert!(resp.presale_open);
        assert!(!resp.buyback_enabled);
        assert_eq!(resp.operations, 0);
        assert_eq!(resp.snapshot_digest.map(|d| d.len()), Some(64));
    }

    #[tokio::test]
    async fn unknown_account_is_zeroed() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/accounts/0xnobody").await;

        assert_eq!(status, StatusCode::OK);
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.address, Address::from("0xnobody"));
        assert_eq!(resp.liquid, 0);
        assert_eq!(resp.locked, 0);
        assert_eq!(resp.cooldown_remaining_secs, 0);
    }

    #[tokio::test]
    async fn transfer_is_applied_and_journaled() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_operation(
            &router,
            r#"{"caller":"0xowner","operation":{"transfer":{"to":"0xalice","amount":250}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let outcome: Outcome = serde_json::from_slice(&body).unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let (_, body) = get(&router, "/accounts/0xalice").await;
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.liquid, 250);

        assert_eq!(state.db.operation_count().unwrap(), 1);
        let entry: JournalEntry = state.db.journal_entry(0).unwrap().unwrap();
        assert_eq!(entry.caller, Address::from(OWNER));
        assert_eq!(entry.operation.name(), "transfer");

        let persisted: RegaliumToken = state.db.load_snapshot().unwrap().unwrap();
        assert_eq!(persisted.balance_of(&Address::from("0xalice")), 250);
    }

    #[tokio::test]
    async fn rejected_operation_returns_422_and_changes_nothing() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_operation(
            &router,
            r#"{"caller":"0xalice","operation":{"sell_tokens":{"amount":20}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "buyback_disabled");
        assert!(!err.retryable);
        assert_eq!(state.db.operation_count().unwrap(), 0);
        assert_eq!(
            state
                .metrics
                .operations_rejected_total
                .with_label_values(&["buyback_disabled"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn owner_only_operation_returns_403_for_strangers() {
        let router = create_router(test_app_state());

        let (status, body) = post_operation(
            &router,
            r#"{"caller":"0xmallory","operation":{"set_difficulty":{"difficulty":1}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "not_owner");
    }

    #[tokio::test]
    async fn stale_mining_difficulty_is_retryable() {
        let router = create_router(test_app_state());

        let (status, body) = post_operation(
            &router,
            r#"{"caller":"0xminer","operation":{"mine":{"nonce":1,"difficulty":3}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "difficulty_not_met");
        assert!(err.retryable);
    }

    #[tokio::test]
    async fn presale_payment_then_buyback_pays_out() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, body) = post_operation(
            &router,
            r#"{"caller":"0xbuyer","operation":{"receive_payment":{"value":1000000000000000000000}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let outcome: Outcome = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            outcome,
            Outcome::Minted {
                amount: 2_000_000_000_000_000_000_000
            }
        );

        let (status, _) = post_operation(
            &router,
            r#"{"caller":"0xowner","operation":{"set_buyback_enabled":{"enabled":true}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_operation(
            &router,
            r#"{"caller":"0xbuyer","operation":{"sell_tokens":{"amount":20}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let outcome: Outcome = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            outcome,
            Outcome::Paid(Payout {
                recipient: Address::from("0xbuyer"),
                amount: 30
            })
        );

        assert_eq!(state.db.operation_count().unwrap(), 3);
        assert!(state.token.read().await.is_conserved());
    }

    #[tokio::test]
    async fn allowance_endpoint_reflects_approve() {
        let router = create_router(test_app_state());

        let (status, _) = post_operation(
            &router,
            r#"{"caller":"0xowner","operation":{"approve":{"spender":"0xspender","amount":77}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(&router, "/allowances/0xowner/0xspender").await;
        assert_eq!(status, StatusCode::OK);
        let resp: AllowanceResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.allowance, 77);
    }

    #[tokio::test]
    async fn stake_cooldown_surfaces_remaining_seconds() {
        let router = create_router(test_app_state());

        let stake = r#"{"caller":"0xowner","operation":{"stake":{"amount":10}}}"#;
        let (status, _) = post_operation(&router, stake).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_operation(&router, stake).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "stake_cooldown_active");

        let (_, body) = get(&router, "/accounts/0xowner").await;
        let resp: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.locked, 10);
        assert!(resp.cooldown_remaining_secs > 86_000);
    }

    #[tokio::test]
    async fn malformed_operation_is_rejected_by_extractor() {
        let router = create_router(test_app_state());
        let (status, _) = post_operation(
            &router,
            r#"{"caller":"0xowner","operation":{"teleport":{"amount":1}}}"#,
        )
        .await;
        assert!(status.is_client_error());
    }
}
