//! Gateway webhook behavior through the full HTTP surface.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use parking_lot::Mutex;
use tower::ServiceExt;

use cashier_backend::api::{create_router, AppState};
use cashier_backend::cashier::{
    AccountantNotifier, DepositWatcher, GatewayAdapter, WithdrawalGate,
};
use cashier_backend::fees::FeeEngine;
use cashier_backend::models::{Bill, Contract, TrackedAddress, UserFeeProfile};
use cashier_backend::ports::{Accountant, GatewayClient, HotWallet, LedgerDirectory, NodeRpc};

// ===== Fakes =====

#[derive(Default)]
struct FakeAccountant {
    notifications: Mutex<Vec<(String, i64)>>,
}

#[async_trait]
impl Accountant for FakeAccountant {
    async fn notify_deposit(&self, address: &str, total_received: i64) -> Result<()> {
        self.notifications
            .lock()
            .push((address.to_string(), total_received));
        Ok(())
    }
}

struct FakeLedger;

#[async_trait]
impl LedgerDirectory for FakeLedger {
    async fn lookup_address(&self, _address: &str) -> Result<Option<TrackedAddress>> {
        // Gateway synthetic addresses start untracked: watermark zero
        Ok(None)
    }
    async fn active_addresses(&self, _currency: &str) -> Result<Vec<TrackedAddress>> {
        Ok(Vec::new())
    }
    async fn lookup_contract(&self, ticker: &str) -> Result<Contract> {
        // Peso-style cash contract: 100 centavos per unit
        Ok(Contract::cash(ticker, 100, 1, 1))
    }
    async fn fee_profile(&self, _username: &str) -> Result<UserFeeProfile> {
        Ok(UserFeeProfile::default())
    }
}

struct FakeGateway {
    bills: HashMap<String, f64>,
    fetches: Mutex<Vec<String>>,
    /// Simulate the gateway API being unreachable
    unreachable: bool,
}

impl FakeGateway {
    fn with_bill(id: &str, amount: f64) -> Self {
        Self {
            bills: HashMap::from([(id.to_string(), amount)]),
            fetches: Mutex::new(Vec::new()),
            unreachable: false,
        }
    }
}

#[async_trait]
impl GatewayClient for FakeGateway {
    async fn get_bill(&self, id: &str) -> Result<Bill> {
        self.fetches.lock().push(id.to_string());
        if self.unreachable {
            return Err(anyhow!("gateway unreachable"));
        }
        let amount = *self
            .bills
            .get(id)
            .with_context(|| format!("no bill {}", id))?;
        Ok(Bill {
            id: id.to_string(),
            amount,
            currency: "MXN".to_string(),
        })
    }

    fn parse_existing_bill(&self, payload: &serde_json::Value) -> Result<String> {
        let id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .context("payload has no bill id")?;
        payload
            .get("amount")
            .context("payload has no amount field")?;
        Ok(id.to_string())
    }

    fn amount_after_fees(&self, amount: i64) -> i64 {
        amount - 100
    }
}

struct FakeNode;

#[async_trait]
impl NodeRpc for FakeNode {
    async fn list_received_by_address(
        &self,
        _min_confirmations: u32,
    ) -> Result<Vec<(String, i64)>> {
        Ok(Vec::new())
    }
    async fn get_received_by_address(&self, _address: &str, _min_confirmations: u32) -> Result<i64> {
        Ok(0)
    }
    async fn send_to_address(&self, _address: &str, _amount: i64) -> Result<String> {
        Ok("txid".to_string())
    }
    async fn get_balance(&self) -> Result<i64> {
        Ok(0)
    }
}

struct FakeWallet;

#[async_trait]
impl HotWallet for FakeWallet {
    async fn available_balance(&self, _ticker: &str) -> Result<i64> {
        Ok(0)
    }
}

fn app_with(
    gateway_client: Arc<FakeGateway>,
    accountant: Arc<FakeAccountant>,
) -> axum::Router {
    let ledger: Arc<dyn LedgerDirectory> = Arc::new(FakeLedger);
    let notifier = AccountantNotifier::new(accountant);
    let mut nodes: HashMap<String, Arc<dyn NodeRpc>> = HashMap::new();
    nodes.insert("BTC".to_string(), Arc::new(FakeNode));

    let watcher = Arc::new(DepositWatcher::new(
        nodes.clone(),
        ledger.clone(),
        notifier.clone(),
        6,
    ));
    let gateway = Arc::new(GatewayAdapter::new(
        gateway_client,
        ledger.clone(),
        notifier,
        "MXN".to_string(),
    ));
    let gate = Arc::new(WithdrawalGate::new(
        ledger,
        Arc::new(FakeWallet),
        nodes,
        FeeEngine::new(false),
        i64::MAX,
    ));

    create_router(AppState {
        watcher,
        gateway,
        gate,
        default_currency: "BTC".to_string(),
    })
}

fn webhook_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/hooks/gateway")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ===== Scenarios =====

#[tokio::test]
async fn malformed_webhook_returns_ok_and_reconciles_nothing() {
    let gateway = Arc::new(FakeGateway::with_bill("bill-1", 150.0));
    let accountant = Arc::new(FakeAccountant::default());
    let app = app_with(gateway.clone(), accountant.clone());

    let response = app.oneshot(webhook_post("this is not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(gateway.fetches.lock().is_empty());
    assert!(accountant.notifications.lock().is_empty());
}

#[tokio::test]
async fn unexpected_shape_webhook_returns_ok_and_reconciles_nothing() {
    let gateway = Arc::new(FakeGateway::with_bill("bill-1", 150.0));
    let accountant = Arc::new(FakeAccountant::default());
    let app = app_with(gateway.clone(), accountant.clone());

    let response = app
        .oneshot(webhook_post(r#"{"event": "something_else"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(gateway.fetches.lock().is_empty());
    assert!(accountant.notifications.lock().is_empty());
}

#[tokio::test]
async fn valid_webhook_refetches_bill_and_notifies_fee_adjusted_total() {
    let gateway = Arc::new(FakeGateway::with_bill("bill-1", 150.0));
    let accountant = Arc::new(FakeAccountant::default());
    let app = app_with(gateway.clone(), accountant.clone());

    // Webhook claims a wildly wrong amount; only the id matters
    let response = app
        .oneshot(webhook_post(
            r#"{"id": "bill-1", "amount": "999999.00", "status": "charge.success"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The authoritative fetch happened, and the notified amount comes from
    // it: 150.00 MXN -> 15000 centavos, minus the fake 100-centavo fee.
    assert_eq!(gateway.fetches.lock().as_slice(), &["bill-1".to_string()]);
    assert_eq!(
        accountant.notifications.lock().as_slice(),
        &[("gateway:bill-1".to_string(), 14_900)]
    );
}

#[tokio::test]
async fn unreachable_gateway_still_returns_ok_without_notifying() {
    let mut gateway = FakeGateway::with_bill("bill-1", 150.0);
    gateway.unreachable = true;
    let gateway = Arc::new(gateway);
    let accountant = Arc::new(FakeAccountant::default());
    let app = app_with(gateway.clone(), accountant.clone());

    let response = app
        .oneshot(webhook_post(r#"{"id": "bill-1", "amount": "150.00"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gateway.fetches.lock().len(), 1);
    assert!(accountant.notifications.lock().is_empty());
}

#[tokio::test]
async fn admin_rescan_routes_gateway_namespace_to_bill_refetch() {
    let gateway = Arc::new(FakeGateway::with_bill("bill-7", 20.0));
    let accountant = Arc::new(FakeAccountant::default());
    let app = app_with(gateway.clone(), accountant.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/admin/rescan")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"address": "gateway:bill-7"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(gateway.fetches.lock().as_slice(), &["bill-7".to_string()]);
    // 20.00 -> 2000 centavos, minus the fake fee
    assert_eq!(
        accountant.notifications.lock().as_slice(),
        &[("gateway:bill-7".to_string(), 1_900)]
    );
}

#[tokio::test]
async fn health_endpoint_reports_version() {
    let gateway = Arc::new(FakeGateway::with_bill("bill-1", 1.0));
    let accountant = Arc::new(FakeAccountant::default());
    let app = app_with(gateway, accountant);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "healthy");
}
