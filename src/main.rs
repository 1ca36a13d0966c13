//! Cashier service entrypoint.
//!
//! Wires the external ports (node RPC, payment gateway, accountant), spawns
//! the periodic deposit poller, and serves the webhook/admin HTTP surface.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cashier_backend::api::{create_router, AppState};
use cashier_backend::cashier::{
    spawn_deposit_poller, AccountantNotifier, DepositWatcher, GatewayAdapter, WithdrawalGate,
};
use cashier_backend::config::Config;
use cashier_backend::fees::FeeEngine;
use cashier_backend::ports::{Accountant, GatewayClient, HotWallet, LedgerDirectory, NodeRpc};
use cashier_backend::sources::{AccountantRpc, BitcoindRpc, GatewayApi, NodeHotWallet};

#[derive(Parser, Debug)]
#[command(name = "cashier", about = "Deposit/withdrawal reconciliation service")]
struct Args {
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Seconds between deposit scans (overrides SCAN_INTERVAL_SECS)
    #[arg(long)]
    scan_interval: Option<u64>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cashier_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(interval) = args.scan_interval {
        config.scan_interval_secs = interval;
    }

    init_tracing();
    info!("🏦 Cashier starting");
    if config.cold_wallet_address.is_empty() {
        info!("no cold wallet address configured");
    } else {
        info!(address = %config.cold_wallet_address, "cold wallet reserve address");
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    // The accountant service is both the notification sink and the directory
    // for addresses, contracts, and fee profiles
    let accountant = Arc::new(AccountantRpc::new(
        http_client.clone(),
        config.accountant_url.clone(),
    ));
    let ledger: Arc<dyn LedgerDirectory> = accountant.clone();
    let notifier = AccountantNotifier::new(accountant.clone() as Arc<dyn Accountant>);

    let node: Arc<dyn NodeRpc> = Arc::new(BitcoindRpc::new(
        http_client.clone(),
        config.node_rpc_url.clone(),
        config.node_rpc_user.clone(),
        config.node_rpc_password.clone(),
    ));
    let mut nodes: HashMap<String, Arc<dyn NodeRpc>> = HashMap::new();
    nodes.insert(config.default_currency.clone(), node);

    let watcher = Arc::new(DepositWatcher::new(
        nodes.clone(),
        ledger.clone(),
        notifier.clone(),
        config.min_confirmations,
    ));

    let gateway_client: Arc<dyn GatewayClient> = Arc::new(GatewayApi::new(
        http_client.clone(),
        config.gateway_url.clone(),
        config.gateway_api_key.clone(),
        config.gateway_currency.clone(),
    ));
    let gateway = Arc::new(GatewayAdapter::new(
        gateway_client,
        ledger.clone(),
        notifier.clone(),
        config.gateway_currency.clone(),
    ));

    let hot_wallet: Arc<dyn HotWallet> = Arc::new(NodeHotWallet::new(nodes.clone()));
    let gate = Arc::new(WithdrawalGate::new(
        ledger,
        hot_wallet,
        nodes,
        FeeEngine::new(config.trial_period),
        config.withdrawal_ceiling,
    ));

    // Forward pending-withdrawal notices to the user-notification pipeline
    let mut notices = gate.subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            info!(
                id = %notice.id,
                username = %notice.username,
                ticker = %notice.ticker,
                amount = notice.amount,
                "user notified: withdrawal pending manual review"
            );
        }
    });

    tokio::spawn(spawn_deposit_poller(
        watcher.clone(),
        config.scan_interval_secs,
    ));

    let state = AppState {
        watcher,
        gateway,
        gate,
        default_currency: config.default_currency.clone(),
    };
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    info!("🌐 Cashier listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
