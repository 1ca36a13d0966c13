//! Ports to every external collaborator.
//!
//! The cashier never talks to a database, node, gateway, or the accountant
//! directly; it goes through these traits. Production implementations live in
//! `sources/`, tests substitute in-memory fakes. Transport guarantees are
//! deliberately weak (best-effort, at-least-once) — watermark semantics on
//! the accountant side are what make repetition safe.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Bill, Contract, TrackedAddress, UserFeeProfile};

/// Read-only view of the ledger's address and contract reference data.
/// The ledger owns all of it; the cashier re-reads per cycle and never
/// writes back.
#[async_trait]
pub trait LedgerDirectory: Send + Sync {
    /// Tracked address by exact key, including gateway-namespaced synthetic
    /// addresses. `None` for addresses the ledger is not tracking.
    async fn lookup_address(&self, address: &str) -> Result<Option<TrackedAddress>>;

    /// All active tracked addresses for one currency, with their watermarks.
    async fn active_addresses(&self, currency: &str) -> Result<Vec<TrackedAddress>>;

    /// Resolve a ticker to a fully resolved contract (denominated/payout
    /// references populated). Fails with `ContractNotFound`.
    async fn lookup_contract(&self, ticker: &str) -> Result<Contract>;

    /// Per-user fee multipliers.
    async fn fee_profile(&self, username: &str) -> Result<UserFeeProfile>;
}

/// One-way, best-effort channel to the ledger service.
#[async_trait]
pub trait Accountant: Send + Sync {
    /// Tell the accountant an address has received at least `total_received`
    /// in total. Absolute value, never a delta; safe to repeat.
    async fn notify_deposit(&self, address: &str, total_received: i64) -> Result<()>;
}

/// bitcoin-like node RPC surface. Amounts are in the smallest integer unit.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `(address, total ever received)` for every address meeting the
    /// confirmation floor.
    async fn list_received_by_address(&self, min_confirmations: u32)
        -> Result<Vec<(String, i64)>>;

    /// Total ever received by one address.
    async fn get_received_by_address(&self, address: &str, min_confirmations: u32) -> Result<i64>;

    /// Broadcast a payment; returns the network transaction id.
    async fn send_to_address(&self, address: &str, amount: i64) -> Result<String>;

    /// Spendable balance of the node's own wallet (the hot wallet).
    async fn get_balance(&self) -> Result<i64>;
}

/// Payment-gateway client.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Fetch the authoritative bill by id. The only amount source we trust.
    async fn get_bill(&self, id: &str) -> Result<Bill>;

    /// Shape-validate a webhook payload and extract the bill id. The payload
    /// is never trusted for anything beyond identity; amounts come from
    /// `get_bill`.
    fn parse_existing_bill(&self, payload: &serde_json::Value) -> Result<String>;

    /// What remains of `amount` (smallest unit) after the gateway's own
    /// collection fee.
    fn amount_after_fees(&self, amount: i64) -> i64;
}

/// Operationally available funds, per currency, in the smallest integer unit.
#[async_trait]
pub trait HotWallet: Send + Sync {
    async fn available_balance(&self, ticker: &str) -> Result<i64>;
}
