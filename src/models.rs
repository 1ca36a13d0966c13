use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contract families with distinct wire scaling rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    Cash,
    Prediction,
    Futures,
}

impl ContractType {
    pub fn as_str(&self) -> &str {
        match self {
            ContractType::Cash => "cash",
            ContractType::Prediction => "prediction",
            ContractType::Futures => "futures",
        }
    }
}

/// Immutable contract reference data, loaded once per operation.
///
/// `denominated_contract` must be resolved for any non-prediction price math,
/// and `payout_contract` for futures quantity math; the directory is expected
/// to hand out fully resolved contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub ticker: String,
    pub contract_type: ContractType,
    pub denominator: i64,
    pub tick_size: i64,
    pub lot_size: i64,
    /// Transaction fee in bps of the transaction size
    pub fee_bps: i64,
    pub deposit_base_fee: i64,
    pub deposit_bps_fee: i64,
    pub withdraw_base_fee: i64,
    pub withdraw_bps_fee: i64,
    pub denominated_contract: Option<Box<Contract>>,
    pub payout_contract: Option<Box<Contract>>,
}

impl Contract {
    /// Minimal cash contract; fee fields default to zero
    pub fn cash(ticker: &str, denominator: i64, tick_size: i64, lot_size: i64) -> Self {
        Self {
            ticker: ticker.to_string(),
            contract_type: ContractType::Cash,
            denominator,
            tick_size,
            lot_size,
            fee_bps: 0,
            deposit_base_fee: 0,
            deposit_bps_fee: 0,
            withdraw_base_fee: 0,
            withdraw_bps_fee: 0,
            denominated_contract: None,
            payout_contract: None,
        }
    }

    pub fn with_deposit_fees(mut self, base: i64, bps: i64) -> Self {
        self.deposit_base_fee = base;
        self.deposit_bps_fee = bps;
        self
    }

    pub fn with_withdraw_fees(mut self, base: i64, bps: i64) -> Self {
        self.withdraw_base_fee = base;
        self.withdraw_bps_fee = bps;
        self
    }
}

/// Per-user fee multipliers, in percent (100 = schedule rate)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeeProfile {
    pub aggressive_factor: f64,
    pub passive_factor: f64,
    pub deposit_factor: f64,
    pub withdraw_factor: f64,
}

impl Default for UserFeeProfile {
    fn default() -> Self {
        Self {
            aggressive_factor: 100.0,
            passive_factor: 100.0,
            deposit_factor: 100.0,
            withdraw_factor: 100.0,
        }
    }
}

/// A fee denominated in one contract's ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub ticker: String,
    pub amount: i64,
}

/// Read-only cached view of a ledger-owned deposit address.
///
/// `accounted_for` is the watermark: the highest observed total the ledger
/// has already credited. Only the ledger mutates it; the cashier re-reads it
/// every scan and never writes it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedAddress {
    pub address: String,
    pub currency: String,
    pub username: String,
    pub active: bool,
    pub accounted_for: i64,
}

/// Transient per-scan observation of an external balance. Never persisted.
#[derive(Debug, Clone)]
pub struct DepositObservation {
    pub address: String,
    pub currency: String,
    /// Total ever received, in the smallest integer unit
    pub total_received: i64,
}

/// Withdrawal request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalState {
    Requested,
    AutoApproved,
    PendingManualReview,
    Executed,
    Rejected,
}

impl WithdrawalState {
    pub fn as_str(&self) -> &str {
        match self {
            WithdrawalState::Requested => "requested",
            WithdrawalState::AutoApproved => "auto_approved",
            WithdrawalState::PendingManualReview => "pending_manual_review",
            WithdrawalState::Executed => "executed",
            WithdrawalState::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub username: String,
    pub ticker: String,
    /// Destination address on the external network
    pub address: String,
    /// Requested amount in the smallest integer unit
    pub amount: i64,
    pub state: WithdrawalState,
    pub requested_at: DateTime<Utc>,
    /// Transaction id on the external network, once executed
    pub txid: Option<String>,
}

impl WithdrawalRequest {
    pub fn new(username: &str, ticker: &str, address: &str, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            ticker: ticker.to_string(),
            address: address.to_string(),
            amount,
            state: WithdrawalState::Requested,
            requested_at: Utc::now(),
            txid: None,
        }
    }
}

/// An authoritative gateway bill, as fetched by id (never from webhook bodies)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    /// Amount in decimal currency units (e.g. pesos, not centavos)
    pub amount: f64,
    pub currency: String,
}
