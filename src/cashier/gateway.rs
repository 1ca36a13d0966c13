//! Payment-gateway deposit path.
//!
//! Webhooks only ever tell us *which* bill to look at. The amount is
//! re-fetched from the gateway by id before anything is credited, so a forged
//! webhook body can at worst trigger a harmless re-check. Gateway deposits
//! have no periodic poll — redelivery is the gateway's job, with the admin
//! rescan as the manual fallback.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cashier::engine::{reconcile, ScanDecision};
use crate::cashier::notifier::AccountantNotifier;
use crate::models::DepositObservation;
use crate::ports::{GatewayClient, LedgerDirectory};
use crate::wire;

/// Namespace prefix for synthetic gateway addresses ("gateway:<bill id>")
pub const GATEWAY_ADDRESS_PREFIX: &str = "gateway:";

pub struct GatewayAdapter {
    client: Arc<dyn GatewayClient>,
    ledger: Arc<dyn LedgerDirectory>,
    notifier: AccountantNotifier,
    /// Ticker of the cash contract gateway bills are denominated in
    currency: String,
}

impl GatewayAdapter {
    pub fn new(
        client: Arc<dyn GatewayClient>,
        ledger: Arc<dyn LedgerDirectory>,
        notifier: AccountantNotifier,
        currency: String,
    ) -> Self {
        Self {
            client,
            ledger,
            notifier,
            currency,
        }
    }

    /// Handle a raw webhook body. Never fails: garbage is logged and
    /// swallowed so the sender gets its 200 and doesn't go into a retry
    /// storm, and no reconciliation happens for it.
    pub async fn handle_webhook(&self, body: &[u8]) {
        let payload: serde_json::Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    body = %String::from_utf8_lossy(body),
                    "received undecodable webhook payload from gateway"
                );
                return;
            }
        };

        // Validation only; the parsed bill is discarded in favor of a fresh
        // authoritative fetch keyed by its id.
        let bill_id = match self.client.parse_existing_bill(&payload) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "received unexpected webhook payload from gateway");
                return;
            }
        };

        if let Err(e) = self.rescan_bill(&bill_id).await {
            warn!(bill_id, error = %e, "could not process gateway bill");
        }
    }

    /// Fetch the authoritative bill and run it through reconciliation under
    /// its synthetic address, exactly like a crypto deposit.
    pub async fn rescan_bill(&self, bill_id: &str) -> Result<()> {
        info!(bill_id, "fetching authoritative bill from gateway");
        let bill = self
            .client
            .get_bill(bill_id)
            .await
            .with_context(|| format!("could not get bill for id {}", bill_id))?;

        let contract = self.ledger.lookup_contract(&self.currency).await?;
        let gross = wire::quantity_to_wire(&contract, bill.amount)?;
        let amount = self.client.amount_after_fees(gross);

        let address = format!("{}{}", GATEWAY_ADDRESS_PREFIX, bill.id);
        let accounted_for = self
            .ledger
            .lookup_address(&address)
            .await?
            .map(|a| a.accounted_for)
            .unwrap_or(0);

        let observation = DepositObservation {
            address: address.clone(),
            currency: self.currency.clone(),
            total_received: amount,
        };
        if let ScanDecision::Notify { total_received } =
            reconcile(&observation, accounted_for, true)
        {
            self.notifier.notify_deposit(&address, total_received).await;
        }
        Ok(())
    }
}
