//! Periodic deposit watcher for bitcoin-like currencies.
//!
//! Each cycle takes a read-once snapshot of two worlds — what the node says
//! every address has received, and what the ledger says it has already
//! accounted for — intersects them, and dispatches one notification per
//! address that has grown. Dispatch is per-address independent: a timeout
//! notifying for one address never delays or aborts the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::cashier::engine::{reconcile, ScanDecision};
use crate::cashier::notifier::AccountantNotifier;
use crate::models::DepositObservation;
use crate::ports::{LedgerDirectory, NodeRpc};

pub struct DepositWatcher {
    /// currency ticker -> node connection
    nodes: HashMap<String, Arc<dyn NodeRpc>>,
    ledger: Arc<dyn LedgerDirectory>,
    notifier: AccountantNotifier,
    min_confirmations: u32,
}

impl DepositWatcher {
    pub fn new(
        nodes: HashMap<String, Arc<dyn NodeRpc>>,
        ledger: Arc<dyn LedgerDirectory>,
        notifier: AccountantNotifier,
        min_confirmations: u32,
    ) -> Self {
        Self {
            nodes,
            ledger,
            notifier,
            min_confirmations,
        }
    }

    pub fn currencies(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    fn node(&self, currency: &str) -> Result<&Arc<dyn NodeRpc>> {
        self.nodes
            .get(currency)
            .ok_or_else(|| anyhow!("no node connection for currency '{}'", currency))
    }

    /// One reconciliation cycle over every active address of a currency.
    /// Returns how many notifications went out.
    pub async fn scan_currency(&self, currency: &str) -> Result<usize> {
        debug!(currency, "checking for deposits");
        let node = self.node(currency)?;

        // Everything the node has seen at or above the confirmation floor.
        // Listing already filters on confirmations, so every row here has
        // met them by construction.
        let received = node
            .list_received_by_address(self.min_confirmations)
            .await
            .with_context(|| format!("listreceivedbyaddress failed for {}", currency))?;

        // Cached watermarks for every address the ledger is watching
        let accounted_for: HashMap<String, i64> = self
            .ledger
            .active_addresses(currency)
            .await
            .context("fetching active addresses from ledger")?
            .into_iter()
            .map(|a| (a.address, a.accounted_for))
            .collect();

        let mut pending = Vec::new();
        for (address, total_received) in received {
            let Some(&watermark) = accounted_for.get(&address) else {
                continue;
            };
            let observation = DepositObservation {
                address: address.clone(),
                currency: currency.to_string(),
                total_received,
            };
            if let ScanDecision::Notify { total_received } =
                reconcile(&observation, watermark, true)
            {
                pending.push((address, total_received));
            }
        }

        // Independent dispatch; one slow or failing send doesn't hold up the rest
        let sends = pending.into_iter().map(|(address, total)| {
            let notifier = self.notifier.clone();
            async move { notifier.notify_deposit(&address, total).await }
        });
        let sent = join_all(sends).await.into_iter().filter(|ok| *ok).count();

        if sent > 0 {
            info!(currency, sent, "deposit scan dispatched notifications");
        }
        Ok(sent)
    }

    /// On-demand reconciliation of a single tracked address, for the admin
    /// rescan path and the node notify hook. The address's currency comes
    /// from the ledger rather than being assumed.
    pub async fn rescan_address(&self, address: &str) -> Result<()> {
        info!(address, "rescanning address for updates");

        let tracked = self
            .ledger
            .lookup_address(address)
            .await?
            .ok_or_else(|| anyhow!("address '{}' is not tracked by the ledger", address))?;

        let node = self.node(&tracked.currency)?;
        let total_received = node
            .get_received_by_address(address, self.min_confirmations)
            .await
            .with_context(|| format!("getreceivedbyaddress failed for {}", address))?;

        let observation = DepositObservation {
            address: address.to_string(),
            currency: tracked.currency.clone(),
            total_received,
        };
        if let ScanDecision::Notify { total_received } =
            reconcile(&observation, tracked.accounted_for, true)
        {
            self.notifier.notify_deposit(address, total_received).await;
        }
        Ok(())
    }
}

/// Drive periodic scans over every configured currency until shutdown.
/// A failed cycle is logged and skipped; nothing is committed locally, so
/// abandoning a cycle needs no rollback.
pub async fn spawn_deposit_poller(watcher: Arc<DepositWatcher>, interval_secs: u64) {
    info!(interval_secs, "deposit poller started");
    loop {
        let currencies: Vec<String> = watcher.currencies().cloned().collect();
        for currency in currencies {
            if let Err(e) = watcher.scan_currency(&currency).await {
                warn!(currency, error = %e, "deposit scan failed; retrying next cycle");
            }
        }
        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}
