//! Withdrawal gating.
//!
//! Every request passes a safety check before it can execute automatically:
//! the trailing-24h aggregate of requested value must stay under a configured
//! ceiling, and the hot wallet must cover the payout. Anything else waits in
//! manual review and the user is told so. Requests that end up rejected or
//! cancelled still count toward the window — the aggregate is a velocity
//! brake, not a success tally.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fees::FeeEngine;
use crate::models::{WithdrawalRequest, WithdrawalState};
use crate::ports::{HotWallet, LedgerDirectory, NodeRpc};

/// Published whenever a request is parked for manual review
#[derive(Debug, Clone)]
pub struct WithdrawalNotice {
    pub id: Uuid,
    pub username: String,
    pub ticker: String,
    pub amount: i64,
}

pub struct WithdrawalGate {
    ledger: Arc<dyn LedgerDirectory>,
    hot_wallet: Arc<dyn HotWallet>,
    /// currency ticker -> node connection, for automated crypto payouts
    nodes: HashMap<String, Arc<dyn NodeRpc>>,
    fee_engine: FeeEngine,
    /// Ceiling on the trailing-24h aggregate of requested value
    ceiling: i64,
    /// (requested_at, amount) pairs inside the trailing window
    window: RwLock<VecDeque<(DateTime<Utc>, i64)>>,
    requests: RwLock<HashMap<Uuid, WithdrawalRequest>>,
    notice_tx: broadcast::Sender<WithdrawalNotice>,
}

impl WithdrawalGate {
    pub fn new(
        ledger: Arc<dyn LedgerDirectory>,
        hot_wallet: Arc<dyn HotWallet>,
        nodes: HashMap<String, Arc<dyn NodeRpc>>,
        fee_engine: FeeEngine,
        ceiling: i64,
    ) -> Self {
        let (notice_tx, _) = broadcast::channel(64);
        Self {
            ledger,
            hot_wallet,
            nodes,
            fee_engine,
            ceiling,
            window: RwLock::new(VecDeque::new()),
            requests: RwLock::new(HashMap::new()),
            notice_tx,
        }
    }

    /// Subscribe to pending-withdrawal notices (user notification channel)
    pub fn subscribe(&self) -> broadcast::Receiver<WithdrawalNotice> {
        self.notice_tx.subscribe()
    }

    /// Submit a request; it either executes immediately or parks in manual
    /// review. Returns the request in its resulting state.
    pub async fn submit(&self, mut request: WithdrawalRequest) -> Result<WithdrawalRequest> {
        let now = Utc::now();
        // Counted before the decision so refusals still slow the next request
        self.record_at(now, request.amount);

        if self.safety_check(&request, now).await? {
            request.state = WithdrawalState::AutoApproved;
            self.execute(&mut request).await;
        } else {
            self.park(&mut request);
        }

        self.requests
            .write()
            .insert(request.id, request.clone());
        Ok(request)
    }

    /// Auto-approve only when the rolling aggregate stays strictly below the
    /// ceiling and the hot wallet can cover the payout. The aggregate
    /// includes the request under evaluation, and landing exactly on the
    /// ceiling already gates.
    async fn safety_check(&self, request: &WithdrawalRequest, now: DateTime<Utc>) -> Result<bool> {
        if self.window_total_at(now) >= self.ceiling {
            info!(
                id = %request.id,
                ceiling = self.ceiling,
                "withdrawal aggregate over ceiling; routing to manual review"
            );
            return Ok(false);
        }

        // The payout is net of the withdraw fee (the fee portion never
        // leaves the wallet), so covering the requested amount is enough.
        let available = self
            .hot_wallet
            .available_balance(&request.ticker)
            .await
            .context("checking hot wallet balance")?;
        if available < request.amount {
            info!(
                id = %request.id,
                available,
                amount = request.amount,
                "hot wallet cannot cover withdrawal; routing to manual review"
            );
            return Ok(false);
        }

        Ok(true)
    }

    /// Pay out over the currency's node, net of the withdraw fee. A missing
    /// node connection or a failed broadcast demotes the request to manual
    /// review rather than losing it.
    async fn execute(&self, request: &mut WithdrawalRequest) {
        let net = match self.net_amount(request).await {
            Ok(net) => net,
            Err(e) => {
                warn!(id = %request.id, error = %e, "could not price withdrawal; parking for review");
                self.park(request);
                return;
            }
        };

        let Some(node) = self.nodes.get(&request.ticker) else {
            // No automated rail for this currency (e.g. gateway money)
            self.park(request);
            return;
        };

        match node.send_to_address(&request.address, net).await {
            Ok(txid) => {
                info!(id = %request.id, txid, net, "withdrawal executed");
                request.state = WithdrawalState::Executed;
                request.txid = Some(txid);
            }
            Err(e) => {
                warn!(id = %request.id, error = %e, "withdrawal broadcast failed; parking for review");
                self.park(request);
            }
        }
    }

    async fn net_amount(&self, request: &WithdrawalRequest) -> Result<i64> {
        let contract = self.ledger.lookup_contract(&request.ticker).await?;
        let profile = self.ledger.fee_profile(&request.username).await?;
        let fee: i64 = self
            .fee_engine
            .withdraw_fee(&profile, &contract, request.amount)
            .iter()
            .map(|f| f.amount)
            .sum();
        let net = request.amount - fee;
        if net <= 0 {
            return Err(anyhow!("withdrawal of {} is swallowed by fees", request.amount));
        }
        Ok(net)
    }

    fn park(&self, request: &mut WithdrawalRequest) {
        request.state = WithdrawalState::PendingManualReview;
        info!(id = %request.id, username = %request.username, "withdrawal pending manual review");
        let _ = self.notice_tx.send(WithdrawalNotice {
            id: request.id,
            username: request.username.clone(),
            ticker: request.ticker.clone(),
            amount: request.amount,
        });
    }

    /// Requests awaiting manual review
    pub fn pending(&self) -> Vec<WithdrawalRequest> {
        let mut pending: Vec<_> = self
            .requests
            .read()
            .values()
            .filter(|r| r.state == WithdrawalState::PendingManualReview)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.requested_at);
        pending
    }

    /// Manually approve a parked request and execute it. The claim is
    /// atomic, so of two racing approvals exactly one reaches the payout.
    pub async fn approve(&self, id: Uuid) -> Result<WithdrawalRequest> {
        let mut request = self.claim_pending(id)?;
        self.execute(&mut request).await;
        self.requests.write().insert(id, request.clone());
        Ok(request)
    }

    /// Manually reject a parked request
    pub fn reject(&self, id: Uuid) -> Result<WithdrawalRequest> {
        let mut requests = self.requests.write();
        let request = Self::pending_entry(&mut requests, id)?;
        request.state = WithdrawalState::Rejected;
        info!(id = %request.id, "withdrawal rejected");
        Ok(request.clone())
    }

    /// Flip a pending request to `AutoApproved` under the write lock, so a
    /// concurrent resolver sees it as already claimed and fails here instead
    /// of paying out a second time.
    fn claim_pending(&self, id: Uuid) -> Result<WithdrawalRequest> {
        let mut requests = self.requests.write();
        let request = Self::pending_entry(&mut requests, id)?;
        request.state = WithdrawalState::AutoApproved;
        Ok(request.clone())
    }

    fn pending_entry(
        requests: &mut HashMap<Uuid, WithdrawalRequest>,
        id: Uuid,
    ) -> Result<&mut WithdrawalRequest> {
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no withdrawal request {}", id))?;
        if request.state != WithdrawalState::PendingManualReview {
            return Err(anyhow!(
                "withdrawal {} is {}, not pending review",
                id,
                request.state.as_str()
            ));
        }
        Ok(request)
    }

    fn record_at(&self, now: DateTime<Utc>, amount: i64) {
        let mut window = self.window.write();
        window.push_back((now, amount));
        Self::prune(&mut window, now);
    }

    /// Sum of requested value inside the trailing 24 hours
    fn window_total_at(&self, now: DateTime<Utc>) -> i64 {
        let mut window = self.window.write();
        Self::prune(&mut window, now);
        window.iter().map(|(_, amount)| amount).sum()
    }

    fn prune(window: &mut VecDeque<(DateTime<Utc>, i64)>, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(24);
        while window.front().is_some_and(|(at, _)| *at < cutoff) {
            window.pop_front();
        }
    }
}
