//! Fire-and-forget deposit notifications to the accountant.

use std::sync::Arc;

use tracing::{info, warn};

use crate::ports::Accountant;

/// Best-effort sender. A failed notification is logged and dropped; the next
/// reconciliation cycle re-derives and re-sends it, so no retry state lives
/// here.
#[derive(Clone)]
pub struct AccountantNotifier {
    accountant: Arc<dyn Accountant>,
}

impl AccountantNotifier {
    pub fn new(accountant: Arc<dyn Accountant>) -> Self {
        Self { accountant }
    }

    /// Tell the accountant `address` has received at least `total_received`
    /// in total. Returns whether the send went out, for scan accounting only
    /// — correctness never depends on the answer.
    pub async fn notify_deposit(&self, address: &str, total_received: i64) -> bool {
        info!(address, total_received, "notifying accountant of deposit total");
        match self.accountant.notify_deposit(address, total_received).await {
            Ok(()) => true,
            Err(e) => {
                warn!(address, total_received, error = %e, "deposit notification failed; next cycle will retry");
                false
            }
        }
    }
}
