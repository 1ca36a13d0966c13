//! Watermark comparison at the heart of deposit reconciliation.
//!
//! Deterministic, pure logic. No I/O. The cashier only ever tells the
//! accountant what total an address has observably received; the accountant
//! advances its `accounted_for` watermark and credits the difference in one
//! atomic step on its side. Because the notification carries the absolute
//! total, re-sending it (or sending a stale one) is a no-op for the
//! receiver — which is what makes redundant scans, concurrent triggers, and
//! at-least-once delivery all safe.

use crate::models::DepositObservation;

/// Outcome of comparing one observation against the cached watermark
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    /// Notify the accountant with the absolute observed total
    Notify { total_received: i64 },
    /// Nothing new, or the observation isn't usable this cycle
    Skip,
}

/// Decide whether an observed total warrants a notification.
///
/// `accounted_for` may be stale — the ledger can have advanced it since the
/// cached view was read. That is fine: a notification the ledger has already
/// met or exceeded degenerates to a no-op on its side, so calling this twice
/// with the same inputs, or with inputs another trigger already acted on,
/// never double-credits.
pub fn reconcile(
    observation: &DepositObservation,
    accounted_for: i64,
    confirmations_met: bool,
) -> ScanDecision {
    if !confirmations_met {
        return ScanDecision::Skip;
    }
    if observation.total_received > accounted_for {
        ScanDecision::Notify {
            total_received: observation.total_received,
        }
    } else {
        ScanDecision::Skip
    }
}
