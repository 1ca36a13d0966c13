//! Deposit/withdrawal reconciliation core.
//!
//! `engine` holds the pure watermark comparison; `watcher` and `gateway`
//! drive it from the node poll and the webhook respectively; `notifier`
//! carries decisions to the accountant; `withdrawals` gates the outbound
//! direction.

pub mod engine;
pub mod gateway;
pub mod notifier;
pub mod watcher;
pub mod withdrawals;

pub use engine::{reconcile, ScanDecision};
pub use gateway::{GatewayAdapter, GATEWAY_ADDRESS_PREFIX};
pub use notifier::AccountantNotifier;
pub use watcher::{spawn_deposit_poller, DepositWatcher};
pub use withdrawals::{WithdrawalGate, WithdrawalNotice};
