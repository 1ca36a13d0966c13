//! Cashier: bridges external deposit sources (bitcoin-like nodes, payment
//! gateways) and the accountant's ledger, and gates outbound withdrawals.

pub mod api;
pub mod cashier;
pub mod config;
pub mod error;
pub mod fees;
pub mod models;
pub mod ports;
pub mod sources;
pub mod wire;
