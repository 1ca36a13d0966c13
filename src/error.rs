//! Typed domain failures that must reach the caller intact.
//!
//! Everything transient (RPC timeouts, gateway hiccups) travels as
//! `anyhow::Error` and gets logged and skipped; the variants here are hard
//! failures that callers are required to see and handle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CashierError {
    /// A price or quantity did not scale to an exact multiple of the
    /// contract's granularity. Never silently floored.
    #[error("{kind} {value} does not align to an integer wire value for {ticker}")]
    NonIntegerWireValue {
        kind: &'static str,
        value: f64,
        ticker: String,
    },

    /// A ticker or contract reference could not be resolved.
    #[error("could not resolve contract '{0}'")]
    ContractNotFound(String),
}

impl CashierError {
    pub fn non_integer_price(ticker: &str, value: f64) -> Self {
        CashierError::NonIntegerWireValue {
            kind: "price",
            value,
            ticker: ticker.to_string(),
        }
    }

    pub fn non_integer_quantity(ticker: &str, value: f64) -> Self {
        CashierError::NonIntegerWireValue {
            kind: "quantity",
            value,
            ticker: ticker.to_string(),
        }
    }
}
