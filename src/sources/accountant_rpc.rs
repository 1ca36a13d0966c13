//! HTTP implementation of the accountant port.
//!
//! Plain one-way POST. No ack handling: the watermark makes an equal-or-lower
//! repeat a no-op on the receiver, so at-least-once is all the delivery
//! guarantee this needs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::error::CashierError;
use crate::models::{Contract, TrackedAddress, UserFeeProfile};
use crate::ports::{Accountant, LedgerDirectory};

pub struct AccountantRpc {
    client: Client,
    base_url: String,
}

impl AccountantRpc {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("ledger request {} failed", path))?
            .error_for_status()
            .with_context(|| format!("ledger rejected {}", path))?
            .json()
            .await
            .with_context(|| format!("ledger response for {} was not valid json", path))
    }
}

#[async_trait]
impl Accountant for AccountantRpc {
    async fn notify_deposit(&self, address: &str, total_received: i64) -> Result<()> {
        let url = format!("{}/deposits", self.base_url);
        self.client
            .post(&url)
            .json(&json!({
                "address": address,
                "total_received": total_received,
            }))
            .send()
            .await
            .context("accountant deposit notification failed")?
            .error_for_status()
            .context("accountant rejected deposit notification")?;
        Ok(())
    }
}

#[async_trait]
impl LedgerDirectory for AccountantRpc {
    async fn lookup_address(&self, address: &str) -> Result<Option<TrackedAddress>> {
        let url = format!("{}/addresses/{}", self.base_url, address);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("ledger lookup for address {} failed", address))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let tracked = response
            .error_for_status()
            .with_context(|| format!("ledger rejected address lookup {}", address))?
            .json()
            .await
            .context("ledger address response was not valid json")?;
        Ok(Some(tracked))
    }

    async fn active_addresses(&self, currency: &str) -> Result<Vec<TrackedAddress>> {
        self.get_json(&format!("/addresses?currency={}&active=true", currency))
            .await
    }

    async fn lookup_contract(&self, ticker: &str) -> Result<Contract> {
        let url = format!("{}/contracts/{}", self.base_url, ticker);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("ledger lookup for contract {} failed", ticker))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CashierError::ContractNotFound(ticker.to_string()).into());
        }
        response
            .error_for_status()
            .with_context(|| format!("ledger rejected contract lookup {}", ticker))?
            .json()
            .await
            .context("ledger contract response was not valid json")
    }

    async fn fee_profile(&self, username: &str) -> Result<UserFeeProfile> {
        self.get_json(&format!("/users/{}/fees", username)).await
    }
}
