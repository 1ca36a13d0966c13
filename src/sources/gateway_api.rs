//! Payment-gateway REST client (Compropago-style cash-payment bills).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::models::Bill;
use crate::ports::GatewayClient;

/// Gateway collection fee: bps of the bill plus a flat component, both in
/// the smallest currency unit.
const GATEWAY_FEE_BPS: i64 = 290;
const GATEWAY_FEE_FLAT: i64 = 300;

pub struct GatewayApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    currency: String,
}

/// Bill shape as the gateway serves it; amounts arrive as decimal strings
#[derive(Debug, Deserialize)]
struct GatewayBill {
    id: String,
    amount: String,
}

impl GatewayApi {
    pub fn new(client: Client, base_url: String, api_key: Option<String>, currency: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            currency,
        }
    }
}

#[async_trait]
impl GatewayClient for GatewayApi {
    async fn get_bill(&self, id: &str) -> Result<Bill> {
        let url = format!("{}/charges/{}", self.base_url, id);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.basic_auth(key, None::<&str>);
        }

        let bill: GatewayBill = request
            .send()
            .await
            .with_context(|| format!("gateway request for bill {} failed", id))?
            .error_for_status()
            .with_context(|| format!("gateway rejected bill lookup {}", id))?
            .json()
            .await
            .context("gateway bill response was not valid json")?;

        let amount: f64 = bill
            .amount
            .parse()
            .with_context(|| format!("gateway bill {} has unparseable amount", bill.id))?;
        Ok(Bill {
            id: bill.id,
            amount,
            currency: self.currency.clone(),
        })
    }

    fn parse_existing_bill(&self, payload: &serde_json::Value) -> Result<String> {
        // Only the identity is extracted; the amount (and everything else)
        // comes from the authoritative fetch.
        let bill: GatewayBill = serde_json::from_value(payload.clone())
            .context("webhook payload is not a bill notification")?;
        if bill.id.is_empty() {
            return Err(anyhow!("webhook bill notification has an empty id"));
        }
        Ok(bill.id)
    }

    fn amount_after_fees(&self, amount: i64) -> i64 {
        let fee = (amount as f64 * GATEWAY_FEE_BPS as f64 / 10000.0).round() as i64 + GATEWAY_FEE_FLAT;
        (amount - fee).max(0)
    }
}
