//! JSON-RPC client for bitcoin-like nodes (bitcoind, litecoind, dogecoind).
//!
//! The node reports amounts in whole-coin decimals; everything leaving this
//! module is in the smallest integer unit (satoshis for BTC-likes).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ports::NodeRpc;

/// Smallest units per whole coin for bitcoin-like assets
pub const SATOSHIS_PER_COIN: f64 = 100_000_000.0;

/// Convert a node-native decimal amount to the smallest integer unit.
/// Node amounts are 8-decimal fixed-point rendered as floats, so rounding
/// here only strips representation noise.
pub fn coins_to_smallest_unit(amount: f64) -> i64 {
    (amount * SATOSHIS_PER_COIN).round() as i64
}

pub struct BitcoindRpc {
    client: Client,
    url: String,
    auth: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ReceivedByAddress {
    address: String,
    amount: f64,
}

impl BitcoindRpc {
    pub fn new(client: Client, url: String, user: Option<String>, password: Option<String>) -> Self {
        let auth = user.map(|u| (u, password.unwrap_or_default()));
        Self { client, url, auth }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "1.0",
            "id": "cashier",
            "method": method,
            "params": params,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        let envelope: RpcEnvelope = request
            .send()
            .await
            .with_context(|| format!("node rpc {} request failed", method))?
            .json()
            .await
            .with_context(|| format!("node rpc {} returned non-json", method))?;

        if let Some(error) = envelope.error.filter(|e| !e.is_null()) {
            return Err(anyhow!("node rpc {} error: {}", method, error));
        }
        envelope
            .result
            .ok_or_else(|| anyhow!("node rpc {} returned no result", method))
    }
}

#[async_trait]
impl NodeRpc for BitcoindRpc {
    async fn list_received_by_address(
        &self,
        min_confirmations: u32,
    ) -> Result<Vec<(String, i64)>> {
        let result = self
            .call("listreceivedbyaddress", json!([min_confirmations]))
            .await?;
        let rows: Vec<ReceivedByAddress> =
            serde_json::from_value(result).context("unexpected listreceivedbyaddress shape")?;
        Ok(rows
            .into_iter()
            .map(|row| (row.address, coins_to_smallest_unit(row.amount)))
            .collect())
    }

    async fn get_received_by_address(&self, address: &str, min_confirmations: u32) -> Result<i64> {
        let result = self
            .call("getreceivedbyaddress", json!([address, min_confirmations]))
            .await?;
        let amount = result
            .as_f64()
            .ok_or_else(|| anyhow!("unexpected getreceivedbyaddress shape: {}", result))?;
        Ok(coins_to_smallest_unit(amount))
    }

    async fn send_to_address(&self, address: &str, amount: i64) -> Result<String> {
        let coins = amount as f64 / SATOSHIS_PER_COIN;
        let result = self.call("sendtoaddress", json!([address, coins])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("unexpected sendtoaddress shape: {}", result))
    }

    async fn get_balance(&self) -> Result<i64> {
        let result = self.call("getbalance", json!([])).await?;
        let amount = result
            .as_f64()
            .ok_or_else(|| anyhow!("unexpected getbalance shape: {}", result))?;
        Ok(coins_to_smallest_unit(amount))
    }
}
