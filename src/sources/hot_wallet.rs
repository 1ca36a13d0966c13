//! Hot-wallet liquidity backed by the node wallets themselves.
//!
//! Whatever sits in a node's own wallet is by definition what automated
//! withdrawals can spend; cold-wallet funds are invisible to `getbalance`
//! and therefore out of reach here, which is the point.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::ports::{HotWallet, NodeRpc};

pub struct NodeHotWallet {
    nodes: HashMap<String, Arc<dyn NodeRpc>>,
}

impl NodeHotWallet {
    pub fn new(nodes: HashMap<String, Arc<dyn NodeRpc>>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl HotWallet for NodeHotWallet {
    async fn available_balance(&self, ticker: &str) -> Result<i64> {
        match self.nodes.get(ticker) {
            Some(node) => node.get_balance().await,
            // No automated rail for this currency, so no automated liquidity
            None => Ok(0),
        }
    }
}
