//! Production implementations of the external ports.

pub mod accountant_rpc;
pub mod gateway_api;
pub mod hot_wallet;
pub mod node_rpc;

pub use accountant_rpc::AccountantRpc;
pub use gateway_api::GatewayApi;
pub use hot_wallet::NodeHotWallet;
pub use node_rpc::BitcoindRpc;
