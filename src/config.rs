//! Process configuration, read once at startup and passed into components.

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Currency scanned when the node notify hook fires
    pub default_currency: String,
    /// Confirmations a deposit needs before it counts toward a scan
    pub min_confirmations: u32,
    /// Seconds between periodic deposit scans
    pub scan_interval_secs: u64,
    /// No fees are charged while set
    pub trial_period: bool,

    pub node_rpc_url: String,
    pub node_rpc_user: Option<String>,
    pub node_rpc_password: Option<String>,

    pub gateway_url: String,
    pub gateway_api_key: Option<String>,
    /// Ticker of the cash contract gateway bills are denominated in
    pub gateway_currency: String,

    pub accountant_url: String,

    /// Reserve address outside automated withdrawal reach
    pub cold_wallet_address: String,
    /// Ceiling on the trailing-24h aggregate of withdrawal requests,
    /// in the smallest integer unit
    pub withdrawal_ceiling: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8081".to_string())
            .parse()
            .unwrap_or(8081);

        let default_currency =
            std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "BTC".to_string());

        let min_confirmations = std::env::var("MIN_CONFIRMATIONS")
            .unwrap_or_else(|_| "6".to_string())
            .parse()
            .unwrap_or(6);

        let scan_interval_secs = std::env::var("SCAN_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let trial_period = std::env::var("TRIAL_PERIOD")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        let node_rpc_url = std::env::var("NODE_RPC_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8332".to_string());
        let node_rpc_user = std::env::var("NODE_RPC_USER").ok();
        let node_rpc_password = std::env::var("NODE_RPC_PASSWORD").ok();

        let gateway_url = std::env::var("GATEWAY_URL")
            .unwrap_or_else(|_| "https://api.compropago.com/v1".to_string());
        let gateway_api_key = std::env::var("GATEWAY_API_KEY").ok();
        let gateway_currency =
            std::env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "MXN".to_string());

        let accountant_url = std::env::var("ACCOUNTANT_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8082".to_string());

        let cold_wallet_address = std::env::var("COLD_WALLET_ADDRESS").unwrap_or_default();

        // Default: 5 BTC in satoshis
        let withdrawal_ceiling = std::env::var("WITHDRAWAL_CEILING")
            .unwrap_or_else(|_| "500000000".to_string())
            .parse()
            .unwrap_or(500_000_000);

        Ok(Self {
            port,
            default_currency,
            min_confirmations,
            scan_interval_secs,
            trial_period,
            node_rpc_url,
            node_rpc_user,
            node_rpc_password,
            gateway_url,
            gateway_api_key,
            gateway_currency,
            accountant_url,
            cold_wallet_address,
            withdrawal_ceiling,
        })
    }
}
