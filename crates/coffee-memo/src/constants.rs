use std::time::Duration;

use alloy::primitives::{address, utils::format_ether, Address, U256};

use crate::error::CoffeeError;

/// Deployed BuyMeACoffee contract.
pub const CONTRACT_ADDRESS: Address = address!("da5b8a7db2d47f593c8217c4e9a65a35a4c17a6f");

/// Price of one coffee: 0.001 ether.
pub const COFFEE_PRICE_WEI: u128 = 1_000_000_000_000_000;

/// Name sent when the form's name field is blank.
pub const DEFAULT_NAME: &str = "anonymous";

/// Message sent when the form's message field is blank.
pub const DEFAULT_MESSAGE: &str = "enjoy your coffee :)";

/// How often `NewMemo` logs and pending receipts are polled.
pub const MEMO_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Upper bound on handing a transaction to the wallet or RPC node.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on waiting for a transaction receipt.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Runtime configuration. `Default` is the fixed deployment; `from_env`
/// lets a local or test deployment be targeted instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoffeeConfig {
    pub contract_address: Address,
    pub coffee_price: U256,
    pub default_name: String,
    pub default_message: String,
    pub poll_interval: Duration,
    pub send_timeout: Duration,
    pub receipt_timeout: Duration,
}

impl Default for CoffeeConfig {
    fn default() -> Self {
        Self {
            contract_address: CONTRACT_ADDRESS,
            coffee_price: U256::from(COFFEE_PRICE_WEI),
            default_name: DEFAULT_NAME.to_string(),
            default_message: DEFAULT_MESSAGE.to_string(),
            poll_interval: MEMO_POLL_INTERVAL,
            send_timeout: SEND_TIMEOUT,
            receipt_timeout: RECEIPT_TIMEOUT,
        }
    }
}

impl CoffeeConfig {
    /// Build a config from the process environment, falling back to defaults.
    ///
    /// Recognised variables: `COFFEE_CONTRACT_ADDRESS`, `COFFEE_PRICE_WEI`,
    /// `MEMO_POLL_INTERVAL_MS`, `RECEIPT_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, CoffeeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an arbitrary variable source.
    /// The browser build feeds this from `option_env!`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoffeeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = var("COFFEE_CONTRACT_ADDRESS") {
            config.contract_address = addr.parse().map_err(|e| {
                CoffeeError::Config(format!("invalid COFFEE_CONTRACT_ADDRESS {addr:?}: {e}"))
            })?;
        }
        if let Some(price) = var("COFFEE_PRICE_WEI") {
            config.coffee_price = price.parse().map_err(|e| {
                CoffeeError::Config(format!("invalid COFFEE_PRICE_WEI {price:?}: {e}"))
            })?;
        }
        if let Some(ms) = var("MEMO_POLL_INTERVAL_MS") {
            let ms: u64 = ms.parse().map_err(|e| {
                CoffeeError::Config(format!("invalid MEMO_POLL_INTERVAL_MS {ms:?}: {e}"))
            })?;
            if ms == 0 {
                return Err(CoffeeError::Config(
                    "MEMO_POLL_INTERVAL_MS must be positive".to_string(),
                ));
            }
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = var("RECEIPT_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                CoffeeError::Config(format!("invalid RECEIPT_TIMEOUT_SECS {secs:?}: {e}"))
            })?;
            if secs == 0 {
                return Err(CoffeeError::Config(
                    "RECEIPT_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.receipt_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Human-readable price, e.g. `"0.001 ETH"`.
    pub fn price_label(&self) -> String {
        let ether = format_ether(self.coffee_price);
        let ether = if ether.contains('.') {
            ether.trim_end_matches('0').trim_end_matches('.')
        } else {
            ether.as_str()
        };
        format!("{ether} ETH")
    }
}
