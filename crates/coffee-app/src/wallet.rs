//! Browser wallet (MetaMask and other EIP-1193 injectors).

use alloy::primitives::Address;
use coffee::wallet::parse_accounts;
use coffee::{CoffeeError, WalletProvider};
use serde_json::json;

use crate::rpc;

#[derive(Clone, Copy, Debug, Default)]
pub struct InjectedWallet;

impl WalletProvider for InjectedWallet {
    async fn accounts(&self) -> Result<Vec<Address>, CoffeeError> {
        let raw: Vec<String> = rpc::request_as("eth_accounts", json!([])).await?;
        parse_accounts(raw)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, CoffeeError> {
        if !rpc::has_provider() {
            log::warn!("no wallet found, please install MetaMask");
            return Err(CoffeeError::NoWallet);
        }
        let raw: Vec<String> = rpc::request_as("eth_requestAccounts", json!([])).await?;
        parse_accounts(raw)
    }
}
