//! Wallet authorization surface.
//!
//! Mirrors the two EIP-1102 requests a browser wallet answers:
//! `eth_accounts` (silent, lists already-authorized accounts) and
//! `eth_requestAccounts` (prompts the user).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::Address;

use crate::error::CoffeeError;

/// Account authorization. Futures are not required to be `Send` so that
/// browser implementations holding `JsValue`s qualify.
pub trait WalletProvider {
    /// Accounts the wallet has already authorized for this origin.
    /// Empty when the user has not connected yet.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, CoffeeError>>;

    /// Ask the wallet to authorize an account, prompting if needed.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, CoffeeError>>;
}

/// Parse the address strings a JSON-RPC wallet returns.
pub fn parse_accounts<I, S>(raw: I) -> Result<Vec<Address>, CoffeeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| {
            let s = s.as_ref();
            s.parse::<Address>()
                .map_err(|e| CoffeeError::Wallet(format!("wallet returned bad address {s:?}: {e}")))
        })
        .collect()
}

/// Wallet backed by a key the process already holds (the provider signs
/// with it). Authorization is a flag that flips on the first request.
#[derive(Debug)]
pub struct LocalKeyWallet {
    address: Address,
    authorized: AtomicBool,
}

impl LocalKeyWallet {
    /// A wallet that still needs `request_accounts` before it reports its account.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            authorized: AtomicBool::new(false),
        }
    }

    /// A wallet that has already been authorized, as after a page reload.
    pub fn authorized(address: Address) -> Self {
        Self {
            address,
            authorized: AtomicBool::new(true),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl WalletProvider for LocalKeyWallet {
    async fn accounts(&self) -> Result<Vec<Address>, CoffeeError> {
        if self.authorized.load(Ordering::Acquire) {
            Ok(vec![self.address])
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, CoffeeError> {
        self.authorized.store(true, Ordering::Release);
        Ok(vec![self.address])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accounts() {
        let parsed = parse_accounts(["0xdA5B8A7db2d47F593C8217c4e9A65a35A4C17a6F"]).unwrap();
        assert_eq!(parsed.len(), 1);

        let empty = parse_accounts(Vec::<String>::new()).unwrap();
        assert!(empty.is_empty());

        assert!(matches!(
            parse_accounts(["not-an-address"]),
            Err(CoffeeError::Wallet(_))
        ));
    }

    #[tokio::test]
    async fn test_local_wallet_authorizes_on_request() {
        let wallet = LocalKeyWallet::new(Address::repeat_byte(0x42));
        assert!(wallet.accounts().await.unwrap().is_empty());

        let granted = wallet.request_accounts().await.unwrap();
        assert_eq!(granted, vec![Address::repeat_byte(0x42)]);
        assert_eq!(wallet.accounts().await.unwrap(), granted);
    }

    #[tokio::test]
    async fn test_local_wallet_preauthorized() {
        let wallet = LocalKeyWallet::authorized(Address::repeat_byte(0x01));
        assert_eq!(wallet.accounts().await.unwrap(), vec![wallet.address()]);
    }
}
