//! Client library for the `BuyMeACoffee` tipping contract.
//!
//! A visitor connects a wallet, pays a fixed tip together with a short memo,
//! and watches the list of memos grow as new tips land on-chain.
//!
//! # Pieces
//!
//! - [`WalletProvider`] — probes for and requests wallet authorization
//! - [`MemoContract`] — `buyCoffee`, `getMemos` and the `NewMemo` event stream
//! - [`CoffeeSession`] — the view-model that owns [`CoffeeState`] and drives
//!   both collaborators for the lifetime of one page
//!
//! The browser front-end implements the two traits over `window.ethereum`;
//! with the `native` feature, [`chain::AlloyMemoContract`] and
//! [`wallet::LocalKeyWallet`] do the same over an alloy provider.
//!
//! # Quick example (native)
//!
//! ```no_run
//! use alloy::network::EthereumWallet;
//! use alloy::providers::ProviderBuilder;
//! use alloy::signers::local::PrivateKeySigner;
//! use coffee::{chain::AlloyMemoContract, wallet::LocalKeyWallet, CoffeeConfig, CoffeeSession};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let signer: PrivateKeySigner = "0xYOUR_KEY".parse().unwrap();
//! let wallet = LocalKeyWallet::authorized(signer.address());
//! let provider = ProviderBuilder::new()
//!     .wallet(EthereumWallet::from(signer))
//!     .connect_http("http://localhost:8545".parse().unwrap());
//!
//! let config = CoffeeConfig::default();
//! let contract = AlloyMemoContract::new(provider, config.clone());
//! let mut session = CoffeeSession::new(wallet, contract, config);
//! session.mount().await;
//! session.set_name("alice");
//! session.buy_coffee().await;
//! # }
//! ```

pub mod abi;
pub mod constants;
pub mod contract;
pub mod error;
pub mod form;
pub mod memo;
pub mod session;
pub mod state;
pub mod subscription;
pub mod wallet;

#[cfg(feature = "native")]
pub mod chain;

use alloy::sol;

// BuyMeACoffee contract interface. Only the ABI is generated here so the
// bindings stay usable from WASM; transport lives behind `MemoContract`.
sol! {
    #[derive(Debug, PartialEq, Eq)]
    contract BuyMeACoffee {
        struct Memo {
            address from;
            uint256 timestamp;
            string name;
            string message;
        }

        event NewMemo(address indexed from, uint256 timestamp, string name, string message);

        function buyCoffee(string _name, string _message) public payable;
        function withdrawTips() public;
        function getMemos() public view returns (Memo[] memory);
    }
}

// Re-exports
pub use constants::*;
pub use contract::MemoContract;
pub use error::CoffeeError;
pub use form::{FormState, Submission};
pub use memo::Memo;
pub use session::{CoffeeSession, Command};
pub use state::{CoffeeState, Screen};
pub use subscription::MemoSubscription;
pub use wallet::WalletProvider;
