//! Contract proxy trait.
//!
//! See [`crate::chain::AlloyMemoContract`] for the native implementation;
//! the browser front-end provides its own over `window.ethereum`.

use std::future::Future;

use alloy::primitives::{Address, TxHash, U256};

use crate::error::CoffeeError;
use crate::form::Submission;
use crate::memo::Memo;
use crate::subscription::MemoSubscription;

/// Calls into the deployed `BuyMeACoffee` contract.
pub trait MemoContract {
    /// Send `buyCoffee(name, message)` from `from` with `value` wei attached
    /// and resolve once the transaction is confirmed.
    fn buy_coffee(
        &self,
        from: Address,
        submission: &Submission,
        value: U256,
    ) -> impl Future<Output = Result<TxHash, CoffeeError>>;

    /// Read every memo recorded so far, oldest first.
    fn get_memos(&self) -> impl Future<Output = Result<Vec<Memo>, CoffeeError>>;

    /// Start listening for `NewMemo` events emitted from now on.
    fn subscribe_memos(&self) -> impl Future<Output = Result<MemoSubscription, CoffeeError>>;
}
