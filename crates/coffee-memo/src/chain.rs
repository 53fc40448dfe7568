//! `MemoContract` over an alloy [`Provider`].
//!
//! The provider must carry a wallet able to sign for the `from` account
//! passed to [`MemoContract::buy_coffee`] (e.g. built with
//! `ProviderBuilder::new().wallet(..)`).

use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{Filter, TransactionReceipt, TransactionRequest};
use futures::StreamExt;

use crate::abi;
use crate::constants::CoffeeConfig;
use crate::contract::MemoContract;
use crate::error::CoffeeError;
use crate::form::Submission;
use crate::memo::Memo;
use crate::subscription::MemoSubscription;

pub struct AlloyMemoContract<P> {
    provider: P,
    config: CoffeeConfig,
}

impl<P: Provider> AlloyMemoContract<P> {
    pub fn new(provider: P, config: CoffeeConfig) -> Self {
        Self { provider, config }
    }

    pub fn address(&self) -> Address {
        self.config.contract_address
    }

    /// Poll until the node returns a receipt. The transaction is already
    /// broadcast, so failed lookups are retried rather than reported.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> TransactionReceipt {
        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => {}
                Err(e) => tracing::warn!(%tx_hash, error = %e, "receipt lookup failed, retrying"),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Query the contract's ether balance (the tips not yet withdrawn).
    pub async fn balance(&self) -> Result<U256, CoffeeError> {
        self.provider
            .get_balance(self.config.contract_address)
            .await
            .map_err(|e| CoffeeError::Chain(format!("getBalance failed: {e}")))
    }
}

impl<P: Provider> MemoContract for AlloyMemoContract<P> {
    async fn buy_coffee(
        &self,
        from: Address,
        submission: &Submission,
        value: U256,
    ) -> Result<TxHash, CoffeeError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(self.config.contract_address)
            .with_value(value)
            .with_input(abi::buy_coffee_calldata(submission));

        let pending = tokio::time::timeout(
            self.config.send_timeout,
            self.provider.send_transaction(tx),
        )
        .await
        .map_err(|_| timed_out("buyCoffee send", self.config.send_timeout))?
        .map_err(|e| CoffeeError::Chain(format!("buyCoffee send failed: {e}")))?;

        let tx_hash = *pending.tx_hash();
        tracing::debug!(%tx_hash, "buyCoffee sent, waiting for receipt");

        let receipt = tokio::time::timeout(
            self.config.receipt_timeout,
            self.wait_for_receipt(tx_hash),
        )
        .await
        .map_err(|_| timed_out("buyCoffee receipt", self.config.receipt_timeout))?;

        check_receipt(&receipt)
    }

    async fn get_memos(&self) -> Result<Vec<Memo>, CoffeeError> {
        let tx = TransactionRequest::default()
            .with_to(self.config.contract_address)
            .with_input(abi::get_memos_calldata());

        let data = self
            .provider
            .call(tx)
            .await
            .map_err(|e| CoffeeError::Chain(format!("getMemos failed: {e}")))?;

        abi::decode_memos(&data)
    }

    async fn subscribe_memos(&self) -> Result<MemoSubscription, CoffeeError> {
        let filter = Filter::new()
            .address(self.config.contract_address)
            .event_signature(abi::new_memo_topic());

        let mut logs = self
            .provider
            .watch_logs(&filter)
            .await
            .map_err(|e| CoffeeError::Chain(format!("NewMemo filter failed: {e}")))?
            .with_poll_interval(self.config.poll_interval)
            .into_stream();

        let (tx, rx) = futures::channel::mpsc::unbounded();
        let task = tokio::spawn(async move {
            while let Some(batch) = logs.next().await {
                for log in batch {
                    match abi::decode_new_memo(log.topics(), &log.data().data) {
                        Ok(memo) => {
                            if tx.unbounded_send(memo).is_err() {
                                return;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "skipping undecodable NewMemo log"),
                    }
                }
            }
            tracing::debug!("NewMemo log stream ended");
        });

        Ok(MemoSubscription::new(rx, move || task.abort()))
    }
}

fn check_receipt(receipt: &TransactionReceipt) -> Result<TxHash, CoffeeError> {
    if receipt.status() {
        Ok(receipt.transaction_hash)
    } else {
        Err(CoffeeError::Reverted(receipt.transaction_hash.to_string()))
    }
}

fn timed_out(what: &str, after: Duration) -> CoffeeError {
    CoffeeError::Timeout(format!("{what} after {}s", after.as_secs()))
}
