//! `BuyMeACoffee` proxy over the injected provider.
//!
//! Calls are raw `eth_call` / `eth_sendTransaction` with calldata from
//! [`coffee::abi`]. `NewMemo` delivery polls `eth_getLogs` block range by
//! block range from a local task.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use coffee::subscription::MemoSender;
use coffee::{abi, CoffeeConfig, CoffeeError, Memo, MemoContract, MemoSubscription, Submission};
use futures::channel::oneshot;
use futures::FutureExt;
use gloo_timers::future::sleep;
use serde::Deserialize;
use serde_json::json;

use crate::rpc;

pub struct InjectedContract {
    config: CoffeeConfig,
}

/// The fields of an `eth_getTransactionReceipt` result we look at.
#[derive(Debug, Deserialize)]
struct RpcReceipt {
    status: Option<String>,
}

/// One entry of an `eth_getLogs` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    topics: Vec<String>,
    data: String,
    #[serde(default)]
    removed: bool,
}

impl RpcLog {
    fn decode(&self) -> Result<Memo, CoffeeError> {
        let topics = self
            .topics
            .iter()
            .map(|t| B256::from_str(t))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoffeeError::Decode(format!("bad log topic: {e}")))?;
        let data = Bytes::from_str(&self.data)
            .map_err(|e| CoffeeError::Decode(format!("bad log data: {e}")))?;
        abi::decode_new_memo(&topics, &data)
    }
}

impl InjectedContract {
    pub fn new(config: CoffeeConfig) -> Self {
        Self { config }
    }

    /// Poll for the receipt until it shows up or the configured timeout passes.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxHash, CoffeeError> {
        let interval = self.config.poll_interval;
        let attempts = poll_attempts(self.config.receipt_timeout, interval);
        poll_receipt(
            tx_hash,
            attempts,
            || rpc::request_as("eth_getTransactionReceipt", json!([tx_hash.to_string()])),
            || sleep(interval),
        )
        .await
        .ok_or_else(|| {
            CoffeeError::Timeout(format!(
                "no receipt for {tx_hash} after {}s",
                self.config.receipt_timeout.as_secs()
            ))
        })?
    }
}

impl MemoContract for InjectedContract {
    async fn buy_coffee(
        &self,
        from: Address,
        submission: &Submission,
        value: U256,
    ) -> Result<TxHash, CoffeeError> {
        let tx = json!({
            "from": from.to_string(),
            "to": self.config.contract_address.to_string(),
            "value": format!("0x{value:x}"),
            "data": abi::buy_coffee_calldata(submission).to_string(),
        });

        let hash: String = rpc::request_as("eth_sendTransaction", json!([tx])).await?;
        let tx_hash = TxHash::from_str(&hash).map_err(|e| {
            CoffeeError::Decode(format!("wallet returned bad tx hash {hash:?}: {e}"))
        })?;
        log::debug!("buyCoffee sent: {tx_hash}");

        self.wait_for_receipt(tx_hash).await
    }

    async fn get_memos(&self) -> Result<Vec<Memo>, CoffeeError> {
        let call = json!({
            "to": self.config.contract_address.to_string(),
            "data": abi::get_memos_calldata().to_string(),
        });
        let hex: String = rpc::request_as("eth_call", json!([call, "latest"])).await?;
        let data = Bytes::from_str(&hex)
            .map_err(|e| CoffeeError::Decode(format!("eth_call returned bad hex: {e}")))?;
        abi::decode_memos(&data)
    }

    async fn subscribe_memos(&self) -> Result<MemoSubscription, CoffeeError> {
        let head = block_number().await?;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let (memos, subscription) = MemoSubscription::channel(move || drop(cancel_tx));

        wasm_bindgen_futures::spawn_local(poll_new_memos(
            self.config.contract_address,
            self.config.poll_interval,
            head + 1,
            memos,
            cancel_rx,
        ));

        Ok(subscription)
    }
}

async fn block_number() -> Result<u64, CoffeeError> {
    let head: String = rpc::request_as("eth_blockNumber", json!([])).await?;
    rpc::parse_quantity(&head)
}

async fn fetch_logs(contract: Address, from: u64, to: u64) -> Result<Vec<RpcLog>, CoffeeError> {
    let filter = json!({
        "address": contract.to_string(),
        "topics": [abi::new_memo_topic().to_string()],
        "fromBlock": rpc::quantity(from),
        "toBlock": rpc::quantity(to),
    });
    rpc::request_as("eth_getLogs", json!([filter])).await
}

/// Scan each new block range for `NewMemo` logs until cancelled or the
/// subscriber goes away. A failed scan is retried on the next tick.
async fn poll_new_memos(
    contract: Address,
    interval: Duration,
    mut next_block: u64,
    memos: MemoSender,
    mut cancel: oneshot::Receiver<()>,
) {
    loop {
        futures::select! {
            _ = cancel => break,
            _ = sleep(interval).fuse() => {}
        }

        let head = match block_number().await {
            Ok(head) => head,
            Err(e) => {
                log::warn!("NewMemo poll: {e}");
                continue;
            }
        };
        if head < next_block {
            continue;
        }

        match fetch_logs(contract, next_block, head).await {
            Ok(logs) => {
                for entry in logs.iter().filter(|entry| !entry.removed) {
                    match entry.decode() {
                        Ok(memo) => {
                            log::info!("memo received from {}: {}", memo.address, memo);
                            if memos.unbounded_send(memo).is_err() {
                                return;
                            }
                        }
                        Err(e) => log::warn!("skipping undecodable NewMemo log: {e}"),
                    }
                }
                next_block = head + 1;
            }
            Err(e) => log::warn!("NewMemo poll: {e}"),
        }
    }
    log::debug!("NewMemo polling stopped");
}

/// Look the receipt up at most `attempts` times, pausing between tries.
/// The transaction is already broadcast, so failed lookups are retried.
/// `None` when the attempts run out.
async fn poll_receipt<L, LF, P, PF>(
    tx_hash: TxHash,
    attempts: u128,
    mut lookup: L,
    mut pause: P,
) -> Option<Result<TxHash, CoffeeError>>
where
    L: FnMut() -> LF,
    LF: Future<Output = Result<Option<RpcReceipt>, CoffeeError>>,
    P: FnMut() -> PF,
    PF: Future<Output = ()>,
{
    for _ in 0..attempts {
        match lookup().await {
            Ok(Some(receipt)) => return Some(receipt_outcome(tx_hash, &receipt)),
            Ok(None) => {}
            Err(e) => log::warn!("receipt lookup for {tx_hash} failed, retrying: {e}"),
        }
        pause().await;
    }
    None
}

/// Only an explicit `0x1` status counts as success.
fn receipt_outcome(tx_hash: TxHash, receipt: &RpcReceipt) -> Result<TxHash, CoffeeError> {
    match receipt.status.as_deref() {
        Some("0x1") => Ok(tx_hash),
        _ => Err(CoffeeError::Reverted(tx_hash.to_string())),
    }
}

fn poll_attempts(timeout: Duration, interval: Duration) -> u128 {
    (timeout.as_millis() / interval.as_millis().max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolEvent;
    use coffee::BuyMeACoffee;

    #[test]
    fn test_rpc_log_decodes_new_memo() {
        let event = BuyMeACoffee::NewMemo {
            from: Address::repeat_byte(0xab),
            timestamp: U256::from(1000),
            name: "bob".into(),
            message: "nice".into(),
        };
        let encoded = event.encode_log_data();
        let raw = json!({
            "address": "0xda5b8a7db2d47f593c8217c4e9a65a35a4c17a6f",
            "topics": encoded.topics().iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            "data": encoded.data.to_string(),
            "blockNumber": "0x10",
            "removed": false,
        });

        let log: RpcLog = serde_json::from_value(raw).unwrap();
        let memo = log.decode().unwrap();
        assert_eq!(memo.address, Address::repeat_byte(0xab));
        assert_eq!(memo.timestamp.timestamp_millis(), 1_000_000);
        assert_eq!(memo.name, "bob");
    }

    #[test]
    fn test_rpc_log_rejects_bad_hex() {
        let log: RpcLog = serde_json::from_value(json!({
            "topics": ["0x1234"],
            "data": "0x",
        }))
        .unwrap();
        assert!(matches!(log.decode(), Err(CoffeeError::Decode(_))));
    }

    #[test]
    fn test_receipt_status() {
        let ok: Option<RpcReceipt> = serde_json::from_value(json!({ "status": "0x1" })).unwrap();
        assert_eq!(ok.unwrap().status.as_deref(), Some("0x1"));

        let pending: Option<RpcReceipt> = serde_json::from_value(json!(null)).unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_receipt_outcome() {
        let hash = TxHash::repeat_byte(0x77);
        let status = |s: serde_json::Value| -> RpcReceipt {
            serde_json::from_value(json!({ "status": s })).unwrap()
        };

        assert_eq!(receipt_outcome(hash, &status(json!("0x1"))).unwrap(), hash);
        assert!(matches!(
            receipt_outcome(hash, &status(json!("0x0"))),
            Err(CoffeeError::Reverted(_))
        ));
        assert!(matches!(
            receipt_outcome(hash, &status(json!(null))),
            Err(CoffeeError::Reverted(_))
        ));

        let missing: RpcReceipt = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(receipt_outcome(hash, &missing), Err(CoffeeError::Reverted(_))));
    }

    fn scripted(
        replies: Vec<Result<Option<RpcReceipt>, CoffeeError>>,
    ) -> impl FnMut() -> futures::future::Ready<Result<Option<RpcReceipt>, CoffeeError>> {
        let mut replies = replies.into_iter();
        move || {
            futures::future::ready(
                replies
                    .next()
                    .unwrap_or_else(|| Err(CoffeeError::Wallet("exhausted".into()))),
            )
        }
    }

    fn confirmed(status: &str) -> Option<RpcReceipt> {
        Some(RpcReceipt {
            status: Some(status.to_string()),
        })
    }

    #[test]
    fn test_receipt_lookup_retries_after_rpc_error() {
        let hash = TxHash::repeat_byte(0x77);
        let lookup = scripted(vec![
            Err(CoffeeError::Wallet("header not found".into())),
            Ok(None),
            Ok(confirmed("0x1")),
        ]);
        let mut pauses = 0;

        let outcome = futures::executor::block_on(poll_receipt(hash, 5, lookup, || {
            pauses += 1;
            futures::future::ready(())
        }));

        assert_eq!(outcome.unwrap().unwrap(), hash);
        assert_eq!(pauses, 2);
    }

    #[test]
    fn test_receipt_lookup_reports_revert() {
        let hash = TxHash::repeat_byte(0x77);
        let lookup = scripted(vec![Ok(confirmed("0x0"))]);

        let outcome =
            futures::executor::block_on(poll_receipt(hash, 5, lookup, || futures::future::ready(())));
        assert!(matches!(outcome, Some(Err(CoffeeError::Reverted(_)))));
    }

    #[test]
    fn test_receipt_lookup_gives_up_after_attempts() {
        let hash = TxHash::repeat_byte(0x77);
        let lookup = scripted(vec![
            Err(CoffeeError::Wallet("down".into())),
            Err(CoffeeError::Wallet("down".into())),
            Ok(None),
        ]);

        let outcome =
            futures::executor::block_on(poll_receipt(hash, 3, lookup, || futures::future::ready(())));
        assert!(outcome.is_none());
    }

    #[test]
    fn test_poll_attempts() {
        assert_eq!(poll_attempts(Duration::from_secs(120), Duration::from_secs(4)), 30);
        assert_eq!(poll_attempts(Duration::from_secs(1), Duration::from_secs(4)), 1);
        assert_eq!(poll_attempts(Duration::from_secs(1), Duration::ZERO), 1000);
    }
}
