//! Calldata encoding and return/log decoding for `BuyMeACoffee`.
//!
//! Transport-free so both the browser proxy (raw JSON-RPC through the
//! injected wallet) and the native alloy proxy share one codec.

use alloy::primitives::{Bytes, B256};
use alloy::sol_types::{SolCall, SolEvent};

use crate::error::CoffeeError;
use crate::form::Submission;
use crate::memo::Memo;
use crate::BuyMeACoffee;

/// Calldata for `buyCoffee(name, message)`.
pub fn buy_coffee_calldata(submission: &Submission) -> Bytes {
    BuyMeACoffee::buyCoffeeCall {
        _name: submission.name.clone(),
        _message: submission.message.clone(),
    }
    .abi_encode()
    .into()
}

/// Calldata for `getMemos()`.
pub fn get_memos_calldata() -> Bytes {
    BuyMeACoffee::getMemosCall {}.abi_encode().into()
}

/// Decode the return data of `getMemos()`.
pub fn decode_memos(data: &[u8]) -> Result<Vec<Memo>, CoffeeError> {
    let raw = BuyMeACoffee::getMemosCall::abi_decode_returns(data)
        .map_err(|e| CoffeeError::Decode(format!("getMemos returned bad data: {e}")))?;
    raw.into_iter().map(Memo::try_from).collect()
}

/// topic0 of `NewMemo`, for log filters.
pub fn new_memo_topic() -> B256 {
    BuyMeACoffee::NewMemo::SIGNATURE_HASH
}

/// Decode one `NewMemo` log.
pub fn decode_new_memo(topics: &[B256], data: &[u8]) -> Result<Memo, CoffeeError> {
    let event = BuyMeACoffee::NewMemo::decode_raw_log(topics.iter().copied(), data)
        .map_err(|e| CoffeeError::Decode(format!("bad NewMemo log: {e}")))?;
    Memo::try_from(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{keccak256, Address, U256};
    use alloy::sol_types::SolValue;

    #[test]
    fn test_selectors() {
        let calldata = get_memos_calldata();
        assert_eq!(&calldata[..], &keccak256("getMemos()")[..4]);

        let calldata = buy_coffee_calldata(&Submission {
            name: "bob".into(),
            message: "nice".into(),
        });
        assert_eq!(&calldata[..4], &keccak256("buyCoffee(string,string)")[..4]);
    }

    #[test]
    fn test_buy_coffee_arguments() {
        let submission = Submission {
            name: "anonymous".into(),
            message: "enjoy your coffee :)".into(),
        };
        let calldata = buy_coffee_calldata(&submission);
        let call = BuyMeACoffee::buyCoffeeCall::abi_decode(&calldata).unwrap();
        assert_eq!(call._name, "anonymous");
        assert_eq!(call._message, "enjoy your coffee :)");
    }

    #[test]
    fn test_decode_memos() {
        let raw = vec![
            BuyMeACoffee::Memo {
                from: Address::repeat_byte(0x01),
                timestamp: U256::from(1_700_000_000u64),
                name: "alice".into(),
                message: "gm".into(),
            },
            BuyMeACoffee::Memo {
                from: Address::repeat_byte(0x02),
                timestamp: U256::from(1_700_000_060u64),
                name: "bob".into(),
                message: "gn".into(),
            },
        ];
        let data = raw.abi_encode();

        let memos = decode_memos(&data).unwrap();
        assert_eq!(memos.len(), 2);
        assert_eq!(memos[0].name, "alice");
        assert_eq!(memos[1].address, Address::repeat_byte(0x02));
        assert_eq!(memos[1].timestamp.timestamp(), 1_700_000_060);
    }

    #[test]
    fn test_decode_memos_rejects_garbage() {
        assert!(matches!(
            decode_memos(&[0xde, 0xad]),
            Err(CoffeeError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_new_memo() {
        let from = Address::repeat_byte(0xab);
        let event = BuyMeACoffee::NewMemo {
            from,
            timestamp: U256::from(1000),
            name: "bob".into(),
            message: "nice".into(),
        };
        let log = event.encode_log_data();
        assert_eq!(log.topics()[0], new_memo_topic());

        let memo = decode_new_memo(log.topics(), &log.data).unwrap();
        assert_eq!(memo.address, from);
        assert_eq!(memo.timestamp.timestamp_millis(), 1_000_000);
        assert_eq!(memo.name, "bob");
        assert_eq!(memo.message, "nice");
    }

    #[test]
    fn test_decode_new_memo_wrong_topic() {
        let event = BuyMeACoffee::NewMemo {
            from: Address::ZERO,
            timestamp: U256::from(1),
            name: String::new(),
            message: String::new(),
        };
        let log = event.encode_log_data();
        let topics = [B256::repeat_byte(0x99), log.topics()[1]];
        assert!(decode_new_memo(&topics, &log.data).is_err());
    }
}
