//! Memos: one tip's sender, time, name and message.

use std::fmt;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};

use crate::error::CoffeeError;
use crate::BuyMeACoffee;

/// A memo as shown in the feed. Immutable once received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memo {
    pub address: Address,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub message: String,
}

impl Memo {
    /// Build a memo from the contract's raw fields. `timestamp` is unix
    /// seconds as stored by `block.timestamp`.
    pub fn from_parts(
        address: Address,
        timestamp: U256,
        name: String,
        message: String,
    ) -> Result<Self, CoffeeError> {
        Ok(Self {
            address,
            timestamp: timestamp_from_seconds(timestamp)?,
            name,
            message,
        })
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" from {} at {}",
            self.message,
            self.name,
            self.timestamp.to_rfc2822()
        )
    }
}

impl TryFrom<BuyMeACoffee::Memo> for Memo {
    type Error = CoffeeError;

    fn try_from(raw: BuyMeACoffee::Memo) -> Result<Self, Self::Error> {
        Memo::from_parts(raw.from, raw.timestamp, raw.name, raw.message)
    }
}

impl TryFrom<BuyMeACoffee::NewMemo> for Memo {
    type Error = CoffeeError;

    fn try_from(event: BuyMeACoffee::NewMemo) -> Result<Self, Self::Error> {
        Memo::from_parts(event.from, event.timestamp, event.name, event.message)
    }
}

/// Convert unix seconds to a UTC datetime.
pub fn timestamp_from_seconds(seconds: U256) -> Result<DateTime<Utc>, CoffeeError> {
    let secs = i64::try_from(seconds)
        .map_err(|_| CoffeeError::Decode(format!("memo timestamp {seconds} out of range")))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CoffeeError::Decode(format!("memo timestamp {secs} out of range")))
}

/// `0x1234…abcd`, checksummed, for display.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_timestamp_is_seconds() {
        let memo = Memo::from_parts(addr(0xab), U256::from(1000), "bob".into(), "nice".into())
            .unwrap();
        assert_eq!(memo.timestamp.timestamp_millis(), 1_000_000);
        assert_eq!(memo.address, addr(0xab));
        assert_eq!(memo.name, "bob");
        assert_eq!(memo.message, "nice");
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let err = Memo::from_parts(addr(1), U256::MAX, String::new(), String::new());
        assert!(matches!(err, Err(CoffeeError::Decode(_))));

        let err = timestamp_from_seconds(U256::from(u64::MAX));
        assert!(matches!(err, Err(CoffeeError::Decode(_))));
    }

    #[test]
    fn test_from_contract_struct() {
        let raw = BuyMeACoffee::Memo {
            from: addr(0x11),
            timestamp: U256::from(1_660_000_000u64),
            name: "alice".into(),
            message: "gm".into(),
        };
        let memo = Memo::try_from(raw).unwrap();
        assert_eq!(memo.timestamp.timestamp(), 1_660_000_000);
        assert_eq!(memo.name, "alice");
    }

    #[test]
    fn test_display() {
        let memo =
            Memo::from_parts(addr(0xab), U256::ZERO, "bob".into(), "nice".into()).unwrap();
        let shown = memo.to_string();
        assert!(shown.starts_with("\"nice\" from bob at "));
        assert!(shown.contains("1970"));
    }

    #[test]
    fn test_short_address() {
        let a: Address = "0xdA5B8A7db2d47F593C8217c4e9A65a35A4C17a6F".parse().unwrap();
        assert_eq!(short_address(&a).to_lowercase(), "0xda5b…7a6f");
    }
}
