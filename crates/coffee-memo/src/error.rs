use thiserror::Error;

/// Errors returned by wallet and contract operations.
#[derive(Debug, Error)]
pub enum CoffeeError {
    #[error("no wallet provider detected")]
    NoWallet,

    #[error("wallet not connected")]
    NotConnected,

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("transaction {0} reverted")]
    Reverted(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
