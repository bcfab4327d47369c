//! Error types for the ranking client

use thiserror::Error;

/// Unified error type for collection polling and payload retrieval
#[derive(Error, Debug)]
pub enum RankingError {
    #[error("No data: {0}")]
    NoData(String),

    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    #[error("Scoring job failed: {0}")]
    TerminalJob(String),

    #[error("Collection cancelled")]
    Cancelled,

    #[error("Payload fetch failed: {0}")]
    FetchFailed(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<flipper_core::FlipperError> for RankingError {
    fn from(e: flipper_core::FlipperError) -> Self {
        RankingError::InvalidParameter(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RankingError>;

fn validate_evm_address(kind: &str, address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(RankingError::InvalidParameter(format!(
            "{} address cannot be empty",
            kind
        )));
    }
    let hex = match address.strip_prefix("0x") {
        Some(hex) if hex.len() == 40 => hex,
        _ => {
            return Err(RankingError::InvalidParameter(format!(
                "Invalid {} address format. Expected 0x-prefixed 40-char hex",
                kind.to_lowercase()
            )))
        }
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RankingError::InvalidParameter(format!(
            "{} address contains non-hex characters: {}",
            kind, address
        )));
    }
    Ok(())
}

/// Validate an EVM wallet address
pub fn validate_wallet_address(address: &str) -> Result<()> {
    validate_evm_address("Wallet", address)
}

/// Validate an NFT contract address
pub fn validate_contract_address(address: &str) -> Result<()> {
    validate_evm_address("Contract", address)
}
