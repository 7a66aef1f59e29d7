use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while parsing a base-58 account address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string contains characters outside the base-58 alphabet.
    #[error("invalid base-58 address: {0}")]
    Encoding(#[from] bs58::decode::Error),

    /// The string decoded cleanly but not to a 32-byte public key.
    #[error("address must decode to 32 bytes, got {0}")]
    Length(usize),
}

/// Failures talking to the RPC endpoint.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection, timeout or body transfer failure.
    #[error("rpc request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc endpoint returned HTTP {0}")]
    Status(u16),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Errors surfaced by batch account generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to serialize accounts: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The account document could not be written. The previous file, if any,
    /// is left untouched.
    #[error("failed to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors reading back or checking a persisted account document.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse account record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("bad public key: {0}")]
    PublicKey(#[from] AddressError),

    #[error("secret key must be 64 bytes, got {0}")]
    SecretKeyLength(usize),

    #[error("secret key does not belong to {0}")]
    Mismatch(String),
}
