//! Errors of the relay process

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid traffic update {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid destination address {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("update channel closed")]
    ChannelClosed,
}
