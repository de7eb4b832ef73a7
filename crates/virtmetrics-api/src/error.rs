//! Model error types.

use thiserror::Error;

/// Errors raised while interpreting object fields.
#[derive(Debug, Error)]
pub enum Error {
    /// A resource quantity could not be parsed.
    #[error("invalid quantity: {0:?}")]
    InvalidQuantity(String),

    /// A stored object snapshot could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
