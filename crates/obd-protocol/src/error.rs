//! Protocol Error Types

use crate::signal::SignalId;
use thiserror::Error;

/// Errors from decoding a single response frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame shorter than the echo prefix plus the signal's data bytes.
    #[error("frame too short for {signal:?}: need {needed} hex chars, got {got}")]
    TruncatedFrame {
        signal: SignalId,
        needed: usize,
        got: usize,
    },

    /// Non-hex characters where data bytes were expected.
    #[error("invalid hex in frame: {0}")]
    InvalidHex(String),
}

/// Errors from building or parsing a batched request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// A signal in the batch does not belong to the codec's request mode.
    #[error("{signal:?} ({code}) does not belong to mode {mode}")]
    MixedMode {
        signal: SignalId,
        code: &'static str,
        mode: &'static str,
    },

    /// More signals than one bus request can carry.
    #[error("batch of {len} signals exceeds the limit of {max} per request")]
    BatchTooLarge { len: usize, max: usize },

    /// A request needs at least one signal.
    #[error("batch is empty")]
    EmptyBatch,

    /// Response did not start with the expected mode echo byte.
    #[error("unexpected response echo: expected {expected}, got {got}")]
    UnexpectedEcho { expected: &'static str, got: String },

    /// A frame segment failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
