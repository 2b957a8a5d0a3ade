use std::time::Duration;

use thiserror::Error;

use crate::player::OperationKind;

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Video source is empty")]
    EmptySource,

    #[error("Deprecated argument: {0}")]
    DeprecatedArgument(String),

    #[error("Native engine failed during {operation}: {message}")]
    NativeEngineFailure {
        operation: OperationKind,
        message: String,
    },

    #[error("Operation {operation} abandoned before the native engine replied")]
    Abandoned { operation: OperationKind },

    #[error("Operation {operation} timed out after {after:?}")]
    Timeout {
        operation: OperationKind,
        after: Duration,
    },

    #[error("Bridge controller disconnected")]
    Disconnected,

    #[error("Native engine rejected player properties: {0}")]
    PropsRejected(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Malformed native event: {0}")]
    MalformedEvent(#[from] serde_json::Error),
}
