// Library entry for the native video-processing bridge.
// The controller task owns all pending state; callers talk to it through
// `BridgeHandle` and native engines talk back through `EventSink`.

pub mod config;
pub mod constants;
pub mod logging;
pub mod player;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use player::{
    BridgeController, BridgeHandle, EventRouter, EventSink, NativeCommand, NativeEngine,
    NativeEnvelope, NativeEvent, NativeProps, OperationKind, PlayerProps, PreviewFrame,
    ProgressEvent, RequestId, Source, TrimRange, TrimRequest, VideoInfo, VideoSize, ViewHandle,
};
pub use utils::errors::{BridgeError, BridgeResult};
