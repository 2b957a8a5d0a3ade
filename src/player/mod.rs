pub mod controller;
pub mod pending;
pub mod protocol;
pub mod router;
pub mod traits;
pub mod types;

pub use controller::{BridgeCommand, BridgeController, BridgeHandle, EventSink, ProgressCallback};
pub use pending::PendingQueue;
pub use protocol::{NativeCommand, NativeEnvelope, NativeEvent, NativeProps};
pub use router::EventRouter;
pub use traits::NativeEngine;
pub use types::{
    OperationKind, PlayerProps, PreviewFrame, ProgressEvent, RequestId, Source, TrimRange,
    TrimRequest, VideoInfo, VideoSize, ViewHandle,
};
