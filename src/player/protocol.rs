use serde::{Deserialize, Serialize};

use super::types::{
    OperationKind, PlayerProps, PreviewFrame, ProgressEvent, RequestId, Source, ViewHandle,
};
use crate::utils::errors::BridgeResult;
use crate::utils::source::{SourceDescriptor, resolve_source};

/// One-way instructions sent to the native engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all_fields = "camelCase")]
pub enum NativeCommand {
    #[serde(rename = "getInfo")]
    GetInfo { request_id: RequestId },
    #[serde(rename = "trim")]
    Trim {
        request_id: RequestId,
        start_time: f64,
        end_time: f64,
    },
    #[serde(rename = "getPreviewForSecond")]
    GetPreviewForSecond { request_id: RequestId, second: f64 },
}

impl NativeCommand {
    pub fn request_id(&self) -> RequestId {
        match self {
            NativeCommand::GetInfo { request_id }
            | NativeCommand::Trim { request_id, .. }
            | NativeCommand::GetPreviewForSecond { request_id, .. } => *request_id,
        }
    }

    pub fn operation(&self) -> OperationKind {
        match self {
            NativeCommand::GetInfo { .. } => OperationKind::Info,
            NativeCommand::Trim { .. } => OperationKind::Trim,
            NativeCommand::GetPreviewForSecond { .. } => OperationKind::Preview,
        }
    }

    pub fn name(&self) -> &'static str {
        self.operation().command_name()
    }
}

/// Asynchronous notifications sent back by the native engine.
///
/// `request_id` is optional everywhere: engines that do not echo it get
/// the batch behaviour where one reply settles every waiter of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NativeEvent {
    #[serde(rename = "onVideoInfo")]
    VideoInfo {
        width: f64,
        height: f64,
        duration: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    #[serde(rename = "onPreviewImage")]
    PreviewImage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        #[serde(flatten)]
        frame: PreviewFrame,
    },
    #[serde(rename = "onTrimmedSource")]
    TrimmedSource {
        source: Source,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    #[serde(rename = "onVideoProgress")]
    VideoProgress {
        #[serde(flatten)]
        progress: ProgressEvent,
    },
    #[serde(rename = "onFailure")]
    Failure {
        operation: OperationKind,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
}

impl NativeEvent {
    /// Operation kind this event settles; progress settles nothing
    pub fn operation(&self) -> Option<OperationKind> {
        match self {
            NativeEvent::VideoInfo { .. } => Some(OperationKind::Info),
            NativeEvent::PreviewImage { .. } => Some(OperationKind::Preview),
            NativeEvent::TrimmedSource { .. } => Some(OperationKind::Trim),
            NativeEvent::Failure { operation, .. } => Some(*operation),
            NativeEvent::VideoProgress { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NativeEvent::VideoInfo { .. } => "onVideoInfo",
            NativeEvent::PreviewImage { .. } => "onPreviewImage",
            NativeEvent::TrimmedSource { .. } => "onTrimmedSource",
            NativeEvent::VideoProgress { .. } => "onVideoProgress",
            NativeEvent::Failure { .. } => "onFailure",
        }
    }
}

/// An event addressed to a specific native view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEnvelope {
    pub view: ViewHandle,
    #[serde(flatten)]
    pub event: NativeEvent,
}

impl NativeEnvelope {
    pub fn new(view: ViewHandle, event: NativeEvent) -> Self {
        Self { view, event }
    }

    pub fn from_json(json: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Property snapshot handed to the engine, with the source already resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeProps {
    pub source: Option<SourceDescriptor>,
    pub play: bool,
    pub replay: bool,
    pub volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    pub progress_event_delay_ms: u64,
}

impl NativeProps {
    pub fn from_props(props: &PlayerProps) -> BridgeResult<Self> {
        let source = resolve_source(props.source.as_str())?.map(|resolved| resolved.descriptor());
        Ok(Self {
            source,
            play: props.play,
            replay: props.replay,
            volume: props.volume,
            current_time: props.current_time,
            start_time: props.start_time,
            end_time: props.end_time,
            progress_event_delay_ms: u64::try_from(props.progress_event_delay.as_millis())
                .unwrap_or(u64::MAX),
        })
    }
}
