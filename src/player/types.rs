//! Common types shared by the bridge, its handle and native engines
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_PROGRESS_EVENT_DELAY_MS, DEFAULT_VOLUME};

/// Identity of the native view a bridge instance talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewHandle(u64);

impl ViewHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Monotonic id attached to every outbound command, echoed by engines that
/// support per-request correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Media source identifier: a local path or a remote reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The asynchronous operation kinds that park a caller until the engine replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "getInfo")]
    Info,
    #[serde(rename = "getPreviewForSecond")]
    Preview,
    #[serde(rename = "trim")]
    Trim,
}

impl OperationKind {
    /// Wire name of the command that starts this operation
    pub fn command_name(&self) -> &'static str {
        match self {
            OperationKind::Info => "getInfo",
            OperationKind::Preview => "getPreviewForSecond",
            OperationKind::Trim => "trim",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// Frame dimensions as the engine reports them; some platforms use
/// fractional sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: f64,
    pub height: f64,
}

/// Metadata reported by the engine for the configured source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub size: VideoSize,
    /// Seconds
    pub duration: f64,
}

impl VideoInfo {
    pub fn new(width: f64, height: f64, duration: f64) -> Self {
        Self {
            size: VideoSize { width, height },
            duration,
        }
    }
}

/// Extracted still frame, kept exactly as the engine delivered it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewFrame(Map<String, Value>);

impl PreviewFrame {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self(payload)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Playback position notification, kept exactly as the engine delivered it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressEvent(Map<String, Value>);

impl ProgressEvent {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self(payload)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Current playback position in seconds, when the engine reports one
    pub fn current_time(&self) -> Option<f64> {
        self.0.get("currentTime").and_then(Value::as_f64)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Offsets (seconds) into the source timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimRange {
    pub start_time: f64,
    pub end_time: f64,
}

impl TrimRange {
    pub fn new(start_time: f64, end_time: f64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn is_forward(&self) -> bool {
        self.end_time > self.start_time
    }
}

/// Argument accepted by `trim`. Passing a bare source string is the legacy
/// calling convention and is refused.
#[derive(Debug, Clone, PartialEq)]
pub enum TrimRequest {
    Range(TrimRange),
    LegacySource(String),
}

impl From<TrimRange> for TrimRequest {
    fn from(range: TrimRange) -> Self {
        TrimRequest::Range(range)
    }
}

impl From<(f64, f64)> for TrimRequest {
    fn from((start_time, end_time): (f64, f64)) -> Self {
        TrimRequest::Range(TrimRange::new(start_time, end_time))
    }
}

impl From<&str> for TrimRequest {
    fn from(source: &str) -> Self {
        TrimRequest::LegacySource(source.to_string())
    }
}

impl From<String> for TrimRequest {
    fn from(source: String) -> Self {
        TrimRequest::LegacySource(source)
    }
}

/// Properties pushed to the native view
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProps {
    pub source: Source,
    pub play: bool,
    pub replay: bool,
    /// 0.0 to 1.0
    pub volume: f64,
    pub current_time: Option<f64>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub progress_event_delay: Duration,
}

impl PlayerProps {
    pub fn new(source: impl Into<Source>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }
}

impl Default for PlayerProps {
    fn default() -> Self {
        Self {
            source: Source::default(),
            play: false,
            replay: false,
            volume: DEFAULT_VOLUME,
            current_time: None,
            start_time: None,
            end_time: None,
            progress_event_delay: Duration::from_millis(DEFAULT_PROGRESS_EVENT_DELAY_MS),
        }
    }
}
