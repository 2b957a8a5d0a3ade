// Bridge tuning constants - defaults used when the config file omits a field

// === Replies ===
/// How long a caller waits for a native reply before giving up (seconds).
/// Zero disables the timeout.
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 30;

// === Playback ===
pub const DEFAULT_VOLUME: f64 = 1.0;
/// Interval between `onVideoProgress` events requested from the engine.
pub const DEFAULT_PROGRESS_EVENT_DELAY_MS: u64 = 1000;

// === Config ===
pub const CONFIG_DIR_NAME: &str = "video-bridge";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default log filter handed to `logging::init` by embedders that do not
/// provide their own.
pub const DEFAULT_LOG_FILTER: &str = "video_bridge=info";
