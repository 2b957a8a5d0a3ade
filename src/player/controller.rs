use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use super::pending::{PendingQueue, Responder};
use super::protocol::{NativeCommand, NativeEnvelope, NativeEvent, NativeProps};
use super::traits::NativeEngine;
use super::types::{
    OperationKind, PlayerProps, PreviewFrame, ProgressEvent, RequestId, Source, TrimRange,
    TrimRequest, VideoInfo, ViewHandle,
};
use crate::config::Config;
use crate::utils::errors::{BridgeError, BridgeResult};

/// Receives every `onVideoProgress` payload
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

type PropsUpdate = Box<dyn FnOnce(&mut PlayerProps) + Send>;

/// Commands that can be sent to the bridge controller
pub enum BridgeCommand {
    /// Ask the engine for size and duration of the current source
    FetchInfo { respond_to: Responder<VideoInfo> },
    /// Cut the current source down to a range
    Trim {
        range: TrimRange,
        respond_to: Responder<Source>,
    },
    /// Extract a still frame at an offset in seconds
    ExtractPreviewFrame {
        at_second: f64,
        respond_to: Responder<PreviewFrame>,
    },
    /// Hand back the current source unchanged
    Compress { respond_to: oneshot::Sender<Source> },
    /// Modify the player properties and push them to the engine
    UpdateProps {
        update: PropsUpdate,
        respond_to: oneshot::Sender<BridgeResult<PlayerProps>>,
    },
    /// Get the current player properties
    GetProps {
        respond_to: oneshot::Sender<PlayerProps>,
    },
    /// Replace the progress callback
    SetOnChange { callback: ProgressCallback },
    /// Number of callers waiting on an operation kind
    PendingCount {
        operation: OperationKind,
        respond_to: oneshot::Sender<usize>,
    },
    /// Abandon everything pending and stop the controller
    Shutdown { respond_to: oneshot::Sender<()> },
}

impl std::fmt::Debug for BridgeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BridgeCommand::FetchInfo { .. } => "FetchInfo",
            BridgeCommand::Trim { .. } => "Trim",
            BridgeCommand::ExtractPreviewFrame { .. } => "ExtractPreviewFrame",
            BridgeCommand::Compress { .. } => "Compress",
            BridgeCommand::UpdateProps { .. } => "UpdateProps",
            BridgeCommand::GetProps { .. } => "GetProps",
            BridgeCommand::SetOnChange { .. } => "SetOnChange",
            BridgeCommand::PendingCount { .. } => "PendingCount",
            BridgeCommand::Shutdown { .. } => "Shutdown",
        };
        f.write_str(name)
    }
}

/// Controller that owns the pending queues and processes commands and
/// native events for a single view
pub struct BridgeController {
    view: ViewHandle,
    engine: Arc<dyn NativeEngine>,
    receiver: mpsc::UnboundedReceiver<BridgeCommand>,
    events: mpsc::UnboundedReceiver<NativeEnvelope>,
    events_open: bool,

    props: PlayerProps,
    on_change: ProgressCallback,
    next_request_id: u64,

    info_queue: PendingQueue<VideoInfo>,
    preview_queue: PendingQueue<PreviewFrame>,
    trim_queue: PendingQueue<Source>,
}

impl BridgeController {
    /// Create a controller for `view`, the handle that drives it and the sink
    /// the engine uses to answer
    pub fn new(
        view: ViewHandle,
        engine: Arc<dyn NativeEngine>,
        config: &Config,
        source: impl Into<Source>,
    ) -> (BridgeHandle, BridgeController, EventSink) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let controller = BridgeController {
            view,
            engine,
            receiver,
            events: event_rx,
            events_open: true,
            props: config.initial_props(source),
            on_change: Arc::new(|_| {}),
            next_request_id: 0,
            info_queue: PendingQueue::new(OperationKind::Info),
            preview_queue: PendingQueue::new(OperationKind::Preview),
            trim_queue: PendingQueue::new(OperationKind::Trim),
        };
        let handle = BridgeHandle {
            view,
            sender,
            reply_timeout: config.reply_timeout(),
        };
        let sink = EventSink {
            view,
            sender: event_tx,
        };

        (handle, controller, sink)
    }

    /// Use `callback` for progress events from the start
    pub fn with_on_change(mut self, callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_change = Arc::new(callback);
        self
    }

    /// Run the controller event loop
    pub async fn run(mut self) {
        info!("Bridge controller for {} started", self.view);

        // Mount: the view receives its initial properties before any command
        match NativeProps::from_props(&self.props) {
            Ok(native) => {
                if let Err(e) = self.engine.apply_props(self.view, &native).await {
                    warn!("Engine rejected initial props for {}: {:#}", self.view, e);
                }
            }
            Err(e) => warn!("Initial source for {} not usable: {}", self.view, e),
        }

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(BridgeCommand::Shutdown { respond_to }) => {
                        debug!("Shutdown requested for {}", self.view);
                        self.abandon_all();
                        let _ = respond_to.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("All handles for {} dropped", self.view);
                        break;
                    }
                },
                envelope = self.events.recv(), if self.events_open => match envelope {
                    Some(envelope) => self.handle_event(envelope),
                    None => {
                        warn!("Event channel for {} closed; pending operations abandoned", self.view);
                        self.events_open = false;
                        self.abandon_all();
                    }
                },
            }
        }

        self.abandon_all();
        info!("Bridge controller for {} terminated", self.view);
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        RequestId::new(self.next_request_id)
    }

    async fn handle_command(&mut self, command: BridgeCommand) {
        trace!("{} <- {:?}", self.view, command);
        match command {
            BridgeCommand::FetchInfo { respond_to } => {
                if self.props.source.is_empty() {
                    warn!("Video source is empty");
                    let _ = respond_to.send(Err(BridgeError::EmptySource));
                    return;
                }
                if !self.events_open {
                    let _ = respond_to.send(Err(BridgeError::Abandoned {
                        operation: OperationKind::Info,
                    }));
                    return;
                }
                let request_id = self.next_request_id();
                issue(
                    self.engine.as_ref(),
                    self.view,
                    &mut self.info_queue,
                    NativeCommand::GetInfo { request_id },
                    respond_to,
                )
                .await;
            }
            BridgeCommand::Trim { range, respond_to } => {
                if !self.events_open {
                    let _ = respond_to.send(Err(BridgeError::Abandoned {
                        operation: OperationKind::Trim,
                    }));
                    return;
                }
                let request_id = self.next_request_id();
                issue(
                    self.engine.as_ref(),
                    self.view,
                    &mut self.trim_queue,
                    NativeCommand::Trim {
                        request_id,
                        start_time: range.start_time,
                        end_time: range.end_time,
                    },
                    respond_to,
                )
                .await;
            }
            BridgeCommand::ExtractPreviewFrame {
                at_second,
                respond_to,
            } => {
                if !self.events_open {
                    let _ = respond_to.send(Err(BridgeError::Abandoned {
                        operation: OperationKind::Preview,
                    }));
                    return;
                }
                let request_id = self.next_request_id();
                issue(
                    self.engine.as_ref(),
                    self.view,
                    &mut self.preview_queue,
                    NativeCommand::GetPreviewForSecond {
                        request_id,
                        second: at_second,
                    },
                    respond_to,
                )
                .await;
            }
            BridgeCommand::Compress { respond_to } => {
                let _ = respond_to.send(self.props.source.clone());
            }
            BridgeCommand::UpdateProps { update, respond_to } => {
                let result = self.update_props(update).await;
                let _ = respond_to.send(result);
            }
            BridgeCommand::GetProps { respond_to } => {
                let _ = respond_to.send(self.props.clone());
            }
            BridgeCommand::SetOnChange { callback } => {
                self.on_change = callback;
            }
            BridgeCommand::PendingCount {
                operation,
                respond_to,
            } => {
                let count = match operation {
                    OperationKind::Info => self.info_queue.len(),
                    OperationKind::Preview => self.preview_queue.len(),
                    OperationKind::Trim => self.trim_queue.len(),
                };
                let _ = respond_to.send(count);
            }
            // Intercepted by the run loop
            BridgeCommand::Shutdown { respond_to } => {
                let _ = respond_to.send(());
            }
        }
    }

    /// Apply an update to a copy of the props; only keep it once the engine
    /// accepted the new snapshot
    async fn update_props(&mut self, update: PropsUpdate) -> BridgeResult<PlayerProps> {
        let mut props = self.props.clone();
        update(&mut props);
        props.volume = props.volume.clamp(0.0, 1.0);

        let native = NativeProps::from_props(&props)?;
        self.engine
            .apply_props(self.view, &native)
            .await
            .map_err(|e| BridgeError::PropsRejected(format!("{e:#}")))?;

        if props.source != self.props.source {
            debug!("{} source changed to {}", self.view, props.source);
        }
        self.props = props;
        Ok(self.props.clone())
    }

    fn handle_event(&mut self, envelope: NativeEnvelope) {
        if envelope.view != self.view {
            warn!(
                "Ignoring {} addressed to {} (this is {})",
                envelope.event.name(),
                envelope.view,
                self.view
            );
            return;
        }

        trace!("{} -> {}", self.view, envelope.event.name());
        let settled = match envelope.event {
            NativeEvent::VideoInfo {
                width,
                height,
                duration,
                request_id,
            } => {
                let info = VideoInfo::new(width, height, duration);
                self.info_queue.resolve(request_id, info)
            }
            NativeEvent::PreviewImage { request_id, frame } => {
                self.preview_queue.resolve(request_id, frame)
            }
            NativeEvent::TrimmedSource { source, request_id } => {
                debug!("Trimmed source for {}: {}", self.view, source);
                self.trim_queue.resolve(request_id, source)
            }
            NativeEvent::VideoProgress { progress } => {
                (self.on_change)(progress);
                return;
            }
            NativeEvent::Failure {
                operation,
                message,
                request_id,
            } => {
                warn!("Native engine reported {} failure: {}", operation, message);
                let error = || BridgeError::NativeEngineFailure {
                    operation,
                    message: message.clone(),
                };
                match operation {
                    OperationKind::Info => self.info_queue.reject(request_id, error),
                    OperationKind::Preview => self.preview_queue.reject(request_id, error),
                    OperationKind::Trim => self.trim_queue.reject(request_id, error),
                }
            }
        };
        trace!("{} settled {} waiter(s)", self.view, settled);
    }

    fn abandon_all(&mut self) {
        let abandoned = self.info_queue.reject_all(|| BridgeError::Abandoned {
            operation: OperationKind::Info,
        }) + self.preview_queue.reject_all(|| BridgeError::Abandoned {
            operation: OperationKind::Preview,
        }) + self.trim_queue.reject_all(|| BridgeError::Abandoned {
            operation: OperationKind::Trim,
        });
        if abandoned > 0 {
            debug!("Abandoned {} pending operation(s) on {}", abandoned, self.view);
        }
    }
}

/// Queue the responder, then send the command. If the engine refuses the
/// command, the responder is taken back and failed.
async fn issue<T: Clone>(
    engine: &dyn NativeEngine,
    view: ViewHandle,
    queue: &mut PendingQueue<T>,
    command: NativeCommand,
    respond_to: Responder<T>,
) {
    let operation = command.operation();
    let request_id = command.request_id();

    let waiting = queue.push(request_id, respond_to);
    if waiting > 0 {
        warn!(
            "{} {} operation(s) already pending on {}; a reply without a request id answers all of them",
            waiting, operation, view
        );
    }

    trace!("Dispatching {} ({}) to {}", command.name(), request_id, view);
    if let Err(e) = engine.dispatch(view, command).await {
        warn!("Engine refused {} ({}): {:#}", operation, request_id, e);
        if let Some(respond_to) = queue.remove(request_id) {
            let _ = respond_to.send(Err(BridgeError::NativeEngineFailure {
                operation,
                message: format!("{e:#}"),
            }));
        }
    }
}

/// Sender half of the native event channel for one view
#[derive(Debug, Clone)]
pub struct EventSink {
    view: ViewHandle,
    sender: mpsc::UnboundedSender<NativeEnvelope>,
}

impl EventSink {
    pub fn view(&self) -> ViewHandle {
        self.view
    }

    /// Deliver an event addressed to this sink's view
    pub fn deliver(&self, event: NativeEvent) -> BridgeResult<()> {
        self.deliver_envelope(NativeEnvelope::new(self.view, event))
    }

    pub fn deliver_envelope(&self, envelope: NativeEnvelope) -> BridgeResult<()> {
        self.sender
            .send(envelope)
            .map_err(|_| BridgeError::Disconnected)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Handle to send commands to the bridge controller
#[derive(Clone)]
pub struct BridgeHandle {
    view: ViewHandle,
    sender: mpsc::UnboundedSender<BridgeCommand>,
    reply_timeout: Option<Duration>,
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("view", &self.view)
            .field("sender", &"<UnboundedSender>")
            .field("reply_timeout", &self.reply_timeout)
            .finish()
    }
}

impl BridgeHandle {
    pub fn view(&self) -> ViewHandle {
        self.view
    }

    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Send a command whose answer depends on a native reply
    async fn request<T>(
        &self,
        operation: OperationKind,
        command: impl FnOnce(Responder<T>) -> BridgeCommand,
    ) -> BridgeResult<T> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| BridgeError::Disconnected)?;

        let reply = match self.reply_timeout {
            Some(after) => tokio::time::timeout(after, response)
                .await
                .map_err(|_| BridgeError::Timeout { operation, after })?,
            None => response.await,
        };
        reply.map_err(|_| BridgeError::Abandoned { operation })?
    }

    /// Send a command the controller answers by itself
    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> BridgeCommand) -> BridgeResult<T> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| BridgeError::Disconnected)?;
        response.await.map_err(|_| BridgeError::Disconnected)
    }

    /// Fetch size and duration of the configured source.
    ///
    /// Fails with `EmptySource` without contacting the engine when no source
    /// is configured.
    pub async fn fetch_info(&self) -> BridgeResult<VideoInfo> {
        self.request(OperationKind::Info, |respond_to| BridgeCommand::FetchInfo {
            respond_to,
        })
        .await
    }

    /// Trim the configured source and get back the new source.
    ///
    /// The range is forwarded as is; the engine decides what an inverted
    /// range means. Passing a source string is refused.
    pub async fn trim(&self, request: impl Into<TrimRequest>) -> BridgeResult<Source> {
        let range = match request.into() {
            TrimRequest::Range(range) => range,
            TrimRequest::LegacySource(source) => {
                warn!(
                    "There is no need to pass a source for trimming ({}); this calling convention is deprecated",
                    source
                );
                return Err(BridgeError::DeprecatedArgument(
                    "trim no longer accepts a source".to_string(),
                ));
            }
        };
        if !range.is_forward() {
            warn!(
                "Trim range {}..{} is empty or inverted; forwarding to the engine unchanged",
                range.start_time, range.end_time
            );
        }

        self.request(OperationKind::Trim, |respond_to| BridgeCommand::Trim {
            range,
            respond_to,
        })
        .await
    }

    /// Extract a still frame at `at_second` (0.0 for the first frame)
    pub async fn extract_preview_frame(&self, at_second: f64) -> BridgeResult<PreviewFrame> {
        self.request(OperationKind::Preview, |respond_to| {
            BridgeCommand::ExtractPreviewFrame {
                at_second,
                respond_to,
            }
        })
        .await
    }

    /// Returns the configured source untouched; there is no compression
    /// pipeline in the bridge.
    pub async fn compress(&self) -> BridgeResult<Source> {
        self.call(|respond_to| BridgeCommand::Compress { respond_to })
            .await
    }

    pub async fn props(&self) -> BridgeResult<PlayerProps> {
        self.call(|respond_to| BridgeCommand::GetProps { respond_to })
            .await
    }

    /// Apply `update` to the current props and push the result to the engine
    pub async fn update_props(
        &self,
        update: impl FnOnce(&mut PlayerProps) + Send + 'static,
    ) -> BridgeResult<PlayerProps> {
        self.call(|respond_to| BridgeCommand::UpdateProps {
            update: Box::new(update),
            respond_to,
        })
        .await?
    }

    pub async fn set_props(&self, props: PlayerProps) -> BridgeResult<PlayerProps> {
        self.update_props(move |current| *current = props).await
    }

    pub async fn set_source(&self, source: impl Into<Source>) -> BridgeResult<PlayerProps> {
        let source = source.into();
        self.update_props(move |props| props.source = source).await
    }

    pub async fn play(&self) -> BridgeResult<PlayerProps> {
        self.update_props(|props| props.play = true).await
    }

    pub async fn pause(&self) -> BridgeResult<PlayerProps> {
        self.update_props(|props| props.play = false).await
    }

    pub async fn set_replay(&self, replay: bool) -> BridgeResult<PlayerProps> {
        self.update_props(move |props| props.replay = replay).await
    }

    /// Set volume (clamped to 0.0 to 1.0)
    pub async fn set_volume(&self, volume: f64) -> BridgeResult<PlayerProps> {
        self.update_props(move |props| props.volume = volume).await
    }

    /// Seek to an offset in seconds
    pub async fn seek(&self, position: f64) -> BridgeResult<PlayerProps> {
        self.update_props(move |props| props.current_time = Some(position))
            .await
    }

    /// Limit playback to a range of the source
    pub async fn set_range(&self, range: TrimRange) -> BridgeResult<PlayerProps> {
        self.update_props(move |props| {
            props.start_time = Some(range.start_time);
            props.end_time = Some(range.end_time);
        })
        .await
    }

    pub async fn set_progress_event_delay(&self, delay: Duration) -> BridgeResult<PlayerProps> {
        self.update_props(move |props| props.progress_event_delay = delay)
            .await
    }

    /// Replace the progress callback
    pub fn set_on_change(
        &self,
        callback: impl Fn(ProgressEvent) + Send + Sync + 'static,
    ) -> BridgeResult<()> {
        self.sender
            .send(BridgeCommand::SetOnChange {
                callback: Arc::new(callback),
            })
            .map_err(|_| BridgeError::Disconnected)
    }

    /// Number of callers waiting on `operation`
    pub async fn pending(&self, operation: OperationKind) -> BridgeResult<usize> {
        self.call(|respond_to| BridgeCommand::PendingCount {
            operation,
            respond_to,
        })
        .await
    }

    /// Fail everything pending with `Abandoned` and stop the controller
    pub async fn shutdown(&self) -> BridgeResult<()> {
        match self
            .call(|respond_to| BridgeCommand::Shutdown { respond_to })
            .await
        {
            Ok(()) | Err(BridgeError::Disconnected) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
