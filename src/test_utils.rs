#![cfg(test)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::player::{
    BridgeController, BridgeHandle, EventSink, NativeCommand, NativeEngine, NativeProps,
    Source, ViewHandle,
};

pub const TEST_VIEW: ViewHandle = ViewHandle::new(7);

/// Engine that records what the bridge sends and never answers by itself
pub struct RecordingEngine {
    commands: mpsc::UnboundedSender<(ViewHandle, NativeCommand)>,
    props: Mutex<Vec<NativeProps>>,
    fail_dispatch: AtomicBool,
}

impl RecordingEngine {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(ViewHandle, NativeCommand)>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            commands,
            props: Mutex::new(Vec::new()),
            fail_dispatch: AtomicBool::new(false),
        });
        (engine, receiver)
    }

    pub fn fail_dispatch(&self, fail: bool) {
        self.fail_dispatch.store(fail, Ordering::SeqCst);
    }

    pub fn applied_props(&self) -> Vec<NativeProps> {
        self.props.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeEngine for RecordingEngine {
    async fn dispatch(&self, view: ViewHandle, command: NativeCommand) -> Result<()> {
        if self.fail_dispatch.load(Ordering::SeqCst) {
            return Err(anyhow!("view {} is not mounted", view));
        }
        let _ = self.commands.send((view, command));
        Ok(())
    }

    async fn apply_props(&self, _view: ViewHandle, props: &NativeProps) -> Result<()> {
        self.props.lock().unwrap().push(props.clone());
        Ok(())
    }
}

/// Spawn a controller for `TEST_VIEW` with default config
pub fn spawn_bridge(
    engine: Arc<RecordingEngine>,
    source: impl Into<Source>,
) -> (BridgeHandle, EventSink) {
    let (handle, controller, sink) =
        BridgeController::new(TEST_VIEW, engine, &Config::default(), source);
    tokio::spawn(controller.run());
    (handle, sink)
}

/// Wait for a condition to become true
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
