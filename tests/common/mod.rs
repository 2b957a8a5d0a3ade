
use std::sync::Arc;

use mocks::ScriptedEngine;
use video_bridge::{BridgeController, BridgeHandle, Config, EventRouter, Source, ViewHandle};

/// A bridge wired to a shared engine through a router
pub struct TestBridge {
    pub handle: BridgeHandle,
    pub view: ViewHandle,
}

/// Mount a view on `engine`: spawn its controller and register its sink
pub async fn mount(
    engine: Arc<ScriptedEngine>,
    router: &EventRouter,
    view: ViewHandle,
    config: &Config,
    source: impl Into<Source>,
) -> TestBridge {
    let (handle, controller, sink) = BridgeController::new(view, engine, config, source);
    router.register(sink).await;
    tokio::spawn(controller.run());
    TestBridge { handle, view }
}
