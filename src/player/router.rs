use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{trace, warn};

use super::controller::EventSink;
use super::protocol::NativeEnvelope;
use super::types::ViewHandle;
use crate::utils::errors::{BridgeError, BridgeResult};

/// Routes engine events to the bridge registered for the addressed view,
/// so one engine can serve many views
#[derive(Clone, Default)]
pub struct EventRouter {
    sinks: Arc<RwLock<HashMap<ViewHandle, EventSink>>>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("sinks", &"<Arc<RwLock<...>>>")
            .finish()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink, replacing any previous one for the same view
    pub async fn register(&self, sink: EventSink) {
        let view = sink.view();
        if self.sinks.write().await.insert(view, sink).is_some() {
            warn!("Replaced event sink for {}", view);
        }
    }

    pub async fn unregister(&self, view: ViewHandle) -> Option<EventSink> {
        self.sinks.write().await.remove(&view)
    }

    pub async fn views(&self) -> Vec<ViewHandle> {
        let mut views: Vec<_> = self.sinks.read().await.keys().copied().collect();
        views.sort();
        views
    }

    /// Deliver an envelope. Returns false when nobody listens on that view.
    pub async fn route(&self, envelope: NativeEnvelope) -> BridgeResult<bool> {
        let view = envelope.view;
        let sink = self.sinks.read().await.get(&view).cloned();

        let Some(sink) = sink else {
            warn!("Dropping {} for unregistered {}", envelope.event.name(), view);
            return Ok(false);
        };

        trace!("Routing {} to {}", envelope.event.name(), view);
        match sink.deliver_envelope(envelope) {
            Ok(()) => Ok(true),
            Err(BridgeError::Disconnected) => {
                warn!("Bridge for {} is gone; unregistering", view);
                self.sinks.write().await.remove(&view);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Parse a JSON envelope (`{"view": 7, "type": "onVideoInfo", ...}`) and
    /// route it
    pub async fn route_json(&self, json: &str) -> BridgeResult<bool> {
        let envelope = NativeEnvelope::from_json(json)?;
        self.route(envelope).await
    }
}
