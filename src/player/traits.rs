use anyhow::Result;
use async_trait::async_trait;

use super::protocol::{NativeCommand, NativeProps};
use super::types::ViewHandle;

/// The platform engine that does the actual decoding, trimming and frame
/// extraction. Commands are fire-and-forget: results come back later as
/// `NativeEvent`s through the `EventSink` of the addressed view.
#[async_trait]
pub trait NativeEngine: Send + Sync {
    async fn dispatch(&self, view: ViewHandle, command: NativeCommand) -> Result<()>;
    async fn apply_props(&self, view: ViewHandle, props: &NativeProps) -> Result<()>;
}
