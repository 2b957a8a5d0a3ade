pub mod errors;
pub mod source;

pub use errors::{BridgeError, BridgeResult};
pub use source::{ResolvedSource, resolve_source};
