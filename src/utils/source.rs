use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use super::errors::{BridgeError, BridgeResult};

/// Schemes streamed by the engine over the network
const REMOTE_SCHEMES: &[&str] = &["http", "https", "rtsp", "rtmp"];

/// Schemes pointing into a platform media library
const ASSET_SCHEMES: &[&str] = &["content", "ph", "assets-library", "asset"];

/// A source string after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    Local(PathBuf),
    Remote(Url),
    Asset(Url),
}

/// What the native engine receives in place of the raw source string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub uri: String,
    pub is_network: bool,
    pub is_asset: bool,
}

impl ResolvedSource {
    pub fn uri(&self) -> String {
        match self {
            ResolvedSource::Local(path) => Url::from_file_path(path)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| path.display().to_string()),
            ResolvedSource::Remote(url) | ResolvedSource::Asset(url) => url.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ResolvedSource::Remote(_))
    }

    pub fn is_asset(&self) -> bool {
        matches!(self, ResolvedSource::Asset(_))
    }

    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            uri: self.uri(),
            is_network: self.is_network(),
            is_asset: self.is_asset(),
        }
    }
}

/// Classify a source string. An empty (or blank) source resolves to `None`.
pub fn resolve_source(source: &str) -> BridgeResult<Option<ResolvedSource>> {
    let source = source.trim();
    if source.is_empty() {
        return Ok(None);
    }

    let resolved = match Url::parse(source) {
        // Drive letters parse as one-character schemes
        Ok(url) if url.scheme().len() == 1 => ResolvedSource::Local(PathBuf::from(source)),
        Ok(url) => classify(url)?,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            ResolvedSource::Local(PathBuf::from(source))
        }
        Err(e) => return Err(BridgeError::InvalidSource(format!("{source}: {e}"))),
    };

    trace!("Resolved source {} as {:?}", source, resolved);
    Ok(Some(resolved))
}

fn classify(url: Url) -> BridgeResult<ResolvedSource> {
    let scheme = url.scheme();
    if scheme == "file" {
        return url
            .to_file_path()
            .map(ResolvedSource::Local)
            .map_err(|_| BridgeError::InvalidSource(format!("{url}: not a local file path")));
    }
    if REMOTE_SCHEMES.contains(&scheme) {
        return Ok(ResolvedSource::Remote(url));
    }
    if ASSET_SCHEMES.contains(&scheme) {
        return Ok(ResolvedSource::Asset(url));
    }
    Err(BridgeError::InvalidSource(format!(
        "unsupported scheme '{scheme}' in {url}"
    )))
}
