//! Channel events and the connector seam

use berth_utils::Result;
use url::Url;

use super::channel::StreamChannel;
use super::endpoint::EndpointKey;

/// Event delivered by a [`StreamChannel`], in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Handshake completed; the channel accepts sends
    Opened,
    /// One inbound frame, text or binary
    Message(Vec<u8>),
    /// Transport failure; the channel is finished
    Errored(String),
    /// Orderly close by the remote side; the channel is finished
    Closed { reason: Option<String> },
}

impl ChannelEvent {
    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelEvent::Errored(_) | ChannelEvent::Closed { .. })
    }
}

/// Opens channels for endpoint keys
///
/// Session controllers depend on this rather than on sockets directly so
/// they can be driven by in-memory channels.
pub trait Connector: Send + Sync {
    fn open(&self, key: &EndpointKey) -> Result<StreamChannel>;
}

/// Connector for the container host's WebSocket endpoints
#[derive(Debug, Clone)]
pub struct WsConnector {
    base: Url,
}

impl WsConnector {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl Connector for WsConnector {
    fn open(&self, key: &EndpointKey) -> Result<StreamChannel> {
        let url = key.url(&self.base)?;
        Ok(StreamChannel::open(key.clone(), url))
    }
}
