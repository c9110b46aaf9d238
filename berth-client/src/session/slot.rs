use std::sync::Arc;

use berth_utils::Result;

use crate::connection::{ChannelEvent, Connector, EndpointKey, StreamChannel};

/// Holder for the single channel a session may have open
pub(crate) struct ChannelSlot {
    connector: Arc<dyn Connector>,
    channel: Option<StreamChannel>,
}

impl ChannelSlot {
    pub(crate) fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            channel: None,
        }
    }

    /// Open a channel for `key`
    ///
    /// A live channel for the same key is kept and `false` is returned; any
    /// other channel is closed before the new one is opened.
    pub(crate) fn open(&mut self, key: EndpointKey) -> Result<bool> {
        if let Some(channel) = &self.channel {
            if channel.endpoint() == &key && channel.is_live() {
                tracing::debug!(endpoint = %key, "channel already live, not reopening");
                return Ok(false);
            }
        }
        self.close();
        self.channel = Some(self.connector.open(&key)?);
        Ok(true)
    }

    /// Close the current channel; `false` if there was nothing to close
    pub(crate) fn close(&mut self) -> bool {
        match self.channel.take() {
            Some(mut channel) => channel.close(),
            None => false,
        }
    }

    pub(crate) fn send(&self, payload: &str) -> bool {
        match &self.channel {
            Some(channel) => channel.send(payload),
            None => false,
        }
    }

    pub(crate) async fn next_event(&mut self) -> Option<ChannelEvent> {
        match self.channel.as_mut() {
            Some(channel) => channel.next_event().await,
            None => None,
        }
    }

    pub(crate) fn endpoint(&self) -> Option<&EndpointKey> {
        self.channel.as_ref().map(StreamChannel::endpoint)
    }
}
