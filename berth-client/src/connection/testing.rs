//! In-memory channels for driving session controllers in tests

use std::collections::VecDeque;

use berth_utils::Result;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use super::channel::{ChannelState, Outgoing, StreamChannel};
use super::endpoint::EndpointKey;
use super::handler::{ChannelEvent, Connector};

/// Remote end of an in-memory channel
pub(crate) struct ChannelPeer {
    state: watch::Sender<ChannelState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    outgoing: mpsc::UnboundedReceiver<Outgoing>,
    sent: Vec<String>,
    close_requests: usize,
}

impl ChannelPeer {
    pub(crate) fn open(&self) {
        self.state.send_replace(ChannelState::Open);
        let _ = self.events.send(ChannelEvent::Opened);
    }

    pub(crate) fn push(&self, bytes: impl Into<Vec<u8>>) {
        let _ = self.events.send(ChannelEvent::Message(bytes.into()));
    }

    pub(crate) fn fail(&self, error: &str) {
        self.state.send_replace(ChannelState::Failed);
        let _ = self.events.send(ChannelEvent::Errored(error.to_string()));
    }

    pub(crate) fn close(&self, reason: Option<&str>) {
        self.state.send_replace(ChannelState::Closed);
        let _ = self.events.send(ChannelEvent::Closed {
            reason: reason.map(str::to_string),
        });
    }

    fn drain(&mut self) {
        while let Ok(command) = self.outgoing.try_recv() {
            match command {
                Outgoing::Payload(text) => self.sent.push(text),
                Outgoing::Close => self.close_requests += 1,
            }
        }
    }

    /// Payloads the client handed to the transport, in order
    pub(crate) fn sent(&mut self) -> Vec<String> {
        self.drain();
        self.sent.clone()
    }

    pub(crate) fn close_requests(&mut self) -> usize {
        self.drain();
        self.close_requests
    }
}

pub(crate) fn channel_pair(endpoint: EndpointKey) -> (StreamChannel, ChannelPeer) {
    let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
    let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
    let channel = StreamChannel::from_parts(endpoint, state_rx, outgoing_tx, incoming_rx);
    let peer = ChannelPeer {
        state: state_tx,
        events: incoming_tx,
        outgoing: outgoing_rx,
        sent: Vec::new(),
        close_requests: 0,
    };
    (channel, peer)
}

/// Connector handing out in-memory channels
#[derive(Default)]
pub(crate) struct FakeConnector {
    opened: Mutex<Vec<EndpointKey>>,
    peers: Mutex<VecDeque<ChannelPeer>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Keys opened so far, in order
    pub(crate) fn opened(&self) -> Vec<EndpointKey> {
        self.opened.lock().clone()
    }

    /// Peer of the oldest channel not yet claimed
    pub(crate) fn take_peer(&self) -> ChannelPeer {
        self.peers
            .lock()
            .pop_front()
            .expect("no channel was opened")
    }
}

impl Connector for FakeConnector {
    fn open(&self, key: &EndpointKey) -> Result<StreamChannel> {
        let (channel, peer) = channel_pair(key.clone());
        self.opened.lock().push(key.clone());
        self.peers.lock().push_back(peer);
        Ok(channel)
    }
}
