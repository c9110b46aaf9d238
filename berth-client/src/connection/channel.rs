//! Persistent WebSocket channel to one endpoint

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::endpoint::EndpointKey;
use super::handler::ChannelEvent;

/// Channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
    Failed,
}

impl ChannelState {
    /// Closed and Failed are final: channels never reconnect
    pub fn is_terminal(self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Failed)
    }
}

/// Commands from the channel handle to its background task
#[derive(Debug)]
pub(crate) enum Outgoing {
    Payload(String),
    Close,
}

/// Client side of one stream
///
/// Events are delivered in wire order to the single owner through
/// [`next_event`](Self::next_event). Dropping the channel closes it.
#[derive(Debug)]
pub struct StreamChannel {
    endpoint: EndpointKey,
    state: watch::Receiver<ChannelState>,
    tx: mpsc::UnboundedSender<Outgoing>,
    rx: mpsc::UnboundedReceiver<ChannelEvent>,
    closed: bool,
}

impl StreamChannel {
    /// Start connecting to `url` in the background
    ///
    /// Returns immediately in the `Connecting` state; the outcome of the
    /// handshake arrives as `Opened` or `Errored`. Must be called from
    /// within a tokio runtime.
    pub fn open(endpoint: EndpointKey, url: Url) -> Self {
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        tracing::debug!(endpoint = %endpoint, url = %url, "opening stream channel");
        tokio::spawn(connection_task(
            endpoint.clone(),
            url,
            state_tx,
            outgoing_rx,
            incoming_tx,
        ));

        Self::from_parts(endpoint, state_rx, outgoing_tx, incoming_rx)
    }

    pub(crate) fn from_parts(
        endpoint: EndpointKey,
        state: watch::Receiver<ChannelState>,
        tx: mpsc::UnboundedSender<Outgoing>,
        rx: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> Self {
        Self {
            endpoint,
            state,
            tx,
            rx,
            closed: false,
        }
    }

    pub fn endpoint(&self) -> &EndpointKey {
        &self.endpoint
    }

    pub fn state(&self) -> ChannelState {
        let state = *self.state.borrow();
        if self.closed && !state.is_terminal() {
            ChannelState::Closed
        } else {
            state
        }
    }

    /// Whether the channel may still carry traffic
    pub fn is_live(&self) -> bool {
        !self.state().is_terminal()
    }

    /// Send a text payload
    ///
    /// Payloads sent while the channel is not `Open` are dropped, not
    /// queued; returns whether the payload was handed to the transport.
    pub fn send(&self, payload: impl Into<String>) -> bool {
        if self.state() != ChannelState::Open {
            tracing::debug!(
                endpoint = %self.endpoint,
                state = ?self.state(),
                "dropping payload on channel that is not open"
            );
            return false;
        }
        self.tx.send(Outgoing::Payload(payload.into())).is_ok()
    }

    /// Next event in wire order; `None` once the channel is finished
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Close the channel; returns `true` only for the call that closed it
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        tracing::debug!(endpoint = %self.endpoint, "closing stream channel");
        let _ = self.tx.send(Outgoing::Close);
        true
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Wait until the handle asks to close (or goes away)
async fn close_requested(outgoing: &mut mpsc::UnboundedReceiver<Outgoing>) {
    loop {
        match outgoing.recv().await {
            Some(Outgoing::Payload(_)) => continue,
            Some(Outgoing::Close) | None => return,
        }
    }
}

/// Background task that owns the socket
async fn connection_task(
    endpoint: EndpointKey,
    url: Url,
    state: watch::Sender<ChannelState>,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    incoming: mpsc::UnboundedSender<ChannelEvent>,
) {
    let connected = tokio::select! {
        result = connect_async(url.as_str()) => Some(result),
        _ = close_requested(&mut outgoing) => None,
    };

    let ws = match connected {
        Some(Ok((ws, _response))) => ws,
        Some(Err(e)) => {
            tracing::warn!(endpoint = %endpoint, error = %e, "stream channel failed to connect");
            state.send_replace(ChannelState::Failed);
            let _ = incoming.send(ChannelEvent::Errored(e.to_string()));
            return;
        }
        None => {
            tracing::debug!(endpoint = %endpoint, "closed before connecting");
            state.send_replace(ChannelState::Closed);
            return;
        }
    };

    state.send_replace(ChannelState::Open);
    tracing::info!(endpoint = %endpoint, "stream channel open");
    let _ = incoming.send(ChannelEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            command = outgoing.recv() => match command {
                Some(Outgoing::Payload(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(
                            endpoint = %endpoint,
                            error = %e,
                            "failed to send on stream channel"
                        );
                        state.send_replace(ChannelState::Failed);
                        let _ = incoming.send(ChannelEvent::Errored(e.to_string()));
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    if let Err(e) = sink.close().await {
                        tracing::debug!(endpoint = %endpoint, error = %e, "error closing socket");
                    }
                    state.send_replace(ChannelState::Closed);
                    break;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = incoming.send(ChannelEvent::Message(text.into_bytes()));
                }
                Some(Ok(Message::Binary(data))) => {
                    let _ = incoming.send(ChannelEvent::Message(data));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty());
                    tracing::info!(endpoint = %endpoint, ?reason, "server closed stream channel");
                    state.send_replace(ChannelState::Closed);
                    let _ = incoming.send(ChannelEvent::Closed { reason });
                    break;
                }
                // Ping/pong is answered by the transport
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "stream channel error");
                    state.send_replace(ChannelState::Failed);
                    let _ = incoming.send(ChannelEvent::Errored(e.to_string()));
                    break;
                }
                None => {
                    tracing::info!(endpoint = %endpoint, "stream ended");
                    state.send_replace(ChannelState::Closed);
                    let _ = incoming.send(ChannelEvent::Closed { reason: None });
                    break;
                }
            },
        }
    }
}
