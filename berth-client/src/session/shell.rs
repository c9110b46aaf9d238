//! Interactive shell session

use std::sync::Arc;

use berth_utils::{BerthError, Result};

use super::slot::ChannelSlot;
use crate::connection::{ChannelEvent, Connector, EndpointKey};
use crate::view::ViewScope;

/// Written to the terminal when the channel fails
pub const CONNECTION_ERROR_NOTICE: &str =
    "\r\n\x1b[31mConnection error. Please check if container is running.\x1b[0m\r\n";

/// Written to the terminal when the remote side closes the channel
pub const CONNECTION_CLOSED_NOTICE: &str = "\r\n\x1b[33mConnection closed.\x1b[0m\r\n";

/// Terminal-rendering collaborator
///
/// Receives remote output verbatim; escape sequences are interpreted by
/// whatever renders the terminal, not here.
pub trait TerminalSink: Send {
    fn write(&mut self, bytes: &[u8]);

    /// Terminal dimensions changed
    fn resize(&mut self, _cols: u16, _rows: u16) {}
}

/// Shell session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Idle,
    Connecting,
    Interactive,
    Closed,
    Failed,
}

impl ShellState {
    pub fn is_finished(self) -> bool {
        matches!(self, ShellState::Closed | ShellState::Failed)
    }
}

/// Bridges one container shell channel into a terminal
pub struct ShellSession<T: TerminalSink> {
    slot: ChannelSlot,
    scope: ViewScope,
    sink: T,
    state: ShellState,
}

impl<T: TerminalSink> ShellSession<T> {
    pub fn new(connector: Arc<dyn Connector>, scope: ViewScope, sink: T) -> Self {
        Self {
            slot: ChannelSlot::new(connector),
            scope,
            sink,
            state: ShellState::Idle,
        }
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut T {
        &mut self.sink
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Open the shell of `container_id`
    ///
    /// No-op while a channel to the same container is live; a channel to a
    /// different container is stopped first.
    pub fn start(&mut self, container_id: &str) -> Result<()> {
        if self.scope.is_disposed() {
            return Err(BerthError::Stale);
        }
        let key = EndpointKey::shell(container_id)?;
        match self.slot.open(key) {
            Ok(true) => {
                tracing::info!(container = container_id, "starting shell session");
                self.state = ShellState::Connecting;
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                self.state = ShellState::Failed;
                Err(e)
            }
        }
    }

    /// Send one input event; dropped unless the session is interactive
    pub fn input(&self, data: &str) -> bool {
        if self.state != ShellState::Interactive {
            return false;
        }
        self.slot.send(data)
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.sink.resize(cols, rows);
    }

    /// Apply one channel event to the session
    pub fn handle_event(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                self.state = ShellState::Interactive;
            }
            ChannelEvent::Message(bytes) => {
                self.sink.write(bytes);
            }
            ChannelEvent::Errored(error) => {
                tracing::warn!(
                    error = %error,
                    endpoint = ?self.slot.endpoint(),
                    "shell channel error"
                );
                self.sink.write(CONNECTION_ERROR_NOTICE.as_bytes());
                self.state = ShellState::Failed;
            }
            ChannelEvent::Closed { reason } => {
                tracing::info!(?reason, "shell channel closed");
                self.sink.write(CONNECTION_CLOSED_NOTICE.as_bytes());
                self.state = ShellState::Closed;
            }
        }
    }

    /// Wait for the next channel event and apply it
    ///
    /// Returns `None` once the channel is finished or the view is disposed;
    /// disposal stops the session.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        let token = self.scope.token();
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            event = self.slot.next_event() => event,
        };

        if self.scope.is_disposed() {
            self.stop();
            return None;
        }
        let event = event?;
        self.handle_event(&event);
        Some(event)
    }

    /// Close the channel; returns `true` only for the call that closed it
    pub fn stop(&mut self) -> bool {
        let closed = self.slot.close();
        if closed {
            tracing::debug!("shell session stopped");
            if !self.state.is_finished() {
                self.state = ShellState::Closed;
            }
        }
        closed
    }
}

impl<T: TerminalSink> Drop for ShellSession<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
