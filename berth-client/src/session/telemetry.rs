//! Resource telemetry session

use std::sync::Arc;

use berth_protocol::{decode_telemetry, TelemetryPoint, TelemetrySample};
use berth_utils::{BerthError, Result};

use super::history::SampleHistory;
use super::slot::ChannelSlot;
use crate::connection::{ChannelEvent, Connector, EndpointKey};
use crate::view::ViewScope;

/// Telemetry session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryState {
    Idle,
    Connecting,
    Streaming,
    Closed,
    Failed,
}

impl TelemetryState {
    pub fn is_finished(self) -> bool {
        matches!(self, TelemetryState::Closed | TelemetryState::Failed)
    }
}

/// What a channel event meant for the session
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Connected,
    Sample(TelemetrySample),
    /// A record could not be decoded and was skipped
    Dropped { reason: String },
    Failed(String),
    Closed,
}

/// Keeps the latest sample and a short history for one container
pub struct TelemetrySession {
    slot: ChannelSlot,
    scope: ViewScope,
    state: TelemetryState,
    current: Option<TelemetrySample>,
    history: SampleHistory,
    dropped_records: u64,
}

impl TelemetrySession {
    pub fn new(connector: Arc<dyn Connector>, scope: ViewScope, history_capacity: usize) -> Self {
        Self {
            slot: ChannelSlot::new(connector),
            scope,
            state: TelemetryState::Idle,
            current: None,
            history: SampleHistory::new(history_capacity),
            dropped_records: 0,
        }
    }

    pub fn state(&self) -> TelemetryState {
        self.state
    }

    pub fn current(&self) -> Option<&TelemetrySample> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Records skipped because they failed to decode
    pub fn dropped_records(&self) -> u64 {
        self.dropped_records
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Subscribe to the stats of `container_id`
    pub fn start(&mut self, container_id: &str) -> Result<()> {
        if self.scope.is_disposed() {
            return Err(BerthError::Stale);
        }
        let key = EndpointKey::telemetry(container_id)?;
        match self.slot.open(key) {
            Ok(true) => {
                tracing::info!(container = container_id, "starting telemetry session");
                self.state = TelemetryState::Connecting;
                self.current = None;
                self.history.clear();
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                self.state = TelemetryState::Failed;
                Err(e)
            }
        }
    }

    /// Apply one channel event
    pub fn handle_event(&mut self, event: ChannelEvent) -> TelemetryEvent {
        match event {
            ChannelEvent::Opened => {
                self.state = TelemetryState::Streaming;
                TelemetryEvent::Connected
            }
            ChannelEvent::Message(frame) => match decode_telemetry(&frame) {
                Ok(sample) => {
                    self.record(sample.clone());
                    TelemetryEvent::Sample(sample)
                }
                Err(e) => {
                    self.dropped_records += 1;
                    tracing::warn!(
                        error = %e,
                        dropped = self.dropped_records,
                        "dropping telemetry record"
                    );
                    TelemetryEvent::Dropped {
                        reason: e.to_string(),
                    }
                }
            },
            ChannelEvent::Errored(error) => {
                tracing::warn!(error = %error, "telemetry channel error");
                self.state = TelemetryState::Failed;
                TelemetryEvent::Failed(error)
            }
            ChannelEvent::Closed { reason } => {
                tracing::info!(?reason, "telemetry channel closed");
                self.state = TelemetryState::Closed;
                TelemetryEvent::Closed
            }
        }
    }

    fn record(&mut self, sample: TelemetrySample) {
        self.history.push(TelemetryPoint::now(&sample));
        self.current = Some(sample);
    }

    /// Wait for the next channel event and apply it
    ///
    /// Returns `None` once the channel is finished or the view is disposed;
    /// disposal stops the session.
    pub async fn next_event(&mut self) -> Option<TelemetryEvent> {
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
        event.map(|event| self.handle_event(event))
    }

    /// Close the channel; returns `true` only for the call that closed it
    pub fn stop(&mut self) -> bool {
        let closed = self.slot.close();
        if closed {
            tracing::debug!("telemetry session stopped");
            if !self.state.is_finished() {
                self.state = TelemetryState::Closed;
            }
        }
        closed
    }

    /// One-line usage summary of the current sample
    pub fn summary(&self) -> Option<String> {
        self.current.as_ref().map(|s| {
            format!(
                "CPU {:.2}% | MEM {} / {} ({:.2}%) | NET rx {} tx {}",
                s.cpu_percent,
                format_bytes(s.memory_used_bytes),
                format_bytes(s.memory_limit_bytes),
                s.memory_percent,
                format_bytes(s.network_rx_bytes),
                format_bytes(s.network_tx_bytes),
            )
        })
    }
}

impl Drop for TelemetrySession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Human-readable size in base-1024 units, at most two decimals
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut text = format!("{:.2}", value);
    if text.contains('.') {
        text = text.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{} {}", text, UNITS[unit])
}
