//! Session controllers
//!
//! A session owns the stream channel of one mounted view and adapts its raw
//! events into view state: bytes for the shell, decoded samples for
//! telemetry. Sessions never reconnect; a failed or closed session stays
//! that way until the view starts it again.

mod history;
mod shell;
mod slot;
mod telemetry;

pub use history::{SampleHistory, DEFAULT_HISTORY_CAPACITY};
pub use shell::{
    ShellSession, ShellState, TerminalSink, CONNECTION_CLOSED_NOTICE, CONNECTION_ERROR_NOTICE,
};
pub use telemetry::{format_bytes, TelemetryEvent, TelemetrySession, TelemetryState};
