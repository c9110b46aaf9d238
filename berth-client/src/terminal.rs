//! Local terminal handling for the shell command

use std::io::{self, Write};

use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};

use berth_client::session::TerminalSink;
use berth_utils::Result;

/// Puts the local terminal in raw mode until dropped
///
/// No alternate screen: remote output scrolls like a normal shell.
pub struct RawTerminal {
    _private: (),
}

impl RawTerminal {
    pub fn enable() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnableBracketedPaste)?;
        Ok(Self { _private: () })
    }

    fn restore() -> Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), DisableBracketedPaste)?;
        Ok(())
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(e) = Self::restore() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
    }
}

/// Writes remote shell output straight to stdout
///
/// The local terminal emulator interprets the escape sequences.
pub struct StdoutTerminal {
    out: io::Stdout,
}

impl StdoutTerminal {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl TerminalSink for StdoutTerminal {
    fn write(&mut self, bytes: &[u8]) {
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(bytes).and_then(|_| out.flush()) {
            tracing::warn!("Failed to write shell output: {}", e);
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        // The local emulator reflows on its own; the host has no resize channel
        tracing::debug!(cols, rows, "terminal resized");
    }
}
