//! Local terminal input for the remote shell

mod keys;

pub use keys::encode_key;

use berth_utils::{BerthError, Result};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Default chord that leaves the shell view
pub const DEFAULT_DETACH_KEY: &str = "Ctrl-]";

/// Result of processing one terminal event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    None,
    /// Send as one input event to the shell
    Send(String),
    Resize { cols: u16, rows: u16 },
    /// Leave the shell view
    Detach,
}

/// Maps local terminal events to shell actions
#[derive(Debug, Clone)]
pub struct ShellInput {
    detach: KeyEvent,
}

impl Default for ShellInput {
    fn default() -> Self {
        Self {
            detach: KeyEvent::new(KeyCode::Char(']'), KeyModifiers::CONTROL),
        }
    }
}

impl ShellInput {
    pub fn new(detach: KeyEvent) -> Self {
        Self { detach }
    }

    /// Use the chord described by `binding` (e.g. `Ctrl-]`) to detach
    pub fn with_binding(binding: &str) -> Result<Self> {
        parse_binding(binding).map(Self::new)
    }

    pub fn handle_event(&self, event: Event) -> InputAction {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if same_chord(&key, &self.detach) {
                    return InputAction::Detach;
                }
                match encode_key(&key) {
                    Some(bytes) => InputAction::Send(String::from_utf8_lossy(&bytes).into_owned()),
                    None => InputAction::None,
                }
            }
            // Bracketed paste arrives whole and is sent as one event
            Event::Paste(text) => InputAction::Send(text),
            Event::Resize(cols, rows) => InputAction::Resize { cols, rows },
            _ => InputAction::None,
        }
    }
}

/// Terminals report Ctrl+\ ] ^ _ as Ctrl+4..7
fn normalize(key: &KeyEvent) -> (KeyCode, KeyModifiers) {
    let mods = key.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
    let code = match key.code {
        KeyCode::Char(c) if mods.contains(KeyModifiers::CONTROL) => KeyCode::Char(match c {
            '4' => '\\',
            '5' => ']',
            '6' => '^',
            '7' => '_',
            c => c.to_ascii_lowercase(),
        }),
        code => code,
    };
    (code, mods)
}

fn same_chord(a: &KeyEvent, b: &KeyEvent) -> bool {
    normalize(a) == normalize(b)
}

/// Parse a key binding such as `Ctrl-]`, `Ctrl+Alt-q`, `F12` or `Esc`
pub fn parse_binding(binding: &str) -> Result<KeyEvent> {
    let binding = binding.trim();
    let invalid = || BerthError::config(format!("invalid key binding '{}'", binding));

    // The final token is the key; it may itself be '-' or '+'
    let (prefix, key) = match binding.char_indices().rev().nth(1) {
        Some((i, sep)) if sep == '-' || sep == '+' => (&binding[..i], &binding[i + 1..]),
        _ => match binding.rfind(['-', '+']) {
            Some(i) if i + 1 < binding.len() => (&binding[..i], &binding[i + 1..]),
            _ => ("", binding),
        },
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in prefix.split(['-', '+']).filter(|p| !p.is_empty()) {
        modifiers |= match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "c" => KeyModifiers::CONTROL,
            "alt" | "meta" | "m" => KeyModifiers::ALT,
            "shift" | "s" => KeyModifiers::SHIFT,
            _ => return Err(invalid()),
        };
    }

    let code = match key.to_ascii_lowercase().as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "space" => KeyCode::Char(' '),
        "backspace" => KeyCode::Backspace,
        lower if lower.len() > 1 && lower.starts_with('f') => {
            let n: u8 = lower[1..].parse().map_err(|_| invalid())?;
            KeyCode::F(n)
        }
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return Err(invalid()),
            }
        }
    };

    Ok(KeyEvent::new(code, modifiers))
}
