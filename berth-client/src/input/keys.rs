//! Key events to xterm byte sequences
//!
//! The remote shell runs behind a real PTY on the host, so keys are sent as
//! the bytes an xterm would produce.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Bytes for `key`, or `None` if it produces no input (modifier-only keys,
/// media keys and the like)
pub fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    let mods = key.modifiers;
    let bytes = match key.code {
        KeyCode::Char(c) => encode_char(c, mods),
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Tab if mods.contains(KeyModifiers::SHIFT) => b"\x1b[Z".to_vec(),
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace if mods.contains(KeyModifiers::ALT) => vec![0x1b, 0x7f],
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => csi_letter('A', mods),
        KeyCode::Down => csi_letter('B', mods),
        KeyCode::Right => csi_letter('C', mods),
        KeyCode::Left => csi_letter('D', mods),
        KeyCode::Home => csi_letter('H', mods),
        KeyCode::End => csi_letter('F', mods),
        KeyCode::Insert => csi_tilde(2, mods),
        KeyCode::Delete => csi_tilde(3, mods),
        KeyCode::PageUp => csi_tilde(5, mods),
        KeyCode::PageDown => csi_tilde(6, mods),
        KeyCode::F(n) => function_key(n, mods)?,
        KeyCode::Null => vec![0],
        _ => return None,
    };
    Some(bytes)
}

fn encode_char(c: char, mods: KeyModifiers) -> Vec<u8> {
    let ctrl = mods.contains(KeyModifiers::CONTROL);
    let base = if ctrl { control_byte(c) } else { None };
    let mut bytes = match base {
        Some(b) => vec![b],
        None => c.to_string().into_bytes(),
    };
    // Alt is sent as an ESC prefix
    if mods.contains(KeyModifiers::ALT) {
        bytes.insert(0, 0x1b);
    }
    bytes
}

/// C0 control code for Ctrl+`c`
fn control_byte(c: char) -> Option<u8> {
    match c {
        'a'..='z' | 'A'..='Z' => Some(c.to_ascii_lowercase() as u8 - b'a' + 1),
        '@' | ' ' | '2' => Some(0x00),
        '[' | '3' => Some(0x1b),
        '\\' | '4' => Some(0x1c),
        ']' | '5' => Some(0x1d),
        '^' | '6' => Some(0x1e),
        '_' | '7' | '/' => Some(0x1f),
        '?' | '8' => Some(0x7f),
        _ => None,
    }
}

/// xterm modifier parameter: 1 + shift + 2*alt + 4*ctrl
fn modifier_param(mods: KeyModifiers) -> u8 {
    1 + u8::from(mods.contains(KeyModifiers::SHIFT))
        + 2 * u8::from(mods.contains(KeyModifiers::ALT))
        + 4 * u8::from(mods.contains(KeyModifiers::CONTROL))
}

fn has_modifiers(mods: KeyModifiers) -> bool {
    mods.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT | KeyModifiers::CONTROL)
}

fn csi_letter(letter: char, mods: KeyModifiers) -> Vec<u8> {
    if has_modifiers(mods) {
        format!("\x1b[1;{}{}", modifier_param(mods), letter).into_bytes()
    } else {
        format!("\x1b[{}", letter).into_bytes()
    }
}

fn csi_tilde(code: u8, mods: KeyModifiers) -> Vec<u8> {
    if has_modifiers(mods) {
        format!("\x1b[{};{}~", code, modifier_param(mods)).into_bytes()
    } else {
        format!("\x1b[{}~", code).into_bytes()
    }
}

fn function_key(n: u8, mods: KeyModifiers) -> Option<Vec<u8>> {
    // F1-F4 are SS3 letters; the rest are tilde codes with gaps
    let seq = match n {
        1..=4 => {
            let letter = (b'P' + n - 1) as char;
            if has_modifiers(mods) {
                format!("\x1b[1;{}{}", modifier_param(mods), letter).into_bytes()
            } else {
                format!("\x1bO{}", letter).into_bytes()
            }
        }
        5 => csi_tilde(15, mods),
        6..=10 => csi_tilde(n + 11, mods),
        11..=14 => csi_tilde(n + 12, mods),
        15 | 16 => csi_tilde(n + 13, mods),
        17..=20 => csi_tilde(n + 14, mods),
        _ => return None,
    };
    Some(seq)
}
