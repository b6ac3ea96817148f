//! Key input capture
//!
//! Translates platform key events into [`KeyCode`]s for the simulator:
//!
//! - an OS-level listener built on rdev, which sees real press and release
//!   events regardless of terminal limitations,
//! - a mapping for crossterm key events, used when the OS listener is not
//!   available,
//! - [`HoldTimer`], which releases terminal keys that stop repeating, since
//!   most terminals never report key releases.

use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{KeyCode as TermKey, ModifierKeyCode};
use rdev::{listen, Event, EventType, Key};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::legend::KeyCode;

/// Keyboard events from the OS-level listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsKeyEvent {
    /// A key was pressed
    Press(KeyCode),
    /// A key was released
    Release(KeyCode),
}

/// OS-level keyboard listener that captures key press and release events
pub struct OsKeyboardListener {
    /// Channel receiver for keyboard events
    event_rx: Receiver<OsKeyEvent>,
    /// Shutdown flag
    shutdown: Arc<AtomicBool>,
    /// Listener thread handle
    _thread: JoinHandle<()>,
}

impl OsKeyboardListener {
    /// Start the OS keyboard listener
    ///
    /// Returns None if the listener couldn't be started (e.g., on systems without X11)
    pub fn new() -> Option<Self> {
        if !is_available() {
            return None;
        }

        let (tx, rx) = unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = thread::spawn(move || {
            run_listener(tx, shutdown_clone);
        });

        // Give the thread a moment to start
        thread::sleep(Duration::from_millis(100));

        Some(Self {
            event_rx: rx,
            shutdown,
            _thread: thread,
        })
    }

    /// Try to receive a keyboard event (non-blocking)
    pub fn try_recv(&self) -> Option<OsKeyEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl Drop for OsKeyboardListener {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

/// Map an rdev physical key to a browser key code (US positions)
pub fn os_key_code(key: Key) -> Option<KeyCode> {
    let code = match key {
        Key::Backspace => 8,
        Key::Tab => 9,
        Key::Return | Key::KpReturn => 13,
        Key::ShiftLeft | Key::ShiftRight => 16,
        Key::ControlLeft | Key::ControlRight => 17,
        Key::Alt | Key::AltGr => 18,
        Key::Pause => 19,
        Key::CapsLock => 20,
        Key::Escape => 27,
        Key::Space => 32,
        Key::PageUp => 33,
        Key::PageDown => 34,
        Key::End => 35,
        Key::Home => 36,
        Key::LeftArrow => 37,
        Key::UpArrow => 38,
        Key::RightArrow => 39,
        Key::DownArrow => 40,
        Key::PrintScreen => 44,
        Key::Insert => 45,
        Key::Delete => 46,
        Key::Num0 => 48,
        Key::Num1 => 49,
        Key::Num2 => 50,
        Key::Num3 => 51,
        Key::Num4 => 52,
        Key::Num5 => 53,
        Key::Num6 => 54,
        Key::Num7 => 55,
        Key::Num8 => 56,
        Key::Num9 => 57,
        Key::KeyA => 65,
        Key::KeyB => 66,
        Key::KeyC => 67,
        Key::KeyD => 68,
        Key::KeyE => 69,
        Key::KeyF => 70,
        Key::KeyG => 71,
        Key::KeyH => 72,
        Key::KeyI => 73,
        Key::KeyJ => 74,
        Key::KeyK => 75,
        Key::KeyL => 76,
        Key::KeyM => 77,
        Key::KeyN => 78,
        Key::KeyO => 79,
        Key::KeyP => 80,
        Key::KeyQ => 81,
        Key::KeyR => 82,
        Key::KeyS => 83,
        Key::KeyT => 84,
        Key::KeyU => 85,
        Key::KeyV => 86,
        Key::KeyW => 87,
        Key::KeyX => 88,
        Key::KeyY => 89,
        Key::KeyZ => 90,
        Key::MetaLeft => 91,
        Key::MetaRight => 92,
        Key::Kp0 => 96,
        Key::Kp1 => 97,
        Key::Kp2 => 98,
        Key::Kp3 => 99,
        Key::Kp4 => 100,
        Key::Kp5 => 101,
        Key::Kp6 => 102,
        Key::Kp7 => 103,
        Key::Kp8 => 104,
        Key::Kp9 => 105,
        Key::KpMultiply => 106,
        Key::KpPlus => 107,
        Key::KpMinus => 109,
        Key::KpDelete => 110,
        Key::KpDivide => 111,
        Key::F1 => 112,
        Key::F2 => 113,
        Key::F3 => 114,
        Key::F4 => 115,
        Key::F5 => 116,
        Key::F6 => 117,
        Key::F7 => 118,
        Key::F8 => 119,
        Key::F9 => 120,
        Key::F10 => 121,
        Key::F11 => 122,
        Key::F12 => 123,
        Key::NumLock => 144,
        Key::ScrollLock => 145,
        Key::SemiColon => 186,
        Key::Equal => 187,
        Key::Comma => 188,
        Key::Minus => 189,
        Key::Dot => 190,
        Key::Slash => 191,
        Key::BackQuote => 192,
        Key::LeftBracket => 219,
        Key::BackSlash | Key::IntlBackslash => 220,
        Key::RightBracket => 221,
        Key::Quote => 222,
        _ => return None,
    };
    Some(KeyCode(code))
}

/// Map a crossterm key to a browser key code.
///
/// Shifted characters map to the key that types them on a US layout.
pub fn terminal_key_code(key: TermKey) -> Option<KeyCode> {
    let code = match key {
        TermKey::Backspace => 8,
        TermKey::Tab | TermKey::BackTab => 9,
        TermKey::Enter => 13,
        TermKey::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift) => 16,
        TermKey::Modifier(ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl) => 17,
        TermKey::Modifier(ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt) => 18,
        TermKey::Modifier(ModifierKeyCode::LeftSuper) => 91,
        TermKey::Modifier(ModifierKeyCode::RightSuper) => 92,
        TermKey::Pause => 19,
        TermKey::CapsLock => 20,
        TermKey::Esc => 27,
        TermKey::PageUp => 33,
        TermKey::PageDown => 34,
        TermKey::End => 35,
        TermKey::Home => 36,
        TermKey::Left => 37,
        TermKey::Up => 38,
        TermKey::Right => 39,
        TermKey::Down => 40,
        TermKey::PrintScreen => 44,
        TermKey::Insert => 45,
        TermKey::Delete => 46,
        TermKey::Menu => 93,
        TermKey::F(n @ 1..=12) => 111 + n as u32,
        TermKey::NumLock => 144,
        TermKey::ScrollLock => 145,
        TermKey::Char(c) => return char_key_code(c),
        _ => return None,
    };
    Some(KeyCode(code))
}

/// Key code of the US-layout key that types `c`
pub fn char_key_code(c: char) -> Option<KeyCode> {
    let code = match c {
        'a'..='z' => c as u32 - 'a' as u32 + 65,
        'A'..='Z' => c as u32 - 'A' as u32 + 65,
        '0'..='9' => c as u32 - '0' as u32 + 48,
        ' ' => 32,
        ')' => 48,
        '!' => 49,
        '@' => 50,
        '#' => 51,
        '$' => 52,
        '%' => 53,
        '^' => 54,
        '&' => 55,
        '*' => 56,
        '(' => 57,
        ';' | ':' => 186,
        '=' | '+' => 187,
        ',' | '<' => 188,
        '-' | '_' => 189,
        '.' | '>' => 190,
        '/' | '?' => 191,
        '`' | '~' => 192,
        '[' | '{' => 219,
        '\\' | '|' => 220,
        ']' | '}' => 221,
        '\'' | '"' => 222,
        _ => return None,
    };
    Some(KeyCode(code))
}

/// Run the rdev listener (blocking - runs in its own thread)
fn run_listener(tx: Sender<OsKeyEvent>, shutdown: Arc<AtomicBool>) {
    let callback = move |event: Event| {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }

        match event.event_type {
            EventType::KeyPress(key) => {
                if let Some(code) = os_key_code(key) {
                    let _ = tx.send(OsKeyEvent::Press(code));
                }
            }
            EventType::KeyRelease(key) => {
                if let Some(code) = os_key_code(key) {
                    let _ = tx.send(OsKeyEvent::Release(code));
                }
            }
            _ => {}
        }
    };

    // This blocks until an error occurs
    if let Err(e) = listen(callback) {
        log::error!("OS keyboard listener error: {:?}", e);
    }
}

/// Check if the OS keyboard listener is likely to work on this system
pub fn is_available() -> bool {
    // On Linux, rdev requires X11 or Wayland
    #[cfg(target_os = "linux")]
    {
        std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
    }

    #[cfg(not(target_os = "linux"))]
    {
        true
    }
}

/// Synthesises releases for terminal keys that stopped repeating
#[derive(Debug, Clone)]
pub struct HoldTimer {
    timeout: Duration,
    last_seen: HashMap<KeyCode, Instant>,
}

impl HoldTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: HashMap::new(),
        }
    }

    /// Record a press or repeat of `code` at `now`
    pub fn touch(&mut self, code: KeyCode, now: Instant) {
        self.last_seen.insert(code, now);
    }

    /// Forget `code` (it was released some other way)
    pub fn forget(&mut self, code: KeyCode) {
        self.last_seen.remove(&code);
    }

    pub fn clear(&mut self) {
        self.last_seen.clear();
    }

    /// Codes not touched within the timeout, removed from tracking
    pub fn expired(&mut self, now: Instant) -> Vec<KeyCode> {
        let timeout = self.timeout;
        let mut expired: Vec<KeyCode> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.saturating_duration_since(**seen) > timeout)
            .map(|(&code, _)| code)
            .collect();
        expired.sort();

        for code in &expired {
            self.last_seen.remove(code);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_key_codes() {
        assert_eq!(os_key_code(Key::KeyQ), Some(KeyCode(81)));
        assert_eq!(os_key_code(Key::ShiftLeft), os_key_code(Key::ShiftRight));
        assert_eq!(os_key_code(Key::Return), Some(KeyCode(13)));
        assert_eq!(os_key_code(Key::Kp7), Some(KeyCode(103)));
        assert_eq!(os_key_code(Key::Function), None);
    }

    #[test]
    fn test_terminal_key_codes() {
        assert_eq!(terminal_key_code(TermKey::Char('q')), Some(KeyCode(81)));
        assert_eq!(terminal_key_code(TermKey::Char('Q')), Some(KeyCode(81)));
        assert_eq!(terminal_key_code(TermKey::Char('!')), Some(KeyCode(49)));
        assert_eq!(terminal_key_code(TermKey::F(5)), Some(KeyCode(116)));
        assert_eq!(terminal_key_code(TermKey::F(13)), None);
        assert_eq!(terminal_key_code(TermKey::Enter), Some(KeyCode(13)));
        assert_eq!(terminal_key_code(TermKey::Char('é')), None);
    }

    #[test]
    fn test_hold_timer_expires_untouched_keys() {
        let start = Instant::now();
        let mut timer = HoldTimer::new(Duration::from_millis(400));
        timer.touch(KeyCode(81), start);
        timer.touch(KeyCode(87), start);

        // W keeps repeating
        timer.touch(KeyCode(87), start + Duration::from_millis(300));
        assert!(timer.expired(start + Duration::from_millis(350)).is_empty());

        let expired = timer.expired(start + Duration::from_millis(500));
        assert_eq!(expired, vec![KeyCode(81)]);
        // Removed once reported
        assert!(timer.expired(start + Duration::from_millis(500)).is_empty());

        timer.forget(KeyCode(87));
        assert!(timer.expired(start + Duration::from_secs(5)).is_empty());
    }
}
