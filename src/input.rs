use crate::machine::{Chip8, Machine};
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

/// left-hand side of a qwerty keyboard onto the hex keypad
///
///   1 2 3 4        1 2 3 C
///   q w e r   =>   4 5 6 D
///   a s d f        7 8 9 E
///   z x c v        A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// how key labels become machine input codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keymap {
    /// lowercased code point of the label's first character; the machine
    /// decides what it means
    #[default]
    Passthrough,
    /// keypad line 0x0..0xF from the conventional layout; other keys dropped
    Conventional,
}

/// Turns host key notifications into set/clear calls on the machine.
#[derive(Debug, Clone)]
pub struct InputMapper {
    keymap: Keymap,
    table: HashMap<char, u8>,
}

impl InputMapper {
    pub fn new(keymap: Keymap) -> Self {
        InputMapper {
            keymap,
            table: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
        }
    }

    pub fn keymap(&self) -> Keymap {
        self.keymap
    }

    /// machine code for a key label, if it has one
    pub fn code_for(&self, label: &str) -> Option<u32> {
        let c = label.chars().next()?.to_lowercase().next()?;
        match self.keymap {
            Keymap::Passthrough => Some(c as u32),
            Keymap::Conventional => {
                // "a" maps, "ArrowLeft" doesn't
                if label.chars().count() != 1 {
                    return None;
                }
                self.table.get(&c).map(|&line| line as u32)
            }
        }
    }

    /// forward a key press; returns the code sent, if any
    pub fn key_down<M: Machine>(&self, label: &str, chip8: &mut Chip8<M>) -> Option<u32> {
        let code = self.lookup(label)?;
        chip8.set_key_down(code);
        Some(code)
    }

    /// forward a key release; returns the code sent, if any
    pub fn key_up<M: Machine>(&self, label: &str, chip8: &mut Chip8<M>) -> Option<u32> {
        let code = self.lookup(label)?;
        chip8.set_key_up(code);
        Some(code)
    }

    fn lookup(&self, label: &str) -> Option<u32> {
        let code = self.code_for(label);
        match code {
            Some(code) => debug!("key {:?} -> {}", label, code),
            None if !label.is_empty() => warn!("can't map key {:?} to a CHIP-8 key", label),
            None => {}
        }
        code
    }
}

/// what the host keyboard did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Down(String),
    Up(String),
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that happened since the last poll, oldest first
    fn poll_events(&mut self) -> Result<Vec<KeyEvent>, io::Error>;
}

/// Terminals only report presses, so a pressed key is held for `hold` and
/// then released.
#[derive(Debug, Clone)]
pub struct KeyLatch {
    hold: Duration,
    held: HashMap<String, Instant>,
}

impl KeyLatch {
    pub fn new(hold: Duration) -> Self {
        KeyLatch {
            hold,
            held: HashMap::new(),
        }
    }

    /// (re)start the hold on `label`
    pub fn press(&mut self, label: &str, now: Instant) {
        self.held.insert(label.to_string(), now + self.hold);
    }

    /// keys whose hold ran out by `now`, no longer held afterwards
    pub fn expired(&mut self, now: Instant) -> Vec<String> {
        let mut done: Vec<String> = self
            .held
            .iter()
            .filter(|&(_, &until)| until <= now)
            .map(|(label, _)| label.clone())
            .collect();
        done.sort();
        for label in &done {
            self.held.remove(label);
        }
        done
    }
}

/// name a terminal key the way a browser's `KeyboardEvent.key` would
fn key_label(code: KeyCode) -> Option<String> {
    let label = match code {
        KeyCode::Char(c) => return Some(c.to_string()),
        KeyCode::F(n) => return Some(format!("F{}", n)),
        KeyCode::Enter => "Enter",
        KeyCode::Backspace => "Backspace",
        KeyCode::Tab => "Tab",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Delete => "Delete",
        KeyCode::Insert => "Insert",
        _ => return None,
    };
    Some(label.to_string())
}

/// simple implementation of Input, using the terminal in raw mode
pub struct TermInput {
    latch: KeyLatch,
}

impl TermInput {
    pub fn new(hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            latch: KeyLatch::new(hold),
        })
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("couldn't leave raw mode: {}", e);
        }
    }
}

impl Input for TermInput {
    fn poll_events(&mut self) -> Result<Vec<KeyEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => events.push(KeyEvent::Quit),
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        events.push(KeyEvent::Quit)
                    }
                    code => match key_label(code) {
                        Some(label) => {
                            self.latch.press(&label, Instant::now());
                            events.push(KeyEvent::Down(label));
                        }
                        None => debug!("ignoring key {:?}", code),
                    },
                }
            }
        }
        events.extend(
            self.latch
                .expired(Instant::now())
                .into_iter()
                .map(KeyEvent::Up),
        );
        Ok(events)
    }
}

/// dummy Input implementation for testing; one batch per poll
#[derive(Debug, Default)]
pub struct DummyInput {
    batches: VecDeque<Vec<KeyEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<KeyEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<KeyEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
