use std::collections::VecDeque;

use glam::Vec2;

/// Number of slots in the key state table.
pub const KEY_TABLE_SIZE: usize = 64;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    /// Index of the key in the state table, or `None` when the key is not
    /// tracked.
    pub fn slot(self) -> Option<usize> {
        match self {
            Self::Character(ch) if ch.is_ascii_alphabetic() => {
                Some((ch.to_ascii_uppercase() as u8 - b'A') as usize)
            }
            Self::Character(_) => None,
            Self::Digit(digit) if digit <= 9 => Some(26 + digit as usize),
            Self::Digit(_) => None,
            Self::Named(named) => Some(36 + named as usize),
        }
    }
}

/// Friendly names for the non-printable keys the viewer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
}

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
    /// Auto-repeat while held; leaves the key table untouched.
    Repeat,
}

/// Window events the frame loop cares about, queued in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { code: KeyCode, action: KeyAction },
    CursorMoved { x: f32, y: f32 },
    CloseRequested,
}

/// FIFO of input events filled by the windowing callbacks and drained once
/// per frame.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Keyboard table and cursor tracking.
#[derive(Debug, Clone)]
pub struct InputState {
    keys: [bool; KEY_TABLE_SIZE],
    last_cursor: Vec2,
    first_mouse: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl InputState {
    /// Creates an empty key table with the cursor baseline at the centre of
    /// a `width` x `height` window.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            keys: [false; KEY_TABLE_SIZE],
            last_cursor: Vec2::new(width as f32 / 2.0, height as f32 / 2.0),
            first_mouse: true,
        }
    }

    /// Records a key transition. Returns `false` when the key has no slot in
    /// the table and was ignored.
    pub fn set_key(&mut self, key: KeyCode, action: KeyAction) -> bool {
        let Some(slot) = key.slot() else {
            return false;
        };
        match action {
            KeyAction::Press => self.keys[slot] = true,
            KeyAction::Release => self.keys[slot] = false,
            KeyAction::Repeat => {}
        }
        true
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        key.slot().map(|slot| self.keys[slot]).unwrap_or(false)
    }

    /// True when any of the given keys is held.
    pub fn any_down(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|key| self.is_key_down(*key))
    }

    /// Converts an absolute cursor position into a look offset.
    ///
    /// The first sample only establishes the baseline and yields zero. The
    /// vertical component is inverted so that moving the cursor up looks up.
    pub fn cursor_offset(&mut self, position: Vec2) -> Vec2 {
        if self.first_mouse {
            self.last_cursor = position;
            self.first_mouse = false;
        }
        let offset = Vec2::new(
            position.x - self.last_cursor.x,
            self.last_cursor.y - position.y,
        );
        self.last_cursor = position;
        offset
    }

    pub fn is_first_mouse(&self) -> bool {
        self.first_mouse
    }

    pub fn last_cursor(&self) -> Vec2 {
        self.last_cursor
    }
}
