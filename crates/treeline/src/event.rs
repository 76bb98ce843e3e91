use serde::{Deserialize, Serialize};

/// One user input, delivered by the embedding layer. The layer owns raw key
/// capture and event serialization; the engine only ever sees these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A single typed character, including the trigger characters (`"`,
    /// `[`, `{`, `\`, `,`, `.`, infix operator characters, closers).
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Tab,
    ShiftTab,
    Enter,
}

/// Characters that can begin or extend an infix operator.
pub const INFIX_CHARS: &[char] = &['+', '-', '*', '/', '<', '>', '=', '!', '&', '|', '%', '^'];

pub fn is_infix_char(c: char) -> bool {
    INFIX_CHARS.contains(&c)
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}
