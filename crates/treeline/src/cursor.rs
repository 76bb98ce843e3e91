use serde::{Deserialize, Serialize};

use crate::event::InputEvent;

/// The caret and everything that gives it memory: an optional selection
/// anchor, the column vertical movement tries to return to, the last event
/// dispatched, and the highlighted autocomplete row. Created at editor open,
/// rewritten by every edit, never persisted beyond the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorState {
    /// Caret position as a char offset into the flattened token text.
    pub caret: usize,
    /// The other end of the selection; `None` when nothing is selected.
    pub anchor: Option<usize>,
    /// Column remembered across vertical moves so repeated Up/Down tracks a
    /// stable column through short lines. Cleared by horizontal movement
    /// and by edits.
    pub column_memory: Option<usize>,
    pub last_event: Option<InputEvent>,
    /// Highlighted row of the autocomplete overlay, when one is open.
    pub ac_index: Option<usize>,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            caret: 0,
            anchor: None,
            column_memory: None,
            last_event: None,
            ac_index: None,
        }
    }

    pub fn at(caret: usize) -> Self {
        Self {
            caret,
            ..Self::new()
        }
    }

    /// The selected range in ascending order, if a selection is active.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.caret {
            return None;
        }
        Some((anchor.min(self.caret), anchor.max(self.caret)))
    }

    pub(crate) fn moved_to(&self, caret: usize) -> Self {
        Self {
            caret,
            anchor: None,
            column_memory: None,
            last_event: self.last_event.clone(),
            ac_index: None,
        }
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}
