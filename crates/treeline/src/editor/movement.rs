//! Caret navigation over a laid-out token stream. Plain arrows move by one
//! grapheme through text tokens and skip atomic tokens (keywords, blanks,
//! whole numbers' neighbours like separators) in a single step; vertical
//! moves track a remembered column through short lines.

use unicode_segmentation::UnicodeSegmentation;

use crate::cursor::CursorState;
use crate::index::{grid_for, max_row, offset_for, stream_len, token_at};
use crate::token::{to_text, Token, TokenInfo, TokenKind};

fn flattened(tokens: &[TokenInfo]) -> String {
    let raw: Vec<Token> = tokens.iter().map(|info| info.token.clone()).collect();
    to_text(&raw)
}

/// Char offsets of every grapheme boundary in the stream, including 0 and
/// the total length.
fn grapheme_boundaries(tokens: &[TokenInfo]) -> Vec<usize> {
    let text = flattened(tokens);
    let mut boundaries = vec![0usize];
    let mut chars = 0usize;
    for grapheme in text.graphemes(true) {
        chars += grapheme.chars().count();
        boundaries.push(chars);
    }
    boundaries
}

/// Whether a caret may rest at `offset`. Valid positions are the stream
/// edges, edges of content tokens, and grapheme boundaries inside text
/// tokens; never inside an atomic token or an indent run.
pub(super) fn valid_caret(tokens: &[TokenInfo], offset: usize) -> bool {
    if offset == 0 || offset == stream_len(tokens) {
        return true;
    }
    let Some(info) = token_at(tokens, offset) else {
        return false;
    };
    match info.kind() {
        TokenKind::Indent => false,
        TokenKind::Newline | TokenKind::Sep => offset == info.start,
        kind if kind.is_text() => true,
        _ => offset == info.start,
    }
}

/// Snap an arbitrary offset to the nearest valid caret position at or left
/// of it.
pub(super) fn snap(tokens: &[TokenInfo], offset: usize) -> usize {
    let mut pos = offset.min(stream_len(tokens));
    while pos > 0 && !valid_caret(tokens, pos) {
        pos -= 1;
    }
    pos
}

pub(super) fn left(tokens: &[TokenInfo], caret: usize) -> usize {
    let boundaries = grapheme_boundaries(tokens);
    for pos in boundaries.iter().rev().filter(|b| **b < caret).copied() {
        if valid_caret(tokens, pos) {
            return pos;
        }
    }
    0
}

pub(super) fn right(tokens: &[TokenInfo], caret: usize) -> usize {
    let len = stream_len(tokens);
    let boundaries = grapheme_boundaries(tokens);
    for pos in boundaries.iter().filter(|b| **b > caret).copied() {
        if valid_caret(tokens, pos) {
            return pos;
        }
    }
    len
}

pub(super) fn vertical(tokens: &[TokenInfo], cursor: &CursorState, up: bool) -> CursorState {
    let grid = grid_for(tokens, cursor.caret);
    let column = cursor.column_memory.unwrap_or(grid.col);
    let target_row = if up {
        grid.row.saturating_sub(1)
    } else {
        (grid.row + 1).min(max_row(tokens))
    };
    let caret = snap(tokens, offset_for(tokens, target_row, column));
    CursorState {
        caret,
        anchor: None,
        column_memory: Some(column),
        last_event: cursor.last_event.clone(),
        ac_index: None,
    }
}

pub(super) fn home(tokens: &[TokenInfo], caret: usize) -> usize {
    let row = grid_for(tokens, caret).row;
    offset_for(tokens, row, 0)
}

pub(super) fn end_of_row(tokens: &[TokenInfo], caret: usize) -> usize {
    let row = grid_for(tokens, caret).row;
    offset_for(tokens, row, usize::MAX)
}
