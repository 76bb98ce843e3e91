//! Conversions over a laid-out token stream: offset ↔ token, offset ↔ grid,
//! neighbour and blank lookups. Callers only ever see content-bearing
//! tokens; whitespace, indent and newline tokens are skipped.

use std::collections::HashMap;

use crate::expr::{parent_map, Expr};
use crate::id::NodeId;
use crate::token::{TokenInfo, TokenKind};

/// A caret's content-token neighbour on one side. `Left` means the caret
/// touches the token's trailing edge or sits inside it; `Right` means it
/// touches the leading edge or sits inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighbour<'a> {
    Left(&'a TokenInfo),
    Right(&'a TokenInfo),
    None,
}

impl<'a> Neighbour<'a> {
    pub fn token(&self) -> Option<&'a TokenInfo> {
        match self {
            Neighbour::Left(t) | Neighbour::Right(t) => Some(t),
            Neighbour::None => None,
        }
    }
}

/// Row/column grid coordinates. Zero-indexed; columns count chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

/// The token whose span contains `offset`.
pub fn token_at(tokens: &[TokenInfo], offset: usize) -> Option<&TokenInfo> {
    tokens.iter().find(|info| info.contains(offset))
}

/// Total char length of the stream.
pub fn stream_len(tokens: &[TokenInfo]) -> usize {
    tokens.last().map(|info| info.end).unwrap_or(0)
}

fn is_content(info: &TokenInfo) -> bool {
    !info.kind().is_whitespace()
}

/// Content-token neighbours of a caret offset. The left neighbour is the
/// last content token starting strictly before the offset; the right one is
/// the first content token ending strictly after it.
pub fn neighbours(tokens: &[TokenInfo], offset: usize) -> (Neighbour<'_>, Neighbour<'_>) {
    let left = tokens
        .iter()
        .filter(|info| is_content(info) && info.start < offset)
        .last()
        .map_or(Neighbour::None, Neighbour::Left);
    let right = tokens
        .iter()
        .find(|info| is_content(info) && info.end > offset)
        .map_or(Neighbour::None, Neighbour::Right);
    (left, right)
}

/// Grid coordinates of a caret offset.
pub fn grid_for(tokens: &[TokenInfo], offset: usize) -> GridPos {
    for info in tokens {
        if info.contains(offset) {
            return GridPos {
                row: info.row,
                col: info.col + (offset - info.start),
            };
        }
    }
    // Past the last token: the end of the stream.
    match tokens.last() {
        Some(last) if last.kind() == TokenKind::Newline => GridPos {
            row: last.row + 1,
            col: 0,
        },
        Some(last) => GridPos {
            row: last.row,
            col: last.col + last.token.len(),
        },
        None => GridPos { row: 0, col: 0 },
    }
}

fn row_tokens<'a>(tokens: &'a [TokenInfo], row: usize) -> Vec<&'a TokenInfo> {
    tokens
        .iter()
        .filter(|info| info.row == row && info.kind() != TokenKind::Newline)
        .collect()
}

pub fn max_row(tokens: &[TokenInfo]) -> usize {
    tokens.iter().map(|info| info.row).max().unwrap_or(0)
}

/// Inverse of [`grid_for`], clamped to the nearest valid caret position on
/// the row: never inside an indent run, never past the row's end. An empty
/// row maps to its column 0.
pub fn offset_for(tokens: &[TokenInfo], row: usize, col: usize) -> usize {
    let on_row = row_tokens(tokens, row);
    let content: Vec<&&TokenInfo> = on_row.iter().filter(|info| is_content(info)).collect();

    let (Some(first), Some(last)) = (content.first(), content.last()) else {
        // Row holds only the newline (or indent): caret parks at its start.
        return tokens
            .iter()
            .find(|info| info.row == row)
            .map(|info| info.start)
            .unwrap_or_else(|| stream_len(tokens));
    };

    if col <= first.col {
        return first.start;
    }
    let row_end_col = last.col + last.token.len();
    if col >= row_end_col {
        return last.end;
    }
    for info in &content {
        let token_end_col = info.col + info.token.len();
        if col < token_end_col {
            if col < info.col {
                // Inside a whitespace gap between content tokens: snap to
                // the next content token's start.
                return info.start;
            }
            return info.start + (col - info.col);
        }
    }
    last.end
}

/// Token-range of every node's whole subtree: the span from the first to
/// the last token owned by the node or any of its descendants. Nodes that
/// render nothing (pipe targets) have no entry.
pub fn subtree_ranges(expr: &Expr, tokens: &[TokenInfo]) -> HashMap<NodeId, (usize, usize)> {
    let parents = parent_map(expr);
    let mut ranges: HashMap<NodeId, (usize, usize)> = HashMap::new();
    for info in tokens {
        if info.kind().is_whitespace() {
            continue;
        }
        let mut node = Some(info.node());
        while let Some(id) = node {
            ranges
                .entry(id)
                .and_modify(|range| {
                    range.0 = range.0.min(info.start);
                    range.1 = range.1.max(info.end);
                })
                .or_insert((info.start, info.end));
            node = parents.get(&id).copied();
        }
    }
    ranges
}

/// Nearest blank token at or after `from`, wrapping past the end of the
/// stream.
pub fn next_blank(tokens: &[TokenInfo], from: usize) -> Option<&TokenInfo> {
    let blanks: Vec<&TokenInfo> = tokens.iter().filter(|t| t.kind().is_blank()).collect();
    if blanks.is_empty() {
        return None;
    }
    blanks
        .iter()
        .find(|t| t.start > from)
        .or_else(|| blanks.first())
        .copied()
}

/// Nearest blank token strictly before `from`, wrapping past the start.
pub fn prev_blank(tokens: &[TokenInfo], from: usize) -> Option<&TokenInfo> {
    let blanks: Vec<&TokenInfo> = tokens.iter().filter(|t| t.kind().is_blank()).collect();
    if blanks.is_empty() {
        return None;
    }
    blanks
        .iter()
        .rev()
        .find(|t| t.start < from)
        .or_else(|| blanks.last())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::id::IdAllocator;
    use crate::provider::StaticSignatures;
    use crate::tokenizer::tokenize_info;

    fn let_tree() -> Expr {
        let mut ids = IdAllocator::new();
        Expr::Let {
            id: ids.mint(),
            lhs_id: ids.mint(),
            lhs: "x".to_string(),
            rhs: Box::new(Expr::IntLiteral {
                id: ids.mint(),
                digits: "12".to_string(),
            }),
            body: Box::new(Expr::Blank { id: ids.mint() }),
        }
    }

    #[test]
    fn token_at_finds_the_covering_token() {
        let sigs = StaticSignatures::builtin();
        let tokens = tokenize_info(&let_tree(), &sigs);
        // "let x = 12\n___" — offset 8 is inside "12".
        let info = token_at(&tokens, 8).expect("token at 8");
        assert_eq!(info.kind(), TokenKind::Integer);
    }

    #[test]
    fn neighbours_skip_whitespace() {
        let sigs = StaticSignatures::builtin();
        let tokens = tokenize_info(&let_tree(), &sigs);
        // Offset 4 is the start of "x": left neighbour is the keyword, not
        // the separator between them.
        let (left, right) = neighbours(&tokens, 4);
        assert_eq!(left.token().expect("left").kind(), TokenKind::LetKeyword);
        assert_eq!(right.token().expect("right").kind(), TokenKind::LetVarName);
    }

    #[test]
    fn grid_round_trips_through_offset() {
        let sigs = StaticSignatures::builtin();
        let tokens = tokenize_info(&let_tree(), &sigs);
        let pos = grid_for(&tokens, 8);
        assert_eq!(pos, GridPos { row: 0, col: 8 });
        assert_eq!(offset_for(&tokens, pos.row, pos.col), 8);
    }

    #[test]
    fn offset_for_clamps_past_row_end() {
        let sigs = StaticSignatures::builtin();
        let tokens = tokenize_info(&let_tree(), &sigs);
        // Row 0 is "let x = 12" (10 chars); column 80 clamps to its end.
        assert_eq!(offset_for(&tokens, 0, 80), 10);
    }

    #[test]
    fn blank_search_wraps_cyclically() {
        let sigs = StaticSignatures::builtin();
        let tokens = tokenize_info(&let_tree(), &sigs);
        let blank = next_blank(&tokens, 0).expect("blank");
        assert_eq!(blank.kind(), TokenKind::Blank);
        // From past the blank, the search wraps back around to it.
        let wrapped = next_blank(&tokens, blank.start).expect("wrapped");
        assert_eq!(wrapped.start, blank.start);
        let before = prev_blank(&tokens, 3).expect("prev wraps");
        assert_eq!(before.start, blank.start);
    }
}
