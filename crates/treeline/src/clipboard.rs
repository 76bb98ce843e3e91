//! Clipboard payloads and type-directed paste. A structured subtree is the
//! preferred, lossless payload; plain text is the fallback and is always
//! representable as a string literal. Paste merges are listed exhaustively
//! by destination/source pair — any unlisted pair is a no-op that keeps the
//! original tree.

use serde::{Deserialize, Serialize};

use crate::cursor::CursorState;
use crate::editor::EditResult;
use crate::error::TreelineError;
use crate::expr::{find_node, replace_node, with_fresh_ids, Expr};
use crate::id::IdAllocator;
use crate::index::{stream_len, subtree_ranges, token_at};
use crate::provider::SignatureLookup;
use crate::token::{TokenInfo, TokenKind};
use crate::tokenizer::tokenize_info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ClipboardPayload {
    Subtree { expr: Expr },
    Text { text: String },
}

impl ClipboardPayload {
    pub fn to_json(&self) -> Result<String, TreelineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, TreelineError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Copy: reconstruct the selected range as a standalone subtree. A range
/// that maps to no coherent subtree copies as a blank.
pub fn copy_range(
    expr: &Expr,
    range: (usize, usize),
    sigs: &dyn SignatureLookup,
    ids: &mut IdAllocator,
) -> ClipboardPayload {
    let subtree = crate::reconstruct::reconstruct(expr, range, sigs, ids)
        .unwrap_or(Expr::Blank { id: ids.mint() });
    ClipboardPayload::Subtree { expr: subtree }
}

pub(crate) fn paste(
    expr: &Expr,
    cursor: &CursorState,
    payload: &ClipboardPayload,
    sigs: &dyn SignatureLookup,
    ids: &mut IdAllocator,
) -> EditResult {
    let tokens = tokenize_info(expr, sigs);
    let caret = cursor.caret.min(stream_len(&tokens));
    let no_op = EditResult {
        expr: expr.clone(),
        cursor: cursor.clone(),
        diagnostics: Vec::new(),
    };

    let Some(info) = target_token(&tokens, caret) else {
        return no_op;
    };
    let info = info.clone();

    if info.kind().is_blank() {
        return paste_over_blank(expr, cursor, payload, sigs, ids, &info);
    }

    match (info.kind(), payload) {
        // Integer over integer splices digits at the caret, re-validated as
        // a 63-bit literal.
        (
            TokenKind::Integer,
            ClipboardPayload::Subtree {
                expr: Expr::IntLiteral { digits: src, .. },
            },
        ) => {
            let Some(Expr::IntLiteral { id, digits }) = find_node(info.node(), expr) else {
                return no_op;
            };
            let idx = caret - info.start;
            let spliced = splice_str(digits, idx, src);
            if !int_in_range(&spliced) {
                return no_op;
            }
            let next = Expr::IntLiteral {
                id: *id,
                digits: spliced,
            };
            EditResult {
                expr: replace_node(*id, &next, expr),
                cursor: cursor.moved_to(caret + src.chars().count()),
                diagnostics: Vec::new(),
            }
        }
        // Pasting into a string splices the raw, unescaped text.
        (
            TokenKind::String
            | TokenKind::StringMLStart
            | TokenKind::StringMLMiddle
            | TokenKind::StringMLEnd,
            payload,
        ) => {
            let src = match payload {
                ClipboardPayload::Text { text } => text.clone(),
                ClipboardPayload::Subtree {
                    expr: Expr::StringLiteral { text, .. },
                } => text.clone(),
                _ => return no_op,
            };
            let Some(Expr::StringLiteral { id, text }) = find_node(info.node(), expr) else {
                return no_op;
            };
            let has_open_quote =
                matches!(info.kind(), TokenKind::String | TokenKind::StringMLStart);
            let idx = caret - info.start;
            if has_open_quote && idx == 0 {
                return no_op;
            }
            let logical =
                info.token.segment_offset.unwrap_or(0) + idx - usize::from(has_open_quote);
            let next = Expr::StringLiteral {
                id: *id,
                text: splice_str(text, logical, &src),
            };
            EditResult {
                expr: replace_node(*id, &next, expr),
                cursor: cursor.moved_to(caret + src.chars().count()),
                diagnostics: Vec::new(),
            }
        }
        // An identifier pasted into an empty binding slot names it.
        (TokenKind::LetVarName, payload) => {
            let name = match payload {
                ClipboardPayload::Subtree {
                    expr: Expr::Variable { name, .. },
                } => name.clone(),
                ClipboardPayload::Text { text } => text.clone(),
                _ => return no_op,
            };
            if !is_identifier(&name) {
                return no_op;
            }
            let Some(Expr::Let {
                id,
                lhs_id,
                lhs,
                rhs,
                body,
            }) = find_node(info.node(), expr)
            else {
                return no_op;
            };
            if !lhs.is_empty() {
                return no_op;
            }
            let next = Expr::Let {
                id: *id,
                lhs_id: *lhs_id,
                lhs: name.clone(),
                rhs: rhs.clone(),
                body: body.clone(),
            };
            EditResult {
                expr: replace_node(*id, &next, expr),
                cursor: cursor.moved_to(info.start + name.chars().count()),
                diagnostics: Vec::new(),
            }
        }
        _ => no_op,
    }
}

fn paste_over_blank(
    expr: &Expr,
    cursor: &CursorState,
    payload: &ClipboardPayload,
    sigs: &dyn SignatureLookup,
    ids: &mut IdAllocator,
    info: &TokenInfo,
) -> EditResult {
    let incoming = match payload {
        // Fresh ids throughout: the pasted subtree may come from this very
        // snapshot.
        ClipboardPayload::Subtree { expr: subtree } => with_fresh_ids(subtree, ids),
        ClipboardPayload::Text { text } => Expr::StringLiteral {
            id: ids.mint(),
            text: text.clone(),
        },
    };
    let focus = incoming.id();
    let next = replace_node(info.node(), &incoming, expr);
    let next_tokens = tokenize_info(&next, sigs);
    let caret = subtree_ranges(&next, &next_tokens)
        .get(&focus)
        .map(|range| range.1)
        .unwrap_or(cursor.caret);
    EditResult {
        expr: next,
        cursor: cursor.moved_to(caret),
        diagnostics: Vec::new(),
    }
}

fn target_token<'t>(tokens: &'t [TokenInfo], caret: usize) -> Option<&'t TokenInfo> {
    token_at(tokens, caret)
        .filter(|info| !info.kind().is_whitespace())
        .or_else(|| {
            tokens
                .iter()
                .find(|info| info.end == caret && !info.kind().is_whitespace())
        })
}

fn splice_str(text: &str, idx: usize, insert: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let idx = idx.min(chars.len());
    let mut out: String = chars[..idx].iter().collect();
    out.push_str(insert);
    out.extend(&chars[idx..]);
    out
}

/// Integer literals hold 63-bit values; a splice that overflows is
/// rejected rather than truncated.
fn int_in_range(digits: &str) -> bool {
    match digits.parse::<i64>() {
        Ok(value) => value.abs() < (1i64 << 62),
        Err(_) => false,
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
