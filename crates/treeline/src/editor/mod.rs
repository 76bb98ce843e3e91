//! The keystroke state machine. Every public operation is a total function
//! from `(tree, cursor, event)` to `(tree, cursor)`: an input that cannot
//! apply returns the tree unchanged, at most repositioning the caret, and
//! an impossible tree shape is reported as a diagnostic value rather than
//! an error.

mod commit;
mod delete;
mod insert;
mod movement;
mod rows;

#[cfg(test)]
mod tests;

use crate::clipboard::{self, ClipboardPayload};
use crate::cursor::CursorState;
use crate::diagnostics::Diagnostic;
use crate::event::InputEvent;
use crate::expr::{find_node, max_node_id, parent_map, Expr};
use crate::id::IdAllocator;
use crate::index::{next_blank, prev_blank, stream_len, subtree_ranges};
use crate::provider::{QueryContext, SignatureLookup, SuggestionProvider};
use crate::reconstruct;
use crate::token::{TokenInfo, TokenKind};
use crate::tokenizer::tokenize_info;

/// Outcome of one dispatch: the next tree/cursor pair plus any internal
/// diagnostics the edit raised. Diagnostics never abort the session.
#[derive(Debug, Clone)]
pub struct EditResult {
    pub expr: Expr,
    pub cursor: CursorState,
    pub diagnostics: Vec<Diagnostic>,
}

/// The edit engine. Holds the injected collaborators and the id allocator;
/// the tree and cursor are threaded through every call by the embedding
/// layer, which is also responsible for serializing input events.
pub struct Editor<'a> {
    provider: &'a dyn SuggestionProvider,
    sigs: &'a dyn SignatureLookup,
    ids: IdAllocator,
}

impl<'a> Editor<'a> {
    /// An editor whose allocator starts past every id in `expr`, so fresh
    /// nodes can never collide with the snapshot being edited.
    pub fn for_tree(
        provider: &'a dyn SuggestionProvider,
        sigs: &'a dyn SignatureLookup,
        expr: &Expr,
    ) -> Self {
        Self {
            provider,
            sigs,
            ids: IdAllocator::starting_at(max_node_id(expr) + 1),
        }
    }

    pub fn sigs(&self) -> &dyn SignatureLookup {
        self.sigs
    }

    pub(crate) fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn dispatch(&mut self, expr: &Expr, cursor: &CursorState, event: InputEvent) -> EditResult {
        self.dispatch_guarded(expr, cursor, event, true)
    }

    /// Rebuild a standalone subtree from an offset range, for copy.
    pub fn reconstruct(&mut self, expr: &Expr, range: (usize, usize)) -> Option<Expr> {
        reconstruct::reconstruct(expr, range, self.sigs, &mut self.ids)
    }

    /// Apply a clipboard payload at the caret. Unlisted destination/source
    /// pairs are a no-op that keeps the original tree.
    pub fn paste_into(
        &mut self,
        expr: &Expr,
        cursor: &CursorState,
        payload: &ClipboardPayload,
    ) -> EditResult {
        clipboard::paste(expr, cursor, payload, self.sigs, &mut self.ids)
    }

    /// `allow_commit` is the recursion guard: committing a pending partial
    /// as a side effect of a keystroke re-invokes dispatch exactly once,
    /// with commits disabled on the recursive call.
    fn dispatch_guarded(
        &mut self,
        expr: &Expr,
        cursor: &CursorState,
        event: InputEvent,
        allow_commit: bool,
    ) -> EditResult {
        let tokens = tokenize_info(expr, self.sigs);
        let caret = cursor.caret.min(stream_len(&tokens));
        let cursor = CursorState {
            caret,
            ..cursor.clone()
        };
        let mut diagnostics = Vec::new();

        let (next_expr, mut next_cursor) = match event.clone() {
            InputEvent::Left => (
                expr.clone(),
                cursor.moved_to(movement::left(&tokens, caret)),
            ),
            InputEvent::Right => (
                expr.clone(),
                cursor.moved_to(movement::right(&tokens, caret)),
            ),
            InputEvent::Up | InputEvent::Down => {
                let up = event == InputEvent::Up;
                match (cursor.ac_index, partial_at(&tokens, caret)) {
                    (Some(index), Some(info)) => {
                        let count = self
                            .provider
                            .suggestions(&query_context(expr, info))
                            .len();
                        let next = if up {
                            index.saturating_sub(1)
                        } else {
                            (index + 1).min(count.saturating_sub(1))
                        };
                        (
                            expr.clone(),
                            CursorState {
                                ac_index: Some(next),
                                ..cursor.clone()
                            },
                        )
                    }
                    _ => (expr.clone(), movement::vertical(&tokens, &cursor, up)),
                }
            }
            InputEvent::Home => (expr.clone(), cursor.moved_to(movement::home(&tokens, caret))),
            InputEvent::End => (
                expr.clone(),
                cursor.moved_to(movement::end_of_row(&tokens, caret)),
            ),
            InputEvent::Tab => match partial_at(&tokens, caret) {
                Some(info) if allow_commit && cursor.ac_index.is_some() => {
                    commit::commit_at(self, expr, &tokens, info, &cursor, &mut diagnostics)
                }
                _ => {
                    let caret = next_blank(&tokens, caret)
                        .map(|info| info.start)
                        .unwrap_or(caret);
                    (expr.clone(), cursor.moved_to(caret))
                }
            },
            InputEvent::ShiftTab => {
                let caret = prev_blank(&tokens, caret)
                    .map(|info| info.start)
                    .unwrap_or(caret);
                (expr.clone(), cursor.moved_to(caret))
            }
            InputEvent::Enter => match partial_at(&tokens, caret) {
                Some(info) if allow_commit => {
                    commit::commit_at(self, expr, &tokens, info, &cursor, &mut diagnostics)
                }
                _ => rows::enter(self, expr, &tokens, &cursor),
            },
            InputEvent::Backspace => {
                delete::backspace(self, expr, &tokens, &cursor, &mut diagnostics)
            }
            InputEvent::Delete => {
                delete::delete_forward(self, expr, &tokens, &cursor, &mut diagnostics)
            }
            InputEvent::Insert(c) => {
                let result =
                    insert::insert_char(self, expr, &tokens, &cursor, c, allow_commit);
                diagnostics.extend(result.diagnostics);
                (result.expr, result.cursor)
            }
        };

        next_cursor.last_event = Some(event);
        EditResult {
            expr: next_expr,
            cursor: next_cursor,
            diagnostics,
        }
    }
}

/// The in-progress token the caret is on or immediately after, if any.
pub(crate) fn partial_at<'t>(tokens: &'t [TokenInfo], caret: usize) -> Option<&'t TokenInfo> {
    tokens.iter().find(|info| {
        matches!(
            info.kind(),
            TokenKind::Partial | TokenKind::RightPartial | TokenKind::FieldPartial
        ) && info.start <= caret
            && caret <= info.end
    })
}

pub(crate) fn query_context(expr: &Expr, info: &TokenInfo) -> QueryContext {
    let parents = parent_map(expr);
    let mut in_pipeline = false;
    let mut node = Some(info.node());
    while let Some(id) = node {
        if matches!(find_node(id, expr), Some(Expr::Pipeline { .. })) {
            in_pipeline = true;
            break;
        }
        node = parents.get(&id).copied();
    }
    QueryContext {
        query: if info.kind() == TokenKind::FieldPartial {
            String::new()
        } else {
            info.token.text.clone()
        },
        is_field_access: info.kind() == TokenKind::FieldPartial,
        in_pipeline,
    }
}

/// Caret target after a structural replacement: the first blank inside the
/// new node's rendering, or the end of that rendering.
pub(crate) fn caret_into(expr: &Expr, node: crate::id::NodeId, sigs: &dyn SignatureLookup) -> usize {
    let tokens = tokenize_info(expr, sigs);
    let ranges = subtree_ranges(expr, &tokens);
    let Some((start, end)) = ranges.get(&node).copied() else {
        return stream_len(&tokens);
    };
    tokens
        .iter()
        .find(|info| info.kind().is_blank() && info.start >= start && info.end <= end)
        .map(|info| info.start)
        .unwrap_or(end)
}

/// Insert `c` at char position `idx` of `text`.
pub(crate) fn splice_char(text: &str, idx: usize, c: char) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let idx = idx.min(chars.len());
    chars.insert(idx, c);
    chars.into_iter().collect()
}

/// Remove the char at position `idx` of `text`, if any.
pub(crate) fn remove_char(text: &str, idx: usize) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    if idx < chars.len() {
        chars.remove(idx);
    }
    chars.into_iter().collect()
}
