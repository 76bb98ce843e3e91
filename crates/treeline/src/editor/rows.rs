//! Structural row operations: insert-above/insert-below for list, record,
//! match and pipeline rows. Inserting always leaves the construct with at
//! least one row; removal lives with the delete rules.

use crate::cursor::CursorState;
use crate::expr::{find_node, parent_map, replace_node, Expr, MatchArm, Pattern, RecordField};
use crate::id::NodeId;
use crate::index::{neighbours, subtree_ranges, token_at};
use crate::token::TokenInfo;

use super::Editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RowKind {
    List,
    Record,
    Match,
    Pipeline,
}

/// The nearest enclosing construct with insertable rows, together with the
/// index of the row the caret is in.
pub(super) fn rowable_ancestor(
    expr: &Expr,
    tokens: &[TokenInfo],
    caret: usize,
) -> Option<(NodeId, RowKind, usize)> {
    let start_node = token_at(tokens, caret)
        .filter(|info| !info.kind().is_whitespace())
        .map(|info| info.node())
        .or_else(|| neighbours(tokens, caret).0.token().map(|info| info.node()))?;

    let parents = parent_map(expr);
    let ranges = subtree_ranges(expr, tokens);
    let mut node = Some(start_node);
    while let Some(id) = node {
        if let Some(found) = find_node(id, expr) {
            let kind = match found {
                Expr::List { .. } => Some(RowKind::List),
                Expr::Record { .. } => Some(RowKind::Record),
                Expr::Match { .. } => Some(RowKind::Match),
                Expr::Pipeline { .. } => Some(RowKind::Pipeline),
                _ => None,
            };
            if let Some(kind) = kind {
                let index = row_index(found, &ranges, caret);
                return Some((id, kind, index));
            }
        }
        node = parents.get(&id).copied();
    }
    None
}

/// Which row of `construct` the caret offset falls in: the last row whose
/// rendered range starts at or before the caret.
fn row_index(
    construct: &Expr,
    ranges: &std::collections::HashMap<NodeId, (usize, usize)>,
    caret: usize,
) -> usize {
    let row_ids: Vec<NodeId> = match construct {
        Expr::List { items, .. } | Expr::Pipeline { segments: items, .. } => {
            items.iter().map(Expr::id).collect()
        }
        Expr::Record { fields, .. } => fields.iter().map(|f| f.id).collect(),
        Expr::Match { arms, .. } => arms.iter().map(|arm| arm.pattern.id()).collect(),
        _ => return 0,
    };
    let mut index = 0usize;
    for (i, id) in row_ids.iter().enumerate() {
        if let Some((start, _)) = ranges.get(id) {
            if *start <= caret {
                index = i;
            }
        }
    }
    index
}

/// Enter: open a new blank row in the nearest rowable construct — above the
/// current row when the caret sits at the row's start, below otherwise.
pub(super) fn enter(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    cursor: &CursorState,
) -> (Expr, CursorState) {
    let Some((ancestor, kind, index)) = rowable_ancestor(expr, tokens, caret_guard(tokens, cursor))
    else {
        return (expr.clone(), cursor.clone());
    };
    let ranges = subtree_ranges(expr, tokens);
    let at_row_start = row_start(expr, &ranges, ancestor, index)
        .map(|start| cursor.caret <= start)
        .unwrap_or(false);
    let insert_at = if at_row_start { index } else { index + 1 };

    let (next, focus) = insert_row(ed, expr, ancestor, kind, insert_at);
    match focus {
        Some(focus) => {
            let caret = super::caret_into(&next, focus, ed.sigs());
            (next, cursor.moved_to(caret))
        }
        None => (expr.clone(), cursor.clone()),
    }
}

fn caret_guard(tokens: &[TokenInfo], cursor: &CursorState) -> usize {
    cursor.caret.min(crate::index::stream_len(tokens))
}

fn row_start(
    expr: &Expr,
    ranges: &std::collections::HashMap<NodeId, (usize, usize)>,
    ancestor: NodeId,
    index: usize,
) -> Option<usize> {
    let construct = find_node(ancestor, expr)?;
    let id = match construct {
        Expr::List { items, .. } | Expr::Pipeline { segments: items, .. } => {
            items.get(index).map(Expr::id)
        }
        Expr::Record { fields, .. } => fields.get(index).map(|f| f.id),
        Expr::Match { arms, .. } => arms.get(index).map(|arm| arm.pattern.id()),
        _ => None,
    }?;
    ranges.get(&id).map(|(start, _)| *start)
}

/// Insert one blank row at `index`, returning the new tree and the node the
/// caret should land in.
pub(super) fn insert_row(
    ed: &mut Editor,
    expr: &Expr,
    ancestor: NodeId,
    kind: RowKind,
    index: usize,
) -> (Expr, Option<NodeId>) {
    let Some(construct) = find_node(ancestor, expr) else {
        return (expr.clone(), None);
    };
    let ids = ed.ids_mut();
    let (rebuilt, focus) = match (kind, construct) {
        (RowKind::List, Expr::List { id, items }) => {
            let blank = Expr::Blank { id: ids.mint() };
            let focus = blank.id();
            let mut items = items.clone();
            let index = index.min(items.len());
            items.insert(index, blank);
            (Expr::List { id: *id, items }, focus)
        }
        (RowKind::Pipeline, Expr::Pipeline { id, segments }) => {
            let blank = Expr::Blank { id: ids.mint() };
            let focus = blank.id();
            let mut segments = segments.clone();
            // Segment 0 is the seed; new rows go after it.
            let index = index.clamp(1, segments.len());
            segments.insert(index, blank);
            (Expr::Pipeline { id: *id, segments }, focus)
        }
        (RowKind::Record, Expr::Record { id, fields }) => {
            let field = RecordField {
                id: ids.mint(),
                name: String::new(),
                value: Expr::Blank { id: ids.mint() },
            };
            let focus = field.id;
            let mut fields = fields.clone();
            let index = index.min(fields.len());
            fields.insert(index, field);
            (Expr::Record { id: *id, fields }, focus)
        }
        (RowKind::Match, Expr::Match { id, subject, arms }) => {
            let arm = MatchArm {
                pattern: Pattern::Blank {
                    match_id: *id,
                    id: ids.mint(),
                },
                body: Expr::Blank { id: ids.mint() },
            };
            let focus = arm.pattern.id();
            let mut arms = arms.clone();
            let index = index.min(arms.len());
            arms.insert(index, arm);
            (
                Expr::Match {
                    id: *id,
                    subject: subject.clone(),
                    arms,
                },
                focus,
            )
        }
        _ => return (expr.clone(), None),
    };
    (replace_node(ancestor, &rebuilt, expr), Some(focus))
}

/// A comma typed inside a list opens a blank element after the current one.
pub(super) fn comma_insert(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    cursor: &CursorState,
) -> Option<(Expr, CursorState)> {
    let (ancestor, kind, index) = rowable_ancestor(expr, tokens, cursor.caret)?;
    if kind != RowKind::List {
        return None;
    }
    let (next, focus) = insert_row(ed, expr, ancestor, kind, index + 1);
    let focus = focus?;
    let caret = super::caret_into(&next, focus, ed.sigs());
    Some((next, cursor.moved_to(caret)))
}
