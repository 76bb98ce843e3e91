//! Backspace and delete. Text tokens lose one grapheme at a time and
//! collapse to blanks when emptied; structural keywords collapse their
//! construct only when every child is already blank; separators remove
//! exactly one adjacent element. A keystroke that would destroy a non-blank
//! descendant instead just repositions the caret.

use crate::cursor::CursorState;
use crate::diagnostics::Diagnostic;
use crate::expr::{
    find_node, find_pattern, map_children, parent_map, rename_variable_uses, replace_node,
    replace_pattern, Expr, LambdaParam, Pattern,
};
use crate::id::NodeId;
use crate::index::{stream_len, subtree_ranges, token_at};
use crate::token::{TokenInfo, TokenKind};
use crate::tokenizer::tokenize_info;

use super::{movement, remove_char, Editor};

pub(super) fn backspace(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    cursor: &CursorState,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Expr, CursorState) {
    if cursor.caret == 0 {
        return (expr.clone(), cursor.clone());
    }
    let pos = cursor.caret - 1;
    let Some(info) = token_at(tokens, pos) else {
        return (expr.clone(), cursor.moved_to(movement::left(tokens, cursor.caret)));
    };
    if info.kind().is_whitespace() {
        return (
            expr.clone(),
            cursor.moved_to(movement::left(tokens, cursor.caret)),
        );
    }
    let info = info.clone();
    let (next, caret, keep_ac) = delete_core(
        ed,
        expr,
        tokens,
        &info,
        pos - info.start,
        cursor.caret,
        true,
        diagnostics,
    );
    finish(cursor, next, caret, keep_ac)
}

pub(super) fn delete_forward(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    cursor: &CursorState,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Expr, CursorState) {
    if cursor.caret >= stream_len(tokens) {
        return (expr.clone(), cursor.clone());
    }
    let Some(info) = token_at(tokens, cursor.caret) else {
        return (expr.clone(), cursor.clone());
    };
    if info.kind().is_whitespace() {
        return (expr.clone(), cursor.clone());
    }
    let info = info.clone();
    let (next, caret, keep_ac) = delete_core(
        ed,
        expr,
        tokens,
        &info,
        cursor.caret - info.start,
        cursor.caret,
        false,
        diagnostics,
    );
    finish(cursor, next, caret, keep_ac)
}

fn finish(
    cursor: &CursorState,
    next: Expr,
    caret: usize,
    keep_ac: bool,
) -> (Expr, CursorState) {
    let mut moved = cursor.moved_to(caret);
    if keep_ac {
        moved.ac_index = Some(0);
    }
    (next, moved)
}

/// Remove the grapheme/element at char `idx` of `info`'s token. Returns the
/// new tree, the caret, and whether the autocomplete overlay stays open.
#[allow(clippy::too_many_arguments)]
fn delete_core(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    info: &TokenInfo,
    idx: usize,
    caret: usize,
    is_backspace: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Expr, usize, bool) {
    let node = info.node();
    let start = info.start;
    let edited_caret = start + idx;
    let unchanged = |caret: usize| (expr.clone(), caret, false);
    let reposition = if is_backspace { start } else { caret };

    match info.kind() {
        TokenKind::Integer => {
            let Some(Expr::IntLiteral { id, digits }) = find_node(node, expr) else {
                diagnostics.push(Diagnostic::invariant(format!(
                    "integer token for non-integer node {node}"
                )));
                return unchanged(caret);
            };
            let remaining = remove_char(digits, idx);
            let next = if remaining.is_empty() {
                Expr::Blank { id: ed.ids.mint() }
            } else {
                Expr::IntLiteral {
                    id: *id,
                    digits: remaining,
                }
            };
            let new_tree = replace_node(*id, &next, expr);
            (new_tree, edited_caret, false)
        }
        TokenKind::FloatWhole | TokenKind::FloatFraction | TokenKind::FloatPoint => {
            let Some(Expr::FloatLiteral {
                id,
                whole,
                fraction,
            }) = find_node(node, expr)
            else {
                return unchanged(caret);
            };
            let next = match info.kind() {
                TokenKind::FloatWhole => Expr::FloatLiteral {
                    id: *id,
                    whole: remove_char(whole, idx),
                    fraction: fraction.clone(),
                },
                TokenKind::FloatFraction => Expr::FloatLiteral {
                    id: *id,
                    whole: whole.clone(),
                    fraction: remove_char(fraction, idx),
                },
                // Deleting the point merges the halves back into an integer.
                _ => {
                    let merged = format!("{whole}{fraction}");
                    if merged.is_empty() {
                        Expr::Blank { id: ed.ids.mint() }
                    } else {
                        Expr::IntLiteral {
                            id: ed.ids.mint(),
                            digits: merged,
                        }
                    }
                }
            };
            let next = match next {
                Expr::FloatLiteral {
                    ref whole,
                    ref fraction,
                    ..
                } if whole.is_empty() && fraction.is_empty() => Expr::Blank { id: ed.ids.mint() },
                other => other,
            };
            (replace_node(*id, &next, expr), edited_caret, false)
        }
        TokenKind::String
        | TokenKind::StringMLStart
        | TokenKind::StringMLMiddle
        | TokenKind::StringMLEnd => delete_in_string(ed, expr, info, idx, caret, is_backspace),
        TokenKind::Variable => {
            let Some(Expr::Variable { id, name }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            let remaining = remove_char(name, idx);
            let next = if remaining.is_empty() {
                Expr::Blank { id: ed.ids.mint() }
            } else {
                Expr::Variable {
                    id: *id,
                    name: remaining,
                }
            };
            (replace_node(*id, &next, expr), edited_caret, false)
        }
        TokenKind::FnName | TokenKind::FnVersion => {
            let Some(original @ Expr::FnCall { name, .. }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            let offset = if info.kind() == TokenKind::FnVersion {
                name.chars().count() - info.token.len() + idx
            } else {
                idx
            };
            let next = Expr::Partial {
                id: ed.ids.mint(),
                text: remove_char(name, offset),
                wrapped: Box::new(original.clone()),
            };
            (replace_node(node, &next, expr), edited_caret, true)
        }
        TokenKind::ConstructorName => {
            let Some(original @ Expr::Constructor { name, .. }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            let next = Expr::Partial {
                id: ed.ids.mint(),
                text: remove_char(name, idx),
                wrapped: Box::new(original.clone()),
            };
            (replace_node(node, &next, expr), edited_caret, true)
        }
        TokenKind::LetVarName => {
            let Some(Expr::Let {
                id,
                lhs_id,
                lhs,
                rhs,
                body,
            }) = find_node(node, expr)
            else {
                return unchanged(caret);
            };
            if lhs.is_empty() {
                return unchanged(reposition);
            }
            let remaining = remove_char(lhs, idx);
            let new_body = if remaining.is_empty() {
                body.as_ref().clone()
            } else {
                rename_variable_uses(lhs, &remaining, body)
            };
            let next = Expr::Let {
                id: *id,
                lhs_id: *lhs_id,
                lhs: remaining,
                rhs: rhs.clone(),
                body: Box::new(new_body),
            };
            (replace_node(*id, &next, expr), edited_caret, false)
        }
        TokenKind::LambdaVar => {
            let parents = parent_map(expr);
            let Some(lambda_id) = parents.get(&node).copied() else {
                return unchanged(caret);
            };
            let Some(Expr::Lambda { id, params, body }) = find_node(lambda_id, expr) else {
                return unchanged(caret);
            };
            let Some(position) = params.iter().position(|p| p.id == node) else {
                return unchanged(caret);
            };
            let old_name = params[position].name.clone();
            if old_name.is_empty() {
                return unchanged(reposition);
            }
            let remaining = remove_char(&old_name, idx);
            let mut params = params.clone();
            params[position] = LambdaParam {
                id: node,
                name: remaining.clone(),
            };
            let new_body = if remaining.is_empty() {
                body.as_ref().clone()
            } else {
                rename_variable_uses(&old_name, &remaining, body)
            };
            let next = Expr::Lambda {
                id: *id,
                params,
                body: Box::new(new_body),
            };
            (replace_node(lambda_id, &next, expr), edited_caret, false)
        }
        TokenKind::RecordFieldName => delete_record_name(ed, expr, info, idx, caret, reposition),
        TokenKind::FieldName | TokenKind::FieldPartial => {
            let parents = parent_map(expr);
            let Some(access_id) = parents.get(&node).copied() else {
                return unchanged(caret);
            };
            let Some(Expr::FieldAccess {
                id,
                target,
                field_id,
                field,
            }) = find_node(access_id, expr)
            else {
                return unchanged(caret);
            };
            if field.is_empty() {
                // Deleting an empty field slot removes the access itself.
                let target = target.as_ref().clone();
                let next = replace_node(*id, &target, expr);
                return (next, start.saturating_sub(1), false);
            }
            let next = Expr::FieldAccess {
                id: *id,
                target: target.clone(),
                field_id: *field_id,
                field: remove_char(field, idx),
            };
            (replace_node(access_id, &next, expr), edited_caret, false)
        }
        TokenKind::Partial => {
            let Some(Expr::Partial { id, text, wrapped }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            let remaining = remove_char(text, idx);
            if remaining.is_empty() {
                // Aborting the edit restores what the partial replaced.
                let wrapped = wrapped.as_ref().clone();
                return (replace_node(*id, &wrapped, expr), start, false);
            }
            let next = Expr::Partial {
                id: *id,
                text: remaining,
                wrapped: wrapped.clone(),
            };
            (replace_node(*id, &next, expr), edited_caret, true)
        }
        TokenKind::RightPartial => {
            let Some(Expr::RightPartial { id, text, wrapped }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            let remaining = remove_char(text, idx);
            if remaining.is_empty() {
                let wrapped = wrapped.as_ref().clone();
                return (
                    replace_node(*id, &wrapped, expr),
                    start.saturating_sub(1),
                    false,
                );
            }
            let next = Expr::RightPartial {
                id: *id,
                text: remaining,
                wrapped: wrapped.clone(),
            };
            (replace_node(*id, &next, expr), edited_caret, true)
        }
        TokenKind::PatternVariable | TokenKind::PatternInteger | TokenKind::PatternString => {
            delete_in_pattern(ed, expr, info, idx, caret)
        }
        TokenKind::True | TokenKind::False | TokenKind::Null => {
            let next = Expr::Blank { id: ed.ids.mint() };
            (replace_node(node, &next, expr), start, false)
        }
        TokenKind::PatternTrue | TokenKind::PatternFalse | TokenKind::PatternNull => {
            let Some((pattern, _)) = find_pattern(node, expr) else {
                return unchanged(caret);
            };
            let next = Pattern::Blank {
                match_id: pattern.match_id(),
                id: ed.ids.mint(),
            };
            (replace_pattern(node, &next, expr), start, false)
        }
        TokenKind::Blank | TokenKind::Placeholder => {
            delete_blank(ed, expr, tokens, info, caret, is_backspace)
        }
        TokenKind::PatternBlank => unchanged(if is_backspace {
            movement::left(tokens, caret)
        } else {
            caret
        }),
        TokenKind::LetKeyword
        | TokenKind::IfKeyword
        | TokenKind::MatchKeyword
        | TokenKind::LambdaSymbol => collapse_keyword(ed, expr, info, caret, reposition, diagnostics),
        TokenKind::ListOpen => {
            let Some(Expr::List { items, .. }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            if items.is_empty() {
                let next = Expr::Blank { id: ed.ids.mint() };
                return (replace_node(node, &next, expr), start, false);
            }
            unchanged(reposition)
        }
        TokenKind::RecordOpen => {
            let Some(Expr::Record { fields, .. }) = find_node(node, expr) else {
                return unchanged(caret);
            };
            if fields.is_empty() {
                let next = Expr::Blank { id: ed.ids.mint() };
                return (replace_node(node, &next, expr), start, false);
            }
            unchanged(reposition)
        }
        TokenKind::ListComma => delete_list_comma(ed, expr, tokens, info, caret),
        TokenKind::LambdaComma => delete_lambda_comma(ed, expr, tokens, info, caret),
        TokenKind::PipeSymbol => delete_pipe(ed, expr, tokens, info, caret, diagnostics),
        TokenKind::BinOp => delete_binop(ed, expr, info, idx, caret, reposition),
        _ => unchanged(reposition),
    }
}

fn delete_in_string(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    idx: usize,
    caret: usize,
    is_backspace: bool,
) -> (Expr, usize, bool) {
    let node = info.node();
    let Some(Expr::StringLiteral { id, text }) = find_node(node, expr) else {
        return (expr.clone(), caret, false);
    };
    let len = info.token.len();
    let has_open_quote = matches!(info.kind(), TokenKind::String | TokenKind::StringMLStart);
    let has_close_quote = matches!(info.kind(), TokenKind::String | TokenKind::StringMLEnd);
    let on_open = has_open_quote && idx == 0;
    let on_close = has_close_quote && idx == len - 1;

    if on_open || on_close {
        if text.is_empty() {
            let next = Expr::Blank { id: ed.ids.mint() };
            return (replace_node(*id, &next, expr), info.start, false);
        }
        // The quotes of a non-empty string are not deletable; the caret
        // just slides over them.
        let caret = if is_backspace { info.start + idx } else { caret };
        return (expr.clone(), caret, false);
    }

    let logical = info.token.segment_offset.unwrap_or(0) + idx - usize::from(has_open_quote);
    let next = Expr::StringLiteral {
        id: *id,
        text: remove_char(text, logical),
    };
    (replace_node(*id, &next, expr), info.start + idx, false)
}

fn delete_in_pattern(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    idx: usize,
    caret: usize,
) -> (Expr, usize, bool) {
    let node = info.node();
    let Some((pattern, _)) = find_pattern(node, expr) else {
        return (expr.clone(), caret, false);
    };
    let match_id = pattern.match_id();
    let edited = info.start + idx;
    let next = match pattern {
        Pattern::Variable { id, name, .. } => {
            let remaining = remove_char(name, idx);
            if remaining.is_empty() {
                Pattern::Blank {
                    match_id,
                    id: ed.ids.mint(),
                }
            } else {
                Pattern::Variable {
                    match_id,
                    id: *id,
                    name: remaining,
                }
            }
        }
        Pattern::Integer { id, digits, .. } => {
            let remaining = remove_char(digits, idx);
            if remaining.is_empty() {
                Pattern::Blank {
                    match_id,
                    id: ed.ids.mint(),
                }
            } else {
                Pattern::Integer {
                    match_id,
                    id: *id,
                    digits: remaining,
                }
            }
        }
        Pattern::PString { id, text, .. } => {
            let len = info.token.len();
            if idx == 0 || idx == len - 1 {
                if text.is_empty() {
                    Pattern::Blank {
                        match_id,
                        id: ed.ids.mint(),
                    }
                } else {
                    return (expr.clone(), edited, false);
                }
            } else {
                Pattern::PString {
                    match_id,
                    id: *id,
                    text: remove_char(text, idx - 1),
                }
            }
        }
        _ => return (expr.clone(), caret, false),
    };
    (replace_pattern(node, &next, expr), edited, false)
}

fn delete_record_name(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    idx: usize,
    caret: usize,
    reposition: usize,
) -> (Expr, usize, bool) {
    let node = info.node();
    let parents = parent_map(expr);
    let Some(record_id) = parents.get(&node).copied() else {
        return (expr.clone(), caret, false);
    };
    let Some(Expr::Record { id, fields }) = find_node(record_id, expr) else {
        return (expr.clone(), caret, false);
    };
    let Some(position) = fields.iter().position(|f| f.id == node) else {
        return (expr.clone(), caret, false);
    };
    if fields[position].name.is_empty() {
        if fields[position].value.is_blank() {
            // An untyped row disappears whole.
            let mut fields = fields.clone();
            fields.remove(position);
            let next = Expr::Record {
                id: *id,
                fields,
            };
            let new_tree = replace_node(record_id, &next, expr);
            let caret = range_end_of(ed, &new_tree, record_id).saturating_sub(1);
            return (new_tree, caret, false);
        }
        return (expr.clone(), reposition, false);
    }
    let mut fields = fields.clone();
    fields[position].name = remove_char(&fields[position].name, idx);
    let next = Expr::Record { id: *id, fields };
    (replace_node(record_id, &next, expr), info.start + idx, false)
}

fn delete_blank(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    info: &TokenInfo,
    caret: usize,
    is_backspace: bool,
) -> (Expr, usize, bool) {
    let node = info.node();
    let parents = parent_map(expr);
    let parked = if is_backspace { info.start } else { caret };
    let Some(parent_id) = parents.get(&node).copied() else {
        return (expr.clone(), parked, false);
    };
    match find_node(parent_id, expr) {
        Some(Expr::List { id, items }) => {
            let Some(position) = items.iter().position(|item| item.id() == node) else {
                return (expr.clone(), parked, false);
            };
            let mut items = items.clone();
            items.remove(position);
            let anchor = position
                .checked_sub(1)
                .and_then(|p| items.get(p).map(Expr::id));
            let next = Expr::List { id: *id, items };
            let new_tree = replace_node(parent_id, &next, expr);
            let caret = match anchor {
                Some(anchor) => range_end_of(ed, &new_tree, anchor),
                None => range_start_of(ed, &new_tree, parent_id) + 1,
            };
            (new_tree, caret, false)
        }
        Some(Expr::Pipeline { .. }) => {
            let Some(position) = pipeline_position(expr, parent_id, node) else {
                return (expr.clone(), parked, false);
            };
            remove_pipeline_segment(ed, expr, parent_id, position)
        }
        _ => (
            expr.clone(),
            if is_backspace {
                movement::left(tokens, caret)
            } else {
                caret
            },
            false,
        ),
    }
}

fn pipeline_position(expr: &Expr, pipeline: NodeId, segment: NodeId) -> Option<usize> {
    let Some(Expr::Pipeline { segments, .. }) = find_node(pipeline, expr) else {
        return None;
    };
    segments.iter().position(|s| s.id() == segment)
}

/// Remove one pipeline segment; a pipeline reduced to its head stops being
/// a pipeline at all.
fn remove_pipeline_segment(
    ed: &mut Editor,
    expr: &Expr,
    pipeline_id: NodeId,
    position: usize,
) -> (Expr, usize, bool) {
    let Some(Expr::Pipeline { id, segments }) = find_node(pipeline_id, expr) else {
        return (expr.clone(), 0, false);
    };
    let mut segments = segments.clone();
    if position >= segments.len() || segments.len() < 2 {
        return (expr.clone(), 0, false);
    }
    segments.remove(position);
    let anchor = segments
        .get(position.saturating_sub(1))
        .map(Expr::id)
        .unwrap_or(*id);
    let next = if segments.len() == 1 {
        // The sole survivor leaves the pipeline; any pipe target it still
        // holds has nothing to receive and becomes a blank.
        let sole = segments.remove(0);
        map_children(&sole, &mut |child| {
            if matches!(child, Expr::PipeTarget { .. }) {
                Expr::Blank { id: ed.ids.mint() }
            } else {
                child.clone()
            }
        })
    } else {
        Expr::Pipeline {
            id: *id,
            segments,
        }
    };
    let new_tree = replace_node(pipeline_id, &next, expr);
    let caret = range_end_of(ed, &new_tree, anchor);
    (new_tree, caret, false)
}

fn delete_list_comma(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    info: &TokenInfo,
    caret: usize,
) -> (Expr, usize, bool) {
    let node = info.node();
    let Some(Expr::List { id, items }) = find_node(node, expr) else {
        return (expr.clone(), caret, false);
    };
    // The n-th comma of the list separates items n-1 and n.
    let comma_index = tokens
        .iter()
        .filter(|t| t.kind() == TokenKind::ListComma && t.node() == node && t.start < info.start)
        .count()
        + 1;
    let removable = if items.get(comma_index).map(Expr::is_blank).unwrap_or(false) {
        Some(comma_index)
    } else if items
        .get(comma_index - 1)
        .map(Expr::is_blank)
        .unwrap_or(false)
    {
        Some(comma_index - 1)
    } else {
        None
    };
    let Some(position) = removable else {
        return (expr.clone(), info.start, false);
    };
    let mut items = items.clone();
    items.remove(position);
    let anchor = position
        .checked_sub(1)
        .and_then(|p| items.get(p).map(Expr::id));
    let next = Expr::List { id: *id, items };
    let new_tree = replace_node(node, &next, expr);
    let caret = match anchor {
        Some(anchor) => range_end_of(ed, &new_tree, anchor),
        None => range_start_of(ed, &new_tree, node) + 1,
    };
    (new_tree, caret, false)
}

fn delete_lambda_comma(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    info: &TokenInfo,
    caret: usize,
) -> (Expr, usize, bool) {
    let node = info.node();
    let Some(Expr::Lambda { id, params, body }) = find_node(node, expr) else {
        return (expr.clone(), caret, false);
    };
    let comma_index = tokens
        .iter()
        .filter(|t| t.kind() == TokenKind::LambdaComma && t.node() == node && t.start < info.start)
        .count()
        + 1;
    let removable = if params
        .get(comma_index)
        .map(|p| p.name.is_empty())
        .unwrap_or(false)
    {
        Some(comma_index)
    } else if params
        .get(comma_index - 1)
        .map(|p| p.name.is_empty())
        .unwrap_or(false)
    {
        Some(comma_index - 1)
    } else {
        None
    };
    let Some(position) = removable else {
        return (expr.clone(), info.start, false);
    };
    if params.len() < 2 {
        return (expr.clone(), info.start, false);
    }
    let mut params = params.clone();
    params.remove(position);
    let anchor = params[position.saturating_sub(1).min(params.len() - 1)].id;
    let next = Expr::Lambda {
        id: *id,
        params,
        body: body.clone(),
    };
    let new_tree = replace_node(node, &next, expr);
    let caret = range_end_of(ed, &new_tree, anchor);
    (new_tree, caret, false)
}

fn delete_pipe(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    info: &TokenInfo,
    caret: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Expr, usize, bool) {
    let node = info.node();
    // The n-th pipe token introduces segment n.
    let position = tokens
        .iter()
        .filter(|t| t.kind() == TokenKind::PipeSymbol && t.node() == node && t.start < info.start)
        .count()
        + 1;
    if pipeline_position_exists(expr, node, position) {
        remove_pipeline_segment(ed, expr, node, position)
    } else {
        diagnostics.push(Diagnostic::invariant(format!(
            "pipe token without segment {position} on {node}"
        )));
        (expr.clone(), caret, false)
    }
}

fn pipeline_position_exists(expr: &Expr, pipeline: NodeId, position: usize) -> bool {
    matches!(
        find_node(pipeline, expr),
        Some(Expr::Pipeline { segments, .. }) if position < segments.len()
    )
}

fn delete_binop(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    idx: usize,
    caret: usize,
    reposition: usize,
) -> (Expr, usize, bool) {
    let node = info.node();
    let Some(Expr::BinOp {
        id, op, lhs, rhs, on_rail,
    }) = find_node(node, expr)
    else {
        return (expr.clone(), caret, false);
    };
    if op.chars().count() > 1 {
        let next = Expr::BinOp {
            id: *id,
            op: remove_char(op, idx),
            lhs: lhs.clone(),
            rhs: rhs.clone(),
            on_rail: *on_rail,
        };
        return (replace_node(*id, &next, expr), info.start + idx, false);
    }
    if rhs.is_blank_like() {
        let lhs = lhs.as_ref().clone();
        let anchor = lhs.id();
        let new_tree = replace_node(*id, &lhs, expr);
        let caret = range_end_of(ed, &new_tree, anchor);
        return (new_tree, caret, false);
    }
    if lhs.is_blank_like() {
        let rhs = rhs.as_ref().clone();
        let anchor = rhs.id();
        let new_tree = replace_node(*id, &rhs, expr);
        let caret = range_start_of(ed, &new_tree, anchor);
        return (new_tree, caret, false);
    }
    (expr.clone(), reposition, false)
}

/// Collapse a structural construct to a blank — but only when every child
/// is itself blank. Anything typed survives; the keystroke then only moves
/// the caret.
fn collapse_keyword(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    caret: usize,
    reposition: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Expr, usize, bool) {
    let node = info.node();
    let Some(found) = find_node(node, expr) else {
        diagnostics.push(Diagnostic::invariant(format!(
            "keyword token for missing node {node}"
        )));
        return (expr.clone(), caret, false);
    };
    let collapsible = match found {
        Expr::Let { lhs, rhs, body, .. } => {
            lhs.is_empty() && rhs.is_blank() && body.is_blank()
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => cond.is_blank() && then_branch.is_blank() && else_branch.is_blank(),
        Expr::Match { subject, arms, .. } => {
            subject.is_blank()
                && arms
                    .iter()
                    .all(|arm| arm.pattern.is_blank() && arm.body.is_blank())
        }
        Expr::Lambda { params, body, .. } => {
            params.iter().all(|p| p.name.is_empty()) && body.is_blank()
        }
        _ => false,
    };
    if !collapsible {
        return (expr.clone(), reposition, false);
    }
    let next = Expr::Blank { id: ed.ids.mint() };
    (replace_node(node, &next, expr), info.start, false)
}

fn range_end_of(ed: &Editor, expr: &Expr, node: NodeId) -> usize {
    let tokens = tokenize_info(expr, ed.sigs);
    subtree_ranges(expr, &tokens)
        .get(&node)
        .map(|range| range.1)
        .unwrap_or_else(|| stream_len(&tokens))
}

fn range_start_of(ed: &Editor, expr: &Expr, node: NodeId) -> usize {
    let tokens = tokenize_info(expr, ed.sigs);
    subtree_ranges(expr, &tokens)
        .get(&node)
        .map(|range| range.0)
        .unwrap_or(0)
}
