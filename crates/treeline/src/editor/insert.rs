//! Character insertion. The dispatch order mirrors the engine's prioritized
//! rules: partial continuation (or commit-and-reapply) first, then text
//! edits inside a token, then filling a blank, then infix wrapping of a
//! complete expression, then separator/closer handling; anything left is a
//! dead end that changes nothing.

use crate::cursor::CursorState;
use crate::diagnostics::Diagnostic;
use crate::event::{is_identifier_char, is_infix_char, InputEvent};
use crate::expr::{
    find_node, parent_map, rename_variable_uses, replace_node, replace_pattern, Expr, LambdaParam,
    Pattern,
};
use crate::id::NodeId;
use crate::index::{neighbours, subtree_ranges, token_at};
use crate::provider::ParamType;
use crate::token::{TokenInfo, TokenKind};

use super::{commit, partial_at, rows, splice_char, EditResult, Editor};

pub(super) fn insert_char(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    cursor: &CursorState,
    c: char,
    allow_commit: bool,
) -> EditResult {
    let caret = cursor.caret;
    let mut diagnostics = Vec::new();

    // Rule: a character typed onto an in-progress partial either continues
    // it or commits it and re-applies itself to the committed result. The
    // recursive dispatch happens once; commits are disabled inside it.
    if let Some(info) = partial_at(tokens, caret) {
        if continues_partial(info.kind(), c) {
            let idx = caret - info.start;
            if let Some((next, caret)) = splice_partial(expr, info, idx, c) {
                return done(next, with_autocomplete(cursor, caret), diagnostics);
            }
            // Field partials have no partial node of their own; they are
            // edited as text below.
        } else if allow_commit {
            let (committed, committed_cursor) =
                commit::commit_at(ed, expr, tokens, info, cursor, &mut diagnostics);
            let inner = ed.dispatch_guarded(
                &committed,
                &committed_cursor,
                InputEvent::Insert(c),
                false,
            );
            diagnostics.extend(inner.diagnostics);
            return done(inner.expr, inner.cursor, diagnostics);
        } else {
            return done(expr.clone(), cursor.clone(), diagnostics);
        }
    }

    // Text edits: append to the token ending at the caret, or insert into
    // the token under it.
    if let Some(left) = token_ending_at(tokens, caret) {
        if let Some((next, caret)) =
            edit_text(ed, expr, left, left.token.len(), c, &mut diagnostics)
        {
            return done(next, cursor.moved_to(caret), diagnostics);
        }
    }
    if let Some(info) = token_at(tokens, caret).filter(|t| t.kind().is_text()) {
        if caret > info.start || starts_text(info.kind(), c) {
            if let Some((next, caret)) =
                edit_text(ed, expr, info, caret - info.start, c, &mut diagnostics)
            {
                return done(next, cursor.moved_to(caret), diagnostics);
            }
        }
    }

    // Filling a blank.
    if let Some(info) = blank_target(tokens, caret) {
        if let Some((next, caret, autocomplete)) = fill_blank(ed, expr, info, c) {
            let cursor = if autocomplete {
                with_autocomplete(cursor, caret)
            } else {
                cursor.moved_to(caret)
            };
            return done(next, cursor, diagnostics);
        }
        return done(expr.clone(), cursor.clone(), diagnostics);
    }

    // Infix trigger after a complete expression wraps it; a dot starts a
    // field access.
    if is_infix_char(c) || c == '.' {
        if let Some((next, caret)) = wrap_complete(ed, expr, tokens, caret, c) {
            let cursor = if c == '.' {
                cursor.moved_to(caret)
            } else {
                with_autocomplete(cursor, caret)
            };
            return done(next, cursor, diagnostics);
        }
    }

    // A comma inside a list opens the next element.
    if c == ',' {
        if let Some((next, cursor)) = rows::comma_insert(ed, expr, tokens, cursor) {
            return done(next, cursor, diagnostics);
        }
    }

    // Typing a closer right before the matching closer just steps past it.
    if matches!(c, ']' | '}' | ')') {
        if let Some(info) = token_at(tokens, caret) {
            let matches_closer = matches!(
                (c, info.kind()),
                (']', TokenKind::ListClose)
                    | ('}', TokenKind::RecordClose)
                    | (')', TokenKind::ParenClose)
            );
            if matches_closer && info.start == caret {
                return done(expr.clone(), cursor.moved_to(caret + 1), diagnostics);
            }
        }
    }

    // Typing between the delimiters of an empty collection opens its first
    // row, then the character applies to the fresh blank.
    if let Some((next, caret)) = open_empty_collection(ed, expr, tokens, caret, c) {
        let next_tokens = crate::tokenizer::tokenize_info(&next, ed.sigs);
        let mut inner = insert_char(ed, &next, &next_tokens, &cursor.moved_to(caret), c, false);
        diagnostics.append(&mut inner.diagnostics);
        return done(inner.expr, inner.cursor, diagnostics);
    }
    if let Some((next, caret)) = open_empty_record(ed, expr, tokens, caret, c) {
        return done(next, cursor.moved_to(caret), diagnostics);
    }

    // Dead end: nothing applies at this caret.
    done(expr.clone(), cursor.clone(), diagnostics)
}

/// An empty list under the caret grows a blank first element the typed
/// character can land in.
fn open_empty_collection(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    caret: usize,
    c: char,
) -> Option<(Expr, usize)> {
    if !(c.is_ascii_digit() || c.is_ascii_alphabetic() || matches!(c, '_' | '"' | '[' | '{' | '\\'))
    {
        return None;
    }
    let info = token_at(tokens, caret)?;
    if info.kind() != TokenKind::ListClose || info.start != caret {
        return None;
    }
    let Some(Expr::List { id, items }) = find_node(info.node(), expr) else {
        return None;
    };
    if !items.is_empty() {
        return None;
    }
    let next = Expr::List {
        id: *id,
        items: vec![Expr::Blank { id: ed.ids.mint() }],
    };
    Some((replace_node(*id, &next, expr), caret))
}

/// An empty record under the caret grows a field named by the typed
/// character.
fn open_empty_record(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    caret: usize,
    c: char,
) -> Option<(Expr, usize)> {
    if !(c.is_ascii_alphabetic() || c == '_') {
        return None;
    }
    let info = token_at(tokens, caret)?;
    if info.kind() != TokenKind::RecordClose || info.start != caret {
        return None;
    }
    let Some(Expr::Record { id, fields }) = find_node(info.node(), expr) else {
        return None;
    };
    if !fields.is_empty() {
        return None;
    }
    let field = crate::expr::RecordField {
        id: ed.ids.mint(),
        name: c.to_string(),
        value: Expr::Blank { id: ed.ids.mint() },
    };
    let field_id = field.id;
    let next = Expr::Record {
        id: *id,
        fields: vec![field],
    };
    let next_tree = replace_node(*id, &next, expr);
    let next_tokens = crate::tokenizer::tokenize_info(&next_tree, ed.sigs);
    let caret = next_tokens
        .iter()
        .find(|t| t.node() == field_id && t.kind() == TokenKind::RecordFieldName)
        .map(|t| t.end)
        .unwrap_or(caret);
    Some((next_tree, caret))
}

fn done(expr: Expr, cursor: CursorState, diagnostics: Vec<Diagnostic>) -> EditResult {
    EditResult {
        expr,
        cursor,
        diagnostics,
    }
}

fn with_autocomplete(cursor: &CursorState, caret: usize) -> CursorState {
    let mut next = cursor.moved_to(caret);
    next.ac_index = Some(0);
    next
}

fn continues_partial(kind: TokenKind, c: char) -> bool {
    match kind {
        TokenKind::Partial | TokenKind::FieldPartial => is_identifier_char(c),
        TokenKind::RightPartial => is_infix_char(c),
        _ => false,
    }
}

fn splice_partial(
    expr: &Expr,
    info: &TokenInfo,
    idx: usize,
    c: char,
) -> Option<(Expr, usize)> {
    match find_node(info.node(), expr)? {
        Expr::Partial { id, text, wrapped } => {
            let next = Expr::Partial {
                id: *id,
                text: splice_char(text, idx, c),
                wrapped: wrapped.clone(),
            };
            Some((replace_node(*id, &next, expr), info.start + idx + 1))
        }
        Expr::RightPartial { id, text, wrapped } => {
            let next = Expr::RightPartial {
                id: *id,
                text: splice_char(text, idx, c),
                wrapped: wrapped.clone(),
            };
            Some((replace_node(*id, &next, expr), info.start + idx + 1))
        }
        _ => None,
    }
}

fn token_ending_at<'t>(tokens: &'t [TokenInfo], caret: usize) -> Option<&'t TokenInfo> {
    tokens
        .iter()
        .find(|info| info.end == caret && info.kind().is_text())
}

/// Whether typing `c` at the very start of a token of this kind should be
/// treated as a text edit rather than falling through to wrapping rules.
fn starts_text(kind: TokenKind, c: char) -> bool {
    match kind {
        TokenKind::Integer
        | TokenKind::FloatWhole
        | TokenKind::FloatFraction
        | TokenKind::PatternInteger => c.is_ascii_digit(),
        _ => is_identifier_char(c),
    }
}

fn blank_target<'t>(tokens: &'t [TokenInfo], caret: usize) -> Option<&'t TokenInfo> {
    tokens
        .iter()
        .find(|info| info.kind().is_blank() && info.start <= caret && caret <= info.end)
}

/// Insert `c` at position `idx` of the text token `info`. Returns the new
/// tree and caret, or `None` when `c` does not apply to this token.
fn edit_text(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    idx: usize,
    c: char,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(Expr, usize)> {
    let node = info.node();
    let caret = info.start + idx;
    match info.kind() {
        TokenKind::Integer => {
            let Some(Expr::IntLiteral { id, digits }) = find_node(node, expr) else {
                diagnostics.push(Diagnostic::invariant(format!(
                    "integer token for non-integer node {node}"
                )));
                return None;
            };
            if c.is_ascii_digit() {
                let next = Expr::IntLiteral {
                    id: *id,
                    digits: splice_char(digits, idx, c),
                };
                return Some((replace_node(*id, &next, expr), caret + 1));
            }
            if c == '.' {
                // Splitting an integer at the caret turns it into a float.
                let chars: Vec<char> = digits.chars().collect();
                let next = Expr::FloatLiteral {
                    id: ed.ids.mint(),
                    whole: chars[..idx.min(chars.len())].iter().collect(),
                    fraction: chars[idx.min(chars.len())..].iter().collect(),
                };
                return Some((replace_node(*id, &next, expr), caret + 1));
            }
            None
        }
        TokenKind::FloatWhole => {
            let Some(Expr::FloatLiteral {
                id,
                whole,
                fraction,
            }) = find_node(node, expr)
            else {
                return None;
            };
            if !c.is_ascii_digit() {
                return None;
            }
            let next = Expr::FloatLiteral {
                id: *id,
                whole: splice_char(whole, idx, c),
                fraction: fraction.clone(),
            };
            Some((replace_node(*id, &next, expr), caret + 1))
        }
        TokenKind::FloatFraction => {
            let Some(Expr::FloatLiteral {
                id,
                whole,
                fraction,
            }) = find_node(node, expr)
            else {
                return None;
            };
            if !c.is_ascii_digit() {
                return None;
            }
            let next = Expr::FloatLiteral {
                id: *id,
                whole: whole.clone(),
                fraction: splice_char(fraction, idx, c),
            };
            Some((replace_node(*id, &next, expr), caret + 1))
        }
        TokenKind::FloatPoint => {
            // Typing a digit right after the point prepends to the fraction.
            let Some(Expr::FloatLiteral {
                id,
                whole,
                fraction,
            }) = find_node(node, expr)
            else {
                return None;
            };
            if idx == 1 && c.is_ascii_digit() {
                let next = Expr::FloatLiteral {
                    id: *id,
                    whole: whole.clone(),
                    fraction: splice_char(fraction, 0, c),
                };
                return Some((replace_node(*id, &next, expr), caret + 1));
            }
            None
        }
        TokenKind::String | TokenKind::StringMLStart | TokenKind::StringMLMiddle
        | TokenKind::StringMLEnd => edit_string(expr, info, idx, c),
        TokenKind::Variable => {
            let Some(Expr::Variable { id, name }) = find_node(node, expr) else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            // Editing a reference turns it into a partial so the overlay
            // can offer completions; aborting restores the original.
            let original = Expr::Variable {
                id: *id,
                name: name.clone(),
            };
            let next = Expr::Partial {
                id: ed.ids.mint(),
                text: splice_char(name, idx, c),
                wrapped: Box::new(original),
            };
            Some((replace_node(node, &next, expr), caret + 1))
        }
        TokenKind::FnName | TokenKind::FnVersion => {
            let Some(original @ Expr::FnCall { name, .. }) = find_node(node, expr) else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let offset = if info.kind() == TokenKind::FnVersion {
                name.chars().count() - info.token.len() + idx
            } else {
                idx
            };
            let next = Expr::Partial {
                id: ed.ids.mint(),
                text: splice_char(name, offset, c),
                wrapped: Box::new(original.clone()),
            };
            Some((replace_node(node, &next, expr), caret + 1))
        }
        TokenKind::ConstructorName => {
            let Some(original @ Expr::Constructor { name, .. }) = find_node(node, expr) else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let next = Expr::Partial {
                id: ed.ids.mint(),
                text: splice_char(name, idx, c),
                wrapped: Box::new(original.clone()),
            };
            Some((replace_node(node, &next, expr), caret + 1))
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
                diagnostics.push(Diagnostic::invariant(format!(
                    "let name token for non-let node {node}"
                )));
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let (new_name, caret) = splice_name(lhs, idx, c, info.start);
            let new_body = if lhs.is_empty() || new_name.is_empty() {
                body.as_ref().clone()
            } else {
                rename_variable_uses(lhs, &new_name, body)
            };
            let next = Expr::Let {
                id: *id,
                lhs_id: *lhs_id,
                lhs: new_name,
                rhs: rhs.clone(),
                body: Box::new(new_body),
            };
            Some((replace_node(*id, &next, expr), caret))
        }
        TokenKind::LambdaVar => {
            let parents = parent_map(expr);
            let lambda_id = *parents.get(&node)?;
            let Some(Expr::Lambda { id, params, body }) = find_node(lambda_id, expr) else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let position = params.iter().position(|p| p.id == node)?;
            let old_name = params[position].name.clone();
            let (new_name, caret) = splice_name(&old_name, idx, c, info.start);
            let mut params = params.clone();
            params[position] = LambdaParam {
                id: node,
                name: new_name.clone(),
            };
            let new_body = if old_name.is_empty() || new_name.is_empty() {
                body.as_ref().clone()
            } else {
                rename_variable_uses(&old_name, &new_name, body)
            };
            let next = Expr::Lambda {
                id: *id,
                params,
                body: Box::new(new_body),
            };
            Some((replace_node(lambda_id, &next, expr), caret))
        }
        TokenKind::RecordFieldName => {
            let parents = parent_map(expr);
            let record_id = *parents.get(&node)?;
            let Some(Expr::Record { id, fields }) = find_node(record_id, expr) else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let position = fields.iter().position(|f| f.id == node)?;
            let (new_name, caret) = splice_name(&fields[position].name, idx, c, info.start);
            let mut fields = fields.clone();
            fields[position].name = new_name;
            let next = Expr::Record { id: *id, fields };
            Some((replace_node(record_id, &next, expr), caret))
        }
        TokenKind::FieldName | TokenKind::FieldPartial => {
            let parents = parent_map(expr);
            let access_id = *parents.get(&node)?;
            let Some(Expr::FieldAccess {
                id,
                target,
                field_id,
                field,
            }) = find_node(access_id, expr)
            else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let (new_name, caret) = splice_name(field, idx, c, info.start);
            let next = Expr::FieldAccess {
                id: *id,
                target: target.clone(),
                field_id: *field_id,
                field: new_name,
            };
            Some((replace_node(access_id, &next, expr), caret))
        }
        TokenKind::PatternVariable => {
            let (pattern, _) = crate::expr::find_pattern(node, expr)?;
            let Pattern::Variable { match_id, id, name } = pattern else {
                return None;
            };
            if !is_identifier_char(c) {
                return None;
            }
            let next = Pattern::Variable {
                match_id: *match_id,
                id: *id,
                name: splice_char(name, idx, c),
            };
            Some((replace_pattern(node, &next, expr), caret + 1))
        }
        TokenKind::PatternInteger => {
            let (pattern, _) = crate::expr::find_pattern(node, expr)?;
            let Pattern::Integer {
                match_id,
                id,
                digits,
            } = pattern
            else {
                return None;
            };
            if !c.is_ascii_digit() {
                return None;
            }
            let next = Pattern::Integer {
                match_id: *match_id,
                id: *id,
                digits: splice_char(digits, idx, c),
            };
            Some((replace_pattern(node, &next, expr), caret + 1))
        }
        TokenKind::PatternString => {
            let (pattern, _) = crate::expr::find_pattern(node, expr)?;
            let Pattern::PString { match_id, id, text } = pattern else {
                return None;
            };
            let len = info.token.len();
            if idx == 0 || idx >= len {
                return None;
            }
            let next = Pattern::PString {
                match_id: *match_id,
                id: *id,
                text: splice_char(text, idx - 1, c),
            };
            Some((replace_pattern(node, &next, expr), caret + 1))
        }
        TokenKind::BinOp => {
            // A trigger adjacent to an existing operator edits it in place
            // instead of opening a new wrapper.
            let Some(Expr::BinOp {
                id,
                op,
                lhs,
                rhs,
                on_rail,
            }) = find_node(node, expr)
            else {
                return None;
            };
            if !is_infix_char(c) || (idx != 0 && idx != info.token.len()) {
                return None;
            }
            let next = Expr::BinOp {
                id: *id,
                op: splice_char(op, idx, c),
                lhs: lhs.clone(),
                rhs: rhs.clone(),
                on_rail: *on_rail,
            };
            Some((replace_node(*id, &next, expr), caret + 1))
        }
        _ => None,
    }
}

/// Splice into a possibly-blank name slot: a slot rendering as a blank has
/// an empty backing string, so the first typed char replaces the rendering
/// wholesale.
fn splice_name(name: &str, idx: usize, c: char, token_start: usize) -> (String, usize) {
    if name.is_empty() {
        (c.to_string(), token_start + 1)
    } else {
        (splice_char(name, idx, c), token_start + idx + 1)
    }
}

fn edit_string(expr: &Expr, info: &TokenInfo, idx: usize, c: char) -> Option<(Expr, usize)> {
    let node = info.node();
    let Some(Expr::StringLiteral { id, text }) = find_node(node, expr) else {
        return None;
    };
    let len = info.token.len();
    let caret = info.start + idx;
    let has_open_quote = matches!(info.kind(), TokenKind::String | TokenKind::StringMLStart);
    let has_close_quote = matches!(info.kind(), TokenKind::String | TokenKind::StringMLEnd);

    if has_open_quote && idx == 0 {
        return None;
    }
    if has_close_quote && idx == len {
        return None;
    }
    // Typing the closing quote right before it steps past instead of
    // splicing an escaped quote.
    if c == '"' && has_close_quote && idx == len - 1 {
        return Some((expr.clone(), caret + 1));
    }

    let logical = info.token.segment_offset.unwrap_or(0) + idx
        - usize::from(has_open_quote);
    let next = Expr::StringLiteral {
        id: *id,
        text: splice_char(text, logical, c),
    };
    Some((replace_node(*id, &next, expr), caret + 1))
}

fn fill_blank(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    c: char,
) -> Option<(Expr, usize, bool)> {
    let node = info.node();
    let start = info.start;

    if info.kind() == TokenKind::PatternBlank {
        let (pattern, _) = crate::expr::find_pattern(node, expr)?;
        let match_id = pattern.match_id();
        let next = if c.is_ascii_digit() {
            Pattern::Integer {
                match_id,
                id: ed.ids.mint(),
                digits: c.to_string(),
            }
        } else if c == '"' {
            Pattern::PString {
                match_id,
                id: ed.ids.mint(),
                text: String::new(),
            }
        } else if is_identifier_char(c) {
            Pattern::Variable {
                match_id,
                id: ed.ids.mint(),
                name: c.to_string(),
            }
        } else {
            return None;
        };
        return Some((replace_pattern(node, &next, expr), start + 1, false));
    }

    let original = find_node(node, expr)?.clone();
    if c.is_ascii_digit() {
        let next = Expr::IntLiteral {
            id: ed.ids.mint(),
            digits: c.to_string(),
        };
        return Some((replace_node(node, &next, expr), start + 1, false));
    }
    match c {
        '"' => {
            let next = Expr::StringLiteral {
                id: ed.ids.mint(),
                text: String::new(),
            };
            Some((replace_node(node, &next, expr), start + 1, false))
        }
        '[' => {
            let next = Expr::List {
                id: ed.ids.mint(),
                items: Vec::new(),
            };
            Some((replace_node(node, &next, expr), start + 1, false))
        }
        '{' => {
            let next = Expr::Record {
                id: ed.ids.mint(),
                fields: Vec::new(),
            };
            Some((replace_node(node, &next, expr), start + 1, false))
        }
        '\\' => {
            let params = block_params(ed, expr, node);
            let next = Expr::Lambda {
                id: ed.ids.mint(),
                params,
                body: Box::new(Expr::Blank { id: ed.ids.mint() }),
            };
            Some((replace_node(node, &next, expr), start + 1, false))
        }
        c if c.is_ascii_alphabetic() || c == '_' => {
            let next = Expr::Partial {
                id: ed.ids.mint(),
                text: c.to_string(),
                wrapped: Box::new(original),
            };
            Some((replace_node(node, &next, expr), start + 1, true))
        }
        _ => None,
    }
}

/// Parameter names for a lambda typed into a known block-argument position;
/// a single unnamed parameter otherwise.
fn block_params(ed: &mut Editor, expr: &Expr, blank: NodeId) -> Vec<LambdaParam> {
    let parents = parent_map(expr);
    let declared = parents.get(&blank).and_then(|parent| {
        let Some(Expr::FnCall { name, args, .. }) = find_node(*parent, expr) else {
            return None;
        };
        let index = args.iter().position(|arg| arg.id() == blank)?;
        let params = ed.sigs.params_of(name)?;
        let param = params.get(index)?;
        if param.typ == ParamType::Block && !param.block_args.is_empty() {
            Some(param.block_args.clone())
        } else {
            None
        }
    });
    let names = declared.unwrap_or_else(|| vec![String::new()]);
    names
        .into_iter()
        .map(|name| LambdaParam {
            id: ed.ids.mint(),
            name,
        })
        .collect()
}

/// The largest complete expression whose rendering ends exactly at the
/// caret — the thing an infix trigger wraps.
fn wrap_candidate(expr: &Expr, tokens: &[TokenInfo], caret: usize) -> Option<NodeId> {
    let (left, _) = neighbours(tokens, caret);
    let left = left.token()?;
    if left.end != caret {
        return None;
    }
    let ranges = subtree_ranges(expr, tokens);
    let parents = parent_map(expr);

    // The owning node itself must end here; keywords in the middle of their
    // construct (like `then`) fail this check and nothing wraps.
    let mut current = resolve_expr_node(expr, &parents, left.node())?;
    if ranges.get(&current).map(|r| r.1) != Some(caret) {
        return None;
    }
    while let Some(parent) = parents.get(&current) {
        let parent_is_expr = find_node(*parent, expr).is_some();
        if parent_is_expr && ranges.get(parent).map(|r| r.1) == Some(caret) {
            current = *parent;
        } else {
            break;
        }
    }
    Some(current)
}

/// Map an owning id that may belong to a binding/field/pattern onto the
/// nearest enclosing expression node.
fn resolve_expr_node(
    expr: &Expr,
    parents: &std::collections::HashMap<NodeId, NodeId>,
    mut id: NodeId,
) -> Option<NodeId> {
    loop {
        if find_node(id, expr).is_some() {
            return Some(id);
        }
        id = *parents.get(&id)?;
    }
}

fn wrap_complete(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    caret: usize,
    c: char,
) -> Option<(Expr, usize)> {
    let target = wrap_candidate(expr, tokens, caret)?;
    let original = find_node(target, expr)?.clone();

    if c == '.' {
        if let Expr::IntLiteral { digits, .. } = &original {
            // A dot at the end of an integer continues it as a float.
            let next = Expr::FloatLiteral {
                id: ed.ids.mint(),
                whole: digits.clone(),
                fraction: String::new(),
            };
            let next_tree = replace_node(target, &next, expr);
            return Some((next_tree, caret + 1));
        }
        let next = Expr::FieldAccess {
            id: ed.ids.mint(),
            target: Box::new(original),
            field_id: ed.ids.mint(),
            field: String::new(),
        };
        let next_tree = replace_node(target, &next, expr);
        return Some((next_tree, caret + 1));
    }

    let next = Expr::RightPartial {
        id: ed.ids.mint(),
        text: c.to_string(),
        wrapped: Box::new(original),
    };
    let next_tree = replace_node(target, &next, expr);
    // Rendering appends a separator and the operator text after the
    // wrapped expression.
    Some((next_tree, caret + 2))
}
