//! Committing an in-progress `Partial`/`RightPartial`: replace it with the
//! real node it resolves to, re-bind previously-filled arguments by
//! parameter name and type, and rescue unmatched non-blank arguments into
//! synthetic lets so no typed value is silently discarded.

use std::sync::OnceLock;

use regex::Regex;

use crate::cursor::CursorState;
use crate::diagnostics::Diagnostic;
use crate::event::is_infix_char;
use crate::expr::{find_node, replace_node, Expr, LambdaParam};
use crate::id::IdAllocator;
use crate::provider::{ParamType, Parameter, SignatureLookup, Suggestion};
use crate::token::{TokenInfo, TokenKind};

use super::{caret_into, query_context, Editor};

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("static regex"))
}

fn float_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]*)\.([0-9]*)$").expect("static regex"))
}

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$").expect("static regex")
    })
}

/// Commit the partial under `info`. Falls back to a caret-only change when
/// the text resolves to nothing.
pub(super) fn commit_at(
    ed: &mut Editor,
    expr: &Expr,
    tokens: &[TokenInfo],
    info: &TokenInfo,
    cursor: &CursorState,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Expr, CursorState) {
    let chosen = cursor.ac_index.and_then(|index| {
        ed.provider
            .suggestions(&query_context(expr, info))
            .get(index)
            .cloned()
    });
    let committed = match info.kind() {
        TokenKind::Partial => commit_partial(ed, expr, info, chosen.as_ref(), diagnostics),
        TokenKind::RightPartial => {
            commit_right_partial(ed, expr, info, chosen.as_ref(), diagnostics)
        }
        TokenKind::FieldPartial => commit_field(ed, expr, info, chosen.as_ref()),
        _ => None,
    };
    match committed {
        Some((next, caret)) => (next, cursor.moved_to(caret)),
        None => (expr.clone(), cursor.moved_to(cursor.caret)),
    }
}

fn commit_partial(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    chosen: Option<&Suggestion>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(Expr, usize)> {
    let Some(Expr::Partial { id, text, wrapped }) = find_node(info.node(), expr) else {
        diagnostics.push(Diagnostic::invariant(format!(
            "commit target {} is not a partial",
            info.node()
        )));
        return None;
    };
    let partial_id = *id;
    let wrapped = wrapped.as_ref().clone();

    let (base, within) = match chosen {
        Some(suggestion) => {
            let (expr, within) = ed.provider.to_expression(suggestion, &mut ed.ids);
            (expr, Some(within))
        }
        None => (infer_expression(text, ed.sigs, &mut ed.ids)?, None),
    };
    let base_id = base.id();
    let replacement = match base {
        call @ Expr::FnCall { .. } => realign_arguments(&wrapped, call, ed.sigs, &mut ed.ids),
        // An operator partial over a non-blank expression keeps it as the
        // left operand.
        Expr::BinOp {
            op, rhs, on_rail, ..
        } if !wrapped.is_blank_like() => Expr::BinOp {
            id: ed.ids.mint(),
            op,
            lhs: Box::new(wrapped.clone()),
            rhs,
            on_rail,
        },
        other => other,
    };

    let focus = replacement.id();
    let next = replace_node(partial_id, &replacement, expr);
    // A chosen suggestion knows where its caret belongs within its own
    // rendering; realignment wrappers invalidate that and fall back to the
    // first blank.
    let caret = match within {
        Some(within) if focus == base_id => {
            let tokens = crate::tokenizer::tokenize_info(&next, ed.sigs);
            crate::index::subtree_ranges(&next, &tokens)
                .get(&focus)
                .map(|range| range.0 + within)
                .unwrap_or_else(|| caret_into(&next, focus, ed.sigs))
        }
        _ => caret_into(&next, focus, ed.sigs),
    };
    Some((next, caret))
}

fn commit_right_partial(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    chosen: Option<&Suggestion>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(Expr, usize)> {
    let Some(Expr::RightPartial { id, text, wrapped }) = find_node(info.node(), expr) else {
        diagnostics.push(Diagnostic::invariant(format!(
            "commit target {} is not a right partial",
            info.node()
        )));
        return None;
    };
    let partial_id = *id;
    let wrapped = wrapped.as_ref().clone();
    let op = chosen.map(|s| s.name.clone()).unwrap_or_else(|| text.clone());

    let replacement = if op == "|>" {
        match wrapped {
            Expr::Pipeline { id, mut segments } => {
                segments.push(Expr::Blank { id: ed.ids.mint() });
                Expr::Pipeline { id, segments }
            }
            seed => Expr::Pipeline {
                id: ed.ids.mint(),
                segments: vec![seed, Expr::Blank { id: ed.ids.mint() }],
            },
        }
    } else {
        Expr::BinOp {
            id: ed.ids.mint(),
            op,
            lhs: Box::new(wrapped),
            rhs: Box::new(Expr::Blank { id: ed.ids.mint() }),
            on_rail: false,
        }
    };

    let focus = replacement.id();
    let next = replace_node(partial_id, &replacement, expr);
    let caret = caret_into(&next, focus, ed.sigs);
    Some((next, caret))
}

fn commit_field(
    ed: &mut Editor,
    expr: &Expr,
    info: &TokenInfo,
    chosen: Option<&Suggestion>,
) -> Option<(Expr, usize)> {
    let chosen = chosen?;
    let access = field_parent(expr, info.node())?;
    let Expr::FieldAccess {
        id,
        target,
        field_id,
        ..
    } = access
    else {
        return None;
    };
    let replacement = Expr::FieldAccess {
        id: *id,
        target: target.clone(),
        field_id: *field_id,
        field: chosen.name.clone(),
    };
    let next = replace_node(*id, &replacement, expr);
    let caret = caret_into(&next, *id, ed.sigs);
    Some((next, caret))
}

fn field_parent(expr: &Expr, field_id: crate::id::NodeId) -> Option<&Expr> {
    let parents = crate::expr::parent_map(expr);
    let parent = parents.get(&field_id)?;
    find_node(*parent, expr)
}

/// Resolve free-typed partial text into an expression: literals by shape,
/// known names as calls, identifiers as variable references, operator text
/// as an operator over the text's wrapped value.
pub(super) fn infer_expression(
    text: &str,
    sigs: &dyn SignatureLookup,
    ids: &mut IdAllocator,
) -> Option<Expr> {
    match text {
        "true" => {
            return Some(Expr::BoolLiteral {
                id: ids.mint(),
                value: true,
            })
        }
        "false" => {
            return Some(Expr::BoolLiteral {
                id: ids.mint(),
                value: false,
            })
        }
        "null" => return Some(Expr::NullLiteral { id: ids.mint() }),
        _ => {}
    }
    if int_re().is_match(text) {
        return Some(Expr::IntLiteral {
            id: ids.mint(),
            digits: text.to_string(),
        });
    }
    if let Some(caps) = float_re().captures(text) {
        return Some(Expr::FloatLiteral {
            id: ids.mint(),
            whole: caps[1].to_string(),
            fraction: caps[2].to_string(),
        });
    }
    if !text.is_empty() && text.chars().all(is_infix_char) {
        return Some(Expr::BinOp {
            id: ids.mint(),
            op: text.to_string(),
            lhs: Box::new(Expr::Blank { id: ids.mint() }),
            rhs: Box::new(Expr::Blank { id: ids.mint() }),
            on_rail: false,
        });
    }
    if ident_re().is_match(text) {
        if let Some(params) = sigs.params_of(text).map(<[Parameter]>::to_vec) {
            let args = params
                .iter()
                .map(|param| {
                    if param.typ == ParamType::Block {
                        Expr::Lambda {
                            id: ids.mint(),
                            params: param
                                .block_args
                                .iter()
                                .map(|name| LambdaParam {
                                    id: ids.mint(),
                                    name: name.clone(),
                                })
                                .collect(),
                            body: Box::new(Expr::Blank { id: ids.mint() }),
                        }
                    } else {
                        Expr::Blank { id: ids.mint() }
                    }
                })
                .collect();
            return Some(Expr::FnCall {
                id: ids.mint(),
                name: text.to_string(),
                args,
                on_rail: false,
            });
        }
        return Some(Expr::Variable {
            id: ids.mint(),
            name: text.to_string(),
        });
    }
    None
}

/// Move the old call's filled arguments into the new call. Arguments match
/// positionally by parameter name and type when both signatures are known,
/// and by plain position otherwise; unmatched non-blank arguments become
/// synthetic lets above the new call.
fn realign_arguments(
    wrapped: &Expr,
    replacement: Expr,
    sigs: &dyn SignatureLookup,
    ids: &mut IdAllocator,
) -> Expr {
    let Expr::FnCall {
        name: old_name,
        args: old_args,
        ..
    } = wrapped
    else {
        return replacement;
    };
    let (id, new_name, mut new_args, on_rail) = match replacement {
        Expr::FnCall {
            id,
            name,
            args,
            on_rail,
        } => (id, name, args, on_rail),
        other => return other,
    };

    let old_params = sigs.params_of(old_name).map(<[Parameter]>::to_vec);
    let new_params = sigs.params_of(&new_name).map(<[Parameter]>::to_vec);

    let mut used = vec![false; old_args.len()];
    match (&old_params, &new_params) {
        (Some(old_ps), Some(new_ps)) => {
            for (new_index, new_param) in new_ps.iter().enumerate() {
                if new_index >= new_args.len() {
                    break;
                }
                let matched = old_ps.iter().enumerate().find(|(old_index, old_param)| {
                    !used[*old_index]
                        && old_param.name == new_param.name
                        && old_param.typ == new_param.typ
                        && old_args
                            .get(*old_index)
                            .map(|arg| !arg.is_blank_like())
                            .unwrap_or(false)
                });
                if let Some((old_index, _)) = matched {
                    new_args[new_index] = old_args[old_index].clone();
                    used[old_index] = true;
                }
            }
        }
        _ => {
            for (index, arg) in old_args.iter().enumerate() {
                if index < new_args.len() && !arg.is_blank_like() {
                    new_args[index] = arg.clone();
                    used[index] = true;
                }
            }
        }
    }

    // A pipe target in the old first slot stays a pipe target: the segment
    // keeps receiving the previous result.
    if old_args
        .first()
        .map(|arg| matches!(arg, Expr::PipeTarget { .. }))
        .unwrap_or(false)
        && !new_args.is_empty()
    {
        new_args[0] = Expr::PipeTarget { id: ids.mint() };
        used[0] = true;
    }

    let mut result = Expr::FnCall {
        id,
        name: new_name,
        args: new_args,
        on_rail,
    };

    for (index, arg) in old_args.iter().enumerate().rev() {
        if used[index] || arg.is_blank_like() {
            continue;
        }
        let lhs = old_params
            .as_ref()
            .and_then(|ps| ps.get(index))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("arg{index}"));
        result = Expr::Let {
            id: ids.mint(),
            lhs_id: ids.mint(),
            lhs,
            rhs: Box::new(arg.clone()),
            body: Box::new(result),
        };
    }
    result
}
