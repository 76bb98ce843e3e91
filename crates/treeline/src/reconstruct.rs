//! Rebuilding a standalone subtree from an arbitrary selection range, for
//! copy/cut. The reconstructor finds the topmost node the selection
//! touches, then rebuilds it recursively against each child's clipped
//! range: atomic literals are trimmed to the overlapped substring, children
//! with no surviving tokens become blanks, collection members with no
//! surviving tokens are dropped. Every produced id is fresh so the result
//! can be pasted into any snapshot.

use std::collections::HashMap;

use crate::expr::{find_node, parent_map, Expr, LambdaParam, MatchArm, Pattern, RecordField};
use crate::id::{IdAllocator, NodeId};
use crate::index::{stream_len, subtree_ranges};
use crate::provider::SignatureLookup;
use crate::token::{TokenInfo, TokenKind};
use crate::tokenizer::tokenize_info;

/// Rebuild the subtree covered by `[range.0, range.1)`. `None` means the
/// selection maps to no coherent subtree; callers fall back to a blank.
pub fn reconstruct(
    expr: &Expr,
    range: (usize, usize),
    sigs: &dyn SignatureLookup,
    ids: &mut IdAllocator,
) -> Option<Expr> {
    let tokens = tokenize_info(expr, sigs);
    let len = stream_len(&tokens);
    let start = range.0.min(len);
    let end = range.1.min(len);
    if start >= end {
        return None;
    }

    let parents = parent_map(expr);
    let touched: Vec<&TokenInfo> = tokens
        .iter()
        .filter(|t| !t.kind().is_whitespace() && t.start < end && t.end > start)
        .collect();
    if touched.is_empty() {
        return None;
    }

    let owners: Vec<NodeId> = touched
        .iter()
        .filter_map(|t| resolve_expr_node(expr, &parents, t.node()))
        .collect();
    let topmost = common_ancestor(expr, &parents, &owners)?;
    let node = find_node(topmost, expr)?;

    let ranges = subtree_ranges(expr, &tokens);
    let builder = Rebuilder {
        tokens: &tokens,
        ranges: &ranges,
    };
    builder.rebuild(node, (start, end), ids)
}

fn resolve_expr_node(
    expr: &Expr,
    parents: &HashMap<NodeId, NodeId>,
    mut id: NodeId,
) -> Option<NodeId> {
    loop {
        if find_node(id, expr).is_some() {
            return Some(id);
        }
        id = *parents.get(&id)?;
    }
}

/// The shallowest expression node containing every owner: the chain of the
/// first owner, trimmed until it covers the rest.
fn common_ancestor(
    expr: &Expr,
    parents: &HashMap<NodeId, NodeId>,
    owners: &[NodeId],
) -> Option<NodeId> {
    let first = *owners.first()?;
    let mut candidate = first;
    'outer: loop {
        for owner in owners {
            if !is_ancestor_or_self(parents, candidate, *owner) {
                candidate = *parents.get(&candidate)?;
                continue 'outer;
            }
        }
        break;
    }
    find_node(candidate, expr).map(|node| node.id())
}

fn is_ancestor_or_self(parents: &HashMap<NodeId, NodeId>, ancestor: NodeId, mut id: NodeId) -> bool {
    loop {
        if id == ancestor {
            return true;
        }
        match parents.get(&id) {
            Some(parent) => id = *parent,
            None => return false,
        }
    }
}

struct Rebuilder<'a> {
    tokens: &'a [TokenInfo],
    ranges: &'a HashMap<NodeId, (usize, usize)>,
}

impl<'a> Rebuilder<'a> {
    /// The selection clipped to a node's own rendering; `None` when nothing
    /// of the node survives.
    fn clip(&self, node: NodeId, sel: (usize, usize)) -> Option<(usize, usize)> {
        let (start, end) = self.ranges.get(&node).copied()?;
        let clipped = (sel.0.max(start), sel.1.min(end));
        (clipped.0 < clipped.1).then_some(clipped)
    }

    /// Overlapped substring of the token of `kind` owned directly by `node`.
    fn trimmed(&self, node: NodeId, kind: TokenKind, sel: (usize, usize)) -> Option<String> {
        let info = self
            .tokens
            .iter()
            .find(|t| t.node() == node && t.kind() == kind)?;
        self.trim_token(info, sel)
    }

    fn trim_token(&self, info: &TokenInfo, sel: (usize, usize)) -> Option<String> {
        let start = sel.0.max(info.start);
        let end = sel.1.min(info.end);
        if start >= end {
            return None;
        }
        let text: Vec<char> = info.token.text.chars().collect();
        Some(text[start - info.start..end - info.start].iter().collect())
    }

    fn child_or_blank(&self, child: &Expr, sel: (usize, usize), ids: &mut IdAllocator) -> Expr {
        self.clip(child.id(), sel)
            .and_then(|clipped| self.rebuild(child, clipped, ids))
            .unwrap_or(Expr::Blank { id: ids.mint() })
    }

    fn rebuild(&self, node: &Expr, sel: (usize, usize), ids: &mut IdAllocator) -> Option<Expr> {
        match node {
            Expr::Blank { .. } => Some(Expr::Blank { id: ids.mint() }),
            Expr::PipeTarget { .. } => Some(Expr::PipeTarget { id: ids.mint() }),
            Expr::IntLiteral { id, .. } => {
                let digits = self.trimmed(*id, TokenKind::Integer, sel)?;
                Some(Expr::IntLiteral {
                    id: ids.mint(),
                    digits,
                })
            }
            Expr::FloatLiteral { id, .. } => {
                let whole = self
                    .trimmed(*id, TokenKind::FloatWhole, sel)
                    .unwrap_or_default();
                let point = self.trimmed(*id, TokenKind::FloatPoint, sel);
                let fraction = self
                    .trimmed(*id, TokenKind::FloatFraction, sel)
                    .unwrap_or_default();
                if point.is_some() {
                    Some(Expr::FloatLiteral {
                        id: ids.mint(),
                        whole,
                        fraction,
                    })
                } else {
                    // Only digits on one side of the point survive: they
                    // reconstruct as a plain integer.
                    let digits = if whole.is_empty() { fraction } else { whole };
                    if digits.is_empty() {
                        return None;
                    }
                    Some(Expr::IntLiteral {
                        id: ids.mint(),
                        digits,
                    })
                }
            }
            Expr::StringLiteral { id, .. } => {
                let mut covered = String::new();
                let mut any = false;
                for info in self.tokens.iter().filter(|t| t.node() == *id) {
                    if info.kind().is_whitespace() {
                        continue;
                    }
                    if let Some(piece) = self.trim_token(info, sel) {
                        any = true;
                        covered.push_str(&piece);
                    }
                }
                if !any {
                    return None;
                }
                // Quotes are re-appended by rendering; strip any that were
                // captured in the overlap.
                let text = covered.trim_matches('"').to_string();
                Some(Expr::StringLiteral {
                    id: ids.mint(),
                    text,
                })
            }
            Expr::BoolLiteral { id, value } => {
                let kind = if *value {
                    TokenKind::True
                } else {
                    TokenKind::False
                };
                let covered = self.trimmed(*id, kind, sel)?;
                let full = if *value { "true" } else { "false" };
                if covered == full {
                    Some(Expr::BoolLiteral {
                        id: ids.mint(),
                        value: *value,
                    })
                } else {
                    Some(partial_over_blank(covered, ids))
                }
            }
            Expr::NullLiteral { id } => {
                let covered = self.trimmed(*id, TokenKind::Null, sel)?;
                if covered == "null" {
                    Some(Expr::NullLiteral { id: ids.mint() })
                } else {
                    Some(partial_over_blank(covered, ids))
                }
            }
            Expr::Variable { id, name } => {
                let covered = self.trimmed(*id, TokenKind::Variable, sel)?;
                let variable = Expr::Variable {
                    id: ids.mint(),
                    name: covered.clone(),
                };
                if covered == *name {
                    Some(variable)
                } else {
                    // A half-selected identifier round-trips as an editable
                    // partial, not silently as the full original.
                    Some(Expr::Partial {
                        id: ids.mint(),
                        text: covered,
                        wrapped: Box::new(variable),
                    })
                }
            }
            Expr::Let {
                id, lhs, rhs, body, ..
            } => {
                let covered_name = self
                    .trimmed(*id, TokenKind::LetVarName, sel)
                    .filter(|name| name != crate::tokenizer::BLANK_TEXT)
                    .unwrap_or_default();
                let lhs = if covered_name == *lhs {
                    lhs.clone()
                } else {
                    covered_name
                };
                Some(Expr::Let {
                    id: ids.mint(),
                    lhs_id: ids.mint(),
                    lhs,
                    rhs: Box::new(self.child_or_blank(rhs, sel, ids)),
                    body: Box::new(self.child_or_blank(body, sel, ids)),
                })
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => Some(Expr::If {
                id: ids.mint(),
                cond: Box::new(self.child_or_blank(cond, sel, ids)),
                then_branch: Box::new(self.child_or_blank(then_branch, sel, ids)),
                else_branch: Box::new(self.child_or_blank(else_branch, sel, ids)),
            }),
            Expr::BinOp {
                op, lhs, rhs, on_rail, ..
            } => Some(Expr::BinOp {
                id: ids.mint(),
                op: op.clone(),
                lhs: Box::new(self.child_or_blank(lhs, sel, ids)),
                rhs: Box::new(self.child_or_blank(rhs, sel, ids)),
                on_rail: *on_rail,
            }),
            Expr::FnCall {
                id,
                name,
                args,
                on_rail,
            } => {
                let rebuilt_args: Vec<Expr> = args
                    .iter()
                    .map(|arg| {
                        if matches!(arg, Expr::PipeTarget { .. }) {
                            Expr::PipeTarget { id: ids.mint() }
                        } else {
                            self.child_or_blank(arg, sel, ids)
                        }
                    })
                    .collect();
                let covered_name = self.covered_fn_name(*id, sel);
                let call = Expr::FnCall {
                    id: ids.mint(),
                    name: name.clone(),
                    args: rebuilt_args,
                    on_rail: *on_rail,
                };
                match covered_name {
                    Some(covered) if covered != *name => Some(Expr::Partial {
                        id: ids.mint(),
                        text: covered,
                        wrapped: Box::new(call),
                    }),
                    _ => Some(call),
                }
            }
            Expr::Lambda { params, body, .. } => {
                let rebuilt_params: Vec<LambdaParam> = params
                    .iter()
                    .map(|param| {
                        let covered = self
                            .tokens
                            .iter()
                            .find(|t| t.node() == param.id && t.kind() == TokenKind::LambdaVar)
                            .and_then(|info| self.trim_token(info, sel))
                            .filter(|name| name != crate::tokenizer::BLANK_TEXT)
                            .unwrap_or_default();
                        LambdaParam {
                            id: ids.mint(),
                            name: covered,
                        }
                    })
                    .collect();
                Some(Expr::Lambda {
                    id: ids.mint(),
                    params: rebuilt_params,
                    body: Box::new(self.child_or_blank(body, sel, ids)),
                })
            }
            Expr::FieldAccess {
                target,
                field_id,
                field,
                ..
            } => {
                let covered = self
                    .tokens
                    .iter()
                    .find(|t| {
                        t.node() == *field_id
                            && matches!(t.kind(), TokenKind::FieldName | TokenKind::FieldPartial)
                    })
                    .and_then(|info| self.trim_token(info, sel))
                    .unwrap_or_default();
                let field = if covered == *field {
                    field.clone()
                } else {
                    covered
                };
                Some(Expr::FieldAccess {
                    id: ids.mint(),
                    target: Box::new(self.child_or_blank(target, sel, ids)),
                    field_id: ids.mint(),
                    field,
                })
            }
            Expr::List { items, .. } => {
                let rebuilt: Vec<Expr> = items
                    .iter()
                    .filter_map(|item| {
                        let clipped = self.clip(item.id(), sel)?;
                        self.rebuild(item, clipped, ids)
                    })
                    .collect();
                Some(Expr::List {
                    id: ids.mint(),
                    items: rebuilt,
                })
            }
            Expr::Record { fields, .. } => {
                let rebuilt: Vec<RecordField> = fields
                    .iter()
                    .filter_map(|field| {
                        let clipped = self.clip(field.id, sel)?;
                        let name = self
                            .tokens
                            .iter()
                            .find(|t| {
                                t.node() == field.id && t.kind() == TokenKind::RecordFieldName
                            })
                            .and_then(|info| self.trim_token(info, clipped))
                            .filter(|name| name != "***")
                            .unwrap_or_default();
                        Some(RecordField {
                            id: ids.mint(),
                            name,
                            value: self.child_or_blank(&field.value, clipped, ids),
                        })
                    })
                    .collect();
                Some(Expr::Record {
                    id: ids.mint(),
                    fields: rebuilt,
                })
            }
            Expr::Pipeline { segments, .. } => {
                let mut rebuilt: Vec<Expr> = segments
                    .iter()
                    .filter_map(|segment| {
                        let clipped = self.clip(segment.id(), sel)?;
                        self.rebuild(segment, clipped, ids)
                    })
                    .collect();
                match rebuilt.len() {
                    0 => None,
                    1 => {
                        // A pipeline cannot be degenerate: a single survivor
                        // gets a trailing blank segment.
                        rebuilt.push(Expr::Blank { id: ids.mint() });
                        Some(Expr::Pipeline {
                            id: ids.mint(),
                            segments: rebuilt,
                        })
                    }
                    _ => Some(Expr::Pipeline {
                        id: ids.mint(),
                        segments: rebuilt,
                    }),
                }
            }
            Expr::Constructor { id, name, args } => {
                let covered = self.trimmed(*id, TokenKind::ConstructorName, sel);
                let rebuilt_args: Vec<Expr> = args
                    .iter()
                    .map(|arg| self.child_or_blank(arg, sel, ids))
                    .collect();
                let ctor = Expr::Constructor {
                    id: ids.mint(),
                    name: name.clone(),
                    args: rebuilt_args,
                };
                match covered {
                    Some(covered) if covered != *name => Some(Expr::Partial {
                        id: ids.mint(),
                        text: covered,
                        wrapped: Box::new(ctor),
                    }),
                    _ => Some(ctor),
                }
            }
            Expr::Match { subject, arms, .. } => {
                let match_id = ids.mint();
                let mut rebuilt: Vec<MatchArm> = arms
                    .iter()
                    .filter_map(|arm| {
                        let pattern_clip = self.clip(arm.pattern.id(), sel);
                        let body_clip = self.clip(arm.body.id(), sel);
                        if pattern_clip.is_none() && body_clip.is_none() {
                            return None;
                        }
                        Some(MatchArm {
                            pattern: self.rebuild_pattern(&arm.pattern, match_id, sel, ids),
                            body: self.child_or_blank(&arm.body, sel, ids),
                        })
                    })
                    .collect();
                if rebuilt.is_empty() {
                    rebuilt.push(MatchArm {
                        pattern: Pattern::Blank {
                            match_id,
                            id: ids.mint(),
                        },
                        body: Expr::Blank { id: ids.mint() },
                    });
                }
                Some(Expr::Match {
                    id: match_id,
                    subject: Box::new(self.child_or_blank(subject, sel, ids)),
                    arms: rebuilt,
                })
            }
            Expr::Flag {
                name,
                cond,
                case_off,
                case_on,
                ..
            } => Some(Expr::Flag {
                id: ids.mint(),
                name: name.clone(),
                cond: Box::new(self.child_or_blank(cond, sel, ids)),
                case_off: Box::new(self.child_or_blank(case_off, sel, ids)),
                case_on: Box::new(self.child_or_blank(case_on, sel, ids)),
            }),
            Expr::Partial { id, wrapped, .. } => {
                let covered = self.trimmed(*id, TokenKind::Partial, sel)?;
                Some(Expr::Partial {
                    id: ids.mint(),
                    text: covered,
                    wrapped: Box::new(self.child_or_blank(wrapped, sel, ids)),
                })
            }
            Expr::RightPartial { id, wrapped, .. } => {
                let covered = self
                    .trimmed(*id, TokenKind::RightPartial, sel)
                    .unwrap_or_default();
                if covered.is_empty() {
                    return self
                        .clip(wrapped.id(), sel)
                        .and_then(|clipped| self.rebuild(wrapped, clipped, ids));
                }
                Some(Expr::RightPartial {
                    id: ids.mint(),
                    text: covered,
                    wrapped: Box::new(self.child_or_blank(wrapped, sel, ids)),
                })
            }
        }
    }

    fn covered_fn_name(&self, call: NodeId, sel: (usize, usize)) -> Option<String> {
        let mut covered = String::new();
        let mut any = false;
        for info in self.tokens.iter().filter(|t| {
            t.node() == call && matches!(t.kind(), TokenKind::FnName | TokenKind::FnVersion)
        }) {
            if let Some(piece) = self.trim_token(info, sel) {
                any = true;
                covered.push_str(&piece);
            }
        }
        any.then_some(covered)
    }

    fn rebuild_pattern(
        &self,
        pattern: &Pattern,
        match_id: NodeId,
        sel: (usize, usize),
        ids: &mut IdAllocator,
    ) -> Pattern {
        let blank = |ids: &mut IdAllocator| Pattern::Blank {
            match_id,
            id: ids.mint(),
        };
        let trim = |kind: TokenKind| -> Option<String> {
            let info = self
                .tokens
                .iter()
                .find(|t| t.node() == pattern.id() && t.kind() == kind)?;
            self.trim_token(info, sel)
        };
        match pattern {
            Pattern::Blank { .. } => blank(ids),
            Pattern::Variable { .. } => match trim(TokenKind::PatternVariable) {
                Some(name) => Pattern::Variable {
                    match_id,
                    id: ids.mint(),
                    name,
                },
                None => blank(ids),
            },
            Pattern::Integer { .. } => match trim(TokenKind::PatternInteger) {
                Some(digits) => Pattern::Integer {
                    match_id,
                    id: ids.mint(),
                    digits,
                },
                None => blank(ids),
            },
            Pattern::Float {
                whole, fraction, ..
            } => Pattern::Float {
                match_id,
                id: ids.mint(),
                whole: whole.clone(),
                fraction: fraction.clone(),
            },
            Pattern::Bool { value, .. } => Pattern::Bool {
                match_id,
                id: ids.mint(),
                value: *value,
            },
            Pattern::PString { .. } => match trim(TokenKind::PatternString) {
                Some(text) => Pattern::PString {
                    match_id,
                    id: ids.mint(),
                    text: text.trim_matches('"').to_string(),
                },
                None => blank(ids),
            },
            Pattern::Null { .. } => Pattern::Null {
                match_id,
                id: ids.mint(),
            },
            Pattern::Constructor { name, args, .. } => Pattern::Constructor {
                match_id,
                id: ids.mint(),
                name: name.clone(),
                args: args
                    .iter()
                    .map(|arg| self.rebuild_pattern(arg, match_id, sel, ids))
                    .collect(),
            },
        }
    }
}

fn partial_over_blank(text: String, ids: &mut IdAllocator) -> Expr {
    Expr::Partial {
        id: ids.mint(),
        text,
        wrapped: Box::new(Expr::Blank { id: ids.mint() }),
    }
}
