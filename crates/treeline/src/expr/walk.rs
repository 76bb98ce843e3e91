use std::collections::HashMap;

use crate::id::{IdAllocator, NodeId};

use super::ast::{Expr, LambdaParam, MatchArm, Pattern, RecordField};

/// Pre-order search for a node by id.
pub fn find_node(id: NodeId, expr: &Expr) -> Option<&Expr> {
    if expr.id() == id {
        return Some(expr);
    }
    expr.children()
        .into_iter()
        .find_map(|child| find_node(id, child))
}

/// Pre-order search for the parent of a node.
pub fn find_parent(id: NodeId, expr: &Expr) -> Option<&Expr> {
    for child in expr.children() {
        if child.id() == id {
            return Some(expr);
        }
        if let Some(found) = find_parent(id, child) {
            return Some(found);
        }
    }
    None
}

/// Locate a pattern by its own id, returning it with the index of the arm
/// that holds it.
pub fn find_pattern(id: NodeId, expr: &Expr) -> Option<(&Pattern, usize)> {
    fn in_pattern(id: NodeId, pattern: &Pattern) -> Option<&Pattern> {
        if pattern.id() == id {
            return Some(pattern);
        }
        if let Pattern::Constructor { args, .. } = pattern {
            return args.iter().find_map(|arg| in_pattern(id, arg));
        }
        None
    }

    if let Expr::Match { arms, .. } = expr {
        for (index, arm) in arms.iter().enumerate() {
            if let Some(found) = in_pattern(id, &arm.pattern) {
                return Some((found, index));
            }
        }
    }
    expr.children()
        .into_iter()
        .find_map(|child| find_pattern(id, child))
}

/// Rebuild a node with `f` applied to every direct expression child. All
/// recursive rewrites in the crate are built on this.
pub fn map_children(expr: &Expr, f: &mut dyn FnMut(&Expr) -> Expr) -> Expr {
    match expr {
        Expr::Blank { .. }
        | Expr::IntLiteral { .. }
        | Expr::FloatLiteral { .. }
        | Expr::StringLiteral { .. }
        | Expr::BoolLiteral { .. }
        | Expr::NullLiteral { .. }
        | Expr::Variable { .. }
        | Expr::PipeTarget { .. } => expr.clone(),
        Expr::Let {
            id,
            lhs_id,
            lhs,
            rhs,
            body,
        } => Expr::Let {
            id: *id,
            lhs_id: *lhs_id,
            lhs: lhs.clone(),
            rhs: Box::new(f(rhs)),
            body: Box::new(f(body)),
        },
        Expr::If {
            id,
            cond,
            then_branch,
            else_branch,
        } => Expr::If {
            id: *id,
            cond: Box::new(f(cond)),
            then_branch: Box::new(f(then_branch)),
            else_branch: Box::new(f(else_branch)),
        },
        Expr::BinOp {
            id,
            op,
            lhs,
            rhs,
            on_rail,
        } => Expr::BinOp {
            id: *id,
            op: op.clone(),
            lhs: Box::new(f(lhs)),
            rhs: Box::new(f(rhs)),
            on_rail: *on_rail,
        },
        Expr::FnCall {
            id,
            name,
            args,
            on_rail,
        } => Expr::FnCall {
            id: *id,
            name: name.clone(),
            args: args.iter().map(|a| f(a)).collect(),
            on_rail: *on_rail,
        },
        Expr::Lambda { id, params, body } => Expr::Lambda {
            id: *id,
            params: params.clone(),
            body: Box::new(f(body)),
        },
        Expr::FieldAccess {
            id,
            target,
            field_id,
            field,
        } => Expr::FieldAccess {
            id: *id,
            target: Box::new(f(target)),
            field_id: *field_id,
            field: field.clone(),
        },
        Expr::List { id, items } => Expr::List {
            id: *id,
            items: items.iter().map(|i| f(i)).collect(),
        },
        Expr::Record { id, fields } => Expr::Record {
            id: *id,
            fields: fields
                .iter()
                .map(|field| RecordField {
                    id: field.id,
                    name: field.name.clone(),
                    value: f(&field.value),
                })
                .collect(),
        },
        Expr::Pipeline { id, segments } => Expr::Pipeline {
            id: *id,
            segments: segments.iter().map(|s| f(s)).collect(),
        },
        Expr::Constructor { id, name, args } => Expr::Constructor {
            id: *id,
            name: name.clone(),
            args: args.iter().map(|a| f(a)).collect(),
        },
        Expr::Match { id, subject, arms } => Expr::Match {
            id: *id,
            subject: Box::new(f(subject)),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: arm.pattern.clone(),
                    body: f(&arm.body),
                })
                .collect(),
        },
        Expr::Flag {
            id,
            name,
            cond,
            case_off,
            case_on,
        } => Expr::Flag {
            id: *id,
            name: name.clone(),
            cond: Box::new(f(cond)),
            case_off: Box::new(f(case_off)),
            case_on: Box::new(f(case_on)),
        },
        Expr::Partial { id, text, wrapped } => Expr::Partial {
            id: *id,
            text: text.clone(),
            wrapped: Box::new(f(wrapped)),
        },
        Expr::RightPartial { id, text, wrapped } => Expr::RightPartial {
            id: *id,
            text: text.clone(),
            wrapped: Box::new(f(wrapped)),
        },
    }
}

/// Replace the node with `target` id by `replacement`. A missing id returns
/// the tree unchanged — concurrent edits may aim at stale ids, and that is
/// not an error.
pub fn replace_node(target: NodeId, replacement: &Expr, expr: &Expr) -> Expr {
    if expr.id() == target {
        return replacement.clone();
    }
    map_children(expr, &mut |child| replace_node(target, replacement, child))
}

/// Replace the pattern with `target` id, wherever it sits in a match arm
/// (including inside a constructor pattern). Missing ids leave the tree
/// unchanged, as with [`replace_node`].
pub fn replace_pattern(target: NodeId, replacement: &Pattern, expr: &Expr) -> Expr {
    fn in_pattern(target: NodeId, replacement: &Pattern, pattern: &Pattern) -> Pattern {
        if pattern.id() == target {
            return replacement.clone();
        }
        match pattern {
            Pattern::Constructor {
                match_id,
                id,
                name,
                args,
            } => Pattern::Constructor {
                match_id: *match_id,
                id: *id,
                name: name.clone(),
                args: args
                    .iter()
                    .map(|arg| in_pattern(target, replacement, arg))
                    .collect(),
            },
            other => other.clone(),
        }
    }

    match expr {
        Expr::Match { id, subject, arms } => Expr::Match {
            id: *id,
            subject: Box::new(replace_pattern(target, replacement, subject)),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: in_pattern(target, replacement, &arm.pattern),
                    body: replace_pattern(target, replacement, &arm.body),
                })
                .collect(),
        },
        _ => map_children(expr, &mut |child| replace_pattern(target, replacement, child)),
    }
}

fn pattern_binds(pattern: &Pattern, name: &str) -> bool {
    match pattern {
        Pattern::Variable { name: bound, .. } => bound == name,
        Pattern::Constructor { args, .. } => args.iter().any(|arg| pattern_binds(arg, name)),
        _ => false,
    }
}

/// Rewrite every free reference to `old` with `new`. Recursion stops at any
/// `Let`, `Lambda` or match arm that rebinds `old`: shadowed uses belong to
/// the inner binding and must not be touched.
pub fn rename_variable_uses(old: &str, new: &str, expr: &Expr) -> Expr {
    match expr {
        Expr::Variable { id, name } if name == old => Expr::Variable {
            id: *id,
            name: new.to_string(),
        },
        Expr::Let {
            id,
            lhs_id,
            lhs,
            rhs,
            body,
        } => {
            let rhs = rename_variable_uses(old, new, rhs);
            // The rhs sees the outer binding; the body only if this let does
            // not rebind the name.
            let body = if lhs == old {
                body.as_ref().clone()
            } else {
                rename_variable_uses(old, new, body)
            };
            Expr::Let {
                id: *id,
                lhs_id: *lhs_id,
                lhs: lhs.clone(),
                rhs: Box::new(rhs),
                body: Box::new(body),
            }
        }
        Expr::Lambda { id, params, body } => {
            let body = if params.iter().any(|p| p.name == old) {
                body.as_ref().clone()
            } else {
                rename_variable_uses(old, new, body)
            };
            Expr::Lambda {
                id: *id,
                params: params.clone(),
                body: Box::new(body),
            }
        }
        Expr::Match { id, subject, arms } => Expr::Match {
            id: *id,
            subject: Box::new(rename_variable_uses(old, new, subject)),
            arms: arms
                .iter()
                .map(|arm| {
                    let body = if pattern_binds(&arm.pattern, old) {
                        arm.body.clone()
                    } else {
                        rename_variable_uses(old, new, &arm.body)
                    };
                    MatchArm {
                        pattern: arm.pattern.clone(),
                        body,
                    }
                })
                .collect(),
        },
        _ => map_children(expr, &mut |child| rename_variable_uses(old, new, child)),
    }
}

fn pattern_parents(pattern: &Pattern, parent: NodeId, map: &mut HashMap<NodeId, NodeId>) {
    map.insert(pattern.id(), parent);
    if let Pattern::Constructor { args, .. } = pattern {
        for arg in args {
            pattern_parents(arg, pattern.id(), map);
        }
    }
}

/// Child-id → parent-id over the whole tree, covering expression children,
/// binding/field ids and pattern ids. The root has no entry.
pub fn parent_map(expr: &Expr) -> HashMap<NodeId, NodeId> {
    fn walk(expr: &Expr, map: &mut HashMap<NodeId, NodeId>) {
        let id = expr.id();
        match expr {
            Expr::Let { lhs_id, .. } => {
                map.insert(*lhs_id, id);
            }
            Expr::Lambda { params, .. } => {
                for p in params {
                    map.insert(p.id, id);
                }
            }
            Expr::FieldAccess { field_id, .. } => {
                map.insert(*field_id, id);
            }
            Expr::Record { fields, .. } => {
                for field in fields {
                    map.insert(field.id, id);
                    // The value hangs off the field, not the record, so a
                    // field's subtree covers its whole row.
                    map.insert(field.value.id(), field.id);
                }
            }
            Expr::Match { arms, .. } => {
                for arm in arms {
                    pattern_parents(&arm.pattern, id, map);
                }
            }
            _ => {}
        }
        for child in expr.children() {
            map.entry(child.id()).or_insert(id);
            walk(child, map);
        }
    }

    let mut map = HashMap::new();
    walk(expr, &mut map);
    map
}

fn pattern_max_id(pattern: &Pattern) -> u64 {
    let own = pattern.id().0.max(pattern.match_id().0);
    match pattern {
        Pattern::Constructor { args, .. } => args
            .iter()
            .map(pattern_max_id)
            .fold(own, u64::max),
        _ => own,
    }
}

/// The largest id anywhere in the tree, including binding, field and pattern
/// ids. Used to seed an allocator that must not collide with an existing
/// snapshot.
pub fn max_node_id(expr: &Expr) -> u64 {
    let mut max = expr.id().0;
    match expr {
        Expr::Let { lhs_id, .. } => max = max.max(lhs_id.0),
        Expr::Lambda { params, .. } => {
            for p in params {
                max = max.max(p.id.0);
            }
        }
        Expr::FieldAccess { field_id, .. } => max = max.max(field_id.0),
        Expr::Record { fields, .. } => {
            for field in fields {
                max = max.max(field.id.0);
            }
        }
        Expr::Match { arms, .. } => {
            for arm in arms {
                max = max.max(pattern_max_id(&arm.pattern));
            }
        }
        _ => {}
    }
    for child in expr.children() {
        max = max.max(max_node_id(child));
    }
    max
}

fn pattern_with_fresh_ids(pattern: &Pattern, match_id: NodeId, ids: &mut IdAllocator) -> Pattern {
    let id = ids.mint();
    match pattern {
        Pattern::Blank { .. } => Pattern::Blank { match_id, id },
        Pattern::Variable { name, .. } => Pattern::Variable {
            match_id,
            id,
            name: name.clone(),
        },
        Pattern::Integer { digits, .. } => Pattern::Integer {
            match_id,
            id,
            digits: digits.clone(),
        },
        Pattern::Float {
            whole, fraction, ..
        } => Pattern::Float {
            match_id,
            id,
            whole: whole.clone(),
            fraction: fraction.clone(),
        },
        Pattern::Bool { value, .. } => Pattern::Bool {
            match_id,
            id,
            value: *value,
        },
        Pattern::PString { text, .. } => Pattern::PString {
            match_id,
            id,
            text: text.clone(),
        },
        Pattern::Null { .. } => Pattern::Null { match_id, id },
        Pattern::Constructor { name, args, .. } => Pattern::Constructor {
            match_id,
            id,
            name: name.clone(),
            args: args
                .iter()
                .map(|arg| pattern_with_fresh_ids(arg, match_id, ids))
                .collect(),
        },
    }
}

fn count_pipe_targets(expr: &Expr) -> usize {
    let own = usize::from(matches!(expr, Expr::PipeTarget { .. }));
    own + expr
        .children()
        .iter()
        .map(|child| count_pipe_targets(child))
        .sum::<usize>()
}

/// Structural invariants of a snapshot: unique ids, pipelines of at least
/// two segments with exactly one pipe target per non-first segment, matches
/// with at least one arm. Violations are reported as diagnostics, never
/// panics.
pub fn check_invariants(expr: &Expr) -> Vec<crate::diagnostics::Diagnostic> {
    use crate::diagnostics::Diagnostic;
    use std::collections::HashSet;

    fn walk(expr: &Expr, seen: &mut HashSet<NodeId>, diags: &mut Vec<Diagnostic>) {
        if !seen.insert(expr.id()) {
            diags.push(Diagnostic::invariant(format!(
                "duplicate node id {}",
                expr.id()
            )));
        }
        match expr {
            Expr::Pipeline { id, segments } => {
                if segments.len() < 2 {
                    diags.push(Diagnostic::invariant(format!(
                        "pipeline {id} has fewer than two segments"
                    )));
                }
                for (index, segment) in segments.iter().enumerate().skip(1) {
                    if segment.is_blank_like() {
                        continue;
                    }
                    if count_pipe_targets(segment) != 1 {
                        diags.push(Diagnostic::degenerate_segment(format!(
                            "segment {index} of pipeline {id} does not carry exactly one pipe target"
                        )));
                    }
                }
            }
            Expr::Match { id, arms, .. } => {
                if arms.is_empty() {
                    diags.push(Diagnostic::invariant(format!("match {id} has no arms")));
                }
            }
            _ => {}
        }
        for child in expr.children() {
            walk(child, seen, diags);
        }
    }

    let mut seen = HashSet::new();
    let mut diags = Vec::new();
    walk(expr, &mut seen, &mut diags);
    diags
}

/// Deep-copy a tree with every id re-minted. Used on paste so a subtree can
/// land in a snapshot that may already contain its original ids.
pub fn with_fresh_ids(expr: &Expr, ids: &mut IdAllocator) -> Expr {
    let id = ids.mint();
    match expr {
        Expr::Blank { .. } => Expr::Blank { id },
        Expr::IntLiteral { digits, .. } => Expr::IntLiteral {
            id,
            digits: digits.clone(),
        },
        Expr::FloatLiteral {
            whole, fraction, ..
        } => Expr::FloatLiteral {
            id,
            whole: whole.clone(),
            fraction: fraction.clone(),
        },
        Expr::StringLiteral { text, .. } => Expr::StringLiteral {
            id,
            text: text.clone(),
        },
        Expr::BoolLiteral { value, .. } => Expr::BoolLiteral { id, value: *value },
        Expr::NullLiteral { .. } => Expr::NullLiteral { id },
        Expr::Variable { name, .. } => Expr::Variable {
            id,
            name: name.clone(),
        },
        Expr::Let { lhs, rhs, body, .. } => Expr::Let {
            id,
            lhs_id: ids.mint(),
            lhs: lhs.clone(),
            rhs: Box::new(with_fresh_ids(rhs, ids)),
            body: Box::new(with_fresh_ids(body, ids)),
        },
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => Expr::If {
            id,
            cond: Box::new(with_fresh_ids(cond, ids)),
            then_branch: Box::new(with_fresh_ids(then_branch, ids)),
            else_branch: Box::new(with_fresh_ids(else_branch, ids)),
        },
        Expr::BinOp {
            op,
            lhs,
            rhs,
            on_rail,
            ..
        } => Expr::BinOp {
            id,
            op: op.clone(),
            lhs: Box::new(with_fresh_ids(lhs, ids)),
            rhs: Box::new(with_fresh_ids(rhs, ids)),
            on_rail: *on_rail,
        },
        Expr::FnCall {
            name,
            args,
            on_rail,
            ..
        } => Expr::FnCall {
            id,
            name: name.clone(),
            args: args.iter().map(|a| with_fresh_ids(a, ids)).collect(),
            on_rail: *on_rail,
        },
        Expr::Lambda { params, body, .. } => Expr::Lambda {
            id,
            params: params
                .iter()
                .map(|p| LambdaParam {
                    id: ids.mint(),
                    name: p.name.clone(),
                })
                .collect(),
            body: Box::new(with_fresh_ids(body, ids)),
        },
        Expr::FieldAccess { target, field, .. } => Expr::FieldAccess {
            id,
            target: Box::new(with_fresh_ids(target, ids)),
            field_id: ids.mint(),
            field: field.clone(),
        },
        Expr::List { items, .. } => Expr::List {
            id,
            items: items.iter().map(|i| with_fresh_ids(i, ids)).collect(),
        },
        Expr::Record { fields, .. } => Expr::Record {
            id,
            fields: fields
                .iter()
                .map(|field| RecordField {
                    id: ids.mint(),
                    name: field.name.clone(),
                    value: with_fresh_ids(&field.value, ids),
                })
                .collect(),
        },
        Expr::Pipeline { segments, .. } => Expr::Pipeline {
            id,
            segments: segments.iter().map(|s| with_fresh_ids(s, ids)).collect(),
        },
        Expr::PipeTarget { .. } => Expr::PipeTarget { id },
        Expr::Constructor { name, args, .. } => Expr::Constructor {
            id,
            name: name.clone(),
            args: args.iter().map(|a| with_fresh_ids(a, ids)).collect(),
        },
        Expr::Match { subject, arms, .. } => Expr::Match {
            id,
            subject: Box::new(with_fresh_ids(subject, ids)),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: pattern_with_fresh_ids(&arm.pattern, id, ids),
                    body: with_fresh_ids(&arm.body, ids),
                })
                .collect(),
        },
        Expr::Flag {
            name,
            cond,
            case_off,
            case_on,
            ..
        } => Expr::Flag {
            id,
            name: name.clone(),
            cond: Box::new(with_fresh_ids(cond, ids)),
            case_off: Box::new(with_fresh_ids(case_off, ids)),
            case_on: Box::new(with_fresh_ids(case_on, ids)),
        },
        Expr::Partial { text, wrapped, .. } => Expr::Partial {
            id,
            text: text.clone(),
            wrapped: Box::new(with_fresh_ids(wrapped, ids)),
        },
        Expr::RightPartial { text, wrapped, .. } => Expr::RightPartial {
            id,
            text: text.clone(),
            wrapped: Box::new(with_fresh_ids(wrapped, ids)),
        },
    }
}
