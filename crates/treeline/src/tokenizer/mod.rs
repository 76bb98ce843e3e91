//! Deterministic Expression → token-stream compiler.
//!
//! Tokenization runs in three passes: template expansion (this module), the
//! reflow pass that materializes indentation ([`reflow`]), and the position
//! pass that assigns offsets and grid coordinates ([`layout`]). All three are
//! pure; running reflow twice produces the same stream.

mod reflow;

pub use reflow::reflow;

use crate::expr::{Expr, Pattern};
use crate::id::NodeId;
use crate::provider::{Parameter, SignatureLookup};
use crate::token::{Token, TokenInfo, TokenKind};

/// Maximum rendered segment of a string literal before it is split into
/// Start/Middle/End rows.
pub const STRING_SEGMENT: usize = 40;

/// Rendering of a blank and of a blank-ish name slot.
pub const BLANK_TEXT: &str = "___";
const FIELD_PARTIAL_TEXT: &str = "***";

pub fn tokenize(expr: &Expr, sigs: &dyn SignatureLookup) -> Vec<Token> {
    let mut builder = Builder {
        tokens: Vec::new(),
        indent: 0,
        sigs,
    };
    builder.expr(expr);
    builder.tokens
}

/// Template expansion, reflow and layout in one call — the stream most
/// callers want.
pub fn tokenize_info(expr: &Expr, sigs: &dyn SignatureLookup) -> Vec<TokenInfo> {
    layout(&reflow(tokenize(expr, sigs)))
}

/// The position pass: accumulate token lengths into `start`/`end` offsets,
/// incrementing the row and zeroing the column after each newline. Offsets
/// count chars, matching the caret.
pub fn layout(tokens: &[Token]) -> Vec<TokenInfo> {
    let mut infos = Vec::with_capacity(tokens.len());
    let mut pos = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    for token in tokens {
        let len = token.len();
        infos.push(TokenInfo {
            token: token.clone(),
            start: pos,
            end: pos + len,
            row,
            col,
        });
        pos += len;
        if token.kind == TokenKind::Newline {
            row += 1;
            col = 0;
        } else {
            col += len;
        }
    }
    infos
}

struct Builder<'a> {
    tokens: Vec<Token>,
    indent: u32,
    sigs: &'a dyn SignatureLookup,
}

impl<'a> Builder<'a> {
    /// Zero-length token texts are an invariant violation; a constructor
    /// that would synthesize one omits the token instead.
    fn push(&mut self, token: Token) {
        if token.is_empty() {
            return;
        }
        self.tokens.push(token);
    }

    fn simple(&mut self, kind: TokenKind, node: NodeId, text: &str) {
        self.push(Token::new(kind, node, text));
    }

    fn sep(&mut self, node: NodeId) {
        self.simple(TokenKind::Sep, node, " ");
    }

    fn newline(&mut self, node: NodeId) {
        let mut token = Token::new(TokenKind::Newline, node, "\n");
        token.indent = Some(self.indent);
        self.tokens.push(token);
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 2;
        f(self);
        self.indent -= 2;
    }

    /// A blank child in a known argument position renders as a typed
    /// placeholder instead of a bare blank — the one place tokenization
    /// needs outside data.
    fn child_or_placeholder(&mut self, child: &Expr, param: Option<&Parameter>) {
        match (child, param) {
            (Expr::Blank { id }, Some(param)) => {
                self.simple(
                    TokenKind::Placeholder,
                    *id,
                    &format!("{}: {}", param.name, param.typ.label()),
                );
            }
            _ => self.expr(child),
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Blank { id } => self.simple(TokenKind::Blank, *id, BLANK_TEXT),
            Expr::IntLiteral { id, digits } => {
                if digits.is_empty() {
                    self.simple(TokenKind::Blank, *id, BLANK_TEXT);
                } else {
                    self.simple(TokenKind::Integer, *id, digits);
                }
            }
            Expr::FloatLiteral {
                id,
                whole,
                fraction,
            } => {
                self.simple(TokenKind::FloatWhole, *id, whole);
                self.simple(TokenKind::FloatPoint, *id, ".");
                self.simple(TokenKind::FloatFraction, *id, fraction);
            }
            Expr::StringLiteral { id, text } => self.string(*id, text),
            Expr::BoolLiteral { id, value } => {
                if *value {
                    self.simple(TokenKind::True, *id, "true");
                } else {
                    self.simple(TokenKind::False, *id, "false");
                }
            }
            Expr::NullLiteral { id } => self.simple(TokenKind::Null, *id, "null"),
            Expr::Variable { id, name } => {
                if name.is_empty() {
                    self.simple(TokenKind::Blank, *id, BLANK_TEXT);
                } else {
                    self.simple(TokenKind::Variable, *id, name);
                }
            }
            Expr::Let {
                id,
                lhs,
                rhs,
                body,
                ..
            } => {
                self.simple(TokenKind::LetKeyword, *id, "let");
                self.sep(*id);
                let lhs_text = if lhs.is_empty() { BLANK_TEXT } else { lhs };
                self.simple(TokenKind::LetVarName, *id, lhs_text);
                self.sep(*id);
                self.simple(TokenKind::LetAssignment, *id, "=");
                self.sep(*id);
                self.expr(rhs);
                self.newline(*id);
                self.expr(body);
            }
            Expr::If {
                id,
                cond,
                then_branch,
                else_branch,
            } => {
                self.simple(TokenKind::IfKeyword, *id, "if");
                self.sep(*id);
                self.expr(cond);
                self.newline(*id);
                self.simple(TokenKind::ThenKeyword, *id, "then");
                self.nested(|b| {
                    b.newline(*id);
                    b.expr(then_branch);
                });
                self.newline(*id);
                self.simple(TokenKind::ElseKeyword, *id, "else");
                self.nested(|b| {
                    b.newline(*id);
                    b.expr(else_branch);
                });
            }
            Expr::BinOp {
                id, op, lhs, rhs, ..
            } => {
                let params = self.sigs.params_of(op).map(<[Parameter]>::to_vec);
                let param_at =
                    |index: usize| params.as_ref().and_then(|ps| ps.get(index)).cloned();
                self.child_or_placeholder(lhs, param_at(0).as_ref());
                self.sep(*id);
                self.simple(TokenKind::BinOp, *id, op);
                self.sep(*id);
                self.child_or_placeholder(rhs, param_at(1).as_ref());
            }
            Expr::FnCall { id, name, args, .. } => {
                self.fn_name(*id, name);
                let params = self.sigs.params_of(name).map(<[Parameter]>::to_vec);
                for (index, arg) in args.iter().enumerate() {
                    // The pipe target is implicit; it renders nothing.
                    if matches!(arg, Expr::PipeTarget { .. }) {
                        continue;
                    }
                    self.sep(*id);
                    let param = params.as_ref().and_then(|ps| ps.get(index)).cloned();
                    self.child_or_placeholder(arg, param.as_ref());
                }
            }
            Expr::Lambda { id, params, body } => {
                self.simple(TokenKind::LambdaSymbol, *id, "\\");
                for (index, param) in params.iter().enumerate() {
                    if index > 0 {
                        self.simple(TokenKind::LambdaComma, *id, ", ");
                    }
                    let name = if param.name.is_empty() {
                        BLANK_TEXT
                    } else {
                        &param.name
                    };
                    self.simple(TokenKind::LambdaVar, param.id, name);
                }
                self.sep(*id);
                self.simple(TokenKind::LambdaArrow, *id, "->");
                self.sep(*id);
                self.expr(body);
            }
            Expr::FieldAccess {
                id,
                target,
                field_id,
                field,
            } => {
                self.expr(target);
                self.simple(TokenKind::FieldOp, *id, ".");
                if field.is_empty() {
                    self.simple(TokenKind::FieldPartial, *field_id, FIELD_PARTIAL_TEXT);
                } else {
                    self.simple(TokenKind::FieldName, *field_id, field);
                }
            }
            Expr::List { id, items } => {
                self.simple(TokenKind::ListOpen, *id, "[");
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.simple(TokenKind::ListComma, *id, ",");
                    }
                    self.expr(item);
                }
                self.simple(TokenKind::ListClose, *id, "]");
            }
            Expr::Record { id, fields } => {
                self.simple(TokenKind::RecordOpen, *id, "{");
                if !fields.is_empty() {
                    self.nested(|b| {
                        for field in fields {
                            b.newline(*id);
                            let name = if field.name.is_empty() {
                                FIELD_PARTIAL_TEXT
                            } else {
                                &field.name
                            };
                            b.simple(TokenKind::RecordFieldName, field.id, name);
                            b.simple(TokenKind::RecordSep, *id, " : ");
                            b.expr(&field.value);
                        }
                    });
                    self.newline(*id);
                }
                self.simple(TokenKind::RecordClose, *id, "}");
            }
            Expr::Pipeline { id, segments } => {
                if let Some(head) = segments.first() {
                    self.expr(head);
                }
                self.nested(|b| {
                    for segment in segments.iter().skip(1) {
                        b.newline(*id);
                        b.simple(TokenKind::PipeSymbol, *id, "|>");
                        b.sep(*id);
                        b.expr(segment);
                    }
                });
            }
            // Implicit: holds the previous segment's result, renders nothing.
            Expr::PipeTarget { .. } => {}
            Expr::Constructor { id, name, args } => {
                self.simple(TokenKind::ConstructorName, *id, name);
                for arg in args {
                    self.sep(*id);
                    self.expr(arg);
                }
            }
            Expr::Match { id, subject, arms } => {
                self.simple(TokenKind::MatchKeyword, *id, "match");
                self.sep(*id);
                self.expr(subject);
                self.nested(|b| {
                    for arm in arms {
                        b.newline(*id);
                        b.pattern(&arm.pattern);
                        b.sep(*id);
                        b.simple(TokenKind::MatchSep, *id, "->");
                        b.sep(*id);
                        b.expr(&arm.body);
                    }
                });
            }
            Expr::Flag {
                id,
                cond,
                case_off,
                case_on,
                ..
            } => {
                self.simple(TokenKind::FlagWhenKeyword, *id, "when");
                self.sep(*id);
                self.expr(cond);
                self.nested(|b| {
                    b.newline(*id);
                    b.expr(case_off);
                });
                self.newline(*id);
                self.simple(TokenKind::FlagEnabledKeyword, *id, "enabled");
                self.nested(|b| {
                    b.newline(*id);
                    b.expr(case_on);
                });
            }
            Expr::Partial { id, text, .. } => {
                if text.is_empty() {
                    self.simple(TokenKind::Blank, *id, BLANK_TEXT);
                } else {
                    self.simple(TokenKind::Partial, *id, text);
                }
            }
            Expr::RightPartial { id, text, wrapped } => {
                self.expr(wrapped);
                self.sep(*id);
                self.simple(TokenKind::RightPartial, *id, text);
            }
        }
    }

    fn fn_name(&mut self, id: NodeId, name: &str) {
        // "Mod::fn_v2" renders as a name token plus a version token so the
        // version can be styled separately; concatenated text round-trips.
        if let Some(split) = version_split(name) {
            self.simple(TokenKind::FnName, id, &name[..split]);
            self.simple(TokenKind::FnVersion, id, &name[split..]);
        } else if name.is_empty() {
            self.simple(TokenKind::Blank, id, BLANK_TEXT);
        } else {
            self.simple(TokenKind::FnName, id, name);
        }
    }

    fn string(&mut self, id: NodeId, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= STRING_SEGMENT {
            self.simple(TokenKind::String, id, &format!("\"{text}\""));
            return;
        }
        let segments: Vec<String> = chars
            .chunks(STRING_SEGMENT)
            .map(|chunk| chunk.iter().collect())
            .collect();
        let last = segments.len() - 1;
        let mut offset = 0usize;
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                self.newline(id);
            }
            let (kind, rendered) = if index == 0 {
                (TokenKind::StringMLStart, format!("\"{segment}"))
            } else if index == last {
                (TokenKind::StringMLEnd, format!("{segment}\""))
            } else {
                (TokenKind::StringMLMiddle, segment.clone())
            };
            let mut token = Token::new(kind, id, rendered);
            token.segment_offset = Some(offset);
            self.push(token);
            offset += segment.chars().count();
        }
    }

    fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Blank { id, .. } => self.simple(TokenKind::PatternBlank, *id, BLANK_TEXT),
            Pattern::Variable { id, name, .. } => {
                if name.is_empty() {
                    self.simple(TokenKind::PatternBlank, *id, BLANK_TEXT);
                } else {
                    self.simple(TokenKind::PatternVariable, *id, name);
                }
            }
            Pattern::Integer { id, digits, .. } => {
                self.simple(TokenKind::PatternInteger, *id, digits);
            }
            Pattern::Float {
                id,
                whole,
                fraction,
                ..
            } => {
                self.simple(TokenKind::PatternFloatWhole, *id, whole);
                self.simple(TokenKind::PatternFloatPoint, *id, ".");
                self.simple(TokenKind::PatternFloatFraction, *id, fraction);
            }
            Pattern::Bool { id, value, .. } => {
                if *value {
                    self.simple(TokenKind::PatternTrue, *id, "true");
                } else {
                    self.simple(TokenKind::PatternFalse, *id, "false");
                }
            }
            Pattern::PString { id, text, .. } => {
                self.simple(TokenKind::PatternString, *id, &format!("\"{text}\""));
            }
            Pattern::Null { id, .. } => self.simple(TokenKind::PatternNull, *id, "null"),
            Pattern::Constructor { id, name, args, .. } => {
                self.simple(TokenKind::PatternConstructorName, *id, name);
                for arg in args {
                    self.sep(*id);
                    self.pattern(arg);
                }
            }
        }
    }
}

fn version_split(name: &str) -> Option<usize> {
    let index = name.rfind("_v")?;
    let suffix = &name[index + 2..];
    if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
        Some(index)
    } else {
        None
    }
}

#[cfg(test)]
mod tests;
