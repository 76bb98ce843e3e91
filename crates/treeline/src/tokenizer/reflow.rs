use crate::token::{Token, TokenKind};

/// The line-reflow pass. Walks the stream left to right; every newline
/// resets the column to the indent recorded on it during template
/// expansion, and the indent is materialized as an explicit `Indent` token
/// so the position index can treat it as a skippable run.
///
/// Existing `Indent` tokens are dropped and re-derived, which makes the
/// pass idempotent: `reflow(reflow(t)) == reflow(t)`.
pub fn reflow(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token.kind {
            TokenKind::Indent => {}
            TokenKind::Newline => {
                let indent = token.indent.unwrap_or(0);
                let node = token.node;
                out.push(token);
                if indent > 0 {
                    out.push(Token::new(
                        TokenKind::Indent,
                        node,
                        " ".repeat(indent as usize),
                    ));
                }
            }
            _ => out.push(token),
        }
    }
    out
}
