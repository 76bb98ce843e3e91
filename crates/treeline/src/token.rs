use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Rendering kind of one leaf token. One expression node usually expands to
/// several tokens; every token knows the node that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literal fragments
    Integer,
    FloatWhole,
    FloatPoint,
    FloatFraction,
    String,
    StringMLStart,
    StringMLMiddle,
    StringMLEnd,
    True,
    False,
    Null,

    // Placeholders and in-progress edits
    Blank,
    Placeholder,
    Partial,
    RightPartial,

    // Layout
    Sep,
    Newline,
    Indent,
    ParenOpen,
    ParenClose,

    // Variables and field access
    Variable,
    FieldOp,
    FieldName,
    FieldPartial,

    // Let
    LetKeyword,
    LetVarName,
    LetAssignment,

    // If
    IfKeyword,
    ThenKeyword,
    ElseKeyword,

    // Operators and calls
    BinOp,
    FnName,
    FnVersion,

    // Lambda
    LambdaSymbol,
    LambdaVar,
    LambdaComma,
    LambdaArrow,

    // List
    ListOpen,
    ListClose,
    ListComma,

    // Record
    RecordOpen,
    RecordFieldName,
    RecordSep,
    RecordClose,

    // Pipeline
    PipeSymbol,
    PipeTarget,

    // Constructors
    ConstructorName,

    // Match
    MatchKeyword,
    MatchSep,

    // Match-arm patterns
    PatternBlank,
    PatternVariable,
    PatternConstructorName,
    PatternInteger,
    PatternString,
    PatternTrue,
    PatternFalse,
    PatternNull,
    PatternFloatWhole,
    PatternFloatPoint,
    PatternFloatFraction,

    // Feature flags
    FlagWhenKeyword,
    FlagEnabledKeyword,
}

impl TokenKind {
    /// Layout-only tokens. The position index skips these when computing
    /// neighbours; callers only ever see content-bearing tokens.
    pub fn is_whitespace(self) -> bool {
        matches!(self, TokenKind::Sep | TokenKind::Newline | TokenKind::Indent)
    }

    /// A placeholder the caret can fill.
    pub fn is_blank(self) -> bool {
        matches!(
            self,
            TokenKind::Blank | TokenKind::Placeholder | TokenKind::PatternBlank
        )
    }

    /// Tokens whose text the caret can sit inside and edit one grapheme at a
    /// time. Everything else is atomic: arrows jump over it in one step.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::FloatWhole
                | TokenKind::FloatPoint
                | TokenKind::FloatFraction
                | TokenKind::String
                | TokenKind::StringMLStart
                | TokenKind::StringMLMiddle
                | TokenKind::StringMLEnd
                | TokenKind::Variable
                | TokenKind::FieldName
                | TokenKind::FieldPartial
                | TokenKind::LetVarName
                | TokenKind::LambdaVar
                | TokenKind::RecordFieldName
                | TokenKind::FnName
                | TokenKind::ConstructorName
                | TokenKind::Partial
                | TokenKind::RightPartial
                | TokenKind::PatternVariable
                | TokenKind::PatternInteger
                | TokenKind::PatternString
                | TokenKind::PatternFloatWhole
                | TokenKind::PatternFloatPoint
                | TokenKind::PatternFloatFraction
                | TokenKind::PatternConstructorName
        )
    }

    pub fn is_atomic(self) -> bool {
        !self.is_text() && !self.is_whitespace()
    }

    /// Tokens the autocomplete overlay attaches to.
    pub fn is_autocompletable(self) -> bool {
        matches!(
            self,
            TokenKind::Blank
                | TokenKind::Placeholder
                | TokenKind::Partial
                | TokenKind::RightPartial
                | TokenKind::FieldPartial
                | TokenKind::PatternBlank
        )
    }

    /// Structural keywords whose deletion may collapse the whole construct.
    pub fn is_structural_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::LetKeyword
                | TokenKind::IfKeyword
                | TokenKind::MatchKeyword
                | TokenKind::LambdaSymbol
        )
    }
}

/// A leaf rendering unit: kind, owning node, and literal text. Multiline
/// string segments additionally remember their offset within the logical
/// string so edits can be mapped back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub node: NodeId,
    pub text: String,
    /// For `Newline`: the indent column the next row starts at.
    pub indent: Option<u32>,
    /// For `StringML*`: offset of this segment within the logical string.
    pub segment_offset: Option<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, node: NodeId, text: impl Into<String>) -> Self {
        Self {
            kind,
            node,
            text: text.into(),
            indent: None,
            segment_offset: None,
        }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A token after layout: absolute offsets into the flattened text plus grid
/// coordinates of its first character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub row: usize,
    pub col: usize,
}

impl TokenInfo {
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind
    }

    pub fn node(&self) -> NodeId {
        self.token.node
    }
}

/// Concatenated text of a token stream — the string the caret moves through.
pub fn to_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// One line per token, for tests and tooling only. Editing decisions never
/// look at this.
pub fn to_debug_text(tokens: &[TokenInfo]) -> String {
    let mut out = String::new();
    for info in tokens {
        out.push_str(&format!(
            "{}:{} kind={:?} text={:?} node={}\n",
            info.row, info.col, info.token.kind, info.token.text, info.token.node
        ));
    }
    out
}
